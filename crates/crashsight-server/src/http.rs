use crate::state::AppState;
use crate::static_ui::UI_HTML;
use crate::view::{version_summaries, EventsPage, IssueRow};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Local, Utc};
use crashsight_core::detail::VariantFocus;
use crashsight_core::error::CrashSightError;
use crashsight_core::filter::FilterState;
use crashsight_core::time_range::{Preset, TimeRange};
use crashsight_core::workflow::NoteDraft;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CrashSightError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Core(CrashSightError::EmptyNote) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Core(CrashSightError::AlreadyClosed(_)) => StatusCode::CONFLICT,
            ApiError::Core(CrashSightError::IssueNotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
struct IssuesQuery {
    search: Option<String>,
    builds: Option<String>,
    range: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl IssuesQuery {
    /// Layers the query over the committed filter. Unknown range tags and
    /// incomplete custom bounds leave the time range as it was.
    fn apply_to(&self, mut filter: FilterState) -> FilterState {
        if let Some(search) = &self.search {
            filter.search = search.clone();
        }
        if let Some(builds) = &self.builds {
            filter.selected_builds = builds
                .split(',')
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string)
                .collect();
        }
        match self.range.as_deref() {
            Some("custom") => {
                if let (Some(start), Some(end)) = (self.start, self.end) {
                    filter.time_range = TimeRange::Custom { start, end };
                }
            }
            Some(tag) => {
                if let Some(preset) = Preset::from_tag(tag) {
                    filter.time_range = TimeRange::Preset(preset);
                }
            }
            None => {}
        }
        filter
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssuesResponse {
    total: usize,
    time_range: String,
    filter: FilterState,
    issues: Vec<IssueRow>,
}

#[derive(Deserialize)]
struct EventsQuery {
    variant: Option<usize>,
    page: Option<usize>,
}

#[derive(Deserialize)]
struct NoteBody {
    content: String,
}

#[derive(Serialize)]
struct ExportResponse {
    path: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Html(UI_HTML) }))
        .route("/health", get(health_handler))
        .route("/versions", get(versions_handler))
        .route("/issues", get(issues_handler))
        .route("/issues/:id", get(issue_handler))
        .route("/issues/:id/events", get(events_handler))
        .route("/issues/:id/notes", post(note_handler))
        .route("/issues/:id/close", post(close_handler))
        .route("/issues/:id/export", post(export_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.health().await)
}

async fn versions_handler(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = state.dashboard.read().await;
    Json(version_summaries(
        dashboard.versions(),
        &dashboard.filter().selected_builds,
    ))
}

async fn issues_handler(
    State(state): State<AppState>,
    Query(params): Query<IssuesQuery>,
) -> impl IntoResponse {
    let dashboard = state.dashboard.read().await;
    let filter = params.apply_to(dashboard.filter().clone());
    let rows: Vec<IssueRow> = dashboard
        .query(&filter, &Local::now())
        .into_iter()
        .map(IssueRow::from_issue)
        .collect();
    crate::metrics::record_filter_apply(rows.len());

    Json(IssuesResponse {
        total: rows.len(),
        time_range: filter.time_range.label(&Local),
        filter,
        issues: rows,
    })
}

async fn issue_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.dashboard.read().await.issue(&id) {
        Some(issue) => Json(issue.clone()).into_response(),
        None => ApiError::from(CrashSightError::IssueNotFound(id)).into_response(),
    }
}

async fn events_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<EventsQuery>,
) -> Result<Json<EventsPage>, ApiError> {
    let dashboard = state.dashboard.read().await;
    let issue = dashboard
        .issue(&id)
        .ok_or_else(|| CrashSightError::IssueNotFound(id.clone()))?;
    let focus = VariantFocus::from_index(issue, params.variant);
    Ok(Json(EventsPage::build(issue, focus, params.page.unwrap_or(0))))
}

async fn note_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<NoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = NoteDraft::new(body.content)?;
    let note = state.dashboard.write().await.annotate(&id, draft, Utc::now())?;
    crate::metrics::record_note(note.action);
    Ok((StatusCode::CREATED, Json(note)))
}

async fn close_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<NoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = NoteDraft::new(body.content)?;
    let note = state.dashboard.write().await.close_issue(&id, draft, Utc::now())?;
    crate::metrics::record_note(note.action);
    Ok(Json(note))
}

async fn export_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExportResponse>, ApiError> {
    match state.export_issue(&id).await? {
        Some(path) => Ok(Json(ExportResponse {
            path: path.to_string_lossy().to_string(),
        })),
        None => Err(CrashSightError::IssueNotFound(id).into()),
    }
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.as_ref().map(|h| h.render()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_dataset;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use crashsight_core::dashboard::{Dashboard, DashboardOptions};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(tag: &str) -> (Router, AppState) {
        let dashboard = Dashboard::new(sample_dataset().unwrap(), DashboardOptions::default());
        let dir = std::env::temp_dir().join(format!("crashsight-http-{}-{}", tag, std::process::id()));
        let state = AppState::new(dashboard, dir);
        (router(state.clone()), state)
    }

    async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn ids(json: &Value) -> Vec<String> {
        json["issues"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_health_counts_statuses() {
        let (router, _) = app("health");
        let (status, json) = send(router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["issues"], 4);
        assert_eq!(json["by_status"]["CLOSED"], 1);
    }

    #[tokio::test]
    async fn test_issues_filters_by_build_and_search() {
        let (router, _) = app("issues");
        let (_, all) = send(router.clone(), Method::GET, "/issues", None).await;
        assert_eq!(ids(&all), vec!["1", "2", "3", "4"]);

        let (_, by_build) = send(router.clone(), Method::GET, "/issues?builds=103030012", None).await;
        assert_eq!(ids(&by_build), vec!["2"]);

        let (_, by_search) = send(router, Method::GET, "/issues?search=SQLITE", None).await;
        assert_eq!(ids(&by_search), vec!["1", "4"]);
    }

    #[tokio::test]
    async fn test_issues_unknown_range_keeps_time_range() {
        let (router, _) = app("range");
        let (status, json) = send(router.clone(), Method::GET, "/issues?range=90d", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["timeRange"], "Last 30 days");

        let (_, json) = send(router, Method::GET, "/issues?range=yesterday", None).await;
        assert_eq!(json["timeRange"], "Yesterday");
    }

    #[tokio::test]
    async fn test_issue_not_found() {
        let (router, _) = app("missing");
        let (status, _) = send(router, Method::GET, "/issues/404", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_events_page_per_variant() {
        let (router, _) = app("events");
        let (status, json) = send(router.clone(), Method::GET, "/issues/2/events", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 12);
        assert_eq!(json["position"], "1 / 12");
        assert_eq!(json["variants"][0]["share"], 100.0);
        assert_eq!(json["variants"][1]["share"], 25.0);

        let (_, json) = send(router, Method::GET, "/issues/2/events?variant=1&page=99", None).await;
        assert_eq!(json["total"], 6);
        assert_eq!(json["position"], "6 / 6");
        assert_eq!(json["affectedUsers"], 14);
    }

    #[tokio::test]
    async fn test_close_flow_status_codes() {
        let (router, state) = app("close");
        let (status, _) = send(
            router.clone(),
            Method::POST,
            "/issues/1/close",
            Some(serde_json::json!({ "content": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!state.dashboard.read().await.issue("1").unwrap().is_closed());

        let (status, note) = send(
            router.clone(),
            Method::POST,
            "/issues/1/close",
            Some(serde_json::json!({ "content": "fixed in 1.3.5" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(note["action"], "closed");

        let (status, _) = send(
            router.clone(),
            Method::POST,
            "/issues/1/close",
            Some(serde_json::json!({ "content": "again" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            router,
            Method::POST,
            "/issues/nope/close",
            Some(serde_json::json!({ "content": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let dashboard = state.dashboard.read().await;
        let issue = dashboard.issue("1").unwrap();
        assert!(issue.is_closed());
        assert_eq!(issue.notes.len(), 1);
    }

    #[tokio::test]
    async fn test_note_is_prepended() {
        let (router, state) = app("note");
        let (status, _) = send(
            router,
            Method::POST,
            "/issues/4/notes",
            Some(serde_json::json!({ "content": "seen again on 1.3.3.1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let dashboard = state.dashboard.read().await;
        let notes = &dashboard.issue("4").unwrap().notes;
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].content, "seen again on 1.3.3.1");
    }

    #[tokio::test]
    async fn test_export_writes_bundle() {
        let (router, state) = app("export");
        let (status, json) = send(router.clone(), Method::POST, "/issues/3/export", None).await;
        assert_eq!(status, StatusCode::OK);
        let path = json["path"].as_str().unwrap();
        assert!(std::path::Path::new(path).exists());

        let (status, _) = send(router, Method::POST, "/issues/nope/export", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let _ = std::fs::remove_dir_all(&state.export_dir);
    }

    #[tokio::test]
    async fn test_index_serves_html() {
        let (router, _) = app("index");
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("CrashSight"));
    }
}
