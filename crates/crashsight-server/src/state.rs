use crate::export::write_bundle;
use crashsight_core::dashboard::{Dashboard, DashboardOptions};
use crashsight_core::types::IssueStatus;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Settings that live outside the dashboard itself.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http: Option<String>,
    pub export_dir: PathBuf,
    pub options: DashboardOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub issues: usize,
    pub by_status: BTreeMap<&'static str, usize>,
}

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<RwLock<Dashboard>>,
    pub start_time: Instant,
    pub export_dir: PathBuf,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(dashboard: Dashboard, export_dir: PathBuf) -> Self {
        Self {
            dashboard: Arc::new(RwLock::new(dashboard)),
            start_time: Instant::now(),
            export_dir,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub async fn health(&self) -> HealthReport {
        let dashboard = self.dashboard.read().await;
        let by_status = [
            IssueStatus::New,
            IssueStatus::Open,
            IssueStatus::Regression,
            IssueStatus::Closed,
        ]
        .into_iter()
        .map(|s| (s.as_str(), dashboard.count_by_status(s)))
        .collect();

        HealthReport {
            status: "ok",
            uptime_seconds: self.uptime_seconds(),
            issues: dashboard.issues().len(),
            by_status,
        }
    }

    /// Writes the export bundle for issue `id`. `Ok(None)` when the id is unknown.
    pub async fn export_issue(&self, id: &str) -> anyhow::Result<Option<PathBuf>> {
        let issue = match self.dashboard.read().await.issue(id) {
            Some(issue) => issue.clone(),
            None => return Ok(None),
        };
        let path = write_bundle(&self.export_dir, &issue, chrono::Utc::now())?;
        crate::metrics::record_export();
        Ok(Some(path))
    }
}
