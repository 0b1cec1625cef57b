use anyhow::Context;
use chrono::{DateTime, Utc};
use crashsight_core::types::CrashGroup;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Writes `<dir>/<issue-id>_<unix-ts>.zip` holding the issue, its events as
/// NDJSON and its notes.
pub fn write_bundle(dir: &Path, issue: &CrashGroup, now: DateTime<Utc>) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export dir {}", dir.display()))?;
    let path = dir.join(format!("{}_{}.zip", issue.id, now.timestamp()));

    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create bundle {}", path.display()))?;
    let mut zip = ZipWriter::new(std::io::BufWriter::new(file));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("issue.json", options)?;
    zip.write_all(serde_json::to_string_pretty(issue)?.as_bytes())?;

    zip.start_file("events.ndjson", options)?;
    for event in issue.events() {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        zip.write_all(line.as_bytes())?;
    }

    zip.start_file("notes.json", options)?;
    zip.write_all(serde_json::to_string_pretty(&issue.notes)?.as_bytes())?;

    zip.finish()?;
    tracing::info!("Issue bundle exported: {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_dataset;
    use chrono::TimeZone;
    use std::io::Read;

    #[test]
    fn test_bundle_contents() {
        let dataset = sample_dataset().unwrap();
        let issue = &dataset.issues[0];
        let dir = std::env::temp_dir().join(format!("crashsight-export-{}", std::process::id()));
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let path = write_bundle(&dir, issue, now).unwrap();
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(format!("{}_1700000000.zip", issue.id).as_str())
        );

        let mut archive = zip::ZipArchive::new(std::fs::File::open(&path).unwrap()).unwrap();
        let mut events = String::new();
        archive
            .by_name("events.ndjson")
            .unwrap()
            .read_to_string(&mut events)
            .unwrap();
        assert_eq!(events.lines().count(), issue.events().count());

        let mut json = String::new();
        archive.by_name("issue.json").unwrap().read_to_string(&mut json).unwrap();
        let back: CrashGroup = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, issue);
        assert!(archive.by_name("notes.json").is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
