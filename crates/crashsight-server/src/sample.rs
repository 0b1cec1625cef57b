use crashsight_core::dataset::Dataset;

/// Dataset used when no `--data` file is given.
pub const SAMPLE_JSON: &str = include_str!("../data/sample.json");

pub fn sample_dataset() -> crashsight_core::error::Result<Dataset> {
    Dataset::from_json_str(SAMPLE_JSON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_consistent() {
        let dataset = sample_dataset().unwrap();
        assert_eq!(dataset.issues.len(), 4);
        assert!(dataset.validate().is_empty());
    }
}
