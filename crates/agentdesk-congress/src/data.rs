use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use crate::error::CongressResult;

/// Data files the congress knowledge bases are built from
pub const EXPECTED_DATA_FILES: [&str; 3] = ["bills.json", "records.json", "reports.json"];

/// True when the response's `updateDate` is at most one day before `today`
pub fn is_fresh(data: &Value, today: NaiveDate) -> bool {
    let Some(update_date) = data.get("updateDate").and_then(Value::as_str) else {
        return false;
    };
    let day = update_date.split('T').next().unwrap_or_default();
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(date) => (today - date).num_days() <= 1,
        Err(_) => false,
    }
}

/// Freshness of a saved data file; unreadable files are stale
pub async fn check_data_freshness(path: &Path) -> bool {
    let Ok(raw) = tokio::fs::read_to_string(path).await else {
        return false;
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(data) => is_fresh(&data, Local::now().date_naive()),
        Err(_) => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataFileStatus {
    pub file: String,
    pub exists: bool,
    pub fresh: bool,
}

impl DataFileStatus {
    pub async fn check(data_dir: &Path, file: &str) -> Self {
        let path = data_dir.join(file);
        let exists = tokio::fs::try_exists(&path).await.unwrap_or(false);
        let fresh = exists && check_data_freshness(&path).await;
        Self {
            file: file.to_string(),
            exists,
            fresh,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match (self.exists, self.fresh) {
            (true, true) => "✓",
            (true, false) => "!",
            _ => "✗",
        }
    }

    pub fn freshness(&self) -> &'static str {
        match (self.exists, self.fresh) {
            (true, true) => "up-to-date",
            (true, false) => "stale",
            _ => "missing",
        }
    }
}

impl std::fmt::Display for DataFileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.symbol(), self.file, self.freshness())
    }
}

/// Shape of one saved data file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonFileSummary {
    pub file: String,
    pub keys: Vec<String>,
    /// Length of the compact JSON text, in characters
    pub size: usize,
}

/// Top-level keys and size of every expected data file that exists
pub async fn verify_json_data(data_dir: &Path) -> CongressResult<Vec<JsonFileSummary>> {
    let mut summaries = Vec::new();
    for file in EXPECTED_DATA_FILES {
        let path = data_dir.join(file);
        if !tokio::fs::try_exists(&path).await? {
            continue;
        }
        let data: Value = serde_json::from_str(&tokio::fs::read_to_string(&path).await?)?;
        let keys = data
            .as_object()
            .map(|object| object.keys().cloned().collect())
            .unwrap_or_default();
        summaries.push(JsonFileSummary {
            file: file.to_string(),
            keys,
            size: data.to_string().chars().count(),
        });
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_freshness_window() {
        let today = day("2024-03-10");
        assert!(is_fresh(&json!({"updateDate": "2024-03-10T08:00:00Z"}), today));
        assert!(is_fresh(&json!({"updateDate": "2024-03-09"}), today));
        assert!(!is_fresh(&json!({"updateDate": "2024-03-08T23:59:59Z"}), today));
        assert!(!is_fresh(&json!({"bills": []}), today));
        assert!(!is_fresh(&json!({"updateDate": "yesterday"}), today));
    }

    #[tokio::test]
    async fn test_data_file_status() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bills.json"), r#"{"bills": []}"#).unwrap();

        let bills = DataFileStatus::check(dir.path(), "bills.json").await;
        assert_eq!(bills.to_string(), "! bills.json (stale)");

        let records = DataFileStatus::check(dir.path(), "records.json").await;
        assert_eq!(records.to_string(), "✗ records.json (missing)");
    }

    #[tokio::test]
    async fn test_verify_json_data() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("reports.json"),
            r#"{"reports": [], "pagination": {"count": 0}}"#,
        )
        .unwrap();

        let summaries = verify_json_data(dir.path()).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].file, "reports.json");
        assert_eq!(summaries[0].keys, vec!["pagination", "reports"]);
        assert!(summaries[0].size > 0);
    }
}
