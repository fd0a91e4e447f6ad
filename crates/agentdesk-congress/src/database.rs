use serde::Serialize;
use std::path::Path;

use agentdesk_knowledge::StoreBackend;

use crate::data::{DataFileStatus, EXPECTED_DATA_FILES};

/// Every table the congress analysis creates
pub const CONGRESS_TABLES: [&str; 16] = [
    "congress_docs",
    "congress_records",
    "congress_reports",
    "congress_members",
    "congress_committees",
    "committee_meetings",
    "congress_hearings",
    "congress_nominations",
    "congress_knowledge",
    "constitutional_docs",
    "congress_agent_sessions",
    "constitutional_summaries",
    "federalism_knowledge",
    "bill_of_rights_knowledge",
    "agent_memory",
    "congress_workflows",
];

/// Tables reported by [`check_knowledge_bases`], with their descriptions
const CHECKED_TABLES: [(&str, &str); 5] = [
    ("congress_docs", "Congress Bills"),
    ("congress_records", "Congressional Records"),
    ("congress_reports", "Committee Reports"),
    ("constitutional_docs", "Constitutional Documents"),
    ("congress_knowledge", "Combined Knowledge"),
];

/// Outcome of dropping one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDrop {
    pub table: String,
    pub error: Option<String>,
}

impl std::fmt::Display for TableDrop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error {
            None => write!(f, "✓ Dropped {}", self.table),
            Some(e) => write!(f, "✗ Error dropping {}: {}", self.table, e),
        }
    }
}

/// Drop every congress table (`DROP TABLE IF EXISTS ai.<t> CASCADE` on
/// Postgres), reporting each table separately
pub async fn reset_database(backend: &StoreBackend) -> Vec<TableDrop> {
    let mut results = Vec::with_capacity(CONGRESS_TABLES.len());
    for table in CONGRESS_TABLES {
        let outcome = match backend.open(table) {
            Ok(store) => store.drop_table().await,
            Err(e) => Err(e),
        };
        if let Err(e) = &outcome {
            log::warn!("failed to drop {}: {}", table, e);
        }
        results.push(TableDrop {
            table: table.to_string(),
            error: outcome.err().map(|e| e.to_string()),
        });
    }
    results
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TableState {
    Missing,
    Rows(usize),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub table: String,
    pub description: String,
    pub state: TableState,
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.state {
            TableState::Rows(count) => {
                let symbol = if *count > 0 { "✓" } else { "!" };
                write!(f, "{} {}: {} documents", symbol, self.description, count)
            }
            TableState::Missing => write!(f, "✗ {}: Table not found", self.description),
            TableState::Error(_) => write!(f, "✗ {}: Error checking table", self.description),
        }
    }
}

/// Data-file freshness plus per-table existence and row counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeReport {
    pub files: Vec<DataFileStatus>,
    pub tables: Vec<TableStatus>,
}

impl std::fmt::Display for KnowledgeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Data File Status:")?;
        writeln!(f, "----------------")?;
        for file in &self.files {
            writeln!(f, "{}", file)?;
        }
        writeln!(f)?;
        writeln!(f, "Knowledge Base Status:")?;
        writeln!(f, "---------------------")?;
        for table in &self.tables {
            writeln!(f, "{}", table)?;
        }
        Ok(())
    }
}

async fn table_state(backend: &StoreBackend, table: &str) -> TableState {
    let store = match backend.open(table) {
        Ok(store) => store,
        Err(e) => return TableState::Error(e.to_string()),
    };
    match store.exists().await {
        Ok(false) => TableState::Missing,
        Ok(true) => match store.count().await {
            Ok(count) => TableState::Rows(count),
            Err(e) => TableState::Error(e.to_string()),
        },
        Err(e) => TableState::Error(e.to_string()),
    }
}

pub async fn check_knowledge_bases(backend: &StoreBackend, data_dir: &Path) -> KnowledgeReport {
    let mut files = Vec::new();
    for file in EXPECTED_DATA_FILES {
        files.push(DataFileStatus::check(data_dir, file).await);
    }

    let mut tables = Vec::new();
    for (table, description) in CHECKED_TABLES {
        tables.push(TableStatus {
            table: table.to_string(),
            description: description.to_string(),
            state: table_state(backend, table).await,
        });
    }

    KnowledgeReport { files, tables }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_types::Document;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_reset_drops_every_table() {
        let backend = StoreBackend::memory();
        let store = backend.open("congress_docs").unwrap();
        store
            .insert(&[Document::new("bill", "text")], &[vec![1.0, 0.0]])
            .await
            .unwrap();

        let results = reset_database(&backend).await;
        assert_eq!(results.len(), CONGRESS_TABLES.len());
        assert!(results.iter().all(|r| r.error.is_none()));
        assert_eq!(results[0].to_string(), "✓ Dropped congress_docs");
        assert!(!store.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_check_report() {
        let dir = tempfile::tempdir().unwrap();
        let backend = StoreBackend::memory();
        backend.open("congress_reports").unwrap().create().await.unwrap();
        backend
            .open("congress_docs")
            .unwrap()
            .insert(&[Document::new("bill", "text")], &[vec![1.0]])
            .await
            .unwrap();

        let report = check_knowledge_bases(&backend, dir.path()).await;
        let lines: Vec<String> = report.tables.iter().map(|t| t.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "✓ Congress Bills: 1 documents",
                "✗ Congressional Records: Table not found",
                "! Committee Reports: 0 documents",
                "✗ Constitutional Documents: Table not found",
                "✗ Combined Knowledge: Table not found",
            ]
        );
        assert!(report.files.iter().all(|f| !f.exists));
        assert!(report.to_string().starts_with("Data File Status:\n"));
    }
}
