use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use agentdesk_types::{Document, SearchResult, VECTOR_SCHEMA};

use crate::error::KnowledgeResult;
use crate::store::{check_lengths, validate_table_name, SearchType, VectorStore};

const SELECT_COLUMNS: &str = "id, name, meta_data, content, content_hash";
const TS_CONFIG: &str = "english";

/// pgvector-backed table `ai.<table>`
pub struct PgVectorStore {
    pool: PgPool,
    schema: String,
    table: String,
    dimensions: usize,
}

impl PgVectorStore {
    pub fn new(pool: PgPool, table: &str, dimensions: usize) -> KnowledgeResult<Self> {
        validate_table_name(table)?;
        Ok(Self {
            pool,
            schema: VECTOR_SCHEMA.to_string(),
            table: table.to_string(),
            dimensions,
        })
    }

    fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    fn create_statements(&self) -> Vec<String> {
        let table = self.qualified();
        vec![
            "CREATE EXTENSION IF NOT EXISTS vector".to_string(),
            format!("CREATE SCHEMA IF NOT EXISTS {}", self.schema),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 id TEXT PRIMARY KEY, \
                 name TEXT, \
                 meta_data JSONB DEFAULT '{{}}'::jsonb, \
                 content TEXT NOT NULL, \
                 embedding vector({}), \
                 content_hash TEXT, \
                 created_at TIMESTAMPTZ DEFAULT now())",
                table, self.dimensions
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS {}_content_hash_idx ON {} (content_hash)",
                self.table, table
            ),
        ]
    }

    fn write_statement(&self, replace: bool) -> String {
        let conflict = if replace {
            "ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, meta_data = EXCLUDED.meta_data, \
             content = EXCLUDED.content, embedding = EXCLUDED.embedding, \
             content_hash = EXCLUDED.content_hash"
        } else {
            "ON CONFLICT (id) DO NOTHING"
        };
        format!(
            "INSERT INTO {} (id, name, meta_data, content, embedding, content_hash) \
             VALUES ($1, $2, $3, $4, $5::vector, $6) {}",
            self.qualified(),
            conflict
        )
    }

    /// Rows without a `source_id` are their own source
    fn delete_source_statement(&self) -> String {
        format!(
            "DELETE FROM {} WHERE COALESCE(meta_data->>'source_id', id) = $1",
            self.qualified()
        )
    }

    /// Parameters: Vector `$1 embedding, $2 limit`; Keyword `$1 text, $2 limit`;
    /// Hybrid `$1 embedding, $2 text, $3 limit`
    fn search_statement(&self, search_type: SearchType) -> String {
        let table = self.qualified();
        let rank = |param: &str| {
            format!(
                "ts_rank_cd(to_tsvector('{cfg}', content), plainto_tsquery('{cfg}', {param}))",
                cfg = TS_CONFIG,
                param = param
            )
        };
        match search_type {
            SearchType::Vector => format!(
                "SELECT {cols}, (1 - (embedding <=> $1::vector))::float8 AS similarity \
                 FROM {table} ORDER BY embedding <=> $1::vector LIMIT $2",
                cols = SELECT_COLUMNS,
                table = table
            ),
            SearchType::Keyword => format!(
                "SELECT {cols}, {rank}::float8 AS similarity FROM {table} \
                 WHERE to_tsvector('{cfg}', content) @@ plainto_tsquery('{cfg}', $1) \
                 ORDER BY similarity DESC LIMIT $2",
                cols = SELECT_COLUMNS,
                rank = rank("$1"),
                table = table,
                cfg = TS_CONFIG
            ),
            SearchType::Hybrid => format!(
                "SELECT {cols}, (((1 - (embedding <=> $1::vector)) + ({rank} / (1 + {rank}))) / 2)::float8 \
                 AS similarity FROM {table} ORDER BY similarity DESC LIMIT $3",
                cols = SELECT_COLUMNS,
                rank = rank("$2"),
                table = table
            ),
        }
    }

    async fn write(&self, documents: &[Document], embeddings: &[Vec<f32>], replace: bool) -> KnowledgeResult<usize> {
        check_lengths(documents, embeddings)?;
        let statement = self.write_statement(replace);
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for (document, embedding) in documents.iter().zip(embeddings) {
            let result = sqlx::query(&statement)
                .bind(&document.id)
                .bind(&document.name)
                .bind(serde_json::Value::Object(document.meta_data.clone()))
                .bind(&document.content)
                .bind(vector_literal(embedding))
                .bind(&document.content_hash)
                .execute(&mut *tx)
                .await?;
            written += result.rows_affected() as usize;
        }

        tx.commit().await?;
        Ok(written)
    }
}

/// pgvector text representation, e.g. `[0.1,0.2]`
pub fn vector_literal(embedding: &[f32]) -> String {
    let values: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}

fn row_to_result(row: &PgRow) -> KnowledgeResult<SearchResult> {
    let meta_data = match row.try_get::<Option<serde_json::Value>, _>("meta_data")? {
        Some(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    let document = Document {
        id: row.try_get("id")?,
        name: row.try_get::<Option<String>, _>("name")?.unwrap_or_default(),
        content: row.try_get("content")?,
        meta_data,
        content_hash: row.try_get::<Option<String>, _>("content_hash")?.unwrap_or_default(),
    };
    let similarity: Option<f64> = row.try_get("similarity")?;
    Ok(SearchResult::new(document, similarity.unwrap_or(0.0) as f32))
}

#[async_trait]
impl VectorStore for PgVectorStore {
    fn table_name(&self) -> &str {
        &self.table
    }

    async fn create(&self) -> KnowledgeResult<()> {
        for statement in self.create_statements() {
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        log::debug!("created table {}", self.qualified());
        Ok(())
    }

    async fn exists(&self) -> KnowledgeResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
             WHERE table_schema = $1 AND table_name = $2)",
        )
        .bind(&self.schema)
        .bind(&self.table)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn drop_table(&self) -> KnowledgeResult<()> {
        sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", self.qualified()))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_all(&self) -> KnowledgeResult<()> {
        if self.exists().await? {
            sqlx::query(&format!("DELETE FROM {}", self.qualified()))
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    async fn delete_source(&self, source_id: &str) -> KnowledgeResult<usize> {
        let result = sqlx::query(&self.delete_source_statement())
            .bind(source_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }

    async fn insert(&self, documents: &[Document], embeddings: &[Vec<f32>]) -> KnowledgeResult<usize> {
        self.write(documents, embeddings, false).await
    }

    async fn upsert(&self, documents: &[Document], embeddings: &[Vec<f32>]) -> KnowledgeResult<usize> {
        self.write(documents, embeddings, true).await
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        query_text: &str,
        limit: usize,
        search_type: SearchType,
    ) -> KnowledgeResult<Vec<SearchResult>> {
        let statement = self.search_statement(search_type);
        let query = sqlx::query(&statement);
        let query = match search_type {
            SearchType::Vector => query.bind(vector_literal(query_embedding)),
            SearchType::Keyword => query.bind(query_text),
            SearchType::Hybrid => query.bind(vector_literal(query_embedding)).bind(query_text),
        };
        let rows = query.bind(limit as i64).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_result).collect()
    }

    async fn count(&self) -> KnowledgeResult<usize> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", self.qualified()))
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn doc_exists(&self, content_hash: &str) -> KnowledgeResult<bool> {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE content_hash = $1)",
            self.qualified()
        ))
        .bind(content_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PgVectorStore {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://ai:ai@localhost:5532/ai")
            .unwrap();
        PgVectorStore::new(pool, "pdf_documents", 1536).unwrap()
    }

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
        assert_eq!(vector_literal(&[]), "[]");
    }

    #[tokio::test]
    async fn test_statements_target_schema_table() {
        let store = store();
        let create = store.create_statements();
        assert!(create[2].contains("ai.pdf_documents"));
        assert!(create[2].contains("vector(1536)"));

        assert!(store.write_statement(false).ends_with("ON CONFLICT (id) DO NOTHING"));
        assert!(store.write_statement(true).contains("DO UPDATE"));
        assert_eq!(
            store.delete_source_statement(),
            "DELETE FROM ai.pdf_documents WHERE COALESCE(meta_data->>'source_id', id) = $1"
        );

        let vector = store.search_statement(SearchType::Vector);
        assert!(vector.contains("<=> $1::vector"));
        assert!(store.search_statement(SearchType::Keyword).contains("ts_rank_cd"));
        assert!(store.search_statement(SearchType::Hybrid).contains("ts_rank_cd"));
    }

    #[tokio::test]
    async fn test_rejects_bad_table_name() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://ai:ai@localhost:5532/ai")
            .unwrap();
        assert!(PgVectorStore::new(pool, "x; DROP TABLE y", 3).is_err());
    }
}
