use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::Row;

use agentdesk_knowledge::validate_table_name;
use agentdesk_llm_api::ChatMessage;
use agentdesk_types::VECTOR_SCHEMA;

use super::{validate_session_id, AgentSession, AgentStorage};

/// Sessions in a Postgres table `ai.<table>`, messages kept as JSONB
#[derive(Debug, Clone)]
pub struct PgAgentStorage {
    pool: PgPool,
    table: String,
}

impl PgAgentStorage {
    pub fn new(pool: PgPool, table: &str) -> Result<Self> {
        validate_table_name(table)?;
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Storage over a lazily connected pool; nothing is contacted until first use
    pub fn connect(db_url: &str, table: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(db_url)
            .context("Invalid database URL")?;
        Self::new(pool, table)
    }

    fn qualified_table(&self) -> String {
        format!("{}.{}", VECTOR_SCHEMA, self.table)
    }

    pub(crate) fn create_statements(&self) -> Vec<String> {
        vec![
            format!("CREATE SCHEMA IF NOT EXISTS {}", VECTOR_SCHEMA),
            format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 session_id TEXT PRIMARY KEY, \
                 agent_name TEXT NOT NULL, \
                 memory JSONB NOT NULL DEFAULT '[]'::jsonb, \
                 created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
                 updated_at TIMESTAMPTZ NOT NULL DEFAULT now())",
                self.qualified_table()
            ),
        ]
    }

    pub(crate) fn upsert_statement(&self) -> String {
        format!(
            "INSERT INTO {} (session_id, agent_name, memory, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (session_id) DO UPDATE SET \
             agent_name = EXCLUDED.agent_name, memory = EXCLUDED.memory, updated_at = EXCLUDED.updated_at",
            self.qualified_table()
        )
    }
}

#[async_trait]
impl AgentStorage for PgAgentStorage {
    async fn create(&self) -> Result<()> {
        for statement in self.create_statements() {
            sqlx::query(&statement)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to prepare {}", self.qualified_table()))?;
        }
        Ok(())
    }

    async fn read(&self, session_id: &str) -> Result<Option<AgentSession>> {
        validate_session_id(session_id)?;
        let sql = format!(
            "SELECT session_id, agent_name, memory, created_at, updated_at FROM {} WHERE session_id = $1",
            self.qualified_table()
        );
        let row = sqlx::query(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let messages: Json<Vec<ChatMessage>> = row.try_get("memory")?;
        Ok(Some(AgentSession {
            session_id: row.try_get("session_id")?,
            agent_name: row.try_get("agent_name")?,
            messages: messages.0,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        }))
    }

    async fn upsert(&self, session: &AgentSession) -> Result<()> {
        validate_session_id(&session.session_id)?;
        self.create().await?;
        sqlx::query(&self.upsert_statement())
            .bind(&session.session_id)
            .bind(&session.agent_name)
            .bind(Json(&session.messages))
            .bind(session.created_at)
            .bind(session.updated_at)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to store session {}", session.session_id))?;
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        validate_session_id(session_id)?;
        let sql = format!("DELETE FROM {} WHERE session_id = $1", self.qualified_table());
        sqlx::query(&sql).bind(session_id).execute(&self.pool).await?;
        Ok(())
    }

    async fn session_ids(&self) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT session_id FROM {} ORDER BY session_id",
            self.qualified_table()
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("session_id").map_err(Into::into))
            .collect()
    }
}
