//! PostgreSQL JSONB 문서 저장소.
//!
//! 모든 문서를 `documents` 테이블 하나에 `(path, doc_id)` 기본키로 저장합니다.
//! 병합 저장은 JSONB `||` 연산자로 최상위 필드를 덮어씁니다.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::time::Duration;
use tracing::{debug, info};

use fundsync_core::DocumentRef;

use super::DocumentStore;
use crate::error::{DataError, Result};

/// PostgreSQL 기반 문서 저장소.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// 데이터베이스에 연결합니다.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        info!("Connecting to document store...");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        info!("Document store connection established");
        Ok(Self { pool })
    }

    /// `documents` 테이블이 없으면 생성합니다.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                path TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                data JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (path, doc_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// 연결 종료.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, doc: &DocumentRef) -> Result<Option<Value>> {
        let row: Option<(Json<Value>,)> = sqlx::query_as(
            r#"
            SELECT data
            FROM documents
            WHERE path = $1 AND doc_id = $2
            "#,
        )
        .bind(&doc.path)
        .bind(&doc.id)
        .fetch_optional(&self.pool)
        .await?;

        debug!(document = %doc, found = row.is_some(), "문서 조회");
        Ok(row.map(|(Json(data),)| data))
    }

    async fn set(&self, doc: &DocumentRef, data: &Value, merge: bool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (path, doc_id, data, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (path, doc_id)
            DO UPDATE SET
                data = CASE WHEN $4 THEN documents.data || EXCLUDED.data ELSE EXCLUDED.data END,
                updated_at = NOW()
            "#,
        )
        .bind(&doc.path)
        .bind(&doc.id)
        .bind(Json(data))
        .bind(merge)
        .execute(&self.pool)
        .await?;

        debug!(document = %doc, merge = merge, "문서 저장");
        Ok(())
    }
}
