//! 계층형 문서 저장소.
//!
//! 문서는 `(경로, ID)`로 식별되는 JSON 객체입니다. 쿼리나 인덱스는 필요 없고
//! 경로 단위 조회와 저장(덮어쓰기 또는 필드 병합)만 제공합니다.
//!
//! - `PgDocumentStore`: PostgreSQL JSONB 테이블
//! - `MemoryDocumentStore`: 프로세스 내 저장소 (dry-run, 테스트)

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use fundsync_core::DocumentRef;
use serde_json::Value;

use crate::error::Result;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// 문서 저장소 trait.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 문서 조회. 없으면 `None`.
    async fn get(&self, doc: &DocumentRef) -> Result<Option<Value>>;

    /// 문서 저장.
    ///
    /// `merge`가 true이면 기존 객체에 필드 단위로 병합하고(새 값 우선),
    /// false이면 문서 전체를 덮어씁니다.
    async fn set(&self, doc: &DocumentRef, data: &Value, merge: bool) -> Result<()>;
}

/// 두 JSON 객체를 필드 단위로 병합합니다 (`incoming` 우선).
///
/// 어느 한쪽이 객체가 아니면 `incoming`으로 대체합니다.
pub(crate) fn merge_fields(existing: &mut Value, incoming: &Value) {
    match (existing.as_object_mut(), incoming.as_object()) {
        (Some(target), Some(source)) => {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        }
        _ => *existing = incoming.clone(),
    }
}
