//! 프로세스 내 문서 저장소.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use fundsync_core::DocumentRef;

use super::{merge_fields, DocumentStore};
use crate::error::Result;

/// `HashMap` 기반 문서 저장소.
///
/// DB 없이 파이프라인을 실행(dry-run)하거나 테스트할 때 사용합니다.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<DocumentRef, Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 문서 수.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// 특정 경로 아래의 문서 ID 목록 (정렬됨).
    pub async fn ids_in(&self, path: &str) -> Vec<String> {
        let documents = self.documents.read().await;
        let mut ids: Vec<String> = documents
            .keys()
            .filter(|doc| doc.path == path)
            .map(|doc| doc.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// 저장된 모든 문서 위치 (정렬됨).
    pub async fn paths(&self) -> Vec<String> {
        let documents = self.documents.read().await;
        let mut paths: Vec<String> = documents.keys().map(ToString::to_string).collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, doc: &DocumentRef) -> Result<Option<Value>> {
        Ok(self.documents.read().await.get(doc).cloned())
    }

    async fn set(&self, doc: &DocumentRef, data: &Value, merge: bool) -> Result<()> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(doc) {
            Some(existing) if merge => merge_fields(existing, data),
            _ => {
                documents.insert(doc.clone(), data.clone());
            }
        }
        Ok(())
    }
}
