//! 외부 데이터 소스와 문서 저장소.
//!
//! 이 crate는 다음을 제공합니다:
//! - Financial Modeling Prep API 클라이언트 (재시도 포함)
//! - 계층형 문서 저장소 trait과 PostgreSQL / 메모리 구현

pub mod error;
pub mod provider;
pub mod storage;

pub use error::{DataError, Result};
pub use provider::{FinancialDataSource, FmpClient, RetryPolicy};
pub use storage::{DocumentStore, MemoryDocumentStore, PgDocumentStore};
