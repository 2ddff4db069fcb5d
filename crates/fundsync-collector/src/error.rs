//! 에러 타입 정의.

use fundsync_core::{CoreError, Symbol, WorkloadKind};
use fundsync_data::DataError;
use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 데이터 소스 / 문서 저장소 에러
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// 도메인 에러
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 체크포인트 저장 실패 (실행 중단)
    #[error("Checkpoint persistence error ({kind}): {message}")]
    Checkpoint { kind: WorkloadKind, message: String },

    /// universe에 없는 심볼
    #[error("Symbol {0} is not in the defined universe")]
    UnknownSymbol(Symbol),

    /// 같은 작업이 이미 실행 중
    #[error("Workload {0} is already running")]
    WorkloadBusy(WorkloadKind),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
