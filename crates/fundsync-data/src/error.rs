//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 데이터 소스 및 문서 저장소 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 네트워크/연결 오류 (재시도 가능)
    #[error("Network error: {0}")]
    Network(String),

    /// 요청 타임아웃 (재시도 가능)
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// HTTP 상태 오류
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// API가 데이터 대신 오류 응답을 반환
    #[error("API error: {0}")]
    Api(String),

    /// 재시도 횟수 소진
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// 설정 오류
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DataError {
    /// 재시도 가능한 오류인지 확인.
    ///
    /// 네트워크 오류, 타임아웃, 429, 5xx만 재시도합니다.
    pub fn is_retryable(&self) -> bool {
        match self {
            DataError::Network(_) | DataError::Timeout(_) => true,
            DataError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => DataError::ConnectionError("pool timed out".to_string()),
            sqlx::Error::Database(db_err) => DataError::QueryError(db_err.message().to_string()),
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataError::Timeout(err.to_string())
        } else if err.is_decode() {
            DataError::SerializationError(err.to_string())
        } else if let Some(status) = err.status() {
            DataError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            DataError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
