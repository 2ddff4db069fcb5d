//! Financial Modeling Prep API 클라이언트.
//!
//! # 지원 데이터
//!
//! - 회사 프로필 (`v3/profile/{symbol}`)
//! - 시세 (`v3/quote/{symbol}`)
//! - 재무제표 (`v3/{statement}[-as-reported]/{symbol}?period=annual|quarter`)
//!
//! # API 키 관리
//!
//! API 키는 항상 외부 설정(`FMP_API_KEY`)으로 주입합니다.
//! 소스 코드에 기본값을 두지 않습니다.
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use fundsync_data::provider::FmpClient;
//! use secrecy::SecretString;
//!
//! let client = FmpClient::new(SecretString::from(api_key))?;
//! let quote = client.quote(&Symbol::new("AAPL")).await?;
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use fundsync_core::{Record, StatementSpec, Symbol};

use super::FinancialDataSource;
use crate::error::{DataError, Result};

/// FMP 기본 URL.
pub const DEFAULT_BASE_URL: &str = "https://financialmodelingprep.com/api";

/// 재시도 정책 (고정 횟수 + 지수 백오프).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 최대 시도 횟수 (첫 요청 포함)
    pub max_attempts: u32,
    /// 최소 대기 시간
    pub min_delay: Duration,
    /// 최대 대기 시간
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            min_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// `attempt`번째 실패 후 대기 시간: `2^(attempt-1)`초를 `[min, max]`로 제한.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = Duration::from_secs(1u64 << attempt.saturating_sub(1).min(32));
        let upper = self.max_delay.max(self.min_delay);
        exp.max(self.min_delay).min(upper)
    }
}

/// FMP REST API 클라이언트.
pub struct FmpClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    retry: RetryPolicy,
}

impl FmpClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(api_key: SecretString) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::ConfigError(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// 기본 URL을 변경합니다 (프록시, 테스트 서버 등).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// 재시도 정책을 변경합니다.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// 재시도 정책에 따라 레코드 목록을 조회합니다.
    async fn get_records(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<Record>> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.request_once(path, params).await {
                Ok(records) => return Ok(records),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    debug!(
                        path = path,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "FMP 요청 재시도 예정"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_retryable() => {
                    warn!(path = path, attempts = attempt, error = %e, "FMP 요청 최종 실패");
                    return Err(DataError::RetriesExhausted {
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 단일 HTTP 요청.
    async fn request_once(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<Record>> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("apikey", self.api_key.expose_secret())])
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DataError::Http {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let body: Value = response.json().await?;
        parse_records(body)
    }
}

/// 응답 본문을 레코드 목록으로 변환합니다.
///
/// FMP는 정상 응답으로 객체 배열을 반환합니다. 객체 본문은 모두 오류
/// (`{"Error Message": "..."}`, 한도 초과 안내 등)로 취급합니다.
fn parse_records(body: Value) -> Result<Vec<Record>> {
    match body {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(record) => Some(record),
                _ => None,
            })
            .collect()),
        Value::Object(record) => match record.get("Error Message").and_then(Value::as_str) {
            Some(message) => Err(DataError::Api(message.to_string())),
            None => Err(DataError::Api(Value::Object(record).to_string())),
        },
        Value::Null => Ok(Vec::new()),
        other => Err(DataError::SerializationError(format!(
            "예상하지 못한 응답 형식: {}",
            other
        ))),
    }
}

#[async_trait]
impl FinancialDataSource for FmpClient {
    async fn profile(&self, symbol: &Symbol) -> Result<Vec<Record>> {
        self.get_records(&format!("v3/profile/{}", symbol), &[]).await
    }

    async fn quote(&self, symbol: &Symbol) -> Result<Vec<Record>> {
        self.get_records(&format!("v3/quote/{}", symbol), &[]).await
    }

    async fn statement(&self, symbol: &Symbol, spec: StatementSpec) -> Result<Vec<Record>> {
        self.get_records(
            &format!("v3/{}/{}", spec.endpoint(), symbol),
            &[("period", spec.period.as_str())],
        )
        .await
    }
}
