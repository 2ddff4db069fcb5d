//! 외부 재무 데이터 Provider 모듈.
//!
//! ## Financial Modeling Prep (FMP)
//! - `FmpClient`: FMP REST API 클라이언트 (API 키 필요)
//! - 회사 프로필, 시세, 손익계산서/재무상태표/현금흐름표 (연간/분기, 정제본/공시 원본)
//! - 일시적 오류는 지수 백오프로 재시도

pub mod fmp;

use async_trait::async_trait;
use fundsync_core::{Record, StatementSpec, Symbol};

use crate::error::Result;

pub use fmp::{FmpClient, RetryPolicy};

/// 심볼 단위 재무 데이터 조회 Provider.
///
/// 모든 조회는 JSON 객체 레코드 목록을 반환합니다. 레코드가 0개인 응답은
/// 에러가 아니며, 저장 여부는 호출자가 결정합니다.
#[async_trait]
pub trait FinancialDataSource: Send + Sync {
    /// 회사 프로필 조회.
    async fn profile(&self, symbol: &Symbol) -> Result<Vec<Record>>;

    /// 현재 시세 조회.
    async fn quote(&self, symbol: &Symbol) -> Result<Vec<Record>>;

    /// 재무제표 조회.
    async fn statement(&self, symbol: &Symbol, spec: StatementSpec) -> Result<Vec<Record>>;
}
