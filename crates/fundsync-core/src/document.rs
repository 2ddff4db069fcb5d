//! 계층형 문서 저장소의 문서 위치 정의.
//!
//! 모든 문서는 `(컬렉션 경로, 문서 ID)` 쌍으로 식별됩니다.
//!
//! | 문서 | 경로 | ID |
//! |------|------|----|
//! | 회사 프로필 | `companies` | 심볼 |
//! | 시세 | `companies/{symbol}/quotes` | `YYYY-MM-DD` |
//! | 재무제표 | `companies/{symbol}/financials/{collection}/periods` | `{year}-{period}` |
//! | 분석 결과 | `companies/{symbol}/analysis` | `YYYY-MM-DD` |
//! | 체크포인트 | `task_states` | 작업 종류 이름 |

use chrono::NaiveDate;
use std::fmt;

use crate::types::{FinancialKey, Symbol, WorkloadKind};

const COMPANIES: &str = "companies";
const TASK_STATES: &str = "task_states";

/// 문서 저장 시 날짜 ID 형식.
pub const DATE_ID_FORMAT: &str = "%Y-%m-%d";

/// 문서 위치.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    /// 컬렉션 경로
    pub path: String,
    /// 문서 ID
    pub id: String,
}

impl DocumentRef {
    pub fn new(path: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            id: id.into(),
        }
    }

    /// 회사 프로필 문서.
    pub fn profile(symbol: &Symbol) -> Self {
        Self::new(COMPANIES, symbol.as_str())
    }

    /// 일별 시세 문서.
    pub fn quote(symbol: &Symbol, date: NaiveDate) -> Self {
        Self::new(
            format!("{}/{}/quotes", COMPANIES, symbol),
            date.format(DATE_ID_FORMAT).to_string(),
        )
    }

    /// 재무제표 문서. `collection`은 `StatementSpec::collection()` 값입니다.
    pub fn financial(symbol: &Symbol, collection: &str, key: FinancialKey) -> Self {
        Self::new(
            format!("{}/{}/financials/{}/periods", COMPANIES, symbol, collection),
            key.document_id(),
        )
    }

    /// 일별 분석 결과 문서.
    pub fn analysis(symbol: &Symbol, date: NaiveDate) -> Self {
        Self::new(
            format!("{}/{}/analysis", COMPANIES, symbol),
            date.format(DATE_ID_FORMAT).to_string(),
        )
    }

    /// 작업 종류별 체크포인트 문서.
    pub fn checkpoint(kind: WorkloadKind) -> Self {
        Self::new(TASK_STATES, kind.as_str())
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.path, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FiscalPeriod;

    #[test]
    fn test_document_paths() {
        let symbol = Symbol::new("AAPL");
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        assert_eq!(DocumentRef::profile(&symbol).to_string(), "companies/AAPL");
        assert_eq!(
            DocumentRef::quote(&symbol, date).to_string(),
            "companies/AAPL/quotes/2024-03-05"
        );
        assert_eq!(
            DocumentRef::financial(
                &symbol,
                "balance_sheets",
                FinancialKey::new(2023, FiscalPeriod::Q2)
            )
            .to_string(),
            "companies/AAPL/financials/balance_sheets/periods/2023-Q2"
        );
        assert_eq!(
            DocumentRef::analysis(&symbol, date).to_string(),
            "companies/AAPL/analysis/2024-03-05"
        );
        assert_eq!(
            DocumentRef::checkpoint(WorkloadKind::CompanyQuotes).to_string(),
            "task_states/company_quotes"
        );
    }
}
