//! 재무제표 관련 타입.
//!
//! 외부 API가 돌려주는 레코드는 JSON 객체(`Record`) 그대로 저장합니다.
//! 재무 문서의 키는 `(연도, 회계 기간)`이며 레코드에서 추출합니다.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 외부 API 레코드 (JSON 객체).
pub type Record = serde_json::Map<String, Value>;

/// 재무제표 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// 손익계산서
    IncomeStatement,
    /// 재무상태표
    BalanceSheet,
    /// 현금흐름표
    CashFlow,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [
        StatementKind::IncomeStatement,
        StatementKind::BalanceSheet,
        StatementKind::CashFlow,
    ];

    /// 문서 저장소 컬렉션 이름.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::IncomeStatement => "income_statements",
            Self::BalanceSheet => "balance_sheets",
            Self::CashFlow => "cash_flows",
        }
    }

    /// FMP 엔드포인트 이름.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::IncomeStatement => "income-statement",
            Self::BalanceSheet => "balance-sheet-statement",
            Self::CashFlow => "cash-flow-statement",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// 재무제표 변형 (정제본 / 공시 원본).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportVariant {
    /// 달력 기준으로 정규화된 데이터
    Standard,
    /// 공시 원본 (as-reported)
    AsReported,
}

impl ReportVariant {
    fn suffix(&self) -> &'static str {
        match self {
            Self::Standard => "",
            Self::AsReported => "-as-reported",
        }
    }
}

/// 조회 주기.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Annual,
    Quarter,
}

impl PeriodType {
    /// FMP `period` 쿼리 값.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarter => "quarter",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 재무제표 데이터셋 식별자 (종류 × 주기 × 변형).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementSpec {
    pub kind: StatementKind,
    pub period: PeriodType,
    pub variant: ReportVariant,
}

impl StatementSpec {
    pub fn new(kind: StatementKind, period: PeriodType, variant: ReportVariant) -> Self {
        Self {
            kind,
            period,
            variant,
        }
    }

    /// 정제본 데이터셋.
    pub fn standard(kind: StatementKind, period: PeriodType) -> Self {
        Self::new(kind, period, ReportVariant::Standard)
    }

    /// FMP 엔드포인트 경로 (`income-statement-as-reported` 등).
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.kind.endpoint(), self.variant.suffix())
    }

    /// 저장 컬렉션 이름. 공시 원본은 `_as_reported` 접미사가 붙습니다.
    pub fn collection(&self) -> String {
        match self.variant {
            ReportVariant::Standard => self.kind.collection().to_string(),
            ReportVariant::AsReported => format!("{}_as_reported", self.kind.collection()),
        }
    }
}

impl fmt::Display for StatementSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection(), self.period)
    }
}

/// 회계 기간.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FiscalPeriod {
    FY,
    Q1,
    Q2,
    Q3,
    Q4,
}

impl FiscalPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FY => "FY",
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
        }
    }
}

impl fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FiscalPeriod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FY" => Ok(Self::FY),
            "Q1" => Ok(Self::Q1),
            "Q2" => Ok(Self::Q2),
            "Q3" => Ok(Self::Q3),
            "Q4" => Ok(Self::Q4),
            other => Err(CoreError::InvalidInput(format!("알 수 없는 회계 기간: {}", other))),
        }
    }
}

/// 재무 문서 키 `(연도, 회계 기간)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FinancialKey {
    pub year: i32,
    pub period: FiscalPeriod,
}

impl FinancialKey {
    pub fn new(year: i32, period: FiscalPeriod) -> Self {
        Self { year, period }
    }

    /// 레코드에서 키를 추출합니다.
    ///
    /// 연도는 `calendarYear`(문자열 또는 정수), 없으면 `date`(`YYYY-MM-DD`)의
    /// 연도를 사용합니다. 기간은 `period` 필드입니다. 어느 하나라도 추출할 수
    /// 없으면 `None`을 반환합니다.
    pub fn from_record(record: &Record) -> Option<Self> {
        let year = record
            .get("calendarYear")
            .and_then(parse_year)
            .or_else(|| record.get("date").and_then(year_from_date))?;

        let period = record
            .get("period")
            .and_then(Value::as_str)
            .and_then(|p| p.parse::<FiscalPeriod>().ok())?;

        Some(Self::new(year, period))
    }

    /// 문서 ID (`2023-FY`, `2024-Q2`).
    pub fn document_id(&self) -> String {
        format!("{}-{}", self.year, self.period)
    }
}

fn parse_year(value: &Value) -> Option<i32> {
    match value {
        Value::String(s) if !s.trim().is_empty() => s.trim().parse().ok(),
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        _ => None,
    }
}

fn year_from_date(value: &Value) -> Option<i32> {
    let date = value.as_str()?;
    date.get(..4)?.parse().ok()
}
