//! 시세 기반 밸류에이션 분석.
//!
//! 새 시세 문서가 저장되면 최근 연간(FY) 재무제표와 결합해 지표를 계산하고
//! `companies/{symbol}/analysis/{date}` 문서로 저장합니다.
//!
//! # 계산 지표
//!
//! | 지표 | 식 |
//! |------|-----|
//! | NCAV 비율 | (유동자산 − 총부채) / 시가총액 |
//! | EPS | `eps`, 없으면 순이익 / 가중평균 주식수 |
//! | PER | 주가 / EPS (EPS > 0) |
//! | PBR | 시가총액 / 자본총계 |
//! | ROI | 순이익 / (자본총계 + 총차입금) |
//! | 배당 수익률 | −배당금 지급액 / 시가총액 |
//! | 자사주 매입 수익률 | −자사주 매입액 / 시가총액 |
//! | 주주환원 수익률 | 배당 + 자사주 매입 |
//!
//! 입력이 없거나 분모가 0인 지표는 생략합니다.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use fundsync_core::{
    decimal_field, ratio, DecimalExt, DocumentRef, FinancialKey, FiscalPeriod, Record,
    StatementKind, Symbol,
};
use fundsync_data::DocumentStore;

use super::company_sync::QuoteObserver;
use crate::Result;

/// 재무제표를 찾을 때 거슬러 올라가는 최대 연수.
pub const LOOKBACK_YEARS: i32 = 5;

/// 지표 소수점 자릿수.
const METRIC_DP: u32 = 6;

/// 계산된 밸류에이션 지표.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValuationMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ncav_ratio: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pb_ratio: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyback_yield: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shareholder_yield: Option<Decimal>,
}

impl ValuationMetrics {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// 분석 문서.
#[derive(Debug, Serialize)]
struct AnalysisDocument<'a> {
    symbol: &'a Symbol,
    date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    income_statement_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    balance_sheet_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cash_flow_year: Option<i32>,
    #[serde(flatten)]
    metrics: &'a ValuationMetrics,
}

/// 시세와 연간 재무제표로 지표를 계산합니다.
pub fn compute_metrics(
    quote: &Record,
    income: Option<&Record>,
    balance: Option<&Record>,
    cash_flow: Option<&Record>,
) -> ValuationMetrics {
    let market_cap = decimal_field(quote, "marketCap");
    let price = decimal_field(quote, "price");

    let field = |record: Option<&Record>, key: &str| record.and_then(|r| decimal_field(r, key));

    let net_income = field(income, "netIncome");
    let equity = field(balance, "totalStockholdersEquity");

    let ncav_ratio = match (
        field(balance, "totalCurrentAssets"),
        field(balance, "totalLiabilities"),
        market_cap,
    ) {
        (Some(assets), Some(liabilities), Some(cap)) => assets
            .checked_sub(liabilities)
            .and_then(|ncav| ratio(ncav, cap)),
        _ => None,
    };

    let eps = field(income, "eps").or_else(|| {
        net_income.zip(field(income, "weightedAverageShsOut"))
            .and_then(|(ni, shares)| ratio(ni, shares))
    });

    let pe_ratio = match (price, eps) {
        (Some(p), Some(e)) if e > Decimal::ZERO => ratio(p, e),
        _ => None,
    };

    let pb_ratio = market_cap.zip(equity).and_then(|(cap, eq)| ratio(cap, eq));

    let roi = match (net_income, equity) {
        (Some(ni), Some(eq)) => {
            let debt = field(balance, "totalDebt").unwrap_or(Decimal::ZERO);
            eq.checked_add(debt).and_then(|capital| ratio(ni, capital))
        }
        _ => None,
    };

    // 현금흐름표의 지급액은 음수로 기록됨
    let payout_yield = |key: &str| {
        field(cash_flow, key)
            .zip(market_cap)
            .and_then(|(paid, cap)| ratio(-paid, cap))
    };
    let dividend_yield = payout_yield("dividendsPaid");
    let buyback_yield = payout_yield("commonStockRepurchased");
    let shareholder_yield = match (dividend_yield, buyback_yield) {
        (None, None) => None,
        (d, b) => Some(d.unwrap_or(Decimal::ZERO) + b.unwrap_or(Decimal::ZERO)),
    };

    let round = |v: Option<Decimal>| v.map(|d| d.round_metric(METRIC_DP));

    ValuationMetrics {
        ncav_ratio: round(ncav_ratio),
        eps: round(eps),
        pe_ratio: round(pe_ratio),
        pb_ratio: round(pb_ratio),
        roi: round(roi),
        dividend_yield: round(dividend_yield),
        buyback_yield: round(buyback_yield),
        shareholder_yield: round(shareholder_yield),
    }
}

/// 시세 저장 시 지표를 계산해 저장하는 분석기.
pub struct ValuationAnalyzer {
    store: Arc<dyn DocumentStore>,
}

impl ValuationAnalyzer {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// `year`부터 과거로 가장 최근 FY 재무제표를 찾습니다.
    async fn latest_annual(
        &self,
        symbol: &Symbol,
        kind: StatementKind,
        year: i32,
    ) -> Result<Option<(i32, Record)>> {
        for candidate in (year - LOOKBACK_YEARS..=year).rev() {
            let doc = DocumentRef::financial(
                symbol,
                kind.collection(),
                FinancialKey::new(candidate, FiscalPeriod::FY),
            );
            if let Some(Value::Object(record)) = self.store.get(&doc).await? {
                return Ok(Some((candidate, record)));
            }
        }
        Ok(None)
    }

    /// 지표 계산 후 분석 문서 저장. 계산된 지표가 없으면 저장하지 않습니다.
    pub async fn analyze(
        &self,
        symbol: &Symbol,
        date: NaiveDate,
        quote: &Record,
    ) -> Result<ValuationMetrics> {
        let year = date.year();
        let income = self
            .latest_annual(symbol, StatementKind::IncomeStatement, year)
            .await?;
        let balance = self
            .latest_annual(symbol, StatementKind::BalanceSheet, year)
            .await?;
        let cash_flow = self.latest_annual(symbol, StatementKind::CashFlow, year).await?;

        let metrics = compute_metrics(
            quote,
            income.as_ref().map(|(_, r)| r),
            balance.as_ref().map(|(_, r)| r),
            cash_flow.as_ref().map(|(_, r)| r),
        );

        if metrics.is_empty() {
            warn!(symbol = %symbol, "계산 가능한 지표가 없어 분석을 건너뜁니다");
            return Ok(metrics);
        }

        let document = AnalysisDocument {
            symbol,
            date,
            income_statement_year: income.as_ref().map(|(y, _)| *y),
            balance_sheet_year: balance.as_ref().map(|(y, _)| *y),
            cash_flow_year: cash_flow.as_ref().map(|(y, _)| *y),
            metrics: &metrics,
        };
        let value = serde_json::to_value(&document).map_err(fundsync_core::CoreError::from)?;
        self.store
            .set(&DocumentRef::analysis(symbol, date), &value, false)
            .await?;

        debug!(symbol = %symbol, metrics = ?metrics, "분석 문서 저장");
        info!(symbol = %symbol, ncav_ratio = ?metrics.ncav_ratio, "분석 완료");
        Ok(metrics)
    }
}

#[async_trait]
impl QuoteObserver for ValuationAnalyzer {
    async fn on_quote_stored(
        &self,
        symbol: &Symbol,
        date: NaiveDate,
        quote: &Record,
    ) -> Result<()> {
        self.analyze(symbol, date, quote).await.map(|_| ())
    }
}
