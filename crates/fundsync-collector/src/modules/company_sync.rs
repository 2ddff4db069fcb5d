//! 회사 데이터 동기화 엔진.
//!
//! 심볼 하나에 대해 데이터 소스에서 가져와 문서 저장소에 저장합니다.
//!
//! # 동기화 대상
//!
//! - 회사 프로필 (`companies/{symbol}`, 필드 병합)
//! - 오늘 시세 (`companies/{symbol}/quotes/{date}`)
//! - 손익계산서 / 재무상태표 / 현금흐름표 × 연간 / 분기
//!   (`companies/{symbol}/financials/{collection}/periods/{year}-{period}`)
//! - 옵션: 위 재무제표의 공시 원본(as-reported) 변형
//!
//! 데이터 종류마다 실패가 격리됩니다. 한 종류가 실패하거나 비어 있어도
//! 나머지 종류는 계속 동기화합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument};

use fundsync_core::{
    sync_span, DocumentRef, FinancialKey, PeriodType, Record, ReportVariant, StatementKind,
    StatementSpec, Symbol,
};
use fundsync_data::{DocumentStore, FinancialDataSource};

use crate::clock::Clock;
use crate::Result;

/// 동기화 데이터 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Profile,
    Quote,
    Statement(StatementSpec),
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile => f.write_str("profile"),
            Self::Quote => f.write_str("quote"),
            Self::Statement(spec) => write!(f, "{}", spec),
        }
    }
}

/// 심볼 단위 동기화 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSyncReport {
    pub symbol: Symbol,
    /// 저장한 문서 수
    pub stored_documents: usize,
    /// 연도/기간을 알 수 없어 버린 레코드 수
    pub dropped_records: usize,
    /// 가져오기 또는 저장에 실패한 종류
    pub failed: Vec<DataKind>,
    /// 빈 응답을 받은 종류
    pub empty: Vec<DataKind>,
}

impl SymbolSyncReport {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            stored_documents: 0,
            dropped_records: 0,
            failed: Vec::new(),
            empty: Vec::new(),
        }
    }

    /// 모든 종류가 데이터를 받아 저장했는지.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.empty.is_empty()
    }
}

/// 시세 문서 저장 후 호출되는 후속 처리기 (분석 등).
#[async_trait]
pub trait QuoteObserver: Send + Sync {
    async fn on_quote_stored(&self, symbol: &Symbol, date: NaiveDate, quote: &Record)
        -> Result<()>;
}

/// 데이터 소스 → 문서 저장소 동기화 엔진.
#[derive(Clone)]
pub struct CompanySyncEngine {
    source: Arc<dyn FinancialDataSource>,
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    observer: Option<Arc<dyn QuoteObserver>>,
    include_as_reported: bool,
}

impl CompanySyncEngine {
    pub fn new(
        source: Arc<dyn FinancialDataSource>,
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            store,
            clock,
            observer: None,
            include_as_reported: false,
        }
    }

    /// 시세 저장 후속 처리기 등록.
    pub fn with_observer(mut self, observer: Arc<dyn QuoteObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// 공시 원본 재무제표도 동기화할지 설정.
    pub fn with_as_reported(mut self, enabled: bool) -> Self {
        self.include_as_reported = enabled;
        self
    }

    /// 동기화할 재무제표 목록 (연간 3종 → 분기 3종 → 공시 원본).
    pub fn statement_specs(&self) -> Vec<StatementSpec> {
        let mut variants = vec![ReportVariant::Standard];
        if self.include_as_reported {
            variants.push(ReportVariant::AsReported);
        }

        variants
            .into_iter()
            .flat_map(|variant| {
                [PeriodType::Annual, PeriodType::Quarter]
                    .into_iter()
                    .flat_map(move |period| {
                        StatementKind::ALL
                            .into_iter()
                            .map(move |kind| StatementSpec::new(kind, period, variant))
                    })
            })
            .collect()
    }

    /// 프로필, 시세, 재무제표 전체 동기화.
    pub async fn sync_all(&self, symbol: &Symbol) -> SymbolSyncReport {
        let span = sync_span!("sync_all", symbol);
        async {
            let mut report = SymbolSyncReport::new(symbol.clone());

            self.sync_profile(symbol, &mut report).await;
            let quote = self.store_quote(symbol, &mut report).await;
            for spec in self.statement_specs() {
                self.sync_statement(symbol, spec, &mut report).await;
            }

            // 분석은 재무제표 저장 이후에 실행
            if let Some((date, quote)) = quote {
                self.notify_quote(symbol, date, &quote).await;
            }

            info!(
                stored = report.stored_documents,
                dropped = report.dropped_records,
                failed = report.failed.len(),
                empty = report.empty.len(),
                "회사 데이터 동기화 완료"
            );
            report
        }
        .instrument(span)
        .await
    }

    /// 시세만 동기화.
    pub async fn sync_quote(&self, symbol: &Symbol) -> SymbolSyncReport {
        let span = sync_span!("sync_quote", symbol);
        async {
            let mut report = SymbolSyncReport::new(symbol.clone());
            if let Some((date, quote)) = self.store_quote(symbol, &mut report).await {
                self.notify_quote(symbol, date, &quote).await;
            }
            report
        }
        .instrument(span)
        .await
    }

    async fn sync_profile(&self, symbol: &Symbol, report: &mut SymbolSyncReport) {
        let kind = DataKind::Profile;
        let Some(records) = fetch_kind(kind, self.source.profile(symbol), report).await else {
            return;
        };
        let Some(profile) = records.into_iter().next() else {
            return;
        };

        let doc = DocumentRef::profile(symbol);
        if self.store_document(kind, &doc, Value::Object(profile), true, report).await {
            info!("회사 프로필 동기화 완료");
        }
    }

    /// 오늘 시세 저장. 저장에 성공하면 `(날짜, 시세)`를 반환합니다.
    async fn store_quote(
        &self,
        symbol: &Symbol,
        report: &mut SymbolSyncReport,
    ) -> Option<(NaiveDate, Record)> {
        let kind = DataKind::Quote;
        let records = fetch_kind(kind, self.source.quote(symbol), report).await?;
        let quote = records.into_iter().next()?;

        let today = self.clock.today();
        let doc = DocumentRef::quote(symbol, today);
        if !self
            .store_document(kind, &doc, Value::Object(quote.clone()), false, report)
            .await
        {
            return None;
        }
        info!("시세 동기화 완료");
        Some((today, quote))
    }

    async fn notify_quote(&self, symbol: &Symbol, date: NaiveDate, quote: &Record) {
        if let Some(observer) = &self.observer {
            if let Err(e) = observer.on_quote_stored(symbol, date, quote).await {
                error!(error = %e, "시세 후속 처리 실패");
            }
        }
    }

    async fn sync_statement(
        &self,
        symbol: &Symbol,
        spec: StatementSpec,
        report: &mut SymbolSyncReport,
    ) {
        let kind = DataKind::Statement(spec);
        let Some(records) = fetch_kind(kind, self.source.statement(symbol, spec), report).await
        else {
            return;
        };

        let collection = spec.collection();
        let mut stored = 0usize;
        let mut store_failed = false;

        for record in records {
            let Some(key) = FinancialKey::from_record(&record) else {
                warn!(
                    data_kind = %kind,
                    date = ?record.get("date"),
                    "연도 또는 기간이 없는 레코드를 건너뜁니다"
                );
                report.dropped_records += 1;
                continue;
            };

            let doc = DocumentRef::financial(symbol, &collection, key);
            match self.store.set(&doc, &Value::Object(record), false).await {
                Ok(()) => stored += 1,
                Err(e) => {
                    error!(data_kind = %kind, document = %doc, error = %e, "문서 저장 실패");
                    store_failed = true;
                }
            }
        }

        report.stored_documents += stored;
        if store_failed {
            report.failed.push(kind);
        } else {
            info!(data_kind = %kind, documents = stored, "재무제표 동기화 완료");
        }
    }

    /// 문서 하나 저장. 실패 시 종류를 실패로 기록하고 false를 반환합니다.
    async fn store_document(
        &self,
        kind: DataKind,
        doc: &DocumentRef,
        data: Value,
        merge: bool,
        report: &mut SymbolSyncReport,
    ) -> bool {
        match self.store.set(doc, &data, merge).await {
            Ok(()) => {
                debug!(document = %doc, "문서 저장");
                report.stored_documents += 1;
                true
            }
            Err(e) => {
                error!(data_kind = %kind, document = %doc, error = %e, "문서 저장 실패");
                report.failed.push(kind);
                false
            }
        }
    }
}

/// 데이터 하나를 가져옵니다.
///
/// 실패하면 `failed`, 빈 응답이면 `empty`에 기록하고 `None`을 반환합니다.
async fn fetch_kind<F>(
    kind: DataKind,
    fetch: F,
    report: &mut SymbolSyncReport,
) -> Option<Vec<Record>>
where
    F: Future<Output = fundsync_data::Result<Vec<Record>>>,
{
    match fetch.await {
        Ok(records) if records.is_empty() => {
            error!(data_kind = %kind, "빈 응답, 저장하지 않습니다");
            report.empty.push(kind);
            None
        }
        Ok(records) => Some(records),
        Err(e) => {
            error!(data_kind = %kind, error = %e, "데이터 가져오기 실패");
            report.failed.push(kind);
            None
        }
    }
}
