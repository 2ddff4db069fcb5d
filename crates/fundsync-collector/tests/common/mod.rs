//! 통합 테스트 공용 하네스.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fundsync_collector::modules::{
    CheckpointStore, Collector, CompanySyncEngine, ValuationAnalyzer,
};
use fundsync_collector::FixedClock;
use fundsync_core::{
    DocumentRef, PeriodType, Record, StatementKind, StatementSpec, Symbol, Universe, WorkloadKind,
};
use fundsync_data::{DataError, DocumentStore, FinancialDataSource, MemoryDocumentStore};

/// 심볼별 동작을 설정할 수 있는 데이터 소스.
#[derive(Default)]
pub struct StubSource {
    /// 모든 요청이 실패하는 심볼
    pub failing: HashSet<String>,
    /// 시세가 빈 배열인 심볼
    pub empty_quotes: HashSet<String>,
    /// 시세 요청 지연 (ms)
    pub quote_delays: HashMap<String, u64>,
    /// 호출 기록 (`quote:AAA` 형식)
    pub calls: Mutex<Vec<String>>,
}

impl StubSource {
    pub fn failing(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_string());
        self
    }

    pub fn empty_quote(mut self, symbol: &str) -> Self {
        self.empty_quotes.insert(symbol.to_string());
        self
    }

    pub fn quote_delay(mut self, symbol: &str, millis: u64) -> Self {
        self.quote_delays.insert(symbol.to_string(), millis);
        self
    }

    pub fn calls_for(&self, prefix: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| c.strip_prefix(&format!("{}:", prefix)).map(str::to_string))
            .collect()
    }

    fn respond(
        &self,
        call: &str,
        symbol: &Symbol,
        body: Value,
    ) -> fundsync_data::Result<Vec<Record>> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", call, symbol));
        if self.failing.contains(symbol.as_str()) {
            return Err(DataError::RetriesExhausted {
                attempts: 10,
                last_error: "connection reset".to_string(),
            });
        }
        Ok(serde_json::from_value(body).unwrap())
    }
}

#[async_trait]
impl FinancialDataSource for StubSource {
    async fn profile(&self, symbol: &Symbol) -> fundsync_data::Result<Vec<Record>> {
        self.respond(
            "profile",
            symbol,
            json!([{"symbol": symbol, "companyName": format!("{} Corp", symbol)}]),
        )
    }

    async fn quote(&self, symbol: &Symbol) -> fundsync_data::Result<Vec<Record>> {
        if let Some(delay) = self.quote_delays.get(symbol.as_str()) {
            tokio::time::sleep(Duration::from_millis(*delay)).await;
        }
        if self.empty_quotes.contains(symbol.as_str()) {
            return self.respond("quote", symbol, json!([]));
        }
        self.respond(
            "quote",
            symbol,
            json!([{"symbol": symbol, "price": 50, "marketCap": 1000}]),
        )
    }

    async fn statement(
        &self,
        symbol: &Symbol,
        spec: StatementSpec,
    ) -> fundsync_data::Result<Vec<Record>> {
        let annual = match spec.kind {
            StatementKind::IncomeStatement => json!({"netIncome": 100, "eps": 2.5}),
            StatementKind::BalanceSheet => json!({
                "totalCurrentAssets": 900,
                "totalLiabilities": 400,
                "totalStockholdersEquity": 500,
                "totalDebt": 300
            }),
            StatementKind::CashFlow => json!({"dividendsPaid": -20, "commonStockRepurchased": -30}),
        };

        let body = match spec.period {
            PeriodType::Annual => {
                let mut record = annual;
                record["calendarYear"] = json!("2023");
                record["period"] = json!("FY");
                json!([record, {"symbol": symbol}])
            }
            PeriodType::Quarter => json!([
                {"date": "2024-03-30", "period": "Q1"},
                {"date": "2023-12-30", "period": "Q4"}
            ]),
        };
        self.respond(&spec.endpoint(), symbol, body)
    }
}

/// 모든 쓰기를 기록하는 문서 저장소.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryDocumentStore,
    writes: Mutex<Vec<(DocumentRef, Value)>>,
}

impl RecordingStore {
    /// 체크포인트 쓰기 이력 (`latest_symbol` 값).
    pub fn checkpoint_history(&self, kind: WorkloadKind) -> Vec<String> {
        let target = DocumentRef::checkpoint(kind);
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(doc, _)| *doc == target)
            .filter_map(|(_, data)| data["latest_symbol"].as_str().map(str::to_string))
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn get(&self, doc: &DocumentRef) -> fundsync_data::Result<Option<Value>> {
        self.inner.get(doc).await
    }

    async fn set(&self, doc: &DocumentRef, data: &Value, merge: bool) -> fundsync_data::Result<()> {
        self.writes.lock().unwrap().push((doc.clone(), data.clone()));
        self.inner.set(doc, data, merge).await
    }
}

pub struct Harness {
    pub collector: Arc<Collector>,
    pub store: Arc<RecordingStore>,
    pub source: Arc<StubSource>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn new(symbols: &str, source: StubSource) -> Self {
        Self::with_batch_size(symbols, source, 4)
    }

    pub fn with_batch_size(symbols: &str, source: StubSource, batch_size: usize) -> Self {
        let store = Arc::new(RecordingStore::default());
        let source = Arc::new(source);
        let clock = Arc::new(FixedClock::new(today()));

        let engine = CompanySyncEngine::new(source.clone(), store.clone(), clock.clone())
            .with_observer(Arc::new(ValuationAnalyzer::new(store.clone())));
        let checkpoints = CheckpointStore::new(store.clone(), clock.clone());
        let collector = Collector::new(
            Universe::parse_list(symbols).unwrap(),
            engine,
            checkpoints,
            batch_size,
        )
        .unwrap();

        Self {
            collector: Arc::new(collector),
            store,
            source,
            clock,
        }
    }

    pub async fn quote_ids(&self, symbol: &str) -> Vec<String> {
        self.store
            .inner
            .ids_in(&format!("companies/{}/quotes", symbol))
            .await
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}
