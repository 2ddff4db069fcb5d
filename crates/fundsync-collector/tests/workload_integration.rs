//! 작업 실행기 통합 테스트.

mod common;

use common::{today, Harness, StubSource};
use fundsync_collector::CollectorError;
use fundsync_core::{decimal_from_value, DocumentRef, Symbol, WorkloadKind};
use fundsync_data::DocumentStore;
use rust_decimal_macros::dec;

const UNIVERSE: &str = "AAA,BBB,CCC,DDD,EEE";

#[tokio::test]
async fn test_info_run_checkpoints_each_batch() {
    let h = Harness::new(UNIVERSE, StubSource::default());

    let stats = h.collector.sync_all_companies_info().await.unwrap();

    assert_eq!(stats.total, 5);
    assert_eq!(stats.success, 5);
    assert_eq!(stats.batches, 2);
    assert_eq!(
        h.store.checkpoint_history(WorkloadKind::CompanyInfo),
        ["DDD", "EEE"]
    );
    assert!(h
        .store
        .checkpoint_history(WorkloadKind::CompanyQuotes)
        .is_empty());

    let checkpoint = h
        .collector
        .checkpoints()
        .load(WorkloadKind::CompanyInfo)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(checkpoint.latest_symbol, Symbol::new("EEE"));
    assert_eq!(checkpoint.date, today());
}

#[tokio::test]
async fn test_info_run_writes_documents_and_analysis() {
    let h = Harness::new("AAA", StubSource::default());
    h.collector.sync_all_companies_info().await.unwrap();

    let symbol = Symbol::new("AAA");
    let profile = h
        .store
        .get(&DocumentRef::profile(&symbol))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile["companyName"], "AAA Corp");

    assert_eq!(h.quote_ids("AAA").await, ["2024-05-01"]);
    assert_eq!(
        h.store
            .inner
            .ids_in("companies/AAA/financials/balance_sheets/periods")
            .await,
        ["2023-FY", "2023-Q4", "2024-Q1"]
    );

    let analysis = h
        .store
        .get(&DocumentRef::analysis(&symbol, today()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(decimal_from_value(&analysis["ncav_ratio"]), Some(dec!(0.5)));
    assert_eq!(decimal_from_value(&analysis["pe_ratio"]), Some(dec!(20)));
    assert_eq!(analysis["balance_sheet_year"], 2023);
}

#[tokio::test]
async fn test_resume_from_todays_checkpoint() {
    let h = Harness::new(UNIVERSE, StubSource::default());
    h.collector
        .checkpoints()
        .save(WorkloadKind::CompanyQuotes, &Symbol::new("CCC"), today())
        .await
        .unwrap();

    let stats = h.collector.sync_all_companies_quotes().await.unwrap();

    assert_eq!(stats.total, 2);
    assert_eq!(h.source.calls_for("quote"), ["DDD", "EEE"]);
    assert!(h.quote_ids("AAA").await.is_empty());
    assert_eq!(h.quote_ids("EEE").await, ["2024-05-01"]);
}

#[tokio::test]
async fn test_yesterdays_checkpoint_restarts() {
    let h = Harness::new(UNIVERSE, StubSource::default());
    let yesterday = today().pred_opt().unwrap();
    h.collector
        .checkpoints()
        .save(WorkloadKind::CompanyInfo, &Symbol::new("CCC"), yesterday)
        .await
        .unwrap();

    let stats = h.collector.sync_all_companies_info().await.unwrap();
    assert_eq!(stats.total, 5);
}

#[tokio::test]
async fn test_info_is_done_for_the_day_after_last_symbol() {
    let h = Harness::new(UNIVERSE, StubSource::default());
    h.collector.sync_all_companies_info().await.unwrap();

    let writes = h.store.write_count();
    let stats = h.collector.sync_all_companies_info().await.unwrap();

    assert_eq!(stats.total, 0);
    assert_eq!(h.store.write_count(), writes);

    // 다음 날에는 처음부터 다시 시작
    h.clock.set(today().succ_opt().unwrap());
    let stats = h.collector.sync_all_companies_info().await.unwrap();
    assert_eq!(stats.total, 5);
}

#[tokio::test]
async fn test_quotes_restart_after_last_symbol() {
    let h = Harness::new(UNIVERSE, StubSource::default());
    h.collector.sync_all_companies_quotes().await.unwrap();
    let stats = h.collector.sync_all_companies_quotes().await.unwrap();

    assert_eq!(stats.total, 5);
    assert_eq!(h.source.calls_for("quote").len(), 10);
    assert_eq!(
        h.store.checkpoint_history(WorkloadKind::CompanyQuotes),
        ["DDD", "EEE", "DDD", "EEE"]
    );
}

#[tokio::test]
async fn test_stale_checkpoint_falls_back_to_full_universe() {
    let h = Harness::new(UNIVERSE, StubSource::default());
    h.collector
        .checkpoints()
        .save(WorkloadKind::CompanyInfo, &Symbol::new("XYZ"), today())
        .await
        .unwrap();

    let stats = h.collector.sync_all_companies_info().await.unwrap();
    assert_eq!(stats.total, 5);
}

#[tokio::test]
async fn test_empty_quote_is_skipped() {
    let h = Harness::new("AAA,ZZZ,BBB", StubSource::default().empty_quote("ZZZ"));

    let stats = h.collector.sync_all_companies_quotes().await.unwrap();

    assert_eq!(stats.total, 3);
    assert_eq!(stats.empty, 1);
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.success, 3);
    assert!(h.quote_ids("ZZZ").await.is_empty());
    assert_eq!(h.quote_ids("BBB").await, ["2024-05-01"]);
    assert_eq!(
        h.store.checkpoint_history(WorkloadKind::CompanyQuotes),
        ["BBB"]
    );
}

#[tokio::test]
async fn test_failing_symbol_does_not_block_chunk() {
    let h = Harness::new(UNIVERSE, StubSource::default().failing("BBB"));

    let stats = h.collector.sync_all_companies_info().await.unwrap();

    assert_eq!(stats.errors, 1);
    assert_eq!(stats.success, 4);
    assert!(h.quote_ids("BBB").await.is_empty());
    for symbol in ["AAA", "CCC", "DDD"] {
        assert_eq!(h.quote_ids(symbol).await, ["2024-05-01"]);
    }
    assert_eq!(
        h.store.checkpoint_history(WorkloadKind::CompanyInfo),
        ["DDD", "EEE"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_checkpoint_follows_position_under_reversed_completion() {
    let source = StubSource::default()
        .quote_delay("AAA", 400)
        .quote_delay("BBB", 300)
        .quote_delay("CCC", 200)
        .quote_delay("DDD", 100);
    let h = Harness::new(UNIVERSE, source);

    h.collector.sync_all_companies_quotes().await.unwrap();

    assert_eq!(
        h.store.checkpoint_history(WorkloadKind::CompanyQuotes),
        ["DDD", "EEE"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_same_workload_cannot_overlap() {
    let h = Harness::new(UNIVERSE, StubSource::default().quote_delay("AAA", 100));

    let (first, second) = tokio::join!(
        h.collector.sync_all_companies_quotes(),
        h.collector.sync_all_companies_quotes()
    );

    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(CollectorError::WorkloadBusy(WorkloadKind::CompanyQuotes))
    ));
}

#[tokio::test]
async fn test_held_guard_blocks_until_dropped() {
    let h = Harness::new(UNIVERSE, StubSource::default());

    let guard = h.collector.try_acquire(WorkloadKind::CompanyInfo).unwrap();
    assert!(h.collector.is_running(WorkloadKind::CompanyInfo));
    assert!(!h.collector.is_running(WorkloadKind::CompanyQuotes));
    assert!(matches!(
        h.collector.sync_all_companies_info().await,
        Err(CollectorError::WorkloadBusy(WorkloadKind::CompanyInfo))
    ));

    // 상태 확인은 잠금을 건드리지 않음
    assert!(!h.collector.is_running(WorkloadKind::CompanyQuotes));
    let stats = h.collector.sync_all_companies_quotes().await.unwrap();
    assert_eq!(stats.total, 5);

    let stats = h.collector.run_workload(guard).await.unwrap();
    assert_eq!(stats.total, 5);
    assert!(!h.collector.is_running(WorkloadKind::CompanyInfo));
}

#[tokio::test]
async fn test_sync_company_is_idempotent() {
    let h = Harness::new(UNIVERSE, StubSource::default());
    let symbol = Symbol::new("CCC");

    let first = h.collector.sync_company(&symbol).await.unwrap();
    let paths = h.store.inner.paths().await;
    let profile = h.store.get(&DocumentRef::profile(&symbol)).await.unwrap();

    let second = h.collector.sync_company(&symbol).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.store.inner.paths().await, paths);
    assert_eq!(
        h.store.get(&DocumentRef::profile(&symbol)).await.unwrap(),
        profile
    );
    // 단일 심볼 동기화는 체크포인트를 남기지 않음
    assert!(h
        .store
        .checkpoint_history(WorkloadKind::CompanyInfo)
        .is_empty());
}

#[tokio::test]
async fn test_sync_company_rejects_unknown_symbol() {
    let h = Harness::new(UNIVERSE, StubSource::default());

    let err = h
        .collector
        .sync_company(&Symbol::new("NOPE"))
        .await
        .unwrap_err();

    assert!(matches!(err, CollectorError::UnknownSymbol(s) if s.as_str() == "NOPE"));
    assert!(h.source.calls_for("profile").is_empty());
}
