//! 재무 데이터 동기화 CLI.

use clap::{Parser, Subcommand};
use std::sync::Arc;

use fundsync_collector::config::StorageBackend;
use fundsync_collector::modules::{
    CheckpointStore, Collector, CompanySyncEngine, ValuationAnalyzer,
};
use fundsync_collector::{schedule, server, CollectorConfig, LocalClock};
use fundsync_core::{init_logging, LogConfig, Symbol};
use fundsync_data::{DocumentStore, FmpClient, MemoryDocumentStore, PgDocumentStore};

#[derive(Parser)]
#[command(name = "fundsync")]
#[command(about = "Company financial data sync pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 회사 정보 동기화 (프로필, 시세, 재무제표)
    SyncInfo,

    /// 시세 동기화
    SyncQuotes,

    /// 심볼 하나 동기화 (체크포인트 미사용)
    SyncSymbol {
        /// 티커 (universe에 있어야 함)
        #[arg(long)]
        symbol: String,
    },

    /// 체크포인트 상태 조회
    Checkpoints,

    /// HTTP 트리거 서버 실행
    Serve,

    /// 데몬 모드: 스케줄에 따라 작업 실행 (HTTP 서버 포함)
    Daemon,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    // 로깅 초기화
    init_logging(LogConfig::from_env(&format!(
        "fundsync_collector={0},fundsync_data={0},tower_http=info",
        cli.log_level
    )))?;

    tracing::info!("FundSync 수집기 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    let universe = config.universe.load()?;
    tracing::info!(
        universe = universe.len(),
        batch_size = config.sync.batch_size,
        include_as_reported = config.sync.include_as_reported,
        "설정 로드 완료"
    );

    // 문서 저장소 연결
    let mut pg_store = None;
    let store: Arc<dyn DocumentStore> = match &config.storage.backend {
        StorageBackend::Postgres { database_url } => {
            let pg = Arc::new(
                PgDocumentStore::connect(database_url, config.storage.max_connections).await?,
            );
            pg.ensure_schema().await?;
            tracing::info!("데이터베이스 연결 성공");
            pg_store = Some(pg.clone());
            pg
        }
        StorageBackend::Memory => {
            tracing::warn!("메모리 저장소 사용 중: 종료 시 데이터가 사라집니다");
            Arc::new(MemoryDocumentStore::new())
        }
    };

    // 데이터 소스
    let mut client = FmpClient::new(config.fmp.api_key)?.with_retry(config.fmp.retry);
    if let Some(base_url) = &config.fmp.base_url {
        client = client.with_base_url(base_url.clone());
    }

    let clock = Arc::new(LocalClock);
    let engine = CompanySyncEngine::new(Arc::new(client), store.clone(), clock.clone())
        .with_observer(Arc::new(ValuationAnalyzer::new(store.clone())))
        .with_as_reported(config.sync.include_as_reported);
    let checkpoints = CheckpointStore::new(store.clone(), clock);
    let collector = Arc::new(Collector::new(
        universe,
        engine,
        checkpoints,
        config.sync.batch_size,
    )?);

    // 명령 실행
    match cli.command {
        Commands::SyncInfo => {
            collector.sync_all_companies_info().await?;
        }
        Commands::SyncQuotes => {
            collector.sync_all_companies_quotes().await?;
        }
        Commands::SyncSymbol { symbol } => {
            let report = collector.sync_company(&Symbol::new(symbol)).await?;
            tracing::info!(
                symbol = %report.symbol,
                stored = report.stored_documents,
                dropped = report.dropped_records,
                failed = ?report.failed.iter().map(ToString::to_string).collect::<Vec<_>>(),
                empty = ?report.empty.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "심볼 동기화 완료"
            );
        }
        Commands::Checkpoints => {
            for info in collector.checkpoints().list().await? {
                println!(
                    "{:<16} {:<10} {:<12} {}",
                    info.workload,
                    info.latest_symbol
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| "-".to_string()),
                    info.date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    if info.is_today { "today" } else { "stale" }
                );
            }
        }
        Commands::Serve => {
            server::serve(collector.clone(), config.server.addr, shutdown_signal()).await?;
        }
        Commands::Daemon => {
            let server_task = tokio::spawn(server::serve(
                collector.clone(),
                config.server.addr,
                shutdown_signal(),
            ));
            schedule::run_daemon(collector.clone(), &config.daemon, shutdown_signal()).await;
            if let Err(e) = server_task.await? {
                tracing::error!(error = %e, "HTTP 서버 에러");
            }
        }
    }

    if let Some(pg) = pg_store {
        pg.close().await;
    }
    tracing::info!("FundSync 수집기 종료");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "종료 신호 대기 실패");
        std::future::pending::<()>().await;
    }
}
