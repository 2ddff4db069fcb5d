//! 작업 실행기.
//!
//! 체크포인트 해석, 배치 스케줄러, 동기화 엔진을 묶어
//! 회사 정보 / 시세 두 가지 작업과 단일 심볼 동기화를 제공합니다.

use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

use fundsync_core::{Symbol, Universe, WorkloadKind};

use super::batch::run_batches;
use super::checkpoint::CheckpointStore;
use super::company_sync::{CompanySyncEngine, SymbolSyncReport};
use crate::error::CollectorError;
use crate::stats::CollectionStats;
use crate::Result;

/// 작업 실행 권한. 드롭되면 같은 종류의 다음 실행이 가능해집니다.
pub struct WorkloadGuard {
    kind: WorkloadKind,
    _lock: OwnedMutexGuard<()>,
}

impl WorkloadGuard {
    pub fn kind(&self) -> WorkloadKind {
        self.kind
    }
}

/// 동기화 작업 실행기.
///
/// 같은 작업 종류는 프로세스 안에서 동시에 하나만 실행됩니다.
pub struct Collector {
    universe: Arc<Universe>,
    engine: Arc<CompanySyncEngine>,
    checkpoints: CheckpointStore,
    batch_size: usize,
    info_lock: Arc<Mutex<()>>,
    quotes_lock: Arc<Mutex<()>>,
}

impl Collector {
    pub fn new(
        universe: Universe,
        engine: CompanySyncEngine,
        checkpoints: CheckpointStore,
        batch_size: usize,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(CollectorError::Config(
                "배치 크기는 1 이상이어야 합니다".to_string(),
            ));
        }

        Ok(Self {
            universe: Arc::new(universe),
            engine: Arc::new(engine),
            checkpoints,
            batch_size,
            info_lock: Arc::new(Mutex::new(())),
            quotes_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    fn lock_for(&self, kind: WorkloadKind) -> &Arc<Mutex<()>> {
        match kind {
            WorkloadKind::CompanyInfo => &self.info_lock,
            WorkloadKind::CompanyQuotes => &self.quotes_lock,
        }
    }

    /// 작업이 실행 중인지 확인. 잠금을 건드리지 않습니다.
    pub fn is_running(&self, kind: WorkloadKind) -> bool {
        // 살아 있는 WorkloadGuard가 잠금의 Arc를 하나 더 가짐
        Arc::strong_count(self.lock_for(kind)) > 1
    }

    /// 작업 실행 권한을 즉시 얻습니다. 이미 실행 중이면 `WorkloadBusy`.
    pub fn try_acquire(&self, kind: WorkloadKind) -> Result<WorkloadGuard> {
        let lock = self
            .lock_for(kind)
            .clone()
            .try_lock_owned()
            .map_err(|_| CollectorError::WorkloadBusy(kind))?;
        Ok(WorkloadGuard { kind, _lock: lock })
    }

    /// 전체 회사 정보 동기화 (프로필, 시세, 재무제표).
    pub async fn sync_all_companies_info(&self) -> Result<CollectionStats> {
        let guard = self.try_acquire(WorkloadKind::CompanyInfo)?;
        self.run_workload(guard).await
    }

    /// 전체 회사 시세 동기화.
    pub async fn sync_all_companies_quotes(&self) -> Result<CollectionStats> {
        let guard = self.try_acquire(WorkloadKind::CompanyQuotes)?;
        self.run_workload(guard).await
    }

    /// universe에 있는 심볼 하나를 즉시 동기화합니다. 체크포인트는 건드리지 않습니다.
    pub async fn sync_company(&self, symbol: &Symbol) -> Result<SymbolSyncReport> {
        if !self.universe.contains(symbol) {
            return Err(CollectorError::UnknownSymbol(symbol.clone()));
        }
        Ok(self.engine.sync_all(symbol).await)
    }

    /// 미리 얻은 실행 권한으로 작업을 실행합니다. 권한은 작업이 끝나면 반납됩니다.
    pub async fn run_workload(&self, guard: WorkloadGuard) -> Result<CollectionStats> {
        let kind = guard.kind();

        let worklist = self
            .checkpoints
            .remaining_worklist(kind, &self.universe)
            .await?;
        info!(
            workload = %kind,
            remaining = worklist.len(),
            universe = self.universe.len(),
            batch_size = self.batch_size,
            "작업 시작"
        );

        let engine = self.engine.clone();
        let op = move |symbol: Symbol| {
            let engine = engine.clone();
            async move {
                match kind {
                    WorkloadKind::CompanyInfo => engine.sync_all(&symbol).await,
                    WorkloadKind::CompanyQuotes => engine.sync_quote(&symbol).await,
                }
            }
        };

        let writer = self.checkpoints.writer(kind);
        let stats = run_batches(&worklist, self.batch_size, op, &writer).await?;
        stats.log_summary(kind.as_str());
        Ok(stats)
    }
}
