//! 데이터 동기화 모듈.

pub mod analysis;
pub mod batch;
pub mod checkpoint;
pub mod company_sync;
pub mod workload;

pub use analysis::{compute_metrics, ValuationAnalyzer, ValuationMetrics};
pub use batch::{run_batches, CheckpointWriter};
pub use checkpoint::{
    resolve, Checkpoint, CheckpointInfo, CheckpointStore, StaleCheckpoint, WorkloadCheckpoint,
};
pub use company_sync::{CompanySyncEngine, DataKind, QuoteObserver, SymbolSyncReport};
pub use workload::{Collector, WorkloadGuard};
