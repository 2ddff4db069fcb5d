//! 작업 체크포인트 관리 모듈.
//!
//! 배치 작업의 중단/재개를 지원합니다. 체크포인트는 작업 종류별로 하나씩
//! `task_states/{company_info|company_quotes}` 문서에 저장되며, 하루 단위로 유효합니다.
//!
//! # 재개 규칙
//!
//! - 체크포인트가 없거나 날짜가 오늘이 아니면 universe 전체를 처음부터 처리
//! - 오늘 체크포인트가 있으면 `latest_symbol` 다음 심볼부터 처리
//! - `latest_symbol`이 마지막 심볼이면 작업 종류의 [`ExhaustedPolicy`]를 따름
//! - `latest_symbol`이 universe에 없으면 [`StaleCheckpoint`] (호출 측에서 전체 재시작)
//!
//! # 사용 예
//!
//! ```rust,ignore
//! let checkpoints = CheckpointStore::new(store, clock);
//! let worklist = checkpoints.remaining_worklist(WorkloadKind::CompanyInfo, &universe).await?;
//! let writer = checkpoints.writer(WorkloadKind::CompanyInfo);
//! run_batches(&worklist, 4, op, &writer).await?;
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use fundsync_core::{DocumentRef, ExhaustedPolicy, Symbol, Universe, WorkloadKind};
use fundsync_data::DocumentStore;

use super::batch::CheckpointWriter;
use crate::clock::Clock;
use crate::error::CollectorError;
use crate::Result;

/// 작업 종류별 진행 상태.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub workload_kind: WorkloadKind,
    /// 마지막으로 완료된 배치의 마지막 심볼 (worklist 위치 기준)
    pub latest_symbol: Symbol,
    /// 기록 날짜
    pub date: NaiveDate,
}

/// 저장 형식: `{"latest_symbol": "AAPL", "date": "2024-05-01"}`
#[derive(Debug, Serialize, Deserialize)]
struct CheckpointDocument {
    latest_symbol: Symbol,
    date: NaiveDate,
}

/// 체크포인트 심볼이 현재 universe에 없는 경우.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} 체크포인트 심볼 {symbol}이(가) universe에 없습니다")]
pub struct StaleCheckpoint {
    pub kind: WorkloadKind,
    pub symbol: Symbol,
}

/// 남은 작업 목록 계산.
///
/// `policy`는 체크포인트가 universe의 마지막 심볼을 가리킬 때만 사용됩니다.
pub fn resolve(
    universe: &Universe,
    checkpoint: Option<&Checkpoint>,
    today: NaiveDate,
    policy: ExhaustedPolicy,
) -> std::result::Result<Vec<Symbol>, StaleCheckpoint> {
    let checkpoint = match checkpoint {
        Some(cp) if cp.date == today => cp,
        _ => return Ok(universe.symbols().to_vec()),
    };

    let index = universe
        .position(&checkpoint.latest_symbol)
        .ok_or_else(|| StaleCheckpoint {
            kind: checkpoint.workload_kind,
            symbol: checkpoint.latest_symbol.clone(),
        })?;

    if index + 1 == universe.len() {
        return Ok(match policy {
            ExhaustedPolicy::FullRestart => universe.symbols().to_vec(),
            ExhaustedPolicy::Exhausted => Vec::new(),
        });
    }

    Ok(universe.suffix_after(index))
}

/// 체크포인트 조회 결과 (CLI `checkpoints` 출력용).
#[derive(Debug, Clone, Serialize)]
pub struct CheckpointInfo {
    pub workload: WorkloadKind,
    pub latest_symbol: Option<Symbol>,
    pub date: Option<NaiveDate>,
    /// 오늘 기록된 체크포인트인지 (재개 대상 여부)
    pub is_today: bool,
}

/// 문서 저장소 기반 체크포인트 저장소.
#[derive(Clone)]
pub struct CheckpointStore {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl CheckpointStore {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// 체크포인트 로드.
    ///
    /// 형식이 잘못된 문서는 없는 것으로 취급합니다 (전체 재시작).
    pub async fn load(&self, kind: WorkloadKind) -> Result<Option<Checkpoint>> {
        let Some(value) = self.store.get(&DocumentRef::checkpoint(kind)).await? else {
            return Ok(None);
        };

        match serde_json::from_value::<CheckpointDocument>(value) {
            Ok(doc) => Ok(Some(Checkpoint {
                workload_kind: kind,
                latest_symbol: doc.latest_symbol,
                date: doc.date,
            })),
            Err(e) => {
                warn!(workload = %kind, error = %e, "체크포인트 문서 형식 오류, 무시합니다");
                Ok(None)
            }
        }
    }

    /// 체크포인트 저장 (덮어쓰기).
    pub async fn save(&self, kind: WorkloadKind, symbol: &Symbol, date: NaiveDate) -> Result<()> {
        let doc = CheckpointDocument {
            latest_symbol: symbol.clone(),
            date,
        };
        let value = serde_json::to_value(&doc).map_err(fundsync_core::CoreError::from)?;
        self.store
            .set(&DocumentRef::checkpoint(kind), &value, false)
            .await?;
        debug!(workload = %kind, symbol = %symbol, date = %date, "체크포인트 저장");
        Ok(())
    }

    /// 모든 작업 종류의 체크포인트 상태 조회.
    pub async fn list(&self) -> Result<Vec<CheckpointInfo>> {
        let today = self.today();
        let mut infos = Vec::with_capacity(WorkloadKind::ALL.len());

        for kind in WorkloadKind::ALL {
            let checkpoint = self.load(kind).await?;
            infos.push(CheckpointInfo {
                workload: kind,
                is_today: checkpoint.as_ref().is_some_and(|cp| cp.date == today),
                latest_symbol: checkpoint.as_ref().map(|cp| cp.latest_symbol.clone()),
                date: checkpoint.map(|cp| cp.date),
            });
        }

        Ok(infos)
    }

    /// 오늘 처리해야 할 심볼 목록.
    ///
    /// 체크포인트 심볼이 universe에서 빠졌으면 경고 후 universe 전체를 반환합니다.
    pub async fn remaining_worklist(
        &self,
        kind: WorkloadKind,
        universe: &Universe,
    ) -> Result<Vec<Symbol>> {
        let checkpoint = self.load(kind).await?;

        match resolve(
            universe,
            checkpoint.as_ref(),
            self.today(),
            kind.exhausted_policy(),
        ) {
            Ok(worklist) => Ok(worklist),
            Err(stale) => {
                warn!(
                    workload = %kind,
                    symbol = %stale.symbol,
                    "체크포인트 심볼이 universe에 없어 처음부터 다시 시작합니다"
                );
                Ok(universe.symbols().to_vec())
            }
        }
    }

    /// 스케줄러에 넘길 체크포인트 기록기.
    pub fn writer(&self, kind: WorkloadKind) -> WorkloadCheckpoint {
        WorkloadCheckpoint {
            checkpoints: self.clone(),
            kind,
        }
    }
}

/// 특정 작업 종류의 체크포인트를 오늘 날짜로 기록합니다.
#[derive(Clone)]
pub struct WorkloadCheckpoint {
    checkpoints: CheckpointStore,
    kind: WorkloadKind,
}

#[async_trait]
impl CheckpointWriter for WorkloadCheckpoint {
    async fn commit(&self, symbol: &Symbol) -> Result<()> {
        let today = self.checkpoints.today();
        self.checkpoints
            .save(self.kind, symbol, today)
            .await
            .map_err(|e| CollectorError::Checkpoint {
                kind: self.kind,
                message: e.to_string(),
            })
    }
}
