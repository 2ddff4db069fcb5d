//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::modules::company_sync::SymbolSyncReport;

/// 동기화 작업 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 처리 시도한 심볼 수
    pub total: usize,
    /// 실패한 데이터 종류가 없는 심볼 수 (빈 응답은 실패가 아님)
    pub success: usize,
    /// 하나 이상의 데이터 종류가 실패했거나 작업이 중단된 심볼 수
    pub errors: usize,
    /// 빈 응답을 받은 데이터 종류 수
    pub empty: usize,
    /// 연도/기간을 알 수 없어 버린 레코드 수
    pub dropped: usize,
    /// 저장된 총 문서 수
    pub total_documents: usize,
    /// 완료된 배치 수
    pub batches: usize,
    /// 마지막으로 기록한 체크포인트 심볼
    pub last_checkpoint: Option<String>,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 심볼 단위 결과 반영
    pub fn record(&mut self, report: &SymbolSyncReport) {
        self.total += 1;
        if report.failed.is_empty() {
            self.success += 1;
        } else {
            self.errors += 1;
        }
        self.empty += report.empty.len();
        self.dropped += report.dropped_records;
        self.total_documents += report.stored_documents;
    }

    /// 작업 자체가 중단된 심볼 반영 (panic 등)
    pub fn record_aborted(&mut self) {
        self.total += 1;
        self.errors += 1;
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            empty = self.empty,
            dropped = self.dropped,
            total_documents = self.total_documents,
            batches = self.batches,
            last_checkpoint = ?self.last_checkpoint,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "동기화 완료"
        );
    }
}
