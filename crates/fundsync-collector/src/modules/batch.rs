//! 배치 스케줄러.
//!
//! worklist를 고정 크기 청크로 나누어 순서대로 처리합니다.
//! 청크 안의 심볼은 각각 Tokio 태스크로 동시에 실행되고, 청크가 모두 끝나면
//! 청크의 마지막 심볼(worklist 위치 기준)을 체크포인트로 기록합니다.
//!
//! 동시 실행 수는 항상 청크 크기 이하입니다. 청크끼리는 겹치지 않습니다.

use async_trait::async_trait;
use futures::future::join_all;
use std::future::Future;
use std::time::Instant;
use tracing::{error, info};

use fundsync_core::Symbol;

use super::company_sync::SymbolSyncReport;
use crate::error::CollectorError;
use crate::stats::CollectionStats;
use crate::Result;

/// 청크 완료 시 진행 위치를 기록합니다.
#[async_trait]
pub trait CheckpointWriter: Send + Sync {
    async fn commit(&self, symbol: &Symbol) -> Result<()>;
}

/// worklist를 `batch_size` 단위로 처리합니다.
///
/// 심볼별 작업의 실패(panic 포함)는 해당 심볼에 한정되며 체크포인트 진행을 막지 않습니다.
/// 체크포인트 기록 실패만 실행을 중단시킵니다.
pub async fn run_batches<F, Fut, W>(
    worklist: &[Symbol],
    batch_size: usize,
    op: F,
    writer: &W,
) -> Result<CollectionStats>
where
    F: Fn(Symbol) -> Fut,
    Fut: Future<Output = SymbolSyncReport> + Send + 'static,
    W: CheckpointWriter + ?Sized,
{
    if batch_size == 0 {
        return Err(CollectorError::Config(
            "배치 크기는 1 이상이어야 합니다".to_string(),
        ));
    }

    let start = Instant::now();
    let mut stats = CollectionStats::new();

    if worklist.is_empty() {
        info!("처리할 심볼이 없습니다");
        return Ok(stats);
    }

    let total_batches = worklist.len().div_ceil(batch_size);

    for (batch_index, chunk) in worklist.chunks(batch_size).enumerate() {
        info!(
            batch = batch_index + 1,
            total_batches = total_batches,
            symbols = ?chunk.iter().map(Symbol::as_str).collect::<Vec<_>>(),
            "배치 시작"
        );

        // 결과는 완료 순서가 아닌 chunk 내 위치 순서로 모입니다
        let handles: Vec<_> = chunk
            .iter()
            .map(|symbol| tokio::spawn(op(symbol.clone())))
            .collect();
        let results = join_all(handles).await;

        for (symbol, result) in chunk.iter().zip(results) {
            match result {
                Ok(report) => stats.record(&report),
                Err(e) => {
                    error!(symbol = %symbol, error = %e, "심볼 작업 비정상 종료");
                    stats.record_aborted();
                }
            }
        }

        // chunks()는 빈 슬라이스를 만들지 않음
        if let Some(last) = chunk.last() {
            writer.commit(last).await?;
            stats.last_checkpoint = Some(last.to_string());
        }
        stats.batches += 1;

        info!(
            batch = batch_index + 1,
            checkpoint = ?stats.last_checkpoint,
            processed = stats.total,
            "배치 완료"
        );
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingWriter {
        commits: Mutex<Vec<Symbol>>,
        fail_after: Option<usize>,
    }

    impl RecordingWriter {
        fn failing_after(n: usize) -> Self {
            Self {
                commits: Mutex::new(Vec::new()),
                fail_after: Some(n),
            }
        }

        fn commits(&self) -> Vec<String> {
            self.commits
                .lock()
                .unwrap()
                .iter()
                .map(ToString::to_string)
                .collect()
        }
    }

    #[async_trait]
    impl CheckpointWriter for RecordingWriter {
        async fn commit(&self, symbol: &Symbol) -> Result<()> {
            let mut commits = self.commits.lock().unwrap();
            if self.fail_after.is_some_and(|n| commits.len() >= n) {
                return Err(CollectorError::Config("checkpoint store down".to_string()));
            }
            commits.push(symbol.clone());
            Ok(())
        }
    }

    fn worklist(symbols: &[&str]) -> Vec<Symbol> {
        symbols.iter().map(|s| Symbol::new(*s)).collect()
    }

    fn ok_op(symbol: Symbol) -> impl Future<Output = SymbolSyncReport> + Send + 'static {
        async move { SymbolSyncReport::new(symbol) }
    }

    #[tokio::test]
    async fn test_checkpoint_after_each_chunk() {
        let writer = RecordingWriter::default();
        let list = worklist(&["AAA", "BBB", "CCC", "DDD", "EEE"]);

        let stats = run_batches(&list, 4, ok_op, &writer).await.unwrap();

        assert_eq!(writer.commits(), ["DDD", "EEE"]);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.success, 5);
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.last_checkpoint.as_deref(), Some("EEE"));
    }

    #[tokio::test]
    async fn test_empty_worklist_writes_nothing() {
        let writer = RecordingWriter::default();
        let stats = run_batches(&[], 4, ok_op, &writer).await.unwrap();
        assert!(writer.commits().is_empty());
        assert_eq!(stats.batches, 0);
    }

    #[tokio::test]
    async fn test_zero_batch_size_rejected() {
        let writer = RecordingWriter::default();
        let err = run_batches(&worklist(&["AAA"]), 0, ok_op, &writer)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectorError::Config(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkpoint_uses_position_not_finish_order() {
        let writer = RecordingWriter::default();
        let list = worklist(&["AAA", "BBB", "CCC", "DDD", "EEE", "FFF"]);
        let finished = Arc::new(Mutex::new(Vec::new()));

        // 앞쪽 심볼일수록 늦게 끝남
        let order = finished.clone();
        let op = move |symbol: Symbol| {
            let order = order.clone();
            async move {
                let delay = match symbol.as_str() {
                    "AAA" => 40,
                    "BBB" => 30,
                    "CCC" => 20,
                    _ => 10,
                };
                tokio::time::sleep(Duration::from_millis(delay)).await;
                order.lock().unwrap().push(symbol.to_string());
                SymbolSyncReport::new(symbol)
            }
        };

        run_batches(&list, 4, op, &writer).await.unwrap();

        let finished = finished.lock().unwrap().clone();
        assert_eq!(&finished[..4], ["DDD", "CCC", "BBB", "AAA"]);
        assert_eq!(writer.commits(), ["DDD", "FFF"]);
    }

    #[tokio::test]
    async fn test_panicking_symbol_does_not_block_chunk() {
        let writer = RecordingWriter::default();
        let list = worklist(&["AAA", "BBB", "CCC"]);
        let completed = Arc::new(AtomicUsize::new(0));

        let counter = completed.clone();
        let op = move |symbol: Symbol| {
            let counter = counter.clone();
            async move {
                if symbol.as_str() == "BBB" {
                    panic!("boom");
                }
                counter.fetch_add(1, Ordering::SeqCst);
                SymbolSyncReport::new(symbol)
            }
        };

        let stats = run_batches(&list, 4, op, &writer).await.unwrap();

        assert_eq!(completed.load(Ordering::SeqCst), 2);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.errors, 1);
        assert_eq!(writer.commits(), ["CCC"]);
    }

    #[tokio::test]
    async fn test_writer_failure_aborts_run() {
        let writer = RecordingWriter::failing_after(1);
        let list = worklist(&["AAA", "BBB", "CCC"]);
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let op = move |symbol: Symbol| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                SymbolSyncReport::new(symbol)
            }
        };

        let result = run_batches(&list, 1, op, &writer).await;

        assert!(result.is_err());
        assert_eq!(writer.commits(), ["AAA"]);
        // 두 번째 청크까지 실행되고 세 번째는 실행되지 않음
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
