//! 데몬 모드 스케줄러.
//!
//! - 시세 동기화: `quote_interval`마다, 미국 정규장(월~금 09:30~16:00 America/New_York)에만 실행
//! - 회사 정보 동기화: `info_interval`마다 실행
//!
//! 각 실행은 별도 태스크로 돌기 때문에 오래 걸리는 회사 정보 동기화가 시세 동기화를
//! 막지 않습니다. 같은 작업이 이미 실행 중이면 이번 주기는 건너뜁니다.

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::America::New_York;
use std::future::Future;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use fundsync_core::WorkloadKind;

use crate::config::DaemonConfig;
use crate::modules::Collector;

/// 미국 정규장 시간인지 확인합니다 (공휴일은 고려하지 않음).
pub fn is_market_open(now: DateTime<Utc>) -> bool {
    let local = now.with_timezone(&New_York);
    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }

    let time = local.time();
    let (Some(open), Some(close)) = (
        NaiveTime::from_hms_opt(9, 30, 0),
        NaiveTime::from_hms_opt(16, 0, 0),
    ) else {
        return false;
    };
    time >= open && time < close
}

/// `shutdown`이 완료될 때까지 주기적으로 작업을 실행합니다.
pub async fn run_daemon<S>(collector: Arc<Collector>, config: &DaemonConfig, shutdown: S)
where
    S: Future<Output = ()>,
{
    info!(
        quote_interval_minutes = config.quote_interval_minutes,
        info_interval_hours = config.info_interval_hours,
        "=== 데몬 모드 시작 ==="
    );

    let mut quote_interval = tokio::time::interval(config.quote_interval());
    quote_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut info_interval = tokio::time::interval(config.info_interval());
    info_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("종료 신호 수신, 데몬 종료 중...");
                break;
            }
            _ = quote_interval.tick() => {
                if is_market_open(Utc::now()) {
                    spawn_workload(collector.clone(), WorkloadKind::CompanyQuotes);
                } else {
                    debug!("장 시간이 아니므로 시세 동기화를 건너뜁니다");
                }
            }
            _ = info_interval.tick() => {
                spawn_workload(collector.clone(), WorkloadKind::CompanyInfo);
            }
        }
    }
}

/// 작업을 백그라운드 태스크로 실행합니다. 에러는 로그만 남깁니다.
///
/// 실행 권한은 태스크를 띄우기 전에 얻습니다. 이미 실행 중이면 `false`.
pub fn spawn_workload(collector: Arc<Collector>, kind: WorkloadKind) -> bool {
    let guard = match collector.try_acquire(kind) {
        Ok(guard) => guard,
        Err(_) => {
            warn!(workload = %kind, "이전 실행이 아직 진행 중이라 건너뜁니다");
            return false;
        }
    };

    tokio::spawn(async move {
        if let Err(e) = collector.run_workload(guard).await {
            error!(workload = %kind, error = %e, "작업 실패");
        }
    });
    true
}
