//! 재무 데이터 동기화 수집기.
//!
//! 이 crate는 universe에 정의된 회사들의 데이터를 주기적으로 동기화합니다:
//! - 회사 정보 동기화 (프로필, 시세, 연간/분기 재무제표)
//! - 시세 동기화 (장중 주기 실행)
//! - 시세 저장 시 밸류에이션 분석
//! - 체크포인트 기반 중단/재개
//! - HTTP 트리거와 데몬 스케줄러

pub mod clock;
pub mod config;
pub mod error;
pub mod modules;
pub mod schedule;
pub mod server;
pub mod stats;

pub use clock::{Clock, FixedClock, LocalClock};
pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use modules::Collector;
pub use stats::CollectionStats;
