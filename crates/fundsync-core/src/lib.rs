//! # FundSync Core
//!
//! 재무 데이터 동기화 파이프라인의 핵심 도메인 타입을 제공합니다:
//! - 심볼 및 동기화 대상 목록(universe)
//! - 작업 종류(회사 정보 / 시세)와 종료 정책
//! - 재무제표 종류, 회계 기간, 문서 키
//! - 문서 저장소 경로
//! - 로깅 인프라

pub mod document;
pub mod error;
pub mod logging;
pub mod types;

pub use document::*;
pub use error::*;
pub use logging::*;
pub use types::*;
