//! 동기화 작업 종류 정의.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// universe 끝까지 처리한 뒤의 정책.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustedPolicy {
    /// 마지막 심볼까지 처리했으면 처음부터 다시 시작
    FullRestart,
    /// 마지막 심볼까지 처리했으면 오늘은 남은 작업 없음
    Exhausted,
}

/// 동기화 작업 종류. 종류마다 독립된 체크포인트를 가집니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    /// 전체 회사 정보 동기화 (프로필, 시세, 재무제표)
    CompanyInfo,
    /// 시세만 동기화
    CompanyQuotes,
}

impl WorkloadKind {
    pub const ALL: [WorkloadKind; 2] = [WorkloadKind::CompanyInfo, WorkloadKind::CompanyQuotes];

    /// 저장소에 기록되는 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompanyInfo => "company_info",
            Self::CompanyQuotes => "company_quotes",
        }
    }

    /// 끝까지 처리했을 때의 정책.
    ///
    /// 회사 정보는 하루에 한 번만 전체를 돌고, 시세는 장중 계속 순환합니다.
    pub fn exhausted_policy(&self) -> ExhaustedPolicy {
        match self {
            Self::CompanyInfo => ExhaustedPolicy::Exhausted,
            Self::CompanyQuotes => ExhaustedPolicy::FullRestart,
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkloadKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "company_info" => Ok(Self::CompanyInfo),
            "company_quotes" => Ok(Self::CompanyQuotes),
            _ => Err(CoreError::InvalidInput(format!("알 수 없는 작업 종류: {}", s))),
        }
    }
}
