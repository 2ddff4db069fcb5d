//! 달력 날짜 공급자.
//!
//! 체크포인트와 일별 문서는 실행 환경의 로컬 날짜 기준입니다.

use chrono::{Local, NaiveDate};
use std::sync::Mutex;

/// 오늘 날짜를 알려주는 시계.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// 로컬 타임존 기준 시계.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// 고정된 날짜를 반환하는 시계. 날짜를 바꿔 하루가 지난 상황을 재현할 수 있습니다.
#[derive(Debug)]
pub struct FixedClock {
    date: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Mutex::new(date),
        }
    }

    /// 날짜 변경.
    pub fn set(&self, date: NaiveDate) {
        if let Ok(mut current) = self.date.lock() {
            *current = date;
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
            .lock()
            .map(|date| *date)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}
