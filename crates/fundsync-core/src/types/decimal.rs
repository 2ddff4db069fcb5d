//! 재무 지표 계산을 위한 Decimal 유틸리티.
//!
//! 외부 API의 숫자 필드는 JSON 숫자 또는 숫자 문자열로 들어오므로
//! 둘 다 `Decimal`로 변환합니다.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use super::financial::Record;

/// 비율 타입 (0.01 = 1%).
pub type Ratio = Decimal;

/// JSON 값을 `Decimal`로 변환합니다.
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(s) => Decimal::from_str(s.trim())
            .or_else(|_| Decimal::from_scientific(s.trim()))
            .ok(),
        _ => None,
    }
}

/// 레코드의 숫자 필드를 `Decimal`로 읽습니다.
pub fn decimal_field(record: &Record, key: &str) -> Option<Decimal> {
    record.get(key).and_then(decimal_from_value)
}

/// 분모가 0이면 `None`을 반환하는 나눗셈.
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Ratio> {
    if denominator.is_zero() {
        return None;
    }
    numerator.checked_div(denominator)
}

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 지정된 소수점 자릿수로 반올림합니다.
    fn round_metric(&self, dp: u32) -> Decimal;
}

impl DecimalExt for Decimal {
    fn round_metric(&self, dp: u32) -> Decimal {
        self.round_dp_with_strategy(dp, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
    }
}
