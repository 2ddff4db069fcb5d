//! 동기화 파이프라인 전반에서 사용되는 공통 타입.

mod decimal;
mod financial;
mod symbol;
mod workload;

pub use decimal::*;
pub use financial::*;
pub use symbol::*;
pub use workload::*;
