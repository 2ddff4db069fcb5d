//! 심볼 및 동기화 대상 종목 목록(universe) 정의.
//!
//! - `Symbol` - 티커 식별자 (예: AAPL, MSFT)
//! - `Universe` - 순서가 있는 동기화 대상 종목 목록. 순서가 재개 위치를 결정합니다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{CoreError, CoreResult};

/// 티커 심볼.
///
/// 항상 대문자로 정규화되며, 앞뒤 공백은 제거됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// 새 심볼을 생성합니다.
    pub fn new(ticker: impl AsRef<str>) -> Self {
        Self(ticker.as_ref().trim().to_uppercase())
    }

    /// 티커 문자열을 반환합니다.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// universe 파일 형식 (`symbols = ["AAPL", "MSFT"]`).
#[derive(Debug, Deserialize)]
struct UniverseFile {
    symbols: Vec<String>,
}

/// 동기화 대상 종목 목록.
///
/// 외부 설정으로 주어지며 순서가 의미를 가집니다. 같은 날 실행 사이에서는
/// 순서가 안정적이라고 가정합니다. 중복된 심볼은 처음 등장한 위치만 남깁니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    symbols: Vec<Symbol>,
}

impl Universe {
    /// 심볼 목록으로 universe를 생성합니다.
    ///
    /// 빈 심볼과 중복은 제거되며, 결과가 비어 있으면 설정 에러를 반환합니다.
    pub fn new<I, S>(symbols: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        let mut unique: Vec<Symbol> = Vec::new();
        for symbol in symbols.into_iter().map(Into::into) {
            if symbol.as_str().is_empty() || unique.contains(&symbol) {
                continue;
            }
            unique.push(symbol);
        }

        if unique.is_empty() {
            return Err(CoreError::Config("universe가 비어 있습니다".to_string()));
        }

        Ok(Self { symbols: unique })
    }

    /// 쉼표로 구분된 문자열에서 universe를 생성합니다 (예: "AAPL,MSFT,GOOG").
    pub fn parse_list(list: &str) -> CoreResult<Self> {
        Self::new(list.split(',').map(str::trim))
    }

    /// TOML 파일에서 universe를 로드합니다.
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let file: UniverseFile = toml::from_str(content)
            .map_err(|e| CoreError::Config(format!("universe 파일 파싱 실패: {}", e)))?;
        Self::new(file.symbols)
    }

    /// 파일 경로에서 universe를 로드합니다.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("universe 파일 읽기 실패 ({}): {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// 심볼의 위치를 반환합니다.
    pub fn position(&self, symbol: &Symbol) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// universe에 포함된 심볼인지 확인합니다.
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.position(symbol).is_some()
    }

    /// 마지막 심볼.
    pub fn last(&self) -> Option<&Symbol> {
        self.symbols.last()
    }

    /// `index` 바로 다음부터 끝까지의 심볼 목록.
    pub fn suffix_after(&self, index: usize) -> Vec<Symbol> {
        self.symbols
            .get(index + 1..)
            .map(<[Symbol]>::to_vec)
            .unwrap_or_default()
    }

    /// 전체 심볼 목록 (정의된 순서).
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
