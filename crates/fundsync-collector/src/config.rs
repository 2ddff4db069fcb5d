//! 환경변수 기반 설정 모듈.

use secrecy::SecretString;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use fundsync_core::Universe;
use fundsync_data::RetryPolicy;

use crate::error::CollectorError;
use crate::Result;

/// `UNIVERSE_FILE`, `UNIVERSE_SYMBOLS` 모두 없을 때 사용하는 파일.
pub const DEFAULT_UNIVERSE_FILE: &str = "config/universe.toml";

/// Collector 전체 설정
#[derive(Debug)]
pub struct CollectorConfig {
    /// FMP API 설정
    pub fmp: FmpConfig,
    /// 문서 저장소 설정
    pub storage: StorageConfig,
    /// 동기화 대상 목록 위치
    pub universe: UniverseSource,
    /// 동기화 설정
    pub sync: SyncConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
    /// HTTP 서버 설정
    pub server: ServerConfig,
}

/// FMP API 설정
#[derive(Debug)]
pub struct FmpConfig {
    /// API 키 (외부 주입 전용)
    pub api_key: SecretString,
    /// 기본 URL 재정의
    pub base_url: Option<String>,
    /// 재시도 정책
    pub retry: RetryPolicy,
}

/// 문서 저장소 종류
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// PostgreSQL (JSONB)
    Postgres { database_url: String },
    /// 프로세스 메모리 (dry-run)
    Memory,
}

/// 문서 저장소 설정
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// 최대 DB 연결 수
    pub max_connections: u32,
}

/// universe 정의 위치
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniverseSource {
    /// TOML 파일 (`symbols = [...]`)
    File(PathBuf),
    /// 쉼표로 구분된 목록
    Inline(String),
}

impl UniverseSource {
    /// universe 로드.
    pub fn load(&self) -> Result<Universe> {
        let universe = match self {
            Self::File(path) => Universe::load(path)?,
            Self::Inline(list) => Universe::parse_list(list)?,
        };
        Ok(universe)
    }
}

/// 동기화 설정
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// 배치당 심볼 수 (동시 실행 수)
    pub batch_size: usize,
    /// 공시 원본 재무제표 동기화 여부
    pub include_as_reported: bool,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 시세 동기화 주기 (분 단위, 장중에만 실행)
    pub quote_interval_minutes: u64,
    /// 회사 정보 동기화 주기 (시간 단위)
    pub info_interval_hours: u64,
}

/// HTTP 서버 설정
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드 (`.env` 파일 포함)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// 변수 조회 함수로 설정 로드.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = var("FMP_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                CollectorError::Config("FMP_API_KEY 환경변수가 설정되지 않았습니다".to_string())
            })?;

        let backend = match var("DOCUMENT_STORE").as_deref() {
            Some("memory") => StorageBackend::Memory,
            Some("postgres") | None => StorageBackend::Postgres {
                database_url: var("DATABASE_URL").ok_or_else(|| {
                    CollectorError::Config(
                        "DATABASE_URL 환경변수가 설정되지 않았습니다".to_string(),
                    )
                })?,
            },
            Some(other) => {
                return Err(CollectorError::Config(format!(
                    "알 수 없는 DOCUMENT_STORE 값: {}",
                    other
                )))
            }
        };

        let universe = match (var("UNIVERSE_SYMBOLS"), var("UNIVERSE_FILE")) {
            (Some(list), _) if !list.trim().is_empty() => UniverseSource::Inline(list),
            (_, Some(path)) => UniverseSource::File(PathBuf::from(path)),
            _ => UniverseSource::File(PathBuf::from(DEFAULT_UNIVERSE_FILE)),
        };

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: env_var_parse(&var, "FMP_MAX_ATTEMPTS", defaults.max_attempts),
            min_delay: Duration::from_secs(env_var_parse(
                &var,
                "FMP_MIN_BACKOFF_SECS",
                defaults.min_delay.as_secs(),
            )),
            max_delay: Duration::from_secs(env_var_parse(
                &var,
                "FMP_MAX_BACKOFF_SECS",
                defaults.max_delay.as_secs(),
            )),
        };

        let batch_size: usize = env_var_parse(&var, "SYNC_BATCH_SIZE", 4);
        if batch_size == 0 {
            return Err(CollectorError::Config(
                "SYNC_BATCH_SIZE는 1 이상이어야 합니다".to_string(),
            ));
        }

        let addr_raw = var("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let addr = addr_raw.parse().map_err(|e| {
            CollectorError::Config(format!("SERVER_ADDR 형식 오류 ({}): {}", addr_raw, e))
        })?;

        Ok(Self {
            fmp: FmpConfig {
                api_key: SecretString::from(api_key),
                base_url: var("FMP_BASE_URL"),
                retry,
            },
            storage: StorageConfig {
                backend,
                max_connections: env_var_parse(&var, "DB_MAX_CONNECTIONS", 5),
            },
            universe,
            sync: SyncConfig {
                batch_size,
                include_as_reported: env_var_bool(&var, "SYNC_INCLUDE_AS_REPORTED", false),
            },
            daemon: DaemonConfig {
                quote_interval_minutes: env_var_parse(&var, "QUOTE_INTERVAL_MINUTES", 30),
                info_interval_hours: env_var_parse(&var, "INFO_INTERVAL_HOURS", 24),
            },
            server: ServerConfig { addr },
        })
    }
}

impl DaemonConfig {
    /// 시세 동기화 주기를 Duration으로 반환
    pub fn quote_interval(&self) -> Duration {
        Duration::from_secs(self.quote_interval_minutes.max(1) * 60)
    }

    /// 회사 정보 동기화 주기를 Duration으로 반환
    pub fn info_interval(&self) -> Duration {
        Duration::from_secs(self.info_interval_hours.max(1) * 3600)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T, F>(var: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 bool 값 파싱
fn env_var_bool<F>(var: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}
