//! HTTP 트리거 엔드포인트.
//!
//! | 메서드 | 경로 | 설명 |
//! |--------|------|------|
//! | GET | `/health` | 상태 확인 |
//! | GET | `/fetch_company?symbol=S` | 심볼 하나 동기화 (완료 후 응답) |
//! | POST | `/sync/info` | 회사 정보 동기화 시작 (202) |
//! | POST | `/sync/quotes` | 시세 동기화 시작 (202) |

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use fundsync_core::{Symbol, WorkloadKind};

use crate::error::CollectorError;
use crate::modules::Collector;
use crate::schedule::spawn_workload;

const UNKNOWN_SYMBOL_MESSAGE: &str = "symbol is not in defined list";

/// 헬스 체크 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// universe 심볼 수
    pub universe_size: usize,
}

/// 작업 시작 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct TriggerResponse {
    /// "accepted" | "busy"
    pub status: String,
    pub workload: WorkloadKind,
}

#[derive(Debug, Deserialize)]
pub struct FetchCompanyQuery {
    pub symbol: Option<String>,
}

/// 트리거 라우터 생성.
pub fn router(collector: Arc<Collector>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/fetch_company", get(fetch_company))
        .route("/sync/info", post(trigger_info))
        .route("/sync/quotes", post(trigger_quotes))
        .layer(TraceLayer::new_for_http())
        .with_state(collector)
}

/// 서버 실행. `shutdown`이 완료되면 요청 처리를 마치고 종료합니다.
pub async fn serve<S>(
    collector: Arc<Collector>,
    addr: SocketAddr,
    shutdown: S,
) -> std::io::Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "HTTP 트리거 서버 시작");
    axum::serve(listener, router(collector))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health(State(collector): State<Arc<Collector>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        universe_size: collector.universe().len(),
    })
}

async fn fetch_company(
    State(collector): State<Arc<Collector>>,
    Query(query): Query<FetchCompanyQuery>,
) -> (StatusCode, String) {
    let Some(raw) = query.symbol.filter(|s| !s.trim().is_empty()) else {
        error!("symbol 파라미터가 없습니다");
        return (StatusCode::BAD_REQUEST, UNKNOWN_SYMBOL_MESSAGE.to_string());
    };
    let symbol = Symbol::new(raw);

    info!(symbol = %symbol, "단일 심볼 동기화 요청");
    match collector.sync_company(&symbol).await {
        Ok(report) => {
            info!(
                symbol = %symbol,
                stored = report.stored_documents,
                failed = report.failed.len(),
                "단일 심볼 동기화 완료"
            );
            (
                StatusCode::OK,
                format!("Symbol {} fetched and stored", symbol),
            )
        }
        Err(CollectorError::UnknownSymbol(_)) => {
            error!(symbol = %symbol, "universe에 없는 심볼");
            (StatusCode::BAD_REQUEST, UNKNOWN_SYMBOL_MESSAGE.to_string())
        }
        Err(e) => {
            error!(symbol = %symbol, error = %e, "단일 심볼 동기화 실패");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn trigger_info(State(collector): State<Arc<Collector>>) -> impl IntoResponse {
    trigger(collector, WorkloadKind::CompanyInfo)
}

async fn trigger_quotes(State(collector): State<Arc<Collector>>) -> impl IntoResponse {
    trigger(collector, WorkloadKind::CompanyQuotes)
}

fn trigger(collector: Arc<Collector>, kind: WorkloadKind) -> (StatusCode, Json<TriggerResponse>) {
    if !spawn_workload(collector, kind) {
        return (
            StatusCode::CONFLICT,
            Json(TriggerResponse {
                status: "busy".to_string(),
                workload: kind,
            }),
        );
    }

    (
        StatusCode::ACCEPTED,
        Json(TriggerResponse {
            status: "accepted".to_string(),
            workload: kind,
        }),
    )
}
