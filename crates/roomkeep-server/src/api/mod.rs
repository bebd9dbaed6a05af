//! REST API: route table, shared query types and middleware.

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod extract;
pub mod payments;
pub mod reservations;
pub mod rooms;
pub mod schedules;
pub mod users;

use axum::Router;
use axum::routing::get;
use roomkeep_core::repository::Pagination;
use serde::Deserialize;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::state::AppState;

const MAX_PAGE_SIZE: u64 = 200;

/// `?offset=&limit=` on list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl From<PageQuery> for Pagination {
    fn from(q: PageQuery) -> Self {
        let defaults = Pagination::default();
        Self {
            offset: q.offset.unwrap_or(defaults.offset),
            limit: q.limit.unwrap_or(defaults.limit).clamp(1, MAX_PAGE_SIZE),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(rooms::routes())
        .merge(reservations::routes())
        .merge(payments::routes())
        .merge(users::routes())
        .merge(schedules::routes())
        .merge(dashboard::routes())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
