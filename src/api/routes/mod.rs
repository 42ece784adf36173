use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::api::handlers;
use crate::auth::middleware::{operator_auth, user_auth};
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public_routes = Router::new()
        .route("/markets", get(handlers::markets::list_markets))
        .route("/markets/:market_id", get(handlers::markets::get_market))
        .route("/markets/:market_id/orderbook", get(handlers::markets::get_orderbook));

    let user_routes = Router::new()
        .route("/bets", post(handlers::bets::place_bet))
        .route("/orders", get(handlers::bets::list_orders))
        .route("/orders/:order_id", delete(handlers::bets::cancel_order))
        .route("/trades", get(handlers::bets::list_trades))
        .route("/balance", get(handlers::ledger::get_balance))
        .route("/ledger", get(handlers::ledger::get_ledger_history))
        .route(
            "/withdrawals",
            post(handlers::withdrawals::create_withdrawal).get(handlers::withdrawals::list_withdrawals),
        )
        .route(
            "/withdrawals/:withdrawal_id/cancel",
            post(handlers::withdrawals::cancel_withdrawal),
        )
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), user_auth));

    let operator_routes = Router::new()
        .route("/admin/markets", post(handlers::markets::create_market))
        .route("/admin/markets/:market_id", delete(handlers::markets::delete_market))
        .route(
            "/admin/markets/:market_id/resolve",
            post(handlers::markets::resolve_market),
        )
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), operator_auth));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(operator_routes)
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
