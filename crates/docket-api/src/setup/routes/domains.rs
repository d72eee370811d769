//! Domain route groups (files, accounts, partners, corporation lookup, users,
//! tasks).

use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub fn file_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/upload", API_PREFIX),
            post(handlers::upload::upload_files),
        )
        .route(&format!("{}/files", API_PREFIX), get(handlers::files::list_files))
        .route(
            &format!("{}/files/{{id}}", API_PREFIX),
            get(handlers::files::get_file).put(handlers::files::update_file),
        )
        .route(
            &format!("{}/files/{{id}}/reprocess", API_PREFIX),
            post(handlers::files::reprocess_file),
        )
        .with_state(state)
}

pub fn account_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/accounts", API_PREFIX),
            get(handlers::accounts::list_accounts).post(handlers::accounts::create_account),
        )
        .with_state(state)
}

pub fn partner_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/partners", API_PREFIX),
            get(handlers::partners::list_partners).post(handlers::partners::create_partner),
        )
        .with_state(state)
}

pub fn corporation_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/corporation", API_PREFIX),
            get(handlers::corporation::get_corporation),
        )
        .with_state(state)
}

pub fn user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/users", API_PREFIX),
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            &format!("{}/users/{{id}}", API_PREFIX),
            axum::routing::put(handlers::users::update_user),
        )
        .route(
            &format!("{}/users/bulk-delete", API_PREFIX),
            post(handlers::users::bulk_delete_users),
        )
        .with_state(state)
}

pub fn task_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/tasks/stats", API_PREFIX),
            get(handlers::tasks::get_task_stats),
        )
        .with_state(state)
}
