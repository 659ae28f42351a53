use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers;
use crate::state::AppState;

pub mod health;

/// Multipart framing allowance on top of the file size limit
const FORM_OVERHEAD: usize = 1024 * 1024;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let import_limit = state.config.import.max_file_size + FORM_OVERHEAD;

    // API routes
    let api_routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Dashboard
        .route("/dashboard", get(handlers::dashboard::get_dashboard))
        // Guests
        .route(
            "/guests",
            get(handlers::guest::list_guests)
                .post(handlers::guest::create_guest)
                .delete(handlers::guest::delete_all_guests),
        )
        .route(
            "/guests/:id",
            axum::routing::delete(handlers::guest::delete_guest),
        )
        // Groups and labels
        .route(
            "/groups",
            get(handlers::group::list_groups).post(handlers::group::create_group),
        )
        .route(
            "/groups/:id/labels",
            post(handlers::group::add_label_to_group)
                .delete(handlers::group::remove_label_from_group),
        )
        .route(
            "/labels",
            get(handlers::label::list_labels).post(handlers::label::create_label),
        )
        .route(
            "/labels/:id",
            axum::routing::delete(handlers::label::delete_label),
        )
        // Functions
        .route(
            "/functions",
            get(handlers::function::list_functions).post(handlers::function::create_function),
        )
        .route(
            "/functions/:id",
            get(handlers::function::get_function)
                .put(handlers::function::update_function)
                .delete(handlers::function::delete_function),
        )
        // Invites
        .route(
            "/functions/:id/invites",
            get(handlers::invite::list_invites)
                .post(handlers::invite::upsert_invite)
                .put(handlers::invite::update_invite)
                .delete(handlers::invite::delete_invite),
        )
        .route(
            "/functions/:id/invites/increment",
            post(handlers::invite::increment_guest_invite),
        )
        .route(
            "/invites/:id/increment",
            post(handlers::invite::increment_invite).delete(handlers::invite::decrement_invite),
        )
        // Expenses
        .route(
            "/expenses",
            get(handlers::expense::list_expenses).post(handlers::expense::create_expense),
        )
        .route(
            "/expenses/:id",
            get(handlers::expense::get_expense)
                .put(handlers::expense::update_expense)
                .delete(handlers::expense::delete_expense),
        )
        // Import and search
        .route(
            "/import/guests",
            post(handlers::import::import_guests).layer(DefaultBodyLimit::max(import_limit)),
        )
        .route("/search/guests", get(handlers::search::search_guests));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
