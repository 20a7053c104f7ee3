use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{docs::ApiDoc, handlers, middleware, state::AppState};

/// Full application router with shared layers and state applied.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/parking/lots/{lot_id}",
            get(handlers::parking_lots::get_parking_lot),
        );

    let user_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route(
            "/api/vehicles",
            get(handlers::vehicles::list_vehicles).post(handlers::vehicles::create_vehicle),
        )
        .route(
            "/api/vehicles/{vehicle_id}/default",
            put(handlers::vehicles::set_default_vehicle),
        )
        .route(
            "/api/vehicles/{vehicle_id}",
            delete(handlers::vehicles::delete_vehicle),
        )
        .route(
            "/api/user/parking/session",
            post(handlers::parking_session::start_session),
        )
        .route(
            "/api/user/parking/session/current",
            get(handlers::parking_session::get_current_session),
        )
        .route(
            "/api/user/parking/session/history",
            get(handlers::parking_session::get_session_history),
        )
        .route(
            "/api/user/parking/session/{session_id}/navigation",
            get(handlers::parking_session::refresh_navigation),
        )
        .route(
            "/api/user/parking/session/{session_id}/pay",
            post(handlers::parking_session::pay_current_fee),
        )
        .route(
            "/api/user/parking/session/{session_id}/extend",
            post(handlers::parking_session::extend_session),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(SwaggerUi::new("/api/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(axum_middleware::from_fn(middleware::log_error_responses))
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::DELETE,
                            Method::OPTIONS,
                        ])
                        .allow_headers(Any)
                        .max_age(std::time::Duration::from_secs(24 * 60 * 60)),
                ),
        )
        .with_state(state)
}
