// src/web/routes.rs
use crate::{
    state::AppState,
    web::{
        admin_handlers, auth_handlers, coordinator_handlers, mw_admin, mw_auth, student_handlers,
        user_handlers,
    },
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

/// Builds the application router. The session layer is added by the caller.
pub fn create_router(app_state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(auth_handlers::index))
        .route("/login", post(auth_handlers::handle_login))
        .route("/logout", get(auth_handlers::handle_logout));

    let admin_routes = Router::new()
        .route("/add_club", post(admin_handlers::add_club_handler))
        .route("/edit_club/{id}", post(admin_handlers::edit_club_handler))
        .route("/delete_club/{id}", post(admin_handlers::delete_club_handler))
        .route("/manage_users", get(admin_handlers::manage_users_handler))
        .route("/add_user", post(admin_handlers::add_user_handler))
        .route("/delete_user/{id}", post(admin_handlers::delete_user_handler))
        // require_auth is applied by the parent router
        .route_layer(middleware::from_fn(mw_admin::require_admin));

    let coordinator_routes = Router::new()
        .route("/edit_club/{id}", post(coordinator_handlers::edit_club_handler))
        .route("/manage_events/{id}", get(coordinator_handlers::manage_events_handler))
        .route("/add_event/{id}", post(coordinator_handlers::add_event_handler))
        .route("/post_update/{id}", post(coordinator_handlers::post_update_handler))
        .route("/manage_members/{id}", get(coordinator_handlers::manage_members_handler))
        .route("/dismiss_member/{id}", post(coordinator_handlers::dismiss_member_handler))
        .route("/applicants/{id}", get(coordinator_handlers::applicants_handler))
        .route("/update_applicant/{id}", post(coordinator_handlers::update_applicant_handler))
        .route(
            "/view_registrations/{id}",
            get(coordinator_handlers::view_registrations_handler),
        );

    let authenticated_routes = Router::new()
        .route("/dashboard", get(user_handlers::dashboard_handler))
        .route("/notifications", get(user_handlers::notifications_handler))
        .route("/notifications/{id}/read", post(user_handlers::mark_read_handler))
        .route("/club/{id}", get(student_handlers::club_detail_handler))
        .route("/club/{id}/join", post(student_handlers::join_club_handler))
        .route(
            "/register/event/form/{id}",
            get(student_handlers::registration_form_handler),
        )
        .route(
            "/register/event/submit/{id}",
            post(student_handlers::register_event_handler),
        )
        .nest("/admin", admin_routes)
        .nest("/coord", coordinator_routes)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .with_state(app_state)
}
