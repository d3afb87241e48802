use axum::routing::get;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{admin, announcement, auth, event, leaderboard, payment, role_request};
use crate::realtime;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/events", event_routes())
        .nest("/leaderboard", leaderboard_routes())
        .nest("/payments", payment_routes())
        .nest("/admin", admin_routes())
        .nest("/announcements", announcement_routes())
        .route("/ws", get(realtime::ws::upgrade))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::me))
        .routes(routes!(auth::update_profile))
        .routes(routes!(role_request::create_role_request))
        .routes(routes!(role_request::my_role_requests))
}

fn event_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(event::list_events, event::create_event))
        .routes(routes!(
            event::get_event,
            event::update_event,
            event::delete_event
        ))
        .routes(routes!(event::list_participants))
        .routes(routes!(
            event::register_for_event,
            event::unregister_from_event
        ))
}

fn leaderboard_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(leaderboard::event_leaderboard))
        .routes(routes!(leaderboard::top_performers))
        .routes(routes!(leaderboard::college_leaderboard))
        .routes(routes!(
            leaderboard::participant_score,
            leaderboard::update_participant_score
        ))
}

fn announcement_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            announcement::list_announcements,
            announcement::create_announcement
        ))
        .routes(routes!(announcement::delete_announcement))
}

fn payment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(payment::create_payment_intent))
        .routes(routes!(payment::stripe_webhook))
        .routes(routes!(payment::confirm_payment))
        .routes(routes!(payment::my_payments))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(admin::list_users))
        .routes(routes!(admin::get_user))
        .routes(routes!(admin::update_user_role))
        .routes(routes!(role_request::list_role_requests))
        .routes(routes!(role_request::decide_role_request))
        .routes(routes!(admin::get_settings, admin::update_settings))
}
