mod dto;
pub mod handlers;
pub mod repo;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/employees", get(handlers::list_employees))
        .route("/assign-manager", put(handlers::assign_manager))
        .route("/update-techstack", put(handlers::update_tech_stack))
        .route("/:id", delete(handlers::delete_user))
}
