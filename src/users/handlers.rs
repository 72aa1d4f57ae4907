use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        extractors::{AdminUser, AuthUser},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
    },
    error::ApiError,
    state::AppState,
    users::{
        dto::{
            AssignManagerRequest, AuthResponse, EmployeeListResponse, LoginRequest,
            MessageResponse, RegisterRequest, TechStackResponse, UpdateTechStackRequest,
            UserResponse,
        },
        repo::{NewUser, User},
    },
};

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.name.trim().is_empty()
        || payload.department.trim().is_empty()
        || payload.password.is_empty()
    {
        warn!("registration missing required fields");
        return Err(ApiError::validation(
            "Name, email, password, and department are required",
        ));
    }

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    let hash = hash_password(&payload.password)?;
    let tech_stack = payload.tech_stack.unwrap_or_default();

    let user = User::create(
        &state.db,
        NewUser {
            name: payload.name.trim(),
            email: &payload.email,
            password_hash: &hash,
            department: payload.department.trim(),
            tech_stack: &tech_stack,
            role: payload.role.unwrap_or_default(),
        },
    )
    .await?;

    let token = JwtKeys::from_ref(&state).issue(&user)?;

    info!(user_id = user.user_id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            user: user.into(),
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::NotFound("User")
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = user.user_id, "login invalid password");
        return Err(ApiError::InvalidCredential);
    }

    let token = JwtKeys::from_ref(&state).issue(&user)?;

    info!(user_id = user.user_id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        message: "Login successful",
        user: user.into(),
        token,
    }))
}

#[instrument(skip(state))]
pub async fn list_employees(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
) -> Result<Json<EmployeeListResponse>, ApiError> {
    let data = User::list_with_manager(&state.db).await?;
    Ok(Json(EmployeeListResponse {
        message: "Employee list fetched successfully",
        count: data.len(),
        data,
    }))
}

#[instrument(skip(state, admin), fields(admin_id = admin.0.sub))]
pub async fn assign_manager(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<AssignManagerRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if User::find_by_id(&state.db, payload.user_id).await?.is_none() {
        return Err(ApiError::NotFound("User"));
    }
    if User::find_by_id(&state.db, payload.manager_id).await?.is_none() {
        return Err(ApiError::NotFound("Manager"));
    }

    // Reject assignments that would close a loop in the reports-to graph.
    if User::would_create_cycle(&state.db, payload.user_id, payload.manager_id).await? {
        warn!(
            user_id = payload.user_id,
            manager_id = payload.manager_id,
            "manager assignment would create a cycle"
        );
        return Err(ApiError::validation(
            "Assignment would create a reporting cycle",
        ));
    }

    let user = User::set_manager(&state.db, payload.user_id, Some(payload.manager_id)).await?;

    info!(
        user_id = user.user_id,
        manager_id = payload.manager_id,
        "reporting manager assigned"
    );
    Ok(Json(UserResponse {
        message: "Reporting manager assigned successfully",
        user: user.into(),
    }))
}

#[instrument(skip(state, claims, payload), fields(user_id = claims.0.sub))]
pub async fn update_tech_stack(
    State(state): State<AppState>,
    claims: AuthUser,
    Json(payload): Json<UpdateTechStackRequest>,
) -> Result<Json<TechStackResponse>, ApiError> {
    // Target row comes from the verified claims, never from the body.
    let user = User::set_tech_stack(&state.db, claims.0.sub, &payload.tech_stack).await?;

    info!(user_id = user.user_id, "tech stack updated");
    Ok(Json(TechStackResponse {
        message: "Tech stack updated successfully",
        tech_stack: user.tech_stack,
    }))
}

#[instrument(skip(state, admin), fields(admin_id = admin.0.sub))]
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if user_id == admin.0.sub {
        warn!(user_id, "admin attempted self-deletion");
        return Err(ApiError::SelfDeletion);
    }

    let reports = User::direct_reports(&state.db, user_id).await?;
    if !reports.is_empty() {
        info!(
            user_id,
            count = reports.len(),
            "detaching direct reports before deletion"
        );
    }

    User::delete(&state.db, user_id).await?;

    info!(user_id, "user deleted");
    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}
