use serde::{Deserialize, Serialize};

use crate::auth::claims::Role;
use crate::users::repo::{EmployeeRow, User};

/// Request body for account registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub department: String,
    #[serde(default)]
    pub tech_stack: Option<Vec<String>>,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for assigning a reporting manager.
#[derive(Debug, Deserialize)]
pub struct AssignManagerRequest {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "managerId")]
    pub manager_id: i64,
}

/// Request body for replacing the caller's tech stack.
#[derive(Debug, Deserialize)]
pub struct UpdateTechStackRequest {
    pub tech_stack: Vec<String>,
}

/// Sanitized account summary returned to clients; never carries the hash.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: Role,
    pub tech_stack: Vec<String>,
    pub reporting_manager_id: Option<i64>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.user_id,
            name: u.name,
            email: u.email,
            department: u.department,
            role: u.role,
            tech_stack: u.tech_stack,
            reporting_manager_id: u.reporting_manager_id,
        }
    }
}

/// Response for register and login: account summary plus bearer token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: PublicUser,
    pub token: String,
}

/// Response for mutations that return the updated account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: &'static str,
    pub user: PublicUser,
}

/// Response for the reporting view.
#[derive(Debug, Serialize)]
pub struct EmployeeListResponse {
    pub message: &'static str,
    pub count: usize,
    pub data: Vec<EmployeeRow>,
}

/// Response for the tech-stack update.
#[derive(Debug, Serialize)]
pub struct TechStackResponse {
    pub message: &'static str,
    pub tech_stack: Vec<String>,
}

/// Bare confirmation response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
