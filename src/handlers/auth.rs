use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::access::Role;
use crate::auth::{generate_jwt, password_digest, verify_password, Claims};
use crate::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

fn token_payload(user: &User) -> Result<Value, ApiError> {
    let claims = Claims::new(user.id, user.name.clone(), user.role);
    let token = generate_jwt(claims)?;
    let expires_in = config::config().security.jwt_expiry_hours * 3600;

    Ok(json!({
        "token": token,
        "user": {
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "role": user.role,
        },
        "expires_in": expires_in,
    }))
}

/// POST /auth/login - Authenticate with email/password and receive a JWT
pub async fn login(Json(payload): Json<LoginRequest>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(payload.email.trim())
        .fetch_optional(&pool)
        .await
        .map_err(DatabaseError::Sqlx)?;

    let user = match user {
        Some(user) if verify_password(&payload.password, &user.password) => user,
        // Same response for unknown email and wrong password
        _ => return Err(ApiError::unauthorized("Invalid email or password")),
    };

    Ok(ApiResponse::success(token_payload(&user)?))
}

/// POST /auth/register - Self-service account creation; role is always `user`
pub async fn register(Json(payload): Json<RegisterRequest>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let mut errors = HashMap::new();
    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() {
        errors.insert("name".to_string(), "Name is required".to_string());
    }
    if email.is_empty() {
        errors.insert("email".to_string(), "Email is required".to_string());
    } else if !email.contains('@') {
        errors.insert("email".to_string(), "Email is invalid".to_string());
    }
    if payload.password.len() < 8 {
        errors.insert(
            "password".to_string(),
            "Password must be at least 8 characters".to_string(),
        );
    }
    if errors.is_empty() {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&pool)
                .await
                .map_err(DatabaseError::Sqlx)?;
        if taken {
            errors.insert("email".to_string(), "Email is already registered".to_string());
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::validation_error("Validation failed", Some(errors)));
    }

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, password, role) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(name)
    .bind(email)
    .bind(password_digest(&payload.password))
    .bind(Role::User)
    .fetch_one(&pool)
    .await
    .map_err(DatabaseError::Sqlx)?;

    tracing::info!(user_id = user.id, "user registered");
    Ok(ApiResponse::created(token_payload(&user)?))
}

/// GET /auth/whoami - Echo the authenticated principal
pub async fn whoami(Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "id": auth.id,
        "name": auth.name,
        "role": auth.role,
    })))
}
