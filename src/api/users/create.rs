use crate::api::ErrorResponse;
use crate::auth::hash_password;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewUser, User};
use crate::schema::users;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::UserProfile;

const MAX_USERNAME_LENGTH: usize = 150;
const MAX_EMAIL_LENGTH: usize = 254;
const MAX_NAME_LENGTH: usize = 150;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// "me" is reserved for the profile endpoint; the charset matches the
/// usual word characters plus `.@+-`.
fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err("Username is too long".to_string());
    }
    if username.eq_ignore_ascii_case("me") {
        return Err("Username \"me\" is reserved, pick another one".to_string());
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
    {
        return Err("Username contains invalid characters".to_string());
    }
    Ok(())
}

fn validate_request(req: &CreateUserRequest) -> Result<(), String> {
    validate_username(&req.username)?;
    if req.email.is_empty() || !req.email.contains('@') {
        return Err("Enter a valid email address".to_string());
    }
    if req.email.len() > MAX_EMAIL_LENGTH {
        return Err("Email is too long".to_string());
    }
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err("First and last name are required".to_string());
    }
    if req.first_name.len() > MAX_NAME_LENGTH || req.last_name.len() > MAX_NAME_LENGTH {
        return Err("First and last name must be at most 150 characters".to_string());
    }
    if req.password.is_empty() {
        return Err("Password cannot be empty".to_string());
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserProfile),
        (status = 400, description = "Invalid request or duplicate username/email", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<CreateUserRequest>,
) -> impl IntoResponse {
    if let Err(error) = validate_request(&req) {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    let password_hash = match hash_password(&req.password) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!("Failed to hash password: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to hash password".to_string(),
                }),
            )
                .into_response();
        }
    };

    let mut conn = get_conn!(pool);

    let new_user = NewUser {
        username: &req.username,
        email: &req.email,
        first_name: &req.first_name,
        last_name: &req.last_name,
        password_hash: &password_hash,
    };

    let user: User = match diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(&mut conn)
    {
        Ok(u) => u,
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "A user with this username or email already exists".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to create user: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create user".to_string(),
                }),
            )
                .into_response();
        }
    };

    (
        StatusCode::CREATED,
        Json(UserProfile {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed: false,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_username_rejected() {
        assert!(validate_username("me").is_err());
        assert!(validate_username("Me").is_err());
        assert!(validate_username("ME").is_err());
    }

    #[test]
    fn test_username_charset() {
        assert!(validate_username("alice.smith@web+1-2_3").is_ok());
        assert!(validate_username("alice smith").is_err());
        assert!(validate_username("alice!").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_username_length_cap() {
        assert!(validate_username(&"a".repeat(150)).is_ok());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    fn request() -> CreateUserRequest {
        CreateUserRequest {
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            password: "hunter2secret".to_string(),
        }
    }

    #[test]
    fn test_valid_request_accepted() {
        assert!(validate_request(&request()).is_ok());
    }

    #[test]
    fn test_bad_email_rejected() {
        let mut req = request();
        req.email = "not-an-email".to_string();
        assert!(validate_request(&req).is_err());
    }

    #[test]
    fn test_blank_names_rejected() {
        let mut req = request();
        req.first_name = "  ".to_string();
        assert!(validate_request(&req).is_err());
    }

    #[test]
    fn test_overlong_email_rejected() {
        let mut req = request();
        req.email = format!("{}@example.com", "a".repeat(250));
        assert!(validate_request(&req).is_err());
    }

    #[test]
    fn test_overlong_names_rejected() {
        let mut req = request();
        req.first_name = "a".repeat(151);
        assert!(validate_request(&req).is_err());

        let mut req = request();
        req.last_name = "a".repeat(151);
        assert!(validate_request(&req).is_err());
    }
}
