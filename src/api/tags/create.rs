use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewTag, Tag};
use crate::schema::tags;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// The fixed palette the frontend renders tags with.
pub const TAG_COLORS: [&str; 8] = [
    "#C11B0E", // red
    "#FFA500", // orange
    "#FFFF00", // yellow
    "#008000", // green
    "#0000FF", // blue
    "#800080", // purple
    "#808080", // gray
    "#030100", // black
];

const MAX_TAG_FIELD_LENGTH: usize = 200;

pub fn is_allowed_color(color: &str) -> bool {
    TAG_COLORS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(color))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTagRequest {
    pub name: String,
    pub color: String,
    pub slug: String,
}

fn validate_request(req: &CreateTagRequest) -> Result<(), String> {
    let name = req.name.trim();
    let slug = req.slug.trim();

    if name.is_empty() || slug.is_empty() {
        return Err("Tag name and slug cannot be empty".to_string());
    }
    if name.len() > MAX_TAG_FIELD_LENGTH || slug.len() > MAX_TAG_FIELD_LENGTH {
        return Err("Tag name and slug must be at most 200 characters".to_string());
    }
    if !is_allowed_color(&req.color) {
        return Err("Color must be one of the allowed hex values".to_string());
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/tags",
    tag = "tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = Tag),
        (status = 400, description = "Invalid request or duplicate name/color/slug", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_tag(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<CreateTagRequest>,
) -> impl IntoResponse {
    if !user.is_staff {
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Only admins can manage tags".to_string(),
            }),
        )
            .into_response();
    }

    if let Err(error) = validate_request(&req) {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    let mut conn = get_conn!(pool);

    let result: Result<Tag, _> = diesel::insert_into(tags::table)
        .values(NewTag {
            name: req.name.trim(),
            color: &req.color.to_uppercase(),
            slug: req.slug.trim(),
        })
        .returning(Tag::as_returning())
        .get_result(&mut conn);

    match result {
        Ok(tag) => (StatusCode::CREATED, Json(tag)).into_response(),
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "A tag with this name, color or slug already exists".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to create tag: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create tag".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_colors_allowed() {
        for color in TAG_COLORS {
            assert!(is_allowed_color(color));
        }
    }

    #[test]
    fn test_color_check_is_case_insensitive() {
        assert!(is_allowed_color("#ffa500"));
    }

    fn request() -> CreateTagRequest {
        CreateTagRequest {
            name: "Breakfast".to_string(),
            color: "#FFA500".to_string(),
            slug: "breakfast".to_string(),
        }
    }

    #[test]
    fn test_valid_request_accepted() {
        assert!(validate_request(&request()).is_ok());
    }

    #[test]
    fn test_overlong_name_and_slug_rejected() {
        let mut req = request();
        req.name = "a".repeat(201);
        assert!(validate_request(&req).is_err());

        let mut req = request();
        req.slug = "a".repeat(201);
        assert!(validate_request(&req).is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut req = request();
        req.name = "  ".to_string();
        assert!(validate_request(&req).is_err());
    }

    #[test]
    fn test_arbitrary_colors_rejected() {
        assert!(!is_allowed_color("#123456"));
        assert!(!is_allowed_color("red"));
        assert!(!is_allowed_color(""));
    }
}
