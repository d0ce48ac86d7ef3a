use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{Ingredient, NewIngredient};
use crate::schema::ingredients;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

const MAX_INGREDIENT_FIELD_LENGTH: usize = 200;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateIngredientRequest {
    pub name: String,
    pub measurement_unit: String,
}

fn validate_request(req: &CreateIngredientRequest) -> Result<(), String> {
    let name = req.name.trim();
    let unit = req.measurement_unit.trim();

    if name.is_empty() || unit.is_empty() {
        return Err("Ingredient name and measurement unit cannot be empty".to_string());
    }
    if name.len() > MAX_INGREDIENT_FIELD_LENGTH || unit.len() > MAX_INGREDIENT_FIELD_LENGTH {
        return Err(
            "Ingredient name and measurement unit must be at most 200 characters".to_string(),
        );
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/ingredients",
    tag = "ingredients",
    request_body = CreateIngredientRequest,
    responses(
        (status = 201, description = "Ingredient created", body = Ingredient),
        (status = 400, description = "Invalid request or duplicate (name, unit) pair", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_ingredient(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<CreateIngredientRequest>,
) -> impl IntoResponse {
    if !user.is_staff {
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Only admins can manage ingredients".to_string(),
            }),
        )
            .into_response();
    }

    if let Err(error) = validate_request(&req) {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    let mut conn = get_conn!(pool);

    let result: Result<Ingredient, _> = diesel::insert_into(ingredients::table)
        .values(NewIngredient {
            name: req.name.trim(),
            measurement_unit: req.measurement_unit.trim(),
        })
        .returning(Ingredient::as_returning())
        .get_result(&mut conn);

    match result {
        Ok(ingredient) => (StatusCode::CREATED, Json(ingredient)).into_response(),
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "This ingredient and unit pair already exists".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to create ingredient: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create ingredient".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateIngredientRequest {
        CreateIngredientRequest {
            name: "flour".to_string(),
            measurement_unit: "g".to_string(),
        }
    }

    #[test]
    fn test_valid_request_accepted() {
        assert!(validate_request(&request()).is_ok());
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut req = request();
        req.name = "  ".to_string();
        assert!(validate_request(&req).is_err());

        let mut req = request();
        req.measurement_unit = String::new();
        assert!(validate_request(&req).is_err());
    }

    #[test]
    fn test_overlong_fields_rejected() {
        let mut req = request();
        req.name = "a".repeat(201);
        assert!(validate_request(&req).is_err());

        let mut req = request();
        req.measurement_unit = "a".repeat(201);
        assert!(validate_request(&req).is_err());
    }
}
