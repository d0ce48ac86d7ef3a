use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewRecipe, NewRecipeIngredient, NewRecipeTag, Recipe};
use crate::schema::{ingredients, recipe_ingredients, recipe_tags, recipes, tags};
use crate::validation::{
    normalize_ingredients, validate_cooking_time, validate_recipe_name, validate_tags,
    RecipeIngredientInput,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::view::{recipe_response, RecipeResponse};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<RecipeIngredientInput>,
}

/// All referenced catalog ids must exist. Returns the user-facing message
/// for the first missing set, or None when everything checks out.
pub fn check_catalog_ids(
    conn: &mut PgConnection,
    tag_ids: &[Uuid],
    ingredient_ids: &[Uuid],
) -> QueryResult<Option<String>> {
    let found_tags: i64 = tags::table
        .filter(tags::id.eq_any(tag_ids))
        .count()
        .get_result(conn)?;
    if found_tags != tag_ids.len() as i64 {
        return Ok(Some("One or more tags do not exist".to_string()));
    }

    let found_ingredients: i64 = ingredients::table
        .filter(ingredients::id.eq_any(ingredient_ids))
        .count()
        .get_result(conn)?;
    if found_ingredients != ingredient_ids.len() as i64 {
        return Ok(Some("One or more ingredients do not exist".to_string()));
    }

    Ok(None)
}

/// Replace the recipe's ingredient rows with the normalized mapping.
pub fn insert_ingredient_amounts(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    amounts: &BTreeMap<Uuid, i32>,
) -> Result<(), diesel::result::Error> {
    let rows: Vec<NewRecipeIngredient> = amounts
        .iter()
        .map(|(&ingredient_id, &amount)| NewRecipeIngredient {
            recipe_id,
            ingredient_id,
            amount,
        })
        .collect();

    diesel::insert_into(recipe_ingredients::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

pub fn insert_tag_links(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<(), diesel::result::Error> {
    let rows: Vec<NewRecipeTag> = tag_ids
        .iter()
        .map(|&tag_id| NewRecipeTag { recipe_id, tag_id })
        .collect();

    diesel::insert_into(recipe_tags::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created successfully", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(request): Json<CreateRecipeRequest>,
) -> impl IntoResponse {
    if let Err(error) = validate_recipe_name(&request.name) {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    if request.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Recipe description cannot be empty".to_string(),
            }),
        )
            .into_response();
    }

    if let Err(error) = validate_cooking_time(request.cooking_time) {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    if let Err(error) = validate_tags(&request.tags) {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    let amounts = match normalize_ingredients(&request.ingredients) {
        Ok(amounts) => amounts,
        Err(error) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
        }
    };

    let mut conn = get_conn!(pool);

    let ingredient_ids: Vec<Uuid> = amounts.keys().copied().collect();
    match check_catalog_ids(&mut conn, &request.tags, &ingredient_ids) {
        Ok(None) => {}
        Ok(Some(error)) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to check catalog ids: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create recipe".to_string(),
                }),
            )
                .into_response();
        }
    }

    // Recipe row, tag links and ingredient amounts are created atomically
    let result: Result<Recipe, diesel::result::Error> = conn.transaction(|conn| {
        let recipe: Recipe = diesel::insert_into(recipes::table)
            .values(NewRecipe {
                author_id: user.id,
                name: request.name.trim(),
                image: &request.image,
                text: &request.text,
                cooking_time: request.cooking_time,
            })
            .returning(Recipe::as_returning())
            .get_result(conn)?;

        insert_tag_links(conn, recipe.id, &request.tags)?;
        insert_ingredient_amounts(conn, recipe.id, &amounts)?;

        Ok(recipe)
    });

    let recipe = match result {
        Ok(recipe) => recipe,
        Err(e) => {
            tracing::error!("Failed to create recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    match recipe_response(&mut conn, Some(&user), &recipe) {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => {
            tracing::error!("Failed to build recipe response: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}
