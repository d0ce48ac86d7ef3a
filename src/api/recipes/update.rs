use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::schema::{recipe_ingredients, recipe_tags, recipes};
use crate::validation::{
    normalize_ingredients, validate_cooking_time, validate_recipe_name, validate_tags,
    RecipeIngredientInput,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::create::{check_catalog_ids, insert_ingredient_amounts, insert_tag_links};
use super::view::{load_recipe, recipe_response, RecipeResponse};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    /// When supplied, replaces the tag set wholesale
    pub tags: Option<Vec<Uuid>>,
    /// When supplied, replaces the ingredient set wholesale
    pub ingredients: Option<Vec<RecipeIngredientInput>>,
}

#[derive(AsChangeset)]
#[diesel(table_name = recipes)]
struct RecipeChanges<'a> {
    name: Option<&'a str>,
    image: Option<&'a str>,
    text: Option<&'a str>,
    cooking_time: Option<i32>,
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(("id" = Uuid, Path, description = "Recipe ID")),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRecipeRequest>,
) -> impl IntoResponse {
    if let Some(ref name) = request.name {
        if let Err(error) = validate_recipe_name(name) {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
        }
    }

    if let Some(ref text) = request.text {
        if text.trim().is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Recipe description cannot be empty".to_string(),
                }),
            )
                .into_response();
        }
    }

    if let Some(cooking_time) = request.cooking_time {
        if let Err(error) = validate_cooking_time(cooking_time) {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
        }
    }

    // New tag/ingredient sets go through the same validation as creation
    if let Some(ref tag_ids) = request.tags {
        if let Err(error) = validate_tags(tag_ids) {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
        }
    }

    let amounts = match request.ingredients {
        Some(ref entries) => match normalize_ingredients(entries) {
            Ok(amounts) => Some(amounts),
            Err(error) => {
                return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
        },
        None => None,
    };

    let mut conn = get_conn!(pool);

    let recipe = match load_recipe(&mut conn, id) {
        Ok(Some(recipe)) => recipe,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Recipe not found".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to fetch recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    // Author-or-read-only
    if recipe.author_id != user.id {
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "You are not the author of this recipe".to_string(),
            }),
        )
            .into_response();
    }

    let tag_ids = request.tags.as_deref().unwrap_or_default();
    let ingredient_ids: Vec<Uuid> = amounts
        .as_ref()
        .map(|m| m.keys().copied().collect())
        .unwrap_or_default();
    match check_catalog_ids(&mut conn, tag_ids, &ingredient_ids) {
        Ok(None) => {}
        Ok(Some(error)) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to check catalog ids: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to update recipe".to_string(),
                }),
            )
                .into_response();
        }
    }

    let result: Result<(), diesel::result::Error> = conn.transaction(|conn| {
        let changes = RecipeChanges {
            name: request.name.as_deref().map(str::trim),
            image: request.image.as_deref(),
            text: request.text.as_deref(),
            cooking_time: request.cooking_time,
        };

        // Diesel rejects fully-empty changesets, so only update when a
        // scalar field actually changed
        if changes.name.is_some()
            || changes.image.is_some()
            || changes.text.is_some()
            || changes.cooking_time.is_some()
        {
            diesel::update(recipes::table.find(recipe.id))
                .set(changes)
                .execute(conn)?;
        }

        // Clear-then-set semantics: no diffing
        if let Some(ref tag_ids) = request.tags {
            diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe.id)))
                .execute(conn)?;
            insert_tag_links(conn, recipe.id, tag_ids)?;
        }

        if let Some(ref amounts) = amounts {
            diesel::delete(
                recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe.id)),
            )
            .execute(conn)?;
            insert_ingredient_amounts(conn, recipe.id, amounts)?;
        }

        Ok(())
    });

    if let Err(e) = result {
        tracing::error!("Failed to update recipe: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to update recipe".to_string(),
            }),
        )
            .into_response();
    }

    let updated = match load_recipe(&mut conn, recipe.id) {
        Ok(Some(recipe)) => recipe,
        _ => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipe".to_string(),
                }),
            )
                .into_response()
        }
    };

    match recipe_response(&mut conn, Some(&user), &updated) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
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
