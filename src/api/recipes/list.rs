use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Recipe;
use crate::pagination::{PageParams, PaginationMetadata};
use crate::schema::{favorites, recipe_tags, recipes, shopping_cart_items, tags};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::Query;
use chrono::{DateTime, Utc};
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::view::{recipe_response, RecipeResponse};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListRecipesParams {
    /// Tag slugs; a recipe matches if it carries any of them (repeatable)
    #[serde(default)]
    pub tags: Vec<String>,
    /// Restrict to recipes by this author
    pub author: Option<Uuid>,
    /// Truthy (`1`/`true`): only the viewer's favorites. No-op for anonymous viewers.
    pub is_favorited: Option<String>,
    /// Truthy (`1`/`true`): only recipes in the viewer's cart. No-op for anonymous viewers.
    pub is_in_shopping_cart: Option<String>,
    /// 1-based page number (default: 1)
    pub page: Option<i64>,
    /// Number of items per page (default: 6, max: 100)
    pub limit: Option<i64>,
}

fn is_truthy(value: Option<&str>) -> bool {
    matches!(
        value.map(str::trim),
        Some("1") | Some("true") | Some("True")
    )
}

/// Viewer-relative filters only apply for authenticated viewers; for
/// anonymous requests a truthy flag is a no-op, not an error.
fn viewer_filter_active(value: Option<&str>, has_viewer: bool) -> bool {
    has_viewer && is_truthy(value)
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeResponse>,
    pub pagination: PaginationMetadata,
}

#[derive(Queryable)]
struct RecipeRow {
    id: Uuid,
    author_id: Uuid,
    name: String,
    image: String,
    text: String,
    cooking_time: i32,
    created_at: DateTime<Utc>,
    /// Total count of all matching rows (from window function)
    total_count: i64,
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    params(ListRecipesParams),
    responses(
        (status = 200, description = "Filtered, paginated recipes", body = ListRecipesResponse)
    )
)]
pub async fn list_recipes(
    viewer: Option<AuthUser>,
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<ListRecipesParams>,
) -> impl IntoResponse {
    let page_params = PageParams {
        page: params.page,
        limit: params.limit,
    };
    let viewer = viewer.map(|AuthUser(user)| user);

    let mut conn = get_conn!(pool);

    let mut query = recipes::table.into_boxed();

    if !params.tags.is_empty() {
        let tagged_recipe_ids = recipe_tags::table
            .inner_join(tags::table)
            .filter(tags::slug.eq_any(&params.tags))
            .select(recipe_tags::recipe_id);
        query = query.filter(recipes::id.eq_any(tagged_recipe_ids));
    }

    if let Some(author) = params.author {
        query = query.filter(recipes::author_id.eq(author));
    }

    let favorited_only = viewer_filter_active(params.is_favorited.as_deref(), viewer.is_some());
    let in_cart_only =
        viewer_filter_active(params.is_in_shopping_cart.as_deref(), viewer.is_some());

    if let Some(ref viewer) = viewer {
        if favorited_only {
            let favorited_ids = favorites::table
                .filter(favorites::user_id.eq(viewer.id))
                .select(favorites::recipe_id);
            query = query.filter(recipes::id.eq_any(favorited_ids));
        }

        if in_cart_only {
            let cart_ids = shopping_cart_items::table
                .filter(shopping_cart_items::user_id.eq(viewer.id))
                .select(shopping_cart_items::recipe_id);
            query = query.filter(recipes::id.eq_any(cart_ids));
        }
    }

    // Paginated results with total count via window function
    let rows: Vec<RecipeRow> = match query
        .order(recipes::created_at.desc())
        .select((
            recipes::id,
            recipes::author_id,
            recipes::name,
            recipes::image,
            recipes::text,
            recipes::cooking_time,
            recipes::created_at,
            sql::<BigInt>("COUNT(*) OVER()"),
        ))
        .limit(page_params.limit())
        .offset(page_params.offset())
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch recipes: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch recipes".to_string(),
                }),
            )
                .into_response();
        }
    };

    let total = rows.first().map(|r| r.total_count).unwrap_or(0);

    let mut responses = Vec::with_capacity(rows.len());
    for row in rows {
        let recipe = Recipe {
            id: row.id,
            author_id: row.author_id,
            name: row.name,
            image: row.image,
            text: row.text,
            cooking_time: row.cooking_time,
            created_at: row.created_at,
        };
        match recipe_response(&mut conn, viewer.as_ref(), &recipe) {
            Ok(response) => responses.push(response),
            Err(e) => {
                tracing::error!("Failed to build recipe response: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Failed to fetch recipes".to_string(),
                    }),
                )
                    .into_response();
            }
        }
    }

    (
        StatusCode::OK,
        Json(ListRecipesResponse {
            recipes: responses,
            pagination: PaginationMetadata::new(total, &page_params),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy(Some("1")));
        assert!(is_truthy(Some("true")));
        assert!(is_truthy(Some("True")));
        assert!(is_truthy(Some(" 1 ")));
    }

    #[test]
    fn test_falsy_values() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some("0")));
        assert!(!is_truthy(Some("false")));
        assert!(!is_truthy(Some("")));
        assert!(!is_truthy(Some("yes")));
    }

    #[test]
    fn test_viewer_filters_noop_for_anonymous() {
        assert!(!viewer_filter_active(Some("1"), false));
        assert!(!viewer_filter_active(Some("true"), false));
    }

    #[test]
    fn test_viewer_filters_apply_for_authenticated() {
        assert!(viewer_filter_active(Some("1"), true));
        assert!(!viewer_filter_active(Some("0"), true));
        assert!(!viewer_filter_active(None, true));
    }
}
