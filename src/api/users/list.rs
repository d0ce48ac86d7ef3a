use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::User;
use crate::pagination::{PageParams, PaginationMetadata};
use crate::schema::users;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::{profile_for, UserProfile};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListUsersResponse {
    pub users: Vec<UserProfile>,
    pub pagination: PaginationMetadata,
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(PageParams),
    responses(
        (status = 200, description = "Paginated list of users", body = ListUsersResponse)
    )
)]
pub async fn list_users(
    viewer: Option<AuthUser>,
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let total: i64 = match users::table.count().get_result(&mut conn) {
        Ok(n) => n,
        Err(e) => {
            tracing::error!("Failed to count users: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch users".to_string(),
                }),
            )
                .into_response();
        }
    };

    let page: Vec<User> = match users::table
        .order(users::created_at.desc())
        .select(User::as_select())
        .limit(params.limit())
        .offset(params.offset())
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch users: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to fetch users".to_string(),
                }),
            )
                .into_response();
        }
    };

    let viewer = viewer.map(|AuthUser(user)| user);
    let mut profiles = Vec::with_capacity(page.len());
    for user in &page {
        match profile_for(&mut conn, viewer.as_ref(), user) {
            Ok(profile) => profiles.push(profile),
            Err(e) => {
                tracing::error!("Failed to build user profile: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "Failed to fetch users".to_string(),
                    }),
                )
                    .into_response();
            }
        }
    }

    (
        StatusCode::OK,
        Json(ListUsersResponse {
            users: profiles,
            pagination: PaginationMetadata::new(total, &params),
        }),
    )
        .into_response()
}
