use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::schema::{ingredients, recipe_ingredients, shopping_cart_items};
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use diesel::dsl::sum;
use diesel::prelude::*;
use std::fmt::Write as _;
use std::sync::Arc;

/// One aggregated shopping-list line: ingredient name, unit, summed amount.
type AggregatedLine = (String, String, i64);

fn render_shopping_list(lines: &[AggregatedLine], full_name: &str, date: NaiveDate) -> String {
    let mut out = String::from("Shopping list:\n");
    for (n, (name, unit, amount)) in lines.iter().enumerate() {
        let _ = write!(out, "\n{}. {} - {} {}", n + 1, name, amount, unit);
    }
    let _ = write!(
        out,
        "\n\n\n{}\nGenerated by Skillet for {}\n",
        date.format("%d.%m.%Y"),
        full_name
    );
    out
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    tag = "recipes",
    responses(
        (status = 200, description = "Aggregated shopping list as a text attachment", content_type = "text/plain"),
        (status = 400, description = "Shopping cart is empty", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let cart_recipe_ids = shopping_cart_items::table
        .filter(shopping_cart_items::user_id.eq(user.id))
        .select(shopping_cart_items::recipe_id);

    // Sum amounts per (name, unit) across every recipe in the cart
    let rows: Vec<(String, String, Option<i64>)> = match recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(cart_recipe_ids))
        .group_by((ingredients::name, ingredients::measurement_unit))
        .select((
            ingredients::name,
            ingredients::measurement_unit,
            sum(recipe_ingredients::amount),
        ))
        .order(ingredients::name.asc())
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to aggregate shopping list: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to build shopping list".to_string(),
                }),
            )
                .into_response();
        }
    };

    if rows.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Shopping cart is empty".to_string(),
            }),
        )
            .into_response();
    }

    let lines: Vec<AggregatedLine> = rows
        .into_iter()
        .map(|(name, unit, total)| (name, unit, total.unwrap_or(0)))
        .collect();

    let body = render_shopping_list(&lines, &user.full_name(), Utc::now().date_naive());
    let filename = format!("{}_download_list.txt", user.username);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", filename),
        )
        .body(Body::from(body))
        .unwrap()
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()
    }

    #[test]
    fn test_render_single_line() {
        let lines = vec![("flour".to_string(), "g".to_string(), 500)];
        let out = render_shopping_list(&lines, "Alice Smith", date());
        assert!(out.starts_with("Shopping list:\n"));
        assert!(out.contains("\n1. flour - 500 g"));
        assert!(out.contains("24.08.2026"));
        assert!(out.contains("Alice Smith"));
    }

    #[test]
    fn test_render_numbers_lines_in_order() {
        let lines = vec![
            ("flour".to_string(), "g".to_string(), 500),
            ("milk".to_string(), "ml".to_string(), 250),
            ("salt".to_string(), "g".to_string(), 3),
        ];
        let out = render_shopping_list(&lines, "Alice Smith", date());
        let flour = out.find("1. flour - 500 g").unwrap();
        let milk = out.find("2. milk - 250 ml").unwrap();
        let salt = out.find("3. salt - 3 g").unwrap();
        assert!(flour < milk && milk < salt);
    }

    #[test]
    fn test_render_keeps_same_name_different_unit_separate() {
        let lines = vec![
            ("sugar".to_string(), "g".to_string(), 100),
            ("sugar".to_string(), "tbsp".to_string(), 2),
        ];
        let out = render_shopping_list(&lines, "Alice Smith", date());
        assert!(out.contains("1. sugar - 100 g"));
        assert!(out.contains("2. sugar - 2 tbsp"));
    }
}
