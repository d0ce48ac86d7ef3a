use crate::api::users::{profile_for, UserProfile};
use crate::models::{Ingredient, Recipe, Tag, User};
use crate::schema::{
    favorites, ingredients, recipe_ingredients, recipe_tags, recipes, shopping_cart_items, tags,
    users,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// One ingredient line of a recipe, joined with its catalog entry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Full recipe representation returned by list, get, create and update.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub name: String,
    pub author: UserProfile,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<IngredientAmount>,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub created_at: DateTime<Utc>,
}

pub fn load_recipe(conn: &mut PgConnection, id: Uuid) -> QueryResult<Option<Recipe>> {
    recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(conn)
        .optional()
}

fn pair_exists(
    conn: &mut PgConnection,
    user_id: Uuid,
    recipe_id: Uuid,
    in_cart: bool,
) -> QueryResult<bool> {
    if in_cart {
        diesel::select(diesel::dsl::exists(
            shopping_cart_items::table
                .filter(shopping_cart_items::user_id.eq(user_id))
                .filter(shopping_cart_items::recipe_id.eq(recipe_id)),
        ))
        .get_result(conn)
    } else {
        diesel::select(diesel::dsl::exists(
            favorites::table
                .filter(favorites::user_id.eq(user_id))
                .filter(favorites::recipe_id.eq(recipe_id)),
        ))
        .get_result(conn)
    }
}

/// Assemble the full recipe view as seen by `viewer`. Anonymous viewers get
/// `is_favorited` and `is_in_shopping_cart` as false.
pub fn recipe_response(
    conn: &mut PgConnection,
    viewer: Option<&User>,
    recipe: &Recipe,
) -> QueryResult<RecipeResponse> {
    let author: User = users::table
        .find(recipe.author_id)
        .select(User::as_select())
        .first(conn)?;
    let author = profile_for(conn, viewer, &author)?;

    let tag_list: Vec<Tag> = recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq(recipe.id))
        .order(tags::name.asc())
        .select(Tag::as_select())
        .load(conn)?;

    let ingredient_rows: Vec<(Ingredient, i32)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq(recipe.id))
        .order(ingredients::name.asc())
        .select((Ingredient::as_select(), recipe_ingredients::amount))
        .load(conn)?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer) => (
            pair_exists(conn, viewer.id, recipe.id, false)?,
            pair_exists(conn, viewer.id, recipe.id, true)?,
        ),
        None => (false, false),
    };

    Ok(RecipeResponse {
        id: recipe.id,
        name: recipe.name.clone(),
        author,
        tags: tag_list,
        ingredients: ingredient_rows
            .into_iter()
            .map(|(ingredient, amount)| IngredientAmount {
                id: ingredient.id,
                name: ingredient.name,
                measurement_unit: ingredient.measurement_unit,
                amount,
            })
            .collect(),
        image: recipe.image.clone(),
        text: recipe.text.clone(),
        cooking_time: recipe.cooking_time,
        is_favorited,
        is_in_shopping_cart,
        created_at: recipe.created_at,
    })
}
