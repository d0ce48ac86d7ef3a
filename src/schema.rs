diesel::table! {
    users (id) {
        id -> Uuid,
        #[max_length = 150]
        username -> Varchar,
        #[max_length = 254]
        email -> Varchar,
        #[max_length = 150]
        first_name -> Varchar,
        #[max_length = 150]
        last_name -> Varchar,
        #[max_length = 255]
        password_hash -> Varchar,
        is_staff -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    sessions (id) {
        id -> Uuid,
        user_id -> Uuid,
        #[max_length = 255]
        token_hash -> Varchar,
        expires_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    follows (id) {
        id -> Uuid,
        follower_id -> Uuid,
        followee_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    ingredients (id) {
        id -> Uuid,
        #[max_length = 200]
        name -> Varchar,
        #[max_length = 200]
        measurement_unit -> Varchar,
    }
}

diesel::table! {
    tags (id) {
        id -> Uuid,
        #[max_length = 200]
        name -> Varchar,
        #[max_length = 7]
        color -> Varchar,
        #[max_length = 200]
        slug -> Varchar,
    }
}

diesel::table! {
    recipes (id) {
        id -> Uuid,
        author_id -> Uuid,
        #[max_length = 200]
        name -> Varchar,
        image -> Text,
        text -> Text,
        cooking_time -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    recipe_tags (id) {
        id -> Uuid,
        recipe_id -> Uuid,
        tag_id -> Uuid,
    }
}

diesel::table! {
    recipe_ingredients (id) {
        id -> Uuid,
        recipe_id -> Uuid,
        ingredient_id -> Uuid,
        amount -> Int4,
    }
}

diesel::table! {
    favorites (id) {
        id -> Uuid,
        user_id -> Uuid,
        recipe_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    shopping_cart_items (id) {
        id -> Uuid,
        user_id -> Uuid,
        recipe_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(sessions -> users (user_id));
diesel::joinable!(recipes -> users (author_id));
diesel::joinable!(recipe_tags -> recipes (recipe_id));
diesel::joinable!(recipe_tags -> tags (tag_id));
diesel::joinable!(recipe_ingredients -> recipes (recipe_id));
diesel::joinable!(recipe_ingredients -> ingredients (ingredient_id));
diesel::joinable!(favorites -> users (user_id));
diesel::joinable!(favorites -> recipes (recipe_id));
diesel::joinable!(shopping_cart_items -> users (user_id));
diesel::joinable!(shopping_cart_items -> recipes (recipe_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    sessions,
    follows,
    ingredients,
    tags,
    recipes,
    recipe_tags,
    recipe_ingredients,
    favorites,
    shopping_cart_items,
);
