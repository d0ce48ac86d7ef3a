use serde::Deserialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

const MAX_RECIPE_NAME_LENGTH: usize = 200;

/// One ingredient line as submitted by the client: catalog id plus amount.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecipeIngredientInput {
    pub id: Uuid,
    pub amount: i32,
}

/// Tag ids must be non-empty and free of duplicates. Existence in the
/// catalog is checked separately by the caller, against the database.
pub fn validate_tags(tag_ids: &[Uuid]) -> Result<(), String> {
    if tag_ids.is_empty() {
        return Err("At least one tag is required".to_string());
    }
    for (i, id) in tag_ids.iter().enumerate() {
        if tag_ids[..i].contains(id) {
            return Err("Tags must not be duplicated".to_string());
        }
    }
    Ok(())
}

/// Collapse the submitted ingredient lines into one amount per ingredient id.
///
/// Repeated ids are summed rather than rejected. Every individual amount
/// must be positive; the summed amount must still fit the storage column.
pub fn normalize_ingredients(
    entries: &[RecipeIngredientInput],
) -> Result<BTreeMap<Uuid, i32>, String> {
    if entries.is_empty() {
        return Err("At least one ingredient is required".to_string());
    }

    let mut amounts: BTreeMap<Uuid, i64> = BTreeMap::new();
    for entry in entries {
        if entry.amount < 1 {
            return Err("Ingredient amount must be greater than 0".to_string());
        }
        *amounts.entry(entry.id).or_insert(0) += i64::from(entry.amount);
    }

    amounts
        .into_iter()
        .map(|(id, total)| {
            i32::try_from(total)
                .map(|total| (id, total))
                .map_err(|_| "Ingredient amount is too large".to_string())
        })
        .collect()
}

/// The trimmed name must be non-empty and fit the storage column.
pub fn validate_recipe_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Recipe name cannot be empty".to_string());
    }
    if name.len() > MAX_RECIPE_NAME_LENGTH {
        return Err("Recipe name must be at most 200 characters".to_string());
    }
    Ok(())
}

pub fn validate_cooking_time(cooking_time: i32) -> Result<(), String> {
    if cooking_time < 1 {
        return Err("Cooking time must be at least 1 minute".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: Uuid, amount: i32) -> RecipeIngredientInput {
        RecipeIngredientInput { id, amount }
    }

    #[test]
    fn test_empty_tags_rejected() {
        assert!(validate_tags(&[]).is_err());
    }

    #[test]
    fn test_duplicate_tags_rejected() {
        let id = Uuid::new_v4();
        assert!(validate_tags(&[id, Uuid::new_v4(), id]).is_err());
    }

    #[test]
    fn test_distinct_tags_accepted() {
        assert!(validate_tags(&[Uuid::new_v4(), Uuid::new_v4()]).is_ok());
    }

    #[test]
    fn test_empty_ingredients_rejected() {
        assert!(normalize_ingredients(&[]).is_err());
    }

    #[test]
    fn test_zero_amount_rejected() {
        assert!(normalize_ingredients(&[entry(Uuid::new_v4(), 0)]).is_err());
    }

    #[test]
    fn test_negative_amount_rejected() {
        assert!(normalize_ingredients(&[entry(Uuid::new_v4(), -5)]).is_err());
    }

    #[test]
    fn test_duplicate_ingredients_are_summed() {
        let flour = Uuid::new_v4();
        let sugar = Uuid::new_v4();
        let normalized =
            normalize_ingredients(&[entry(flour, 200), entry(sugar, 50), entry(flour, 300)])
                .unwrap();
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[&flour], 500);
        assert_eq!(normalized[&sugar], 50);
    }

    #[test]
    fn test_summed_amount_overflow_rejected() {
        let id = Uuid::new_v4();
        let result = normalize_ingredients(&[entry(id, i32::MAX), entry(id, 1)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_recipe_name_bounds() {
        assert!(validate_recipe_name("Pancakes").is_ok());
        assert!(validate_recipe_name(&"a".repeat(200)).is_ok());
        assert!(validate_recipe_name(&"a".repeat(201)).is_err());
        assert!(validate_recipe_name("   ").is_err());
    }

    #[test]
    fn test_cooking_time_bounds() {
        assert!(validate_cooking_time(0).is_err());
        assert!(validate_cooking_time(-10).is_err());
        assert!(validate_cooking_time(1).is_ok());
    }
}
