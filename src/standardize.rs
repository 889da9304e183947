use crate::model::{IngredientRow, Recipe};
use log::warn;
use std::collections::HashMap;

/// Rescales every amount to one portion of its recipe.
///
/// Needs the final recipe ids and serving counts, so it runs after all
/// documents are parsed. NaN amounts stay NaN.
pub fn standardize_amounts(ingredients: &mut [IngredientRow], recipes: &[Recipe]) {
    let portions: HashMap<i64, u32> = recipes
        .iter()
        .map(|r| (r.id, r.standard_portions))
        .collect();

    for ingredient in ingredients.iter_mut() {
        match portions.get(&ingredient.recipe_id) {
            Some(&count) => ingredient.amount /= f64::from(count.max(1)),
            None => warn!(
                "Ingredient '{}' refers to unknown recipe id {}, amount left as is",
                ingredient.name, ingredient.recipe_id
            ),
        }
    }
}
