use serde::Serialize;
use std::collections::BTreeMap;

/// One recipe document after extraction
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Recipe {
    /// Assigned when the cookbook is assembled, 0 until then
    pub id: i64,
    pub name: String,
    /// Servings the listed amounts are based on, at least 1
    pub standard_portions: u32,
    pub source: Option<String>,
    pub instructions: String,
    /// Passthrough columns from the tag table, keyed by column name
    pub tags: BTreeMap<String, String>,
}

/// One accepted row of a recipe's ingredient table
#[derive(Debug, Clone, Serialize)]
pub struct IngredientRow {
    pub id: i64,
    pub recipe_id: i64,
    pub name: String,
    /// Empty when the row belongs to the whole recipe
    pub section: String,
    /// NaN means no quantity could be determined
    pub amount: f64,
    pub unit: String,
    /// Amount was assumed to be 1 and should be checked by hand
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub needs_review: bool,
}

impl IngredientRow {
    pub fn new(
        name: impl Into<String>,
        section: impl Into<String>,
        amount: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            recipe_id: 0,
            name: name.into(),
            section: section.into(),
            amount,
            unit: unit.into(),
            needs_review: false,
        }
    }

    /// Amount as stored, `None` for an unspecified quantity
    pub fn stored_amount(&self) -> Option<f64> {
        if self.amount.is_nan() {
            None
        } else {
            Some(self.amount)
        }
    }
}

// Two unspecified (NaN) amounts count as equal
impl PartialEq for IngredientRow {
    fn eq(&self, other: &Self) -> bool {
        let amounts_match =
            (self.amount.is_nan() && other.amount.is_nan()) || self.amount == other.amount;
        self.id == other.id
            && self.recipe_id == other.recipe_id
            && self.name == other.name
            && self.section == other.section
            && amounts_match
            && self.unit == other.unit
            && self.needs_review == other.needs_review
    }
}

/// Everything extracted from one recipe document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeDocument {
    pub recipe: Recipe,
    pub ingredients: Vec<IngredientRow>,
}

/// The whole collection, ready to load
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Cookbook {
    pub recipes: Vec<Recipe>,
    pub ingredients: Vec<IngredientRow>,
    /// Tag columns every recipe carries, in table order
    pub tag_columns: Vec<String>,
}

impl Cookbook {
    pub fn recipe(&self, name: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.name == name)
    }

    /// Ingredient rows belonging to the recipe with this id, in document order
    pub fn ingredients_of(&self, recipe_id: i64) -> impl Iterator<Item = &IngredientRow> {
        self.ingredients.iter().filter(move |i| i.recipe_id == recipe_id)
    }

    pub fn rows_needing_review(&self) -> usize {
        self.ingredients.iter().filter(|i| i.needs_review).count()
    }
}
