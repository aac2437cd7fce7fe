use serde::{Deserialize, Serialize};

/// One line of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

pub type Recipe = Vec<Ingredient>;

/// A drink as persisted. Serializes as the long view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drink {
    pub id: i64,
    pub title: String,
    pub recipe: Recipe,
}

/// Public listing view: ingredients without their proportions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortDrink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortIngredient {
    pub name: String,
    pub color: String,
}

impl Drink {
    pub fn into_short(self) -> ShortDrink {
        ShortDrink {
            id: self.id,
            title: self.title,
            recipe: self
                .recipe
                .into_iter()
                .map(|ingredient| ShortIngredient {
                    name: ingredient.name,
                    color: ingredient.color,
                })
                .collect(),
        }
    }
}

/// Request bodies may carry either a list of ingredients or a lone ingredient.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeInput {
    Many(Vec<Ingredient>),
    One(Ingredient),
}

impl From<RecipeInput> for Recipe {
    fn from(value: RecipeInput) -> Self {
        match value {
            RecipeInput::Many(items) => items,
            RecipeInput::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewDrink {
    pub title: String,
    pub recipe: RecipeInput,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDrink {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub recipe: Option<RecipeInput>,
}

/// Recipes are stored as JSON text.
pub fn encode_recipe(recipe: &Recipe) -> serde_json::Result<String> {
    serde_json::to_string(recipe)
}

pub fn decode_recipe(raw: &str) -> serde_json::Result<Recipe> {
    serde_json::from_str(raw)
}

pub fn sample_drink_recipe() -> Recipe {
    vec![Ingredient {
        name: "water".to_string(),
        color: "blue".to_string(),
        parts: 1,
    }]
}
