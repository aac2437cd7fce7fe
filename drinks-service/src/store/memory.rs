use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DrinkChanges, MenuStore, StoreError, StoreResult, MAX_TITLE_LEN};
use crate::drink::{sample_drink_recipe, Drink, Recipe};

#[derive(Default)]
struct Menu {
    last_id: i64,
    drinks: BTreeMap<i64, Drink>,
}

impl Menu {
    fn check_title(&self, title: &str, own_id: Option<i64>) -> StoreResult<()> {
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(StoreError::Constraint(format!(
                "title longer than {MAX_TITLE_LEN} characters"
            )));
        }
        let taken = self
            .drinks
            .values()
            .any(|drink| drink.title == title && Some(drink.id) != own_id);
        if taken {
            return Err(StoreError::Constraint(format!("title '{title}' already exists")));
        }
        Ok(())
    }

    fn insert(&mut self, title: String, recipe: Recipe) -> StoreResult<Drink> {
        self.check_title(&title, None)?;
        self.last_id += 1;
        let drink = Drink {
            id: self.last_id,
            title,
            recipe,
        };
        self.drinks.insert(drink.id, drink.clone());
        Ok(drink)
    }
}

/// Menu kept in process memory; used for local runs without a database and in tests.
#[derive(Default)]
pub struct InMemoryMenuStore {
    menu: RwLock<Menu>,
}

impl InMemoryMenuStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MenuStore for InMemoryMenuStore {
    async fn list_all(&self) -> StoreResult<Vec<Drink>> {
        let menu = self.menu.read().await;
        Ok(menu.drinks.values().cloned().collect())
    }

    async fn exists(&self, id: i64) -> StoreResult<bool> {
        Ok(self.menu.read().await.drinks.contains_key(&id))
    }

    async fn insert(&self, title: String, recipe: Recipe) -> StoreResult<Drink> {
        self.menu.write().await.insert(title, recipe)
    }

    async fn update(&self, id: i64, changes: DrinkChanges) -> StoreResult<Drink> {
        let mut menu = self.menu.write().await;
        if !menu.drinks.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        if let Some(title) = changes.title.as_deref() {
            menu.check_title(title, Some(id))?;
        }
        let drink = menu.drinks.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(title) = changes.title {
            drink.title = title;
        }
        if let Some(recipe) = changes.recipe {
            drink.recipe = recipe;
        }
        Ok(drink.clone())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        match self.menu.write().await.drinks.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn reset(&self) -> StoreResult<()> {
        let mut menu = self.menu.write().await;
        *menu = Menu::default();
        menu.insert("water".to_string(), sample_drink_recipe())?;
        Ok(())
    }
}
