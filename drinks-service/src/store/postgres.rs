use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::warn;

use super::{DrinkChanges, MenuStore, StoreError, StoreResult};
use crate::drink::{decode_recipe, encode_recipe, sample_drink_recipe, Drink, Recipe};

#[derive(Debug, sqlx::FromRow)]
struct DrinkRow {
    id: i64,
    title: String,
    recipe: String,
}

impl TryFrom<DrinkRow> for Drink {
    type Error = StoreError;

    fn try_from(row: DrinkRow) -> StoreResult<Self> {
        let recipe = decode_recipe(&row.recipe).map_err(|err| StoreError::Corrupt {
            id: row.id,
            reason: err.to_string(),
        })?;
        Ok(Drink {
            id: row.id,
            title: row.title,
            recipe,
        })
    }
}

/// Integrity (class 23) and data (class 22) errors mean the write itself was
/// rejected; everything else is treated as the database being unreachable.
fn classify(err: sqlx::Error) -> StoreError {
    let message = err.to_string();
    match &err {
        sqlx::Error::Database(db) => match db.code() {
            Some(code) if code.starts_with("23") || code.starts_with("22") => {
                StoreError::Constraint(message)
            }
            _ => StoreError::Unavailable(message),
        },
        _ => StoreError::Unavailable(message),
    }
}

fn encode(recipe: &Recipe) -> StoreResult<String> {
    encode_recipe(recipe).map_err(|err| StoreError::Constraint(err.to_string()))
}

/// Commit on success, roll back on failure.
async fn finish<T>(
    tx: Transaction<'_, Postgres>,
    result: Result<T, sqlx::Error>,
) -> StoreResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await.map_err(classify)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "failed to roll back drinks transaction");
            }
            Err(classify(err))
        }
    }
}

#[derive(Clone)]
pub struct PgMenuStore {
    pool: PgPool,
}

impl PgMenuStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl MenuStore for PgMenuStore {
    async fn list_all(&self) -> StoreResult<Vec<Drink>> {
        let rows = sqlx::query_as::<_, DrinkRow>("SELECT id, title, recipe FROM drinks ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;
        rows.into_iter().map(Drink::try_from).collect()
    }

    async fn exists(&self, id: i64) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM drinks WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    async fn insert(&self, title: String, recipe: Recipe) -> StoreResult<Drink> {
        let recipe = encode(&recipe)?;
        let mut tx = self.pool.begin().await.map_err(classify)?;
        let result = sqlx::query_as::<_, DrinkRow>(
            "INSERT INTO drinks (title, recipe) VALUES ($1, $2) RETURNING id, title, recipe",
        )
        .bind(title)
        .bind(recipe)
        .fetch_one(&mut *tx)
        .await;
        finish(tx, result).await?.try_into()
    }

    async fn update(&self, id: i64, changes: DrinkChanges) -> StoreResult<Drink> {
        let recipe = changes.recipe.as_ref().map(encode).transpose()?;
        let mut tx = self.pool.begin().await.map_err(classify)?;
        let result = sqlx::query_as::<_, DrinkRow>(
            r#"UPDATE drinks
               SET title = COALESCE($1, title),
                   recipe = COALESCE($2, recipe)
               WHERE id = $3
               RETURNING id, title, recipe"#,
        )
        .bind(changes.title)
        .bind(recipe)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await;
        match finish(tx, result).await? {
            Some(row) => row.try_into(),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(classify)?;
        let result = sqlx::query("DELETE FROM drinks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await;
        if finish(tx, result).await?.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn reset(&self) -> StoreResult<()> {
        let recipe = encode(&sample_drink_recipe())?;
        let mut tx = self.pool.begin().await.map_err(classify)?;
        let result = async {
            sqlx::query("TRUNCATE drinks RESTART IDENTITY")
                .execute(&mut *tx)
                .await?;
            sqlx::query("INSERT INTO drinks (title, recipe) VALUES ($1, $2)")
                .bind("water")
                .bind(recipe)
                .execute(&mut *tx)
                .await
        }
        .await;
        finish(tx, result).await.map(|_| ())
    }
}
