use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use common_auth::AuthContext;
use common_http_errors::{ApiError, ApiResult};
use serde::Serialize;
use tracing::{error, info};

use crate::app_state::AppState;
use crate::drink::{Drink, NewDrink, ShortDrink, UpdateDrink};
use crate::store::DrinkChanges;

#[derive(Debug, Serialize)]
pub struct DrinksResponse<T> {
    pub success: bool,
    pub drinks: Vec<T>,
}

impl<T> DrinksResponse<T> {
    fn ok(drinks: Vec<T>) -> Json<Self> {
        Json(Self { success: true, drinks })
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub delete: String,
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    ApiError::Unprocessable {
        code: "invalid_body",
        message: Some(rejection.body_text()),
    }
}

fn normalize_title(raw: String) -> ApiResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Unprocessable {
            code: "invalid_title",
            message: Some("title must not be blank".to_string()),
        });
    }
    Ok(trimmed.to_string())
}

// Ids that are not integers cannot name a stored drink.
fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>().map_err(|_| ApiError::not_found())
}

pub async fn list_drinks(
    State(state): State<AppState>,
) -> ApiResult<Json<DrinksResponse<ShortDrink>>> {
    let drinks = state.store.list_all().await.map_err(|err| {
        error!(error = %err, "failed to read drinks menu");
        ApiError::Internal { message: None }
    })?;
    Ok(DrinksResponse::ok(
        drinks.into_iter().map(Drink::into_short).collect(),
    ))
}

pub async fn list_drink_details(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DrinksResponse<Drink>>> {
    let drinks = state.store.list_all().await.map_err(|err| {
        error!(error = %err, "failed to read drinks menu");
        ApiError::Internal { message: None }
    })?;
    info!(subject = ?auth.subject(), count = drinks.len(), "served drink details");
    Ok(DrinksResponse::ok(drinks))
}

pub async fn create_drink(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<NewDrink>, JsonRejection>,
) -> ApiResult<Json<DrinksResponse<Drink>>> {
    let Json(new_drink) = payload.map_err(invalid_body)?;
    let title = normalize_title(new_drink.title)?;
    let drink = state.store.insert(title, new_drink.recipe.into()).await?;
    info!(subject = ?auth.subject(), drink_id = drink.id, title = %drink.title, "drink created");
    Ok(DrinksResponse::ok(vec![drink]))
}

fn parse_changes(payload: Result<Json<UpdateDrink>, JsonRejection>) -> ApiResult<DrinkChanges> {
    let Json(update) = payload.map_err(invalid_body)?;
    Ok(DrinkChanges {
        title: update.title.map(normalize_title).transpose()?,
        recipe: update.recipe.map(Into::into),
    })
}

pub async fn update_drink(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateDrink>, JsonRejection>,
) -> ApiResult<Json<DrinksResponse<Drink>>> {
    let id = parse_id(&raw_id)?;
    let changes = match parse_changes(payload) {
        Ok(changes) => changes,
        Err(err) => {
            // An absent drink is reported ahead of a bad body.
            if !state.store.exists(id).await? {
                return Err(ApiError::not_found());
            }
            return Err(err);
        }
    };
    let drink = state.store.update(id, changes).await?;
    info!(subject = ?auth.subject(), drink_id = drink.id, "drink updated");
    Ok(DrinksResponse::ok(vec![drink]))
}

pub async fn delete_drink(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    let id = parse_id(&raw_id)?;
    state.store.delete(id).await?;
    info!(subject = ?auth.subject(), drink_id = id, "drink deleted");
    Ok(Json(DeletedResponse {
        success: true,
        delete: id.to_string(),
    }))
}
