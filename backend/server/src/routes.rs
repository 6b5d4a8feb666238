use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State as Extract,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use pantry::{Credential, Identity, InventoryItem, PantryError, Removal, SearchOutcome};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    state::State,
    utils::{bearer_token, require_token, session},
};

#[derive(Deserialize)]
pub struct ItemPayload {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
    create: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpPayload {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct SignInPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
pub struct AddResponse {
    name: String,
    quantity: u32,
    inventory: Vec<InventoryItem>,
}

#[derive(Serialize)]
pub struct RemoveResponse {
    name: String,
    removal: Removal,
    inventory: Vec<InventoryItem>,
}

pub async fn list_handler(
    Extract(state): Extract<Arc<State>>,
) -> Result<Json<Vec<InventoryItem>>, AppError> {
    Ok(Json(state.inventory.list().await?))
}

pub async fn add_handler(
    Extract(state): Extract<Arc<State>>,
    headers: HeaderMap,
    payload: Result<Json<ItemPayload>, JsonRejection>,
) -> Result<Json<AddResponse>, AppError> {
    let Json(payload) = payload?;
    let session = session(&state, &headers).await?;

    let quantity = state.inventory.add(&session, &payload.name).await?;

    Ok(Json(AddResponse {
        name: payload.name,
        quantity,
        inventory: state.inventory.list().await?,
    }))
}

pub async fn remove_handler(
    Extract(state): Extract<Arc<State>>,
    headers: HeaderMap,
    payload: Result<Json<ItemPayload>, JsonRejection>,
) -> Result<Json<RemoveResponse>, AppError> {
    let Json(payload) = payload?;
    let session = session(&state, &headers).await?;

    let removal = state.inventory.remove(&session, &payload.name).await?;

    Ok(Json(RemoveResponse {
        name: payload.name,
        removal,
        inventory: state.inventory.list().await?,
    }))
}

/// Without `create` a missing item is a 404, which is the client's cue to ask.
pub async fn search_handler(
    Extract(state): Extract<Arc<State>>,
    headers: HeaderMap,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchOutcome>, AppError> {
    let Query(params) = params?;

    let Some(create) = params.create else {
        return match state.inventory.lookup(&params.q).await? {
            Some(found) => Ok(Json(SearchOutcome::Found(found))),
            None => Err(PantryError::NotFound(params.q.trim().to_string()).into()),
        };
    };

    let session = session(&state, &headers).await?;
    let outcome = state
        .inventory
        .search(&session, &params.q, move |_| create)
        .await?;

    Ok(Json(outcome))
}

pub async fn signup_handler(
    Extract(state): Extract<Arc<State>>,
    payload: Result<Json<SignUpPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    state
        .accounts
        .sign_up(&payload.first_name, &payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, "User registered successfully!"))
}

pub async fn signin_handler(
    Extract(state): Extract<Arc<State>>,
    payload: Result<Json<SignInPayload>, JsonRejection>,
) -> Result<Json<Credential>, AppError> {
    let Json(payload) = payload?;
    let session = pantry::Session::anonymous();

    let credential = state
        .accounts
        .sign_in(&session, &payload.email, &payload.password)
        .await?;

    Ok(Json(credential))
}

pub async fn signout_handler(
    Extract(state): Extract<Arc<State>>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = require_token(&headers)?;
    let session = session(&state, &headers).await?;

    state.accounts.sign_out(&session, token).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    Extract(state): Extract<Arc<State>>,
    headers: HeaderMap,
) -> Result<Json<Option<Identity>>, AppError> {
    let session = state.accounts.session_for(bearer_token(&headers)).await?;

    Ok(Json(session.current()))
}

pub async fn delete_account_handler(
    Extract(state): Extract<Arc<State>>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = require_token(&headers)?;
    let session = session(&state, &headers).await?;

    state.accounts.delete_account(&session, token).await?;

    Ok(StatusCode::NO_CONTENT)
}
