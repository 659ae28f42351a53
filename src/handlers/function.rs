//! Function (event) handlers
//!
//! Implements function CRUD; deleting a function removes its invites and RSVPs

use std::cmp::Ordering;

use axum::{extract::State, http::StatusCode, response::Json};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;

use crate::entity::{function, invite, rsvp};
use crate::error::{AppError, AppResult, DbResultExt, OptionExt};
use crate::extract::{ApiJson, ApiPath};
use crate::handlers::SuccessResponse;
use crate::state::AppState;
use crate::validate;

/// Create function request
#[derive(Debug, Deserialize)]
pub struct CreateFunctionRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub date: Option<String>,
    pub venue: Option<String>,
}

/// Update function request; absent fields are left unchanged, null clears
#[derive(Debug, Deserialize)]
pub struct UpdateFunctionRequest {
    pub name: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "validate::double_option")]
    pub kind: Option<Option<String>>,
    #[serde(default, deserialize_with = "validate::double_option")]
    pub date: Option<Option<String>>,
    #[serde(default, deserialize_with = "validate::double_option")]
    pub venue: Option<Option<String>>,
}

/// Dated functions first in date order, undated ones after; ties by name
pub fn order_functions(functions: &mut [function::Model]) {
    functions.sort_by(|a, b| {
        let by_date = match (&a.date, &b.date) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_date.then_with(|| a.name.cmp(&b.name)).then(a.id.cmp(&b.id))
    });
}

fn parse_optional_date(date: Option<String>) -> AppResult<Option<chrono::DateTime<chrono::Utc>>> {
    match validate::optional(date) {
        Some(d) => validate::parse_date(&d).map(Some),
        None => Ok(None),
    }
}

/// GET /api/functions
pub async fn list_functions(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<function::Model>>> {
    let mut functions = function::Entity::find()
        .all(&state.db)
        .await
        .or_internal("Failed to fetch functions")?;
    order_functions(&mut functions);
    Ok(Json(functions))
}

/// GET /api/functions/:id
pub async fn get_function(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<function::Model>> {
    let func = function::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .or_internal("Failed to fetch function")?
        .ok_or_not_found("Function not found")?;
    Ok(Json(func))
}

/// POST /api/functions
pub async fn create_function(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateFunctionRequest>,
) -> AppResult<(StatusCode, Json<function::Model>)> {
    let name = validate::required(req.name.as_deref(), "Function name is required")?;
    let date = parse_optional_date(req.date)?;

    let func = function::ActiveModel {
        name: Set(name),
        kind: Set(validate::optional(req.kind)),
        date: Set(date),
        venue: Set(validate::optional(req.venue)),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .or_internal("Failed to create function")?;

    tracing::info!("Created function: {}", func.name);
    Ok((StatusCode::CREATED, Json(func)))
}

/// PUT /api/functions/:id
pub async fn update_function(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateFunctionRequest>,
) -> AppResult<Json<function::Model>> {
    let db = &state.db;

    let existing = function::Entity::find_by_id(id)
        .one(db)
        .await
        .or_internal("Failed to update function")?
        .ok_or_not_found("Function not found")?;

    let mut active: function::ActiveModel = existing.clone().into();
    if let Some(name) = req.name {
        active.name = Set(validate::required(Some(&name), "Function name cannot be empty")?);
    }
    if let Some(kind) = req.kind {
        active.kind = Set(validate::optional(kind));
    }
    if let Some(venue) = req.venue {
        active.venue = Set(validate::optional(venue));
    }
    if let Some(date) = req.date {
        active.date = Set(parse_optional_date(date)?);
    }

    if !active.is_changed() {
        return Ok(Json(existing));
    }

    let updated = active.update(db).await.map_err(|e| match e {
        DbErr::RecordNotUpdated => AppError::NotFound("Function not found".to_string()),
        other => AppError::internal("Failed to update function", other),
    })?;

    Ok(Json(updated))
}

/// DELETE /api/functions/:id
pub async fn delete_function(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<SuccessResponse>> {
    let db = &state.db;

    let func = function::Entity::find_by_id(id)
        .one(db)
        .await
        .or_internal("Failed to delete function")?
        .ok_or_not_found("Function not found")?;

    db.transaction::<_, (), DbErr>(|txn| {
        Box::pin(async move {
            invite::Entity::delete_many()
                .filter(invite::Column::FunctionId.eq(id))
                .exec(txn)
                .await?;
            rsvp::Entity::delete_many()
                .filter(rsvp::Column::FunctionId.eq(id))
                .exec(txn)
                .await?;
            function::Entity::delete_by_id(id).exec(txn).await?;
            Ok(())
        })
    })
    .await
    .map_err(|e| AppError::internal("Failed to delete function", e))?;

    tracing::info!("Deleted function: {}", func.name);
    Ok(Json(SuccessResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn func(id: i64, name: &str, day: Option<u32>) -> function::Model {
        function::Model {
            id,
            name: name.to_string(),
            kind: None,
            date: day.map(|d| chrono::Utc.with_ymd_and_hms(2025, 12, d, 0, 0, 0).unwrap()),
            venue: None,
        }
    }

    #[test]
    fn test_order_functions() {
        let mut functions = vec![
            func(1, "Walima", None),
            func(2, "Nikah", Some(21)),
            func(3, "Mehndi", Some(20)),
            func(4, "Baraat", Some(21)),
        ];
        order_functions(&mut functions);
        let names: Vec<_> = functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Mehndi", "Baraat", "Nikah", "Walima"]);
    }

    #[test]
    fn test_update_request_distinguishes_null() {
        let req: UpdateFunctionRequest =
            serde_json::from_str(r#"{"venue": null, "type": "Reception"}"#).unwrap();
        assert!(req.name.is_none());
        assert_eq!(req.venue, Some(None));
        assert_eq!(req.kind, Some(Some("Reception".to_string())));
        assert!(req.date.is_none());
    }
}
