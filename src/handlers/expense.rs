//! Expense handlers

use axum::{extract::State, http::StatusCode, response::Json};
use sea_orm::{ActiveModelTrait, DbErr, EntityTrait, QueryOrder, Set};
use serde::Deserialize;

use crate::entity::expense::{self, PaidBy};
use crate::error::{AppError, AppResult, DbResultExt, OptionExt};
use crate::extract::{ApiJson, ApiPath};
use crate::handlers::SuccessResponse;
use crate::state::AppState;
use crate::validate;

/// Create expense request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    pub description: Option<String>,
    /// Kept as a raw JSON value so a non-number gets the amount error
    pub amount: Option<serde_json::Value>,
    pub paid_by: Option<String>,
    pub note: Option<String>,
}

/// Update expense request; absent fields are left unchanged
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    pub description: Option<String>,
    pub amount: Option<serde_json::Value>,
    pub paid_by: Option<String>,
    #[serde(default, deserialize_with = "validate::double_option")]
    pub note: Option<Option<String>>,
}

fn paid_by(value: &str) -> AppResult<PaidBy> {
    PaidBy::parse(value).ok_or_else(|| {
        AppError::BadRequest("Paid by must be one of: bride, brother, father, mother".to_string())
    })
}

async fn find_expense(state: &AppState, id: i64, failure: &str) -> AppResult<expense::Model> {
    expense::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .or_internal(failure)?
        .ok_or_not_found("Expense not found")
}

/// GET /api/expenses
pub async fn list_expenses(State(state): State<AppState>) -> AppResult<Json<Vec<expense::Model>>> {
    let expenses = expense::Entity::find()
        .order_by_desc(expense::Column::CreatedAt)
        .order_by_desc(expense::Column::Id)
        .all(&state.db)
        .await
        .or_internal("Failed to fetch expenses")?;
    Ok(Json(expenses))
}

/// GET /api/expenses/:id
pub async fn get_expense(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<expense::Model>> {
    Ok(Json(find_expense(&state, id, "Failed to fetch expense").await?))
}

/// POST /api/expenses
pub async fn create_expense(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateExpenseRequest>,
) -> AppResult<(StatusCode, Json<expense::Model>)> {
    let description = validate::required(req.description.as_deref(), "Description is required")?;
    let amount = validate::amount(req.amount.as_ref())?;
    let paid_by = paid_by(&validate::required(req.paid_by.as_deref(), "Paid by is required")?)?;

    let expense = expense::ActiveModel {
        description: Set(description),
        amount: Set(amount),
        paid_by: Set(paid_by.as_str().to_string()),
        note: Set(validate::optional(req.note)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .or_internal("Failed to create expense")?;

    tracing::info!("Recorded expense {} ({:.2})", expense.description, expense.amount);
    Ok((StatusCode::CREATED, Json(expense)))
}

/// PUT /api/expenses/:id
pub async fn update_expense(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateExpenseRequest>,
) -> AppResult<Json<expense::Model>> {
    let existing = find_expense(&state, id, "Failed to update expense").await?;

    let mut active: expense::ActiveModel = existing.clone().into();
    if let Some(description) = req.description {
        active.description = Set(validate::required(
            Some(&description),
            "Description cannot be empty",
        )?);
    }
    if req.amount.is_some() {
        active.amount = Set(validate::amount(req.amount.as_ref())?);
    }
    if let Some(value) = req.paid_by {
        let value = validate::required(Some(&value), "Paid by cannot be empty")?;
        active.paid_by = Set(paid_by(&value)?.as_str().to_string());
    }
    if let Some(note) = req.note {
        active.note = Set(validate::optional(note));
    }

    if !active.is_changed() {
        return Ok(Json(existing));
    }

    let updated = active.update(&state.db).await.map_err(|e| match e {
        DbErr::RecordNotUpdated => AppError::NotFound("Expense not found".to_string()),
        other => AppError::internal("Failed to update expense", other),
    })?;

    Ok(Json(updated))
}

/// DELETE /api/expenses/:id
pub async fn delete_expense(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<SuccessResponse>> {
    find_expense(&state, id, "Failed to delete expense").await?;

    expense::Entity::delete_by_id(id)
        .exec(&state.db)
        .await
        .or_internal("Failed to delete expense")?;

    Ok(Json(SuccessResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paid_by_validation() {
        assert_eq!(paid_by("Father").unwrap(), PaidBy::Father);
        assert!(matches!(paid_by("caterer"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_update_request_note_null() {
        let req: UpdateExpenseRequest = serde_json::from_str(r#"{"note": null}"#).unwrap();
        assert_eq!(req.note, Some(None));
        assert!(req.amount.is_none());
    }
}
