//! Label handlers

use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, response::Json};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entity::{group_label, label};
use crate::error::{AppError, AppResult, DbResultExt, OptionExt};
use crate::extract::{ApiJson, ApiPath};
use crate::handlers::SuccessResponse;
use crate::state::AppState;
use crate::validate;

#[derive(Debug, Deserialize)]
pub struct CreateLabelRequest {
    pub name: Option<String>,
}

/// Label with the number of groups carrying it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSummary {
    #[serde(flatten)]
    pub label: label::Model,
    pub group_count: i64,
}

/// GET /api/labels
pub async fn list_labels(State(state): State<AppState>) -> AppResult<Json<Vec<LabelSummary>>> {
    let db = &state.db;

    let labels = label::Entity::find()
        .order_by_asc(label::Column::Name)
        .all(db)
        .await
        .or_internal("Failed to fetch labels")?;

    let counts: HashMap<i64, i64> = group_label::Entity::find()
        .select_only()
        .column(group_label::Column::LabelId)
        .column_as(Expr::col(group_label::Column::Id).count(), "group_count")
        .group_by(group_label::Column::LabelId)
        .into_tuple::<(i64, i64)>()
        .all(db)
        .await
        .or_internal("Failed to fetch labels")?
        .into_iter()
        .collect();

    Ok(Json(
        labels
            .into_iter()
            .map(|l| LabelSummary {
                group_count: counts.get(&l.id).copied().unwrap_or(0),
                label: l,
            })
            .collect(),
    ))
}

/// POST /api/labels
pub async fn create_label(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateLabelRequest>,
) -> AppResult<(StatusCode, Json<label::Model>)> {
    let db = &state.db;
    let name = validate::required(req.name.as_deref(), "Label name is required")?;

    let duplicate = label::Entity::find()
        .filter(label::Column::NameKey.eq(validate::name_key(&name)))
        .one(db)
        .await
        .or_internal("Failed to create label")?;
    if duplicate.is_some() {
        return Err(AppError::Conflict("Label with this name already exists".to_string()));
    }

    let label = label::ActiveModel {
        name_key: Set(validate::name_key(&name)),
        name: Set(name),
        ..Default::default()
    }
    .insert(db)
    .await
    .on_conflict("Label with this name already exists", "Failed to create label")?;

    Ok((StatusCode::CREATED, Json(label)))
}

/// DELETE /api/labels/:id
pub async fn delete_label(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<SuccessResponse>> {
    let db = &state.db;

    let label = label::Entity::find_by_id(id)
        .one(db)
        .await
        .or_internal("Failed to delete label")?
        .ok_or_not_found("Label not found")?;

    db.transaction::<_, (), sea_orm::DbErr>(|txn| {
        Box::pin(async move {
            group_label::Entity::delete_many()
                .filter(group_label::Column::LabelId.eq(id))
                .exec(txn)
                .await?;

            label::Entity::delete_by_id(id).exec(txn).await?;

            Ok(())
        })
    })
    .await
    .map_err(|e| AppError::internal("Failed to delete label", e))?;

    tracing::info!("Deleted label: {}", label.name);
    Ok(Json(SuccessResponse::ok()))
}
