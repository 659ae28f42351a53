//! Group handlers
//!
//! Implements group listing/creation, label association, and the
//! find-or-create lookup used by guest creation and import

use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, response::Json};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

use crate::entity::{group, group_label, guest, label};
use crate::error::{is_unique_violation, AppError, AppResult, DbResultExt, OptionExt};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::handlers::SuccessResponse;
use crate::state::AppState;
use crate::validate;

/// Create group request
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: Option<String>,
}

/// Group with its guest count and labels
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    #[serde(flatten)]
    pub group: group::Model,
    pub guest_count: i64,
    pub labels: Vec<label::Model>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLabelRequest {
    pub label_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelIdQuery {
    pub label_id: Option<i64>,
}

/// Association with the attached label
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupLabelResponse {
    #[serde(flatten)]
    pub group_label: group_label::Model,
    pub label: label::Model,
}

/// Case-insensitive lookup by name
pub async fn find_group_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> AppResult<Option<group::Model>> {
    group::Entity::find()
        .filter(group::Column::NameKey.eq(validate::name_key(name)))
        .one(db)
        .await
        .or_internal("Failed to look up group")
}

/// Resolve a group by name case-insensitively, creating it with `name` as
/// given when none exists. A concurrent insert of the same name is resolved
/// by re-reading.
pub async fn find_or_create_group(db: &DatabaseConnection, name: &str) -> AppResult<group::Model> {
    if let Some(existing) = find_group_by_name(db, name).await? {
        return Ok(existing);
    }

    let created = group::ActiveModel {
        name: Set(name.to_string()),
        name_key: Set(validate::name_key(name)),
        is_predefined: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await;

    match created {
        Ok(group) => {
            tracing::info!("Created group: {}", group.name);
            Ok(group)
        }
        Err(e) if is_unique_violation(&e) => {
            tracing::debug!("Group {} created concurrently, re-reading", name);
            find_group_by_name(db, name)
                .await?
                .ok_or_else(|| AppError::internal("Failed to create group", e))
        }
        Err(e) => Err(AppError::internal("Failed to create group", e)),
    }
}

/// GET /api/groups
pub async fn list_groups(State(state): State<AppState>) -> AppResult<Json<Vec<GroupSummary>>> {
    let db = &state.db;

    let groups = group::Entity::find()
        .order_by_asc(group::Column::Name)
        .all(db)
        .await
        .or_internal("Failed to fetch groups")?;

    let guest_counts: HashMap<i64, i64> = guest::Entity::find()
        .select_only()
        .column(guest::Column::GroupId)
        .column_as(Expr::col(guest::Column::Id).count(), "guest_count")
        .group_by(guest::Column::GroupId)
        .into_tuple::<(i64, i64)>()
        .all(db)
        .await
        .or_internal("Failed to fetch groups")?
        .into_iter()
        .collect();

    let mut labels_by_group: HashMap<i64, Vec<label::Model>> = HashMap::new();
    let links = group_label::Entity::find()
        .find_also_related(label::Entity)
        .order_by_asc(group_label::Column::Id)
        .all(db)
        .await
        .or_internal("Failed to fetch groups")?;
    for (link, label) in links {
        if let Some(label) = label {
            labels_by_group.entry(link.group_id).or_default().push(label);
        }
    }

    let summaries = groups
        .into_iter()
        .map(|g| GroupSummary {
            guest_count: guest_counts.get(&g.id).copied().unwrap_or(0),
            labels: labels_by_group.remove(&g.id).unwrap_or_default(),
            group: g,
        })
        .collect();

    Ok(Json(summaries))
}

/// POST /api/groups
pub async fn create_group(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateGroupRequest>,
) -> AppResult<(StatusCode, Json<group::Model>)> {
    let db = &state.db;
    let name = validate::required(req.name.as_deref(), "Group name is required")?;

    if find_group_by_name(db, &name).await?.is_some() {
        return Err(AppError::Conflict("Group with this name already exists".to_string()));
    }

    let group = group::ActiveModel {
        name_key: Set(validate::name_key(&name)),
        name: Set(name),
        is_predefined: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .on_conflict("Group with this name already exists", "Failed to create group")?;

    tracing::info!("Created group: {}", group.name);
    Ok((StatusCode::CREATED, Json(group)))
}

/// POST /api/groups/:id/labels
pub async fn add_label_to_group(
    State(state): State<AppState>,
    ApiPath(group_id): ApiPath<i64>,
    ApiJson(req): ApiJson<AddLabelRequest>,
) -> AppResult<(StatusCode, Json<GroupLabelResponse>)> {
    let db = &state.db;
    let label_id = req
        .label_id
        .ok_or_else(|| AppError::BadRequest("Label ID is required".to_string()))?;

    group::Entity::find_by_id(group_id)
        .one(db)
        .await
        .or_internal("Failed to add label to group")?
        .ok_or_not_found("Group not found")?;

    let label = label::Entity::find_by_id(label_id)
        .one(db)
        .await
        .or_internal("Failed to add label to group")?
        .ok_or_not_found("Label not found")?;

    let existing = group_label::Entity::find()
        .filter(group_label::Column::GroupId.eq(group_id))
        .filter(group_label::Column::LabelId.eq(label_id))
        .one(db)
        .await
        .or_internal("Failed to add label to group")?;
    if existing.is_some() {
        return Err(AppError::Conflict("Label is already added to this group".to_string()));
    }

    let group_label = group_label::ActiveModel {
        group_id: Set(group_id),
        label_id: Set(label_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .on_conflict("Label is already added to this group", "Failed to add label to group")?;

    Ok((StatusCode::CREATED, Json(GroupLabelResponse { group_label, label })))
}

/// DELETE /api/groups/:id/labels?labelId=
pub async fn remove_label_from_group(
    State(state): State<AppState>,
    ApiPath(group_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<LabelIdQuery>,
) -> AppResult<Json<SuccessResponse>> {
    let label_id = query
        .label_id
        .ok_or_else(|| AppError::BadRequest("Label ID is required".to_string()))?;

    let result = group_label::Entity::delete_many()
        .filter(group_label::Column::GroupId.eq(group_id))
        .filter(group_label::Column::LabelId.eq(label_id))
        .exec(&state.db)
        .await
        .or_internal("Failed to remove label from group")?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Label not found on this group".to_string()));
    }

    Ok(Json(SuccessResponse::ok()))
}
