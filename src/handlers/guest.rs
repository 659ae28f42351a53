//! Guest handlers
//!
//! Implements guest listing, creation (with initial invites) and deletion

use axum::{extract::State, http::StatusCode, response::Json};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entity::group::DEFAULT_GROUP;
use crate::entity::guest::GuestWithGroup;
use crate::entity::{function, group, guest, invite, rsvp};
use crate::error::{AppError, AppResult, DbResultExt, OptionExt};
use crate::extract::{ApiJson, ApiPath};
use crate::handlers::group::find_or_create_group;
use crate::handlers::SuccessResponse;
use crate::state::AppState;
use crate::validate;

const DUPLICATE_GUEST: &str = "Guest with this name already exists";

/// Create guest request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGuestRequest {
    pub name: Option<String>,
    pub group_id: Option<i64>,
    pub ladies: Option<i32>,
    pub gents: Option<i32>,
    pub children: Option<i32>,
    pub notes: Option<String>,
    /// Invites created together with the guest
    pub function_invites: Option<Vec<FunctionInviteInput>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInviteInput {
    pub function_id: i64,
    pub ladies_invited: Option<i32>,
    pub gents_invited: Option<i32>,
    pub children_invited: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAllResponse {
    pub success: bool,
    pub deleted_count: u64,
}

/// Case-insensitive duplicate check
pub async fn guest_name_taken(db: &DatabaseConnection, name: &str) -> Result<bool, DbErr> {
    let existing = guest::Entity::find()
        .filter(guest::Column::NameKey.eq(validate::name_key(name)))
        .one(db)
        .await?;
    Ok(existing.is_some())
}

/// GET /api/guests
pub async fn list_guests(State(state): State<AppState>) -> AppResult<Json<Vec<GuestWithGroup>>> {
    let guests = guest::Entity::find()
        .find_also_related(group::Entity)
        .order_by_asc(guest::Column::Name)
        .all(&state.db)
        .await
        .or_internal("Failed to fetch guests")?;

    Ok(Json(
        guests
            .into_iter()
            .map(|(guest, group)| GuestWithGroup { guest, group })
            .collect(),
    ))
}

/// POST /api/guests
pub async fn create_guest(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateGuestRequest>,
) -> AppResult<(StatusCode, Json<GuestWithGroup>)> {
    let db = &state.db;

    let name = validate::required(req.name.as_deref(), "Guest name is required")?;
    let ladies = validate::count(req.ladies, "ladies")?;
    let gents = validate::count(req.gents, "gents")?;
    let children = validate::count(req.children, "children")?;

    if guest_name_taken(db, &name).await.or_internal("Failed to create guest")? {
        return Err(AppError::Conflict(DUPLICATE_GUEST.to_string()));
    }

    let group = match req.group_id {
        Some(group_id) => group::Entity::find_by_id(group_id)
            .one(db)
            .await
            .or_internal("Failed to create guest")?
            .ok_or_not_found("Group not found")?,
        None => find_or_create_group(db, DEFAULT_GROUP).await?,
    };

    let guest = guest::ActiveModel {
        name_key: Set(validate::name_key(&name)),
        name: Set(name),
        ladies: Set(ladies),
        gents: Set(gents),
        children: Set(children),
        notes: Set(validate::optional(req.notes)),
        group_id: Set(group.id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .on_conflict(DUPLICATE_GUEST, "Failed to create guest")?;

    // A failed invite does not undo the guest
    for input in req.function_invites.unwrap_or_default() {
        match create_initial_invite(db, guest.id, &input).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!(
                "Skipped invite of guest {} to function {}",
                guest.id,
                input.function_id
            ),
            Err(e) => tracing::warn!(
                "Failed to invite guest {} to function {}: {}",
                guest.id,
                input.function_id,
                e
            ),
        }
    }

    tracing::info!("Created guest {} in group {}", guest.name, group.name);
    Ok((
        StatusCode::CREATED,
        Json(GuestWithGroup {
            guest,
            group: Some(group),
        }),
    ))
}

/// Returns false when the function is unknown or the pair already has an invite
async fn create_initial_invite(
    db: &DatabaseConnection,
    guest_id: i64,
    input: &FunctionInviteInput,
) -> Result<bool, DbErr> {
    let function = function::Entity::find_by_id(input.function_id).one(db).await?;
    if function.is_none() {
        return Ok(false);
    }

    let existing = invite::Entity::find()
        .filter(invite::Column::GuestId.eq(guest_id))
        .filter(invite::Column::FunctionId.eq(input.function_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    invite::ActiveModel {
        guest_id: Set(guest_id),
        function_id: Set(input.function_id),
        ladies_invited: Set(input.ladies_invited.unwrap_or(0).max(0)),
        gents_invited: Set(input.gents_invited.unwrap_or(0).max(0)),
        children_invited: Set(input.children_invited.unwrap_or(0).max(0)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(true)
}

/// DELETE /api/guests/:id
pub async fn delete_guest(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<SuccessResponse>> {
    let db = &state.db;

    let guest = guest::Entity::find_by_id(id)
        .one(db)
        .await
        .or_internal("Failed to delete guest")?
        .ok_or_not_found("Guest not found")?;

    db.transaction::<_, (), DbErr>(|txn| {
        Box::pin(async move {
            invite::Entity::delete_many()
                .filter(invite::Column::GuestId.eq(id))
                .exec(txn)
                .await?;
            rsvp::Entity::delete_many()
                .filter(rsvp::Column::GuestId.eq(id))
                .exec(txn)
                .await?;
            guest::Entity::delete_by_id(id).exec(txn).await?;
            Ok(())
        })
    })
    .await
    .map_err(|e| AppError::internal("Failed to delete guest", e))?;

    tracing::info!("Deleted guest: {}", guest.name);
    Ok(Json(SuccessResponse::ok()))
}

/// DELETE /api/guests
pub async fn delete_all_guests(
    State(state): State<AppState>,
) -> AppResult<Json<DeleteAllResponse>> {
    let deleted = state
        .db
        .transaction::<_, u64, DbErr>(|txn| {
            Box::pin(async move {
                invite::Entity::delete_many().exec(txn).await?;
                rsvp::Entity::delete_many().exec(txn).await?;
                let result = guest::Entity::delete_many().exec(txn).await?;
                Ok(result.rows_affected)
            })
        })
        .await
        .map_err(|e| AppError::internal("Failed to delete all guests", e))?;

    tracing::info!("Deleted all guests ({})", deleted);
    Ok(Json(DeleteAllResponse {
        success: true,
        deleted_count: deleted,
    }))
}
