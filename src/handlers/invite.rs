//! Invite handlers
//!
//! Per-guest-per-function invite counts: upsert by pair, direct update and
//! delete scoped to a function, and one-step increment/decrement

use axum::{extract::State, http::StatusCode, response::Json};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;

use crate::entity::invite::{Category, InviteCounts, InviteDetail};
use crate::entity::{function, guest, invite};
use crate::error::{is_unique_violation, AppError, AppResult, DbResultExt, OptionExt};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::handlers::SuccessResponse;
use crate::state::AppState;
use crate::validate;

/// The three counts as sent by clients; absent means zero
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountsInput {
    pub ladies_invited: Option<i32>,
    pub gents_invited: Option<i32>,
    pub children_invited: Option<i32>,
}

impl CountsInput {
    pub fn validate(&self) -> AppResult<InviteCounts> {
        Ok(InviteCounts {
            ladies: validate::count(self.ladies_invited, "ladiesInvited")?,
            gents: validate::count(self.gents_invited, "gentsInvited")?,
            children: validate::count(self.children_invited, "childrenInvited")?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertInviteRequest {
    pub guest_id: Option<i64>,
    #[serde(flatten)]
    pub counts: CountsInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInviteRequest {
    pub invite_id: Option<i64>,
    #[serde(flatten)]
    pub counts: CountsInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteIdQuery {
    pub invite_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct IncrementRequest {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncrementGuestRequest {
    pub guest_id: Option<i64>,
    pub category: Option<String>,
}

fn parse_category(category: Option<&str>) -> AppResult<Category> {
    category.and_then(Category::parse).ok_or_else(|| {
        AppError::BadRequest("Invalid category. Must be ladies, gents, or children".to_string())
    })
}

fn incremented(mut counts: InviteCounts, category: Category) -> AppResult<InviteCounts> {
    if !counts.increment(category) {
        return Err(AppError::BadRequest("Count limit reached".to_string()));
    }
    Ok(counts)
}

async fn find_function(db: &DatabaseConnection, id: i64) -> AppResult<function::Model> {
    function::Entity::find_by_id(id)
        .one(db)
        .await
        .or_internal("Failed to fetch function")?
        .ok_or_not_found("Function not found")
}

async fn find_guest(db: &DatabaseConnection, id: i64) -> AppResult<guest::Model> {
    guest::Entity::find_by_id(id)
        .one(db)
        .await
        .or_internal("Failed to fetch guest")?
        .ok_or_not_found("Guest not found")
}

async fn find_invite(db: &DatabaseConnection, id: i64) -> AppResult<invite::Model> {
    invite::Entity::find_by_id(id)
        .one(db)
        .await
        .or_internal("Failed to fetch invite")?
        .ok_or_not_found("Invite not found")
}

async fn find_pair(
    db: &DatabaseConnection,
    guest_id: i64,
    function_id: i64,
) -> AppResult<Option<invite::Model>> {
    invite::Entity::find()
        .filter(invite::Column::GuestId.eq(guest_id))
        .filter(invite::Column::FunctionId.eq(function_id))
        .one(db)
        .await
        .or_internal("Failed to fetch invite")
}

/// Inserts the pair with `counts`. `None` when another request created it first.
async fn insert_pair(
    db: &DatabaseConnection,
    guest_id: i64,
    function_id: i64,
    counts: InviteCounts,
) -> AppResult<Option<invite::Model>> {
    let created = invite::ActiveModel {
        guest_id: Set(guest_id),
        function_id: Set(function_id),
        ladies_invited: Set(counts.ladies),
        gents_invited: Set(counts.gents),
        children_invited: Set(counts.children),
        ..Default::default()
    }
    .insert(db)
    .await;

    match created {
        Ok(invite) => Ok(Some(invite)),
        Err(e) if is_unique_violation(&e) => Ok(None),
        Err(e) => Err(AppError::internal("Failed to create invite", e)),
    }
}

/// The pair's invite, inserting it with `counts` when missing.
/// The flag is true when this call created it.
async fn find_or_insert_pair(
    db: &DatabaseConnection,
    guest_id: i64,
    function_id: i64,
    counts: InviteCounts,
) -> AppResult<(invite::Model, bool)> {
    if let Some(existing) = find_pair(db, guest_id, function_id).await? {
        return Ok((existing, false));
    }
    if let Some(created) = insert_pair(db, guest_id, function_id, counts).await? {
        return Ok((created, true));
    }

    tracing::debug!(
        "Invite for guest {} and function {} created concurrently",
        guest_id,
        function_id
    );
    let existing = find_pair(db, guest_id, function_id).await?.ok_or_else(|| {
        AppError::internal("Failed to create invite", "conflicting invite not found")
    })?;
    Ok((existing, false))
}

/// Invite `id` scoped to `function_id`: 404 when missing, 403 when it belongs elsewhere
async fn find_function_invite(
    db: &DatabaseConnection,
    function_id: i64,
    invite_id: i64,
) -> AppResult<invite::Model> {
    let invite = find_invite(db, invite_id).await?;
    if invite.function_id != function_id {
        return Err(AppError::Forbidden(
            "Invite does not belong to this function".to_string(),
        ));
    }
    Ok(invite)
}

async fn write_counts(
    db: &DatabaseConnection,
    invite: invite::Model,
    counts: InviteCounts,
    failure: &str,
) -> AppResult<invite::Model> {
    let mut active: invite::ActiveModel = invite.into();
    active.ladies_invited = Set(counts.ladies);
    active.gents_invited = Set(counts.gents);
    active.children_invited = Set(counts.children);
    active.update(db).await.or_internal(failure)
}

async fn with_relations(db: &DatabaseConnection, invite: invite::Model) -> AppResult<InviteDetail> {
    let guest = guest::Entity::find_by_id(invite.guest_id)
        .one(db)
        .await
        .or_internal("Failed to fetch guest")?;
    let function = function::Entity::find_by_id(invite.function_id)
        .one(db)
        .await
        .or_internal("Failed to fetch function")?;
    Ok(InviteDetail {
        invite,
        guest,
        function,
    })
}

/// GET /api/functions/:id/invites
pub async fn list_invites(
    State(state): State<AppState>,
    ApiPath(function_id): ApiPath<i64>,
) -> AppResult<Json<Vec<InviteDetail>>> {
    let db = &state.db;
    let function = find_function(db, function_id).await?;

    let invites = invite::Entity::find()
        .filter(invite::Column::FunctionId.eq(function_id))
        .find_also_related(guest::Entity)
        .order_by_asc(invite::Column::Id)
        .all(db)
        .await
        .or_internal("Failed to fetch invites")?;

    Ok(Json(
        invites
            .into_iter()
            .map(|(invite, guest)| InviteDetail {
                invite,
                guest,
                function: Some(function.clone()),
            })
            .collect(),
    ))
}

/// POST /api/functions/:id/invites
///
/// Creates the invite for (guest, function) or replaces the counts of the
/// existing one: 201 on create, 200 on update.
pub async fn upsert_invite(
    State(state): State<AppState>,
    ApiPath(function_id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpsertInviteRequest>,
) -> AppResult<(StatusCode, Json<InviteDetail>)> {
    let db = &state.db;
    let guest_id = req
        .guest_id
        .ok_or_else(|| AppError::BadRequest("Guest ID is required".to_string()))?;
    let counts = req.counts.validate()?;

    let function = find_function(db, function_id).await?;
    let guest = find_guest(db, guest_id).await?;

    let (invite, created) = find_or_insert_pair(db, guest_id, function_id, counts).await?;
    let (status, invite) = if created {
        tracing::info!("Invited guest {} to function {}", guest.name, function.name);
        (StatusCode::CREATED, invite)
    } else {
        let updated = write_counts(db, invite, counts, "Failed to update invite").await?;
        (StatusCode::OK, updated)
    };

    Ok((
        status,
        Json(InviteDetail {
            invite,
            guest: Some(guest),
            function: Some(function),
        }),
    ))
}

/// PUT /api/functions/:id/invites
pub async fn update_invite(
    State(state): State<AppState>,
    ApiPath(function_id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateInviteRequest>,
) -> AppResult<Json<InviteDetail>> {
    let db = &state.db;
    let invite_id = req
        .invite_id
        .ok_or_else(|| AppError::BadRequest("Invite ID is required".to_string()))?;
    let counts = req.counts.validate()?;

    let invite = find_function_invite(db, function_id, invite_id).await?;
    let updated = write_counts(db, invite, counts, "Failed to update invite").await?;

    Ok(Json(with_relations(db, updated).await?))
}

/// DELETE /api/functions/:id/invites?inviteId=
pub async fn delete_invite(
    State(state): State<AppState>,
    ApiPath(function_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<InviteIdQuery>,
) -> AppResult<Json<SuccessResponse>> {
    let db = &state.db;
    let invite_id = query
        .invite_id
        .ok_or_else(|| AppError::BadRequest("Invite ID is required".to_string()))?;

    find_function_invite(db, function_id, invite_id).await?;

    invite::Entity::delete_by_id(invite_id)
        .exec(db)
        .await
        .or_internal("Failed to delete invite")?;

    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/functions/:id/invites/increment
///
/// Increments the pair's invite, creating it with zero counts first if needed.
pub async fn increment_guest_invite(
    State(state): State<AppState>,
    ApiPath(function_id): ApiPath<i64>,
    ApiJson(req): ApiJson<IncrementGuestRequest>,
) -> AppResult<Json<InviteDetail>> {
    let db = &state.db;
    let guest_id = req
        .guest_id
        .ok_or_else(|| AppError::BadRequest("Guest ID is required".to_string()))?;
    let category = parse_category(req.category.as_deref())?;

    let function = find_function(db, function_id).await?;
    let guest = find_guest(db, guest_id).await?;

    let (invite, _) =
        find_or_insert_pair(db, guest_id, function_id, InviteCounts::default()).await?;

    let counts = incremented(invite.counts(), category)?;
    let updated = write_counts(db, invite, counts, "Failed to increment count").await?;

    Ok(Json(InviteDetail {
        invite: updated,
        guest: Some(guest),
        function: Some(function),
    }))
}

/// POST /api/invites/:id/increment
pub async fn increment_invite(
    State(state): State<AppState>,
    ApiPath(invite_id): ApiPath<i64>,
    ApiJson(req): ApiJson<IncrementRequest>,
) -> AppResult<Json<InviteDetail>> {
    let db = &state.db;
    let category = parse_category(req.category.as_deref())?;

    let invite = find_invite(db, invite_id).await?;
    let counts = incremented(invite.counts(), category)?;
    let updated = write_counts(db, invite, counts, "Failed to increment count").await?;

    Ok(Json(with_relations(db, updated).await?))
}

/// DELETE /api/invites/:id/increment
///
/// Decrements children, else gents, else ladies; 400 once all are zero.
pub async fn decrement_invite(
    State(state): State<AppState>,
    ApiPath(invite_id): ApiPath<i64>,
) -> AppResult<Json<InviteDetail>> {
    let db = &state.db;

    let invite = find_invite(db, invite_id).await?;
    let mut counts = invite.counts();
    let Some(category) = counts.decrement() else {
        return Err(AppError::BadRequest("Count is already at zero".to_string()));
    };
    tracing::debug!("Decrementing {} on invite {}", category.as_str(), invite_id);

    let updated = write_counts(db, invite, counts, "Failed to decrement count").await?;

    Ok(Json(with_relations(db, updated).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::group;
    use sea_orm::{ConnectOptions, Database};

    async fn pair_db() -> (DatabaseConnection, i64, i64) {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1);
        let db = Database::connect(opt).await.unwrap();
        crate::db::auto_migrate(&db).await.unwrap();

        let group = group::ActiveModel {
            name: Set("Family".to_string()),
            name_key: Set("family".to_string()),
            is_predefined: Set(false),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        let guest = guest::ActiveModel {
            name: Set("Amina".to_string()),
            name_key: Set("amina".to_string()),
            ladies: Set(1),
            gents: Set(0),
            children: Set(0),
            notes: Set(None),
            group_id: Set(group.id),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        let function = function::ActiveModel {
            name: Set("Nikah".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        (db, guest.id, function.id)
    }

    #[tokio::test]
    async fn test_insert_pair_yields_to_existing_invite() {
        let (db, guest_id, function_id) = pair_db().await;
        let first = InviteCounts {
            ladies: 2,
            gents: 1,
            children: 0,
        };

        let created = insert_pair(&db, guest_id, function_id, first).await.unwrap();
        assert_eq!(created.unwrap().counts(), first);

        let second = insert_pair(&db, guest_id, function_id, InviteCounts::default())
            .await
            .unwrap();
        assert!(second.is_none());

        let (existing, created) =
            find_or_insert_pair(&db, guest_id, function_id, InviteCounts::default())
                .await
                .unwrap();
        assert!(!created);
        assert_eq!(existing.counts(), first);
        assert_eq!(invite::Entity::find().all(&db).await.unwrap().len(), 1);
    }

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category(Some("gents")).unwrap(), Category::Gents);
        assert!(matches!(parse_category(Some("uncles")), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_category(None), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_counts_input() {
        let input: UpsertInviteRequest =
            serde_json::from_str(r#"{"guestId": 7, "ladiesInvited": 2, "gentsInvited": 1}"#)
                .unwrap();
        assert_eq!(input.guest_id, Some(7));
        assert_eq!(
            input.counts.validate().unwrap(),
            InviteCounts {
                ladies: 2,
                gents: 1,
                children: 0
            }
        );

        let negative = CountsInput {
            children_invited: Some(-2),
            ..Default::default()
        };
        assert!(negative.validate().is_err());
    }
}
