//! Guest search handler
//!
//! Resolves a free-text query to one guest and builds that guest's
//! per-function overview of invites and RSVPs.

use std::collections::HashMap;

use axum::{extract::State, response::Json};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};

use crate::entity::{function, guest, invite, rsvp};
use crate::error::{AppError, AppResult, DbResultExt};
use crate::extract::ApiQuery;
use crate::handlers::function::order_functions;
use crate::state::AppState;
use crate::validate;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Guest fields shown in search results
#[derive(Debug, Serialize)]
pub struct GuestBrief {
    pub id: i64,
    pub name: String,
    pub ladies: i32,
    pub gents: i32,
    pub children: i32,
}

impl From<guest::Model> for GuestBrief {
    fn from(g: guest::Model) -> Self {
        Self {
            id: g.id,
            name: g.name,
            ladies: g.ladies,
            gents: g.gents,
            children: g.children,
        }
    }
}

/// Invite and RSVP state of the guest for one function
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionOverview {
    pub function_id: i64,
    pub function_name: String,
    pub invited: bool,
    pub ladies_invited: i32,
    pub gents_invited: i32,
    pub children_invited: i32,
    pub rsvp_received: bool,
    pub ladies_final: i32,
    pub gents_final: i32,
    pub children_final: i32,
    pub rsvp_notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpNote {
    pub function_name: String,
    pub notes: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestOverview {
    pub guest: GuestBrief,
    pub function_overview: Vec<FunctionOverview>,
    #[serde(rename = "hasRSVP")]
    pub has_rsvp: bool,
    #[serde(rename = "allRSVPNotes")]
    pub all_rsvp_notes: Vec<RsvpNote>,
}

#[derive(Debug, Serialize)]
pub struct NotFound {
    pub guest: Option<GuestBrief>,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SearchResponse {
    Found(GuestOverview),
    NotFound(NotFound),
}

/// Exact case-insensitive name match, else the first substring match by name
pub async fn find_best_match(
    db: &DatabaseConnection,
    query: &str,
) -> Result<Option<guest::Model>, DbErr> {
    let exact = guest::Entity::find()
        .filter(guest::Column::NameKey.eq(validate::name_key(query)))
        .one(db)
        .await?;
    if exact.is_some() {
        return Ok(exact);
    }

    guest::Entity::find()
        .filter(validate::key_contains(guest::Column::NameKey, query))
        .order_by_asc(guest::Column::Name)
        .order_by_asc(guest::Column::Id)
        .one(db)
        .await
}

/// GET /api/search/guests?q=
pub async fn search_guests(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    let db = &state.db;

    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("Query parameter required".to_string()))?;

    let Some(guest) = find_best_match(db, q)
        .await
        .or_internal("Failed to search guest")?
    else {
        return Ok(Json(SearchResponse::NotFound(NotFound {
            guest: None,
            message: "Guest not found".to_string(),
        })));
    };

    let mut functions = function::Entity::find()
        .all(db)
        .await
        .or_internal("Failed to search guest")?;
    order_functions(&mut functions);

    let invites: HashMap<i64, invite::Model> = invite::Entity::find()
        .filter(invite::Column::GuestId.eq(guest.id))
        .all(db)
        .await
        .or_internal("Failed to search guest")?
        .into_iter()
        .map(|i| (i.function_id, i))
        .collect();

    let rsvps = rsvp::Entity::find()
        .filter(rsvp::Column::GuestId.eq(guest.id))
        .find_also_related(function::Entity)
        .all(db)
        .await
        .or_internal("Failed to search guest")?;

    let overview = build_overview(guest, &functions, &invites, rsvps);
    Ok(Json(SearchResponse::Found(overview)))
}

fn build_overview(
    guest: guest::Model,
    functions: &[function::Model],
    invites: &HashMap<i64, invite::Model>,
    rsvps: Vec<(rsvp::Model, Option<function::Model>)>,
) -> GuestOverview {
    let has_rsvp = !rsvps.is_empty();

    let all_rsvp_notes = rsvps
        .iter()
        .filter_map(|(r, f)| {
            let notes = r.notes.clone().filter(|n| !n.is_empty())?;
            Some(RsvpNote {
                function_name: f.as_ref().map(|f| f.name.clone()).unwrap_or_default(),
                notes,
            })
        })
        .collect();

    let rsvp_map: HashMap<i64, rsvp::Model> =
        rsvps.into_iter().map(|(r, _)| (r.function_id, r)).collect();

    let function_overview = functions
        .iter()
        .map(|func| {
            let invite = invites.get(&func.id);
            let rsvp = rsvp_map.get(&func.id);
            FunctionOverview {
                function_id: func.id,
                function_name: func.name.clone(),
                invited: invite.is_some(),
                ladies_invited: invite.map_or(0, |i| i.ladies_invited),
                gents_invited: invite.map_or(0, |i| i.gents_invited),
                children_invited: invite.map_or(0, |i| i.children_invited),
                rsvp_received: rsvp.is_some(),
                ladies_final: rsvp.map_or(0, |r| r.ladies_final),
                gents_final: rsvp.map_or(0, |r| r.gents_final),
                children_final: rsvp.map_or(0, |r| r.children_final),
                rsvp_notes: rsvp.and_then(|r| r.notes.clone()).filter(|n| !n.is_empty()),
            }
        })
        .collect();

    GuestOverview {
        guest: guest.into(),
        function_overview,
        has_rsvp,
        all_rsvp_notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest() -> guest::Model {
        guest::Model {
            id: 7,
            name: "Jane Doe".into(),
            name_key: "jane doe".into(),
            ladies: 2,
            gents: 1,
            children: 0,
            notes: None,
            group_id: 1,
            created_at: chrono::Utc::now(),
        }
    }

    fn func(id: i64, name: &str) -> function::Model {
        function::Model {
            id,
            name: name.into(),
            kind: None,
            date: None,
            venue: None,
        }
    }

    #[test]
    fn test_overview_defaults_for_uninvited_functions() {
        let functions = vec![func(1, "Mehndi"), func(2, "Walima")];
        let mut invites = HashMap::new();
        invites.insert(
            1,
            invite::Model {
                id: 3,
                guest_id: 7,
                function_id: 1,
                ladies_invited: 2,
                gents_invited: 1,
                children_invited: 0,
            },
        );
        let rsvps = vec![(
            rsvp::Model {
                id: 4,
                guest_id: 7,
                function_id: 1,
                ladies_final: 1,
                gents_final: 1,
                children_final: 0,
                notes: Some("Arriving late".into()),
            },
            Some(func(1, "Mehndi")),
        )];

        let overview = build_overview(guest(), &functions, &invites, rsvps);
        assert!(overview.has_rsvp);
        assert_eq!(overview.all_rsvp_notes.len(), 1);
        assert_eq!(overview.all_rsvp_notes[0].function_name, "Mehndi");

        let mehndi = &overview.function_overview[0];
        assert!(mehndi.invited && mehndi.rsvp_received);
        assert_eq!(mehndi.ladies_invited, 2);
        assert_eq!(mehndi.rsvp_notes.as_deref(), Some("Arriving late"));

        let walima = &overview.function_overview[1];
        assert!(!walima.invited && !walima.rsvp_received);
        assert_eq!(walima.children_final, 0);
        assert_eq!(walima.rsvp_notes, None);
    }

    #[test]
    fn test_response_shape() {
        let not_found = SearchResponse::NotFound(NotFound {
            guest: None,
            message: "Guest not found".into(),
        });
        let value = serde_json::to_value(not_found).unwrap();
        assert!(value["guest"].is_null());
        assert_eq!(value["message"], "Guest not found");

        let found = build_overview(guest(), &[], &HashMap::new(), Vec::new());
        let value = serde_json::to_value(SearchResponse::Found(found)).unwrap();
        assert_eq!(value["guest"]["name"], "Jane Doe");
        assert_eq!(value["hasRSVP"], false);
        assert!(value["allRSVPNotes"].as_array().unwrap().is_empty());
        assert!(value.get("notes").is_none());
    }
}
