//! Dashboard totals

use axum::{extract::State, response::Json};
use sea_orm::sea_query::Expr;
use sea_orm::{EntityTrait, PaginatorTrait, QuerySelect};
use serde::Serialize;

use crate::entity::{expense, function, guest, rsvp};
use crate::error::{AppResult, DbResultExt};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_guests: u64,
    pub total_functions: u64,
    /// Sum of all expense amounts
    pub total_expenses: f64,
    pub total_rsvps: u64,
}

/// GET /api/dashboard
pub async fn get_dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    let db = &state.db;
    let failure = "Failed to fetch dashboard";

    let total_guests = guest::Entity::find().count(db).await.or_internal(failure)?;
    let total_functions = function::Entity::find()
        .count(db)
        .await
        .or_internal(failure)?;
    let total_rsvps = rsvp::Entity::find().count(db).await.or_internal(failure)?;

    let total_expenses: Option<f64> = expense::Entity::find()
        .select_only()
        .column_as(Expr::col(expense::Column::Amount).sum(), "total")
        .into_tuple::<Option<f64>>()
        .one(db)
        .await
        .or_internal(failure)?
        .flatten();

    Ok(Json(DashboardStats {
        total_guests,
        total_functions,
        total_expenses: total_expenses.unwrap_or(0.0),
        total_rsvps,
    }))
}
