//! Function entity - wedding events guests are invited to
//!
//! Table: wed_function

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wed_function")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "String(Some(128))")]
    pub name: String,

    /// Free-form kind of event (mehndi, reception, ...)
    #[sea_orm(column_name = "type", column_type = "String(Some(64))", nullable)]
    #[serde(rename = "type")]
    pub kind: Option<String>,

    pub date: Option<DateTimeUtc>,

    #[sea_orm(column_type = "String(Some(255))", nullable)]
    pub venue: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
