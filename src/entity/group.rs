//! Group entity - guest groups
//!
//! Table: wed_group

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Name of the group guests fall into when none is given
pub const DEFAULT_GROUP: &str = "General";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wed_group")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "String(Some(128))")]
    pub name: String,

    /// Case-folded `name`; uniqueness and lookups go through this column
    #[sea_orm(column_type = "String(Some(128))", unique)]
    #[serde(skip)]
    pub name_key: String,

    /// Seeded from configuration rather than created by a user
    pub is_predefined: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
