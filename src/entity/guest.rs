//! Guest entity - invitees with their headcounts
//!
//! Table: wed_guest

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wed_guest")]
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

    pub ladies: i32,

    pub gents: i32,

    pub children: i32,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    pub group_id: i64,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Group,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Guest with its group (API response)
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestWithGroup {
    #[serde(flatten)]
    pub guest: Model,
    pub group: Option<super::group::Model>,
}
