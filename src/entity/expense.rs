//! Expense entity - recorded costs
//!
//! Table: wed_expense

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Who paid for an expense
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaidBy {
    Bride,
    Brother,
    Father,
    Mother,
}

impl PaidBy {
    pub const ALL: [PaidBy; 4] = [PaidBy::Bride, PaidBy::Brother, PaidBy::Father, PaidBy::Mother];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaidBy::Bride => "bride",
            PaidBy::Brother => "brother",
            PaidBy::Father => "father",
            PaidBy::Mother => "mother",
        }
    }

    /// Case-insensitive lookup
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wed_expense")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "String(Some(255))")]
    pub description: String,

    #[sea_orm(column_type = "Double")]
    pub amount: f64,

    /// One of the `PaidBy` roles, stored lowercase
    #[sea_orm(column_type = "String(Some(16))")]
    pub paid_by: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paid_by_parse() {
        assert_eq!(PaidBy::parse("bride"), Some(PaidBy::Bride));
        assert_eq!(PaidBy::parse("Mother"), Some(PaidBy::Mother));
        assert_eq!(PaidBy::parse("uncle"), None);
    }
}
