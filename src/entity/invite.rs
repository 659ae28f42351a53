//! Invite entity - planned headcount per guest per function
//!
//! Table: wed_invite, unique on (guest_id, function_id)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Headcount category a client can increment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Ladies,
    Gents,
    Children,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Ladies => "ladies",
            Category::Gents => "gents",
            Category::Children => "children",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ladies" => Some(Category::Ladies),
            "gents" => Some(Category::Gents),
            "children" => Some(Category::Children),
            _ => None,
        }
    }
}

/// The three invited counts of one invite
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InviteCounts {
    pub ladies: i32,
    pub gents: i32,
    pub children: i32,
}

impl InviteCounts {
    /// Adds one to `category`. Returns false, leaving the counts untouched,
    /// when that count is already at `i32::MAX`.
    pub fn increment(&mut self, category: Category) -> bool {
        let count = match category {
            Category::Ladies => &mut self.ladies,
            Category::Gents => &mut self.gents,
            Category::Children => &mut self.children,
        };
        match count.checked_add(1) {
            Some(next) => {
                *count = next;
                true
            }
            None => false,
        }
    }

    /// Removes one from children, else gents, else ladies.
    ///
    /// The order is fixed and does not depend on which category was last
    /// incremented. Returns the category decremented, or `None` when all
    /// three are zero (counts untouched).
    pub fn decrement(&mut self) -> Option<Category> {
        if self.children > 0 {
            self.children -= 1;
            Some(Category::Children)
        } else if self.gents > 0 {
            self.gents -= 1;
            Some(Category::Gents)
        } else if self.ladies > 0 {
            self.ladies -= 1;
            Some(Category::Ladies)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wed_invite")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub guest_id: i64,

    pub function_id: i64,

    pub ladies_invited: i32,

    pub gents_invited: i32,

    pub children_invited: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::guest::Entity",
        from = "Column::GuestId",
        to = "super::guest::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Guest,
    #[sea_orm(
        belongs_to = "super::function::Entity",
        from = "Column::FunctionId",
        to = "super::function::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Function,
}

impl Related<super::guest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Guest.def()
    }
}

impl Related<super::function::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Function.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn counts(&self) -> InviteCounts {
        InviteCounts {
            ladies: self.ladies_invited,
            gents: self.gents_invited,
            children: self.children_invited,
        }
    }
}

/// Invite with its guest and function (API response)
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteDetail {
    #[serde(flatten)]
    pub invite: Model,
    pub guest: Option<super::guest::Model>,
    pub function: Option<super::function::Model>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("children"), Some(Category::Children));
        assert_eq!(Category::parse("Children"), None);
        assert_eq!(Category::parse(""), None);
        assert_eq!(Category::Gents.as_str(), "gents");
    }

    #[test]
    fn test_increment_touches_one_category() {
        let mut counts = InviteCounts::default();
        assert!(counts.increment(Category::Children));
        assert_eq!(
            counts,
            InviteCounts {
                ladies: 0,
                gents: 0,
                children: 1
            }
        );
    }

    #[test]
    fn test_decrement_order_children_gents_ladies() {
        let mut counts = InviteCounts {
            ladies: 1,
            gents: 1,
            children: 2,
        };
        assert_eq!(counts.decrement(), Some(Category::Children));
        assert_eq!(counts.decrement(), Some(Category::Children));
        assert_eq!(counts.decrement(), Some(Category::Gents));
        assert_eq!(counts.decrement(), Some(Category::Ladies));
        assert_eq!(counts, InviteCounts::default());
    }

    #[test]
    fn test_decrement_ignores_last_increment() {
        let mut counts = InviteCounts {
            ladies: 0,
            gents: 0,
            children: 1,
        };
        assert!(counts.increment(Category::Ladies));
        assert_eq!(counts.decrement(), Some(Category::Children));
        assert_eq!(counts.ladies, 1);
    }

    #[test]
    fn test_increment_stops_at_max() {
        let mut counts = InviteCounts {
            ladies: i32::MAX,
            gents: 0,
            children: 0,
        };
        assert!(!counts.increment(Category::Ladies));
        assert_eq!(counts.ladies, i32::MAX);
        assert!(counts.increment(Category::Gents));
        assert_eq!(counts.gents, 1);
    }

    #[test]
    fn test_decrement_at_zero() {
        let mut counts = InviteCounts::default();
        assert_eq!(counts.decrement(), None);
        assert_eq!(counts, InviteCounts::default());
    }
}
