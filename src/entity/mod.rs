//! Entity module - SeaORM entity definitions
//!
//! One module per table; cross-table lookups are done with explicit queries
//! except where a `Related` impl is declared.

pub mod expense;
pub mod function;
pub mod group;
pub mod group_label;
pub mod guest;
pub mod invite;
pub mod label;
pub mod rsvp;
pub mod user;
