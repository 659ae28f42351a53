//! Request handlers module

use serde::Serialize;

pub mod dashboard;
pub mod expense;
pub mod function;
pub mod group;
pub mod guest;
pub mod import;
pub mod invite;
pub mod label;
pub mod search;

/// Body of successful deletes
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
