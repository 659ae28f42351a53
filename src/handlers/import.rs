//! Spreadsheet import handler
//!
//! Accepts a multipart upload with `file` and `groupName` and creates one
//! guest per data row in that group. Row failures are collected and reported
//! without stopping the import.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::{ActiveModelTrait, Set};
use serde::Serialize;

use crate::entity::{group, guest};
use crate::error::{is_unique_violation, AppError, AppResult, DbResultExt};
use crate::handlers::group::find_or_create_group;
use crate::handlers::guest::guest_name_taken;
use crate::spreadsheet::{self, GuestRow, SheetFormat};
use crate::state::AppState;
use crate::validate;

/// Import outcome
#[derive(Debug, Default, Serialize)]
pub struct ImportResult {
    pub success: u32,
    pub failed: u32,
    pub errors: Vec<String>,
}

struct UploadedFile {
    file_name: String,
    content_type: Option<String>,
    data: Vec<u8>,
}

fn too_large(max_size: usize) -> AppError {
    AppError::BadRequest(format!(
        "File size exceeds {}MB limit",
        max_size / (1024 * 1024)
    ))
}

fn multipart_error(err: axum::extract::multipart::MultipartError, max_size: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_size)
    } else {
        AppError::from(err)
    }
}

/// POST /api/import/guests
pub async fn import_guests(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ImportResult>> {
    let limits = &state.config.import;
    let max_size = limits.max_file_size;

    let mut file: Option<UploadedFile> = None;
    let mut group_name: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_size))?
    {
        let name = field.name().unwrap_or("").to_string();
        tracing::debug!("Parsing field: {}", name);

        match name.as_str() {
            "groupName" => {
                group_name = Some(field.text().await.map_err(|e| multipart_error(e, max_size))?);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(str::to_string);

                let mut data = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| multipart_error(e, max_size))?
                {
                    if data.len() + chunk.len() > max_size {
                        tracing::warn!("Import rejected: {} exceeds {} bytes", file_name, max_size);
                        return Err(too_large(max_size));
                    }
                    data.extend_from_slice(&chunk);
                }

                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    let group_name = group_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("Group name is required".to_string()))?;

    let format = SheetFormat::from_file_name(&file.file_name).ok_or_else(|| {
        AppError::BadRequest("Invalid file type. Allowed: xlsx, xls, csv".to_string())
    })?;
    if let Some(content_type) = &file.content_type {
        if !format.accepts_content_type(content_type) {
            return Err(AppError::BadRequest(format!(
                "Invalid file type: {}",
                content_type
            )));
        }
    }

    let rows = tokio::task::spawn_blocking(move || {
        spreadsheet::read_cells(format, &file.data).map(spreadsheet::guest_rows)
    })
    .await
    .map_err(|e| AppError::internal("Failed to import guests", e))?
    .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if rows.len() > limits.max_rows {
        return Err(AppError::BadRequest(format!(
            "Too many rows: {} (maximum {})",
            rows.len(),
            limits.max_rows
        )));
    }

    let group = find_or_create_group(&state.db, &group_name).await?;
    let mut result = import_rows(&state, &group, &rows).await;

    tracing::info!(
        "Imported {} guests into {} ({} failed)",
        result.success,
        group.name,
        result.failed
    );

    result.errors.truncate(limits.max_errors);
    Ok(Json(result))
}

async fn import_rows(state: &AppState, group: &group::Model, rows: &[GuestRow]) -> ImportResult {
    let production = state.config.is_production();
    let mut result = ImportResult::default();

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 2;
        match import_row(state, group, row).await {
            Ok(()) => result.success += 1,
            Err(e) => {
                result.failed += 1;
                result
                    .errors
                    .push(format!("Row {}: {}", row_number, e.public_message(production)));
            }
        }
    }

    result
}

async fn import_row(state: &AppState, group: &group::Model, row: &GuestRow) -> AppResult<()> {
    let name = row
        .name
        .clone()
        .ok_or_else(|| AppError::BadRequest("Skipped - blank name".to_string()))?;

    let duplicate = || AppError::Conflict(format!("Guest \"{}\" already exists", name));

    if guest_name_taken(&state.db, &name)
        .await
        .or_internal("Failed to create guest")?
    {
        return Err(duplicate());
    }

    guest::ActiveModel {
        name_key: Set(validate::name_key(&name)),
        name: Set(name.clone()),
        ladies: Set(row.ladies),
        gents: Set(row.gents),
        children: Set(row.children),
        notes: Set(None),
        group_id: Set(group.id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            duplicate()
        } else {
            AppError::internal("Failed to create guest", e)
        }
    })?;

    Ok(())
}
