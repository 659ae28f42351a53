//! Request field validation and normalization shared by the handlers

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::sea_query::{Expr, LikeExpr, SimpleExpr};
use sea_orm::ColumnTrait;
use serde::{Deserialize, Deserializer};

use crate::error::{AppError, AppResult};

/// Trimmed, non-empty value or `BadRequest(msg)`
pub fn required(value: Option<&str>, msg: &str) -> AppResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::BadRequest(msg.to_string())),
    }
}

/// Trimmed value, with empty strings collapsed to `None`
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A headcount; absent means zero, negative is rejected
pub fn count(value: Option<i32>, field: &str) -> AppResult<i32> {
    match value {
        None => Ok(0),
        Some(v) if v >= 0 => Ok(v),
        Some(_) => Err(AppError::BadRequest(format!("{} cannot be negative", field))),
    }
}

/// Positive, finite JSON number
pub fn amount(value: Option<&serde_json::Value>) -> AppResult<f64> {
    value
        .and_then(serde_json::Value::as_f64)
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| AppError::BadRequest("Amount must be a positive number".to_string()))
}

/// Parse an ISO date (`2025-12-20`), local datetime (`2025-12-20T18:30`) or RFC 3339 string
pub fn parse_date(value: &str) -> AppResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc());
        }
    }
    Err(AppError::BadRequest(format!("Invalid date: {}", value)))
}

/// Case-folded form of a name, as stored in the `name_key` columns
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// `key_column LIKE %name_key(query)%`, with LIKE wildcards in `query` escaped
pub fn key_contains<C: ColumnTrait>(key_column: C, query: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&name_key(query)));
    Expr::col(key_column).like(LikeExpr::new(pattern).escape('\\'))
}

fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Distinguishes an absent field (`None`) from an explicit null (`Some(None)`).
/// Use with `#[serde(default, deserialize_with = "...")]`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_required() {
        assert_eq!(required(Some("  Jane Doe "), "x").unwrap(), "Jane Doe");
        assert!(matches!(required(Some("   "), "x"), Err(AppError::BadRequest(_))));
        assert!(matches!(required(None, "x"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_optional() {
        assert_eq!(optional(Some(" Hall A ".into())), Some("Hall A".into()));
        assert_eq!(optional(Some("  ".into())), None);
        assert_eq!(optional(None), None);
    }

    #[test]
    fn test_count() {
        assert_eq!(count(None, "ladiesInvited").unwrap(), 0);
        assert_eq!(count(Some(3), "ladiesInvited").unwrap(), 3);
        assert!(count(Some(-1), "ladiesInvited").is_err());
    }

    #[test]
    fn test_amount() {
        assert_eq!(amount(Some(&json!(12.5))).unwrap(), 12.5);
        assert_eq!(amount(Some(&json!(300))).unwrap(), 300.0);
        assert!(amount(Some(&json!(0))).is_err());
        assert!(amount(Some(&json!(-4))).is_err());
        assert!(amount(Some(&json!("12"))).is_err());
        assert!(amount(None).is_err());
    }

    #[test]
    fn test_parse_date() {
        let d = parse_date("2025-12-20").unwrap();
        assert_eq!((d.year(), d.month(), d.day(), d.hour()), (2025, 12, 20, 0));

        let d = parse_date("2025-12-20T18:30").unwrap();
        assert_eq!((d.hour(), d.minute()), (18, 30));

        let d = parse_date("2025-12-20T18:30:00+05:30").unwrap();
        assert_eq!((d.hour(), d.minute()), (13, 0));

        assert!(parse_date("next friday").is_err());
    }

    #[test]
    fn test_name_key_folds_unicode() {
        assert_eq!(name_key("  ÉMILE Dupont "), "émile dupont");
        assert_eq!(name_key("émile dupont"), name_key("Émile DUPONT"));
        assert_eq!(name_key("ZOË"), "zoë");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("jane"), "jane");
    }

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        venue: Option<Option<String>>,
    }

    #[test]
    fn test_double_option() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.venue, None);
        let null: Patch = serde_json::from_str(r#"{"venue":null}"#).unwrap();
        assert_eq!(null.venue, Some(None));
        let set: Patch = serde_json::from_str(r#"{"venue":"Lawn"}"#).unwrap();
        assert_eq!(set.venue, Some(Some("Lawn".into())));
    }
}
