//! Input validation helpers shared by the resource handlers

use crate::error::ApiError;

/// Names of districts, cities, teams, doctors, products, banners
pub const MAX_NAME_LEN: usize = 200;

/// District codes, SKUs, MRNs
pub const MAX_CODE_LEN: usize = 64;

/// Phone numbers, gender and other short identifiers
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Notes, descriptions
pub const MAX_NOTE_LEN: usize = 2000;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;

pub const MAX_URL_LEN: usize = 2048;

pub const MAX_ADDRESS_LEN: usize = 500;

/// Present-or-400 for required body fields
pub fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::field(field, format!("{field} is required")))
}

/// Trimmed, non-empty and within `max_len`
pub fn required_text(value: &str, field: &str, max_len: usize) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::field(field, format!("{field} must not be empty")));
    }
    if trimmed.len() > max_len {
        return Err(ApiError::field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", trimmed.len()),
        ));
    }
    Ok(trimmed.to_string())
}

/// Blank strings collapse to `None`
pub fn optional_text(value: Option<&str>, field: &str, max_len: usize) -> Result<Option<String>, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.len() > max_len => Err(ApiError::field(
            field,
            format!("{field} is too long ({} chars, max {max_len})", v.len()),
        )),
        Some(v) => Ok(Some(v.to_string())),
    }
}

/// Update merge for optional text: absent keeps `current`, blank clears
pub fn merge_text(
    update: Option<String>,
    current: Option<String>,
    field: &str,
    max_len: usize,
) -> Result<Option<String>, ApiError> {
    match update {
        Some(value) => optional_text(Some(&value), field, max_len),
        None => Ok(current),
    }
}

/// Identifier-like codes are compared and stored uppercase
pub fn code(value: &str, field: &str) -> Result<String, ApiError> {
    let code = required_text(value, field, MAX_CODE_LEN)?;
    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(ApiError::field(
            field,
            format!("{field} can only contain letters, numbers, hyphen and underscore"),
        ));
    }
    Ok(code.to_ascii_uppercase())
}

pub fn email(value: &str, field: &str) -> Result<String, ApiError> {
    let email = required_text(value, field, MAX_EMAIL_LEN)?.to_ascii_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
        None => false,
    };
    if !valid {
        return Err(ApiError::field(field, "Invalid email format"));
    }
    Ok(email)
}

pub fn optional_email(value: Option<&str>, field: &str) -> Result<Option<String>, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => email(v, field).map(Some),
    }
}

pub fn password(value: &str) -> Result<(), ApiError> {
    let min = crate::auth::password::MIN_PASSWORD_LENGTH;
    if value.len() < min {
        return Err(ApiError::field("password", format!("password must be at least {min} characters")));
    }
    if value.len() > MAX_PASSWORD_LEN {
        return Err(ApiError::field("password", format!("password is too long (max {MAX_PASSWORD_LEN})")));
    }
    Ok(())
}

pub fn url(value: &str, field: &str) -> Result<String, ApiError> {
    let raw = required_text(value, field, MAX_URL_LEN)?;
    match url::Url::parse(&raw) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(raw),
        _ => Err(ApiError::field(field, format!("{field} must be an http(s) URL"))),
    }
}

pub fn optional_url(value: Option<&str>, field: &str) -> Result<Option<String>, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => url(v, field).map(Some),
    }
}
