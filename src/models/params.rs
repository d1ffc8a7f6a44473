//! Helpers for turning raw request parameters into typed values

use std::str::FromStr;

use uuid::Uuid;
use validator::ValidationErrors;

use crate::error::{AppError, AppResult};

/// Treat empty or whitespace-only values as absent
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Treat blank values as absent without trimming the ones that remain
pub fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Value for a nullable text column: blank becomes NULL, anything else is
/// kept as sent
pub fn nullable(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse an optional numeric parameter, naming it in the error
pub fn parse_number<T: FromStr>(name: &str, value: Option<String>) -> AppResult<Option<T>> {
    match non_empty(value) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("{} must be a valid number", name))),
        None => Ok(None),
    }
}

/// Parse an optional internal `_id`
pub fn parse_uuid(value: Option<String>) -> AppResult<Option<Uuid>> {
    match non_empty(value) {
        Some(raw) => Uuid::parse_str(&raw)
            .map(Some)
            .map_err(|_| AppError::Validation("_id is not a valid identifier".to_string())),
        None => Ok(None),
    }
}

/// Flatten `validator` errors into one message, stable across runs
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(validation_message(&errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_absent() {
        assert_eq!(non_empty(Some("   ".into())), None);
        assert_eq!(non_empty(Some(" Horror ".into())), Some("Horror".into()));
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn blank_text_columns_become_null() {
        assert_eq!(nullable(""), None);
        assert_eq!(nullable("  "), None);
        assert_eq!(nullable(" British "), Some(" British ".into()));
        assert_eq!(present(Some(" book-1".into())), Some(" book-1".into()));
        assert_eq!(present(Some(" ".into())), None);
    }

    #[test]
    fn numbers_parse_or_name_the_parameter() {
        assert_eq!(parse_number::<i32>("authorId", Some("7".into())).unwrap(), Some(7));
        assert_eq!(parse_number::<i32>("authorId", Some("".into())).unwrap(), None);

        let err = parse_number::<i32>("publishedYear", Some("nineteen".into())).unwrap_err();
        assert_eq!(err.to_string(), "publishedYear must be a valid number");
    }

    #[test]
    fn malformed_uuid_is_a_validation_error() {
        assert!(matches!(
            parse_uuid(Some("abc".into())),
            Err(AppError::Validation(_))
        ));
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid(Some(id.to_string())).unwrap(), Some(id));
    }
}
