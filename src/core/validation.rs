//! Request input validation.
//!
//! All checks run before any database or provider call; failures map to
//! `ApiError::BadRequest`.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::errors::ApiError;

pub const MAX_QUESTION_CHARS: usize = 5000;
pub const MAX_IDENTIFIER_CHARS: usize = 64;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap())
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if email_regex().is_match(email.trim()) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Invalid email format: '{}'",
            email
        )))
    }
}

pub fn validate_question(question: &str) -> Result<(), ApiError> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("Question cannot be empty".to_string()));
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Question cannot exceed {} characters",
            MAX_QUESTION_CHARS
        )));
    }
    Ok(())
}

/// Identifiers are the generated `DOC-`/`MTG-` ids, UUIDs, or caller-chosen
/// conversation ids. One shape check covers them all.
pub fn validate_identifier(id: &str) -> Result<(), ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Identifier cannot be empty".to_string(),
        ));
    }
    if id.chars().count() > MAX_IDENTIFIER_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Identifier cannot exceed {} characters",
            MAX_IDENTIFIER_CHARS
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::BadRequest(format!(
            "Identifier contains invalid characters: '{}'",
            id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_emails() {
        assert!(validate_email("john@example.com").is_ok());
        assert!(validate_email("a.b+tag@sub.domain.org").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn rejects_empty_and_oversized_questions() {
        assert!(validate_question("   ").is_err());
        assert!(validate_question(&"x".repeat(MAX_QUESTION_CHARS + 1)).is_err());
        assert!(validate_question("What was decided?").is_ok());
    }

    #[test]
    fn identifier_shape() {
        assert!(validate_identifier("DOC-1A2B3C4D").is_ok());
        assert!(validate_identifier("MTG-00FFAA11").is_ok());
        assert!(validate_identifier("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("has space").is_err());
        assert!(validate_identifier(&"a".repeat(65)).is_err());
    }
}
