use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::users::{dto::RegisterRequest, repo_types::NewUser};

pub const NAME_MAX_CHARS: usize = 100;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^05\d{8}$").unwrap();
}

/// A rejected registration field.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Normalizes a registration payload, or names the first field that is wrong.
pub fn validate(req: RegisterRequest) -> Result<NewUser, ValidationError> {
    if !req.terms {
        return Err(ValidationError::new(
            "terms",
            "You must accept the terms and conditions",
        ));
    }

    let name = req.name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("name", "Name is required"));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(ValidationError::new(
            "name",
            format!("Name must be at most {NAME_MAX_CHARS} characters"),
        ));
    }

    let email = req.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(ValidationError::new("email", "Invalid email address"));
    }

    let phone = match req.phone.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(p) if is_valid_phone(p) => Some(p.to_string()),
        Some(_) => {
            return Err(ValidationError::new(
                "phone",
                "Phone must look like 05XXXXXXXX",
            ))
        }
    };

    Ok(NewUser {
        name: name.to_string(),
        email,
        phone,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, phone: Option<&str>, terms: bool) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            phone: phone.map(String::from),
            terms,
        }
    }

    #[test]
    fn accepts_and_normalizes_valid_input() {
        let user = validate(request(
            "  Ali Hassan ",
            " Ali@Example.COM ",
            Some("0501234567"),
            true,
        ))
        .unwrap();
        assert_eq!(user.name, "Ali Hassan");
        assert_eq!(user.email, "ali@example.com");
        assert_eq!(user.phone.as_deref(), Some("0501234567"));
    }

    #[test]
    fn terms_must_be_true_even_if_rest_is_valid() {
        let err = validate(request("Ali", "ali@example.com", None, false)).unwrap_err();
        assert_eq!(err.field, "terms");
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = validate(request("   ", "ali@example.com", None, true)).unwrap_err();
        assert_eq!(err.field, "name");
    }

    #[test]
    fn name_length_counts_characters_not_bytes() {
        let arabic = "ع".repeat(100);
        assert!(validate(request(&arabic, "a@example.com", None, true)).is_ok());

        let too_long = "a".repeat(101);
        let err = validate(request(&too_long, "a@example.com", None, true)).unwrap_err();
        assert_eq!(err.field, "name");
    }

    #[test]
    fn single_character_name_is_allowed() {
        assert!(validate(request("A", "a@example.com", None, true)).is_ok());
    }

    #[test]
    fn email_syntax_is_checked() {
        for bad in ["", "plain", "a@b", "a b@example.com", "@example.com"] {
            let err = validate(request("Ali", bad, None, true)).unwrap_err();
            assert_eq!(err.field, "email", "{bad:?} should be rejected");
        }
    }

    #[test]
    fn phone_is_optional_but_checked_when_present() {
        assert!(validate(request("Ali", "a@example.com", None, true)).is_ok());

        let blank = validate(request("Ali", "a@example.com", Some("  "), true)).unwrap();
        assert_eq!(blank.phone, None);

        for bad in ["0601234567", "050123456", "05012345678", "+966501234567"] {
            let err = validate(request("Ali", "a@example.com", Some(bad), true)).unwrap_err();
            assert_eq!(err.field, "phone", "{bad:?} should be rejected");
        }
    }
}
