use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::api::ContactForm;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .expect("email pattern is valid")
});

const MIN_PHONE_DIGITS: usize = 10;

/// Reasons a form or key input is refused before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please enter an API key!")]
    MissingKey,
    #[error("Please enter a valid email address as your API key.")]
    InvalidKey,
    #[error("Please fill in all required fields.")]
    MissingField,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Please enter a valid mobile number.")]
    InvalidMobile,
    #[error("Avatar file not found: {0}")]
    MissingAvatar(String),
}

/// Raw text as typed into the add/edit forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub first_name: String,
    pub last_name: String,
    pub mobile: String,
    pub email: String,
    pub avatar_path: String,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(&email.to_lowercase())
}

/// Spaces, dashes and parentheses are ignored; what remains must be at least
/// ten digits with an optional leading `+`.
pub fn is_valid_phone(mobile: &str) -> bool {
    let cleaned: String = mobile
        .chars()
        .filter(|c| !(c.is_whitespace() || matches!(c, '-' | '(' | ')')))
        .collect();

    if cleaned.chars().count() < MIN_PHONE_DIGITS {
        return false;
    }

    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

pub fn validate_api_key(input: &str) -> Result<String, FormError> {
    let key = input.trim();
    if key.is_empty() {
        return Err(FormError::MissingKey);
    }
    if !is_valid_email(key) {
        return Err(FormError::InvalidKey);
    }
    Ok(key.to_string())
}

pub fn validate_draft(draft: &ContactDraft) -> Result<ContactForm, FormError> {
    let first_name = draft.first_name.trim();
    let last_name = draft.last_name.trim();
    let mobile = draft.mobile.trim();
    let email = draft.email.trim();

    if first_name.is_empty() || last_name.is_empty() || mobile.is_empty() || email.is_empty() {
        return Err(FormError::MissingField);
    }
    if !is_valid_email(email) {
        return Err(FormError::InvalidEmail);
    }
    if !is_valid_phone(mobile) {
        return Err(FormError::InvalidMobile);
    }

    let avatar_path = match draft.avatar_path.trim() {
        "" => None,
        raw => {
            let path = expand_tilde(Path::new(raw));
            if !path.is_file() {
                return Err(FormError::MissingAvatar(path.display().to_string()));
            }
            Some(path)
        }
    };

    Ok(ContactForm {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        mobile: mobile.to_string(),
        email: email.to_string(),
        avatar_path,
    })
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}
