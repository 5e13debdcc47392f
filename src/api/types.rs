use std::path::PathBuf;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

/// A contact record as returned by `get-contacts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "firstname", default, deserialize_with = "null_as_empty")]
    pub first_name: String,
    #[serde(rename = "lastname", default, deserialize_with = "null_as_empty")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mobile: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub avatar: Option<String>,
}

impl Contact {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Validated input for insert and edit requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactForm {
    pub first_name: String,
    pub last_name: String,
    pub mobile: String,
    pub email: String,
    pub avatar_path: Option<PathBuf>,
}

/// Result of a mutating call once the sentinel body has been interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The backend answered but refused; carries its raw message.
    Rejected(String),
}

impl Outcome {
    pub(crate) fn from_body(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed == SUCCESS_SENTINEL {
            Outcome::Success
        } else {
            Outcome::Rejected(trimmed.to_string())
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Valid,
    Invalid,
}

pub(crate) const SUCCESS_SENTINEL: &str = "1";

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match Helper::deserialize(deserializer)? {
        Helper::Text(value) => value,
        Helper::Int(value) => value.to_string(),
        Helper::Uint(value) => value.to_string(),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_accepts_numeric_and_string_ids() {
        let raw = r#"[
            {"id": 7, "firstname": "Ada", "lastname": "Lovelace", "mobile": "0123456789", "email": "ada@example.com", "avatar": null},
            {"id": "8", "firstname": "Alan", "lastname": "Turing", "mobile": "0987654321", "email": "alan@example.com", "avatar": "alan.png"}
        ]"#;
        let contacts: Vec<Contact> = serde_json::from_str(raw).unwrap();
        assert_eq!(contacts[0].id, "7");
        assert_eq!(contacts[0].avatar, None);
        assert_eq!(contacts[1].id, "8");
        assert_eq!(contacts[1].avatar.as_deref(), Some("alan.png"));
        assert_eq!(contacts[1].display_name(), "Alan Turing");
    }

    #[test]
    fn test_blank_avatar_is_absent() {
        let raw = r#"{"id": "1", "firstname": "A", "lastname": "B", "mobile": "", "email": "", "avatar": "  "}"#;
        let contact: Contact = serde_json::from_str(raw).unwrap();
        assert!(contact.avatar.is_none());
    }

    #[test]
    fn test_null_text_fields_are_empty() {
        let raw = r#"[
            {"id": "1", "firstname": "Ada", "lastname": null, "mobile": null, "email": null},
            {"id": "2", "firstname": "Alan", "lastname": "Turing", "mobile": "0987654321", "email": "alan@example.com"}
        ]"#;
        let contacts: Vec<Contact> = serde_json::from_str(raw).unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].last_name, "");
        assert_eq!(contacts[0].mobile, "");
        assert_eq!(contacts[0].email, "");
        assert_eq!(contacts[1].email, "alan@example.com");
    }

    #[test]
    fn test_outcome_from_body() {
        assert_eq!(Outcome::from_body("1"), Outcome::Success);
        assert_eq!(Outcome::from_body(" 1\n"), Outcome::Success);
        assert_eq!(
            Outcome::from_body("Duplicate email"),
            Outcome::Rejected("Duplicate email".into())
        );
        assert_eq!(Outcome::from_body("0"), Outcome::Rejected("0".into()));
    }
}
