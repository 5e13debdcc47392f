//! Client for the contact-book HTTP API.
//!
//! This module provides:
//! - `Transport` trait abstracting the HTTP layer (reqwest in production)
//! - `ContactService` wrapping the five remote operations
//! - `Request`/`Response` envelopes used by the background worker

pub mod http;
pub mod types;

use std::path::PathBuf;

use log::{debug, warn};
use thiserror::Error;
use url::Url;

pub use types::{Contact, ContactForm, KeyStatus, Outcome};

const API_KEY_PATH: &str = "controller/api-key/";
const GET_CONTACTS_PATH: &str = "controller/get-contacts/";
const INSERT_CONTACT_PATH: &str = "controller/insert-contact/";
const EDIT_CONTACT_PATH: &str = "controller/edit-contact/";
const DELETE_CONTACT_PATH: &str = "controller/delete-contact/";
const UPLOADS_PATH: &str = "controller/uploads/";

/// Errors that can occur when talking to the contact-book API
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server responded with HTTP {0}")]
    Status(u16),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("cannot read avatar {}: {source}", path.display())]
    Avatar {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// No usable answer came back: the request failed or the status was
    /// not 2xx.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Status(_))
    }
}

/// A completed HTTP exchange; status is not yet checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Multipart body described independently of the HTTP library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartBody {
    pub fields: Vec<(String, String)>,
    pub file: Option<(String, PathBuf)>,
}

impl MultipartBody {
    fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    #[cfg(test)]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Trait for HTTP transports used by `ContactService`
pub trait Transport {
    fn get(&self, url: &Url) -> Result<HttpResponse, ApiError>;

    fn post_multipart(&self, url: &Url, body: MultipartBody) -> Result<HttpResponse, ApiError>;
}

/// Wraps the remote contact-book endpoints under one base URL.
pub struct ContactService<T> {
    transport: T,
    base_url: Url,
    avatar_service: Url,
}

impl<T: Transport> ContactService<T> {
    pub fn new(transport: T, base_url: Url, avatar_service: Url) -> Self {
        Self {
            transport,
            base_url,
            avatar_service,
        }
    }

    pub fn validate_key(&self, key: &str) -> Result<KeyStatus, ApiError> {
        let url = self.endpoint(API_KEY_PATH, &[("apiKey", key)])?;
        let body = self.fetch_text(&url)?;
        if Outcome::from_body(&body).is_success() {
            Ok(KeyStatus::Valid)
        } else {
            Ok(KeyStatus::Invalid)
        }
    }

    /// Lists every contact, or the single contact `id` when given.
    pub fn list_contacts(&self, key: &str, id: Option<&str>) -> Result<Vec<Contact>, ApiError> {
        let mut params = vec![("apiKey", key)];
        if let Some(id) = id {
            params.push(("id", id));
        }
        let url = self.endpoint(GET_CONTACTS_PATH, &params)?;
        let body = self.fetch_text(&url)?;
        let body = body.trim();
        // An empty body or JSON null means nothing matched.
        if body.is_empty() || body == "null" {
            return Ok(Vec::new());
        }
        serde_json::from_str(body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    pub fn insert_contact(&self, key: &str, form: &ContactForm) -> Result<Outcome, ApiError> {
        let url = self.endpoint(INSERT_CONTACT_PATH, &[])?;
        let body = form_body(form).text("apiKey", key);
        self.submit(&url, body)
    }

    pub fn update_contact(&self, key: &str, id: &str, form: &ContactForm) -> Result<Outcome, ApiError> {
        let url = self.endpoint(EDIT_CONTACT_PATH, &[])?;
        let body = form_body(form).text("apiKey", key).text("id", id);
        self.submit(&url, body)
    }

    pub fn delete_contact(&self, key: &str, id: &str) -> Result<Outcome, ApiError> {
        let url = self.endpoint(DELETE_CONTACT_PATH, &[("id", id), ("apiKey", key)])?;
        let body = self.fetch_text(&url)?;
        Ok(Outcome::from_body(&body))
    }

    pub fn avatar_url(&self, contact: &Contact) -> String {
        avatar_url(&self.base_url, &self.avatar_service, contact)
    }

    /// Runs one worker request to completion.
    pub fn execute(&self, key: &str, request: Request) -> Response {
        match request {
            Request::ValidateKey(candidate) => {
                let result = self.validate_key(&candidate);
                Response::KeyValidated { key: candidate, result }
            }
            Request::ListContacts => Response::Listed(self.list_contacts(key, None)),
            Request::LoadContact(id) => {
                let result = self
                    .list_contacts(key, Some(&id))
                    .map(|contacts| contacts.into_iter().next());
                Response::Loaded { id, result }
            }
            Request::Insert(form) => Response::Inserted(self.insert_contact(key, &form)),
            Request::Update { id, form } => {
                let result = self.update_contact(key, &id, &form);
                Response::Updated { id, result }
            }
            Request::Delete(id) => {
                let result = self.delete_contact(key, &id);
                Response::Deleted { id, result }
            }
        }
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self.base_url.join(path)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter().copied());
        }
        Ok(url)
    }

    fn fetch_text(&self, url: &Url) -> Result<String, ApiError> {
        debug!("GET {}", redact(url));
        let response = self.transport.get(url)?;
        check_status(url, response)
    }

    fn submit(&self, url: &Url, body: MultipartBody) -> Result<Outcome, ApiError> {
        debug!("POST {}", redact(url));
        let response = self.transport.post_multipart(url, body)?;
        let text = check_status(url, response)?;
        Ok(Outcome::from_body(&text))
    }
}

/// Uploaded avatar URL, or a generated initials image when none is set.
pub fn avatar_url(base_url: &Url, avatar_service: &Url, contact: &Contact) -> String {
    if let Some(file) = &contact.avatar {
        if let Some(url) = uploaded_avatar_url(base_url, file) {
            return url.to_string();
        }
    }
    let mut url = avatar_service.clone();
    url.query_pairs_mut()
        .append_pair("name", &contact.display_name())
        .append_pair("background", "ff6b6b")
        .append_pair("color", "fff")
        .append_pair("size", "120");
    url.to_string()
}

// The stored name is one path segment under the uploads directory, never a
// relative reference.
fn uploaded_avatar_url(base_url: &Url, file: &str) -> Option<Url> {
    let mut url = base_url.join(UPLOADS_PATH).ok()?;
    url.path_segments_mut().ok()?.pop_if_empty().push(file);
    Some(url)
}

fn form_body(form: &ContactForm) -> MultipartBody {
    let mut body = MultipartBody::default()
        .text("firstname", &form.first_name)
        .text("lastname", &form.last_name)
        .text("mobile", &form.mobile)
        .text("email", &form.email);
    if let Some(path) = &form.avatar_path {
        body.file = Some(("avatar".to_string(), path.clone()));
    }
    body
}

fn check_status(url: &Url, response: HttpResponse) -> Result<String, ApiError> {
    if (200..300).contains(&response.status) {
        Ok(response.body)
    } else {
        warn!("{} answered HTTP {}", url.path(), response.status);
        Err(ApiError::Status(response.status))
    }
}

/// URL for logging with the access key masked.
fn redact(url: &Url) -> String {
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == "apiKey" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), value)
        })
        .collect();
    if pairs.is_empty() {
        return masked.to_string();
    }
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

/// Work handed to the background worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ValidateKey(String),
    ListContacts,
    LoadContact(String),
    Insert(ContactForm),
    Update { id: String, form: ContactForm },
    Delete(String),
}

/// Worker answer for a `Request`, carrying enough context to apply it.
#[derive(Debug)]
pub enum Response {
    KeyValidated {
        key: String,
        result: Result<KeyStatus, ApiError>,
    },
    Listed(Result<Vec<Contact>, ApiError>),
    Loaded {
        id: String,
        result: Result<Option<Contact>, ApiError>,
    },
    Inserted(Result<Outcome, ApiError>),
    Updated {
        id: String,
        result: Result<Outcome, ApiError>,
    },
    Deleted {
        id: String,
        result: Result<Outcome, ApiError>,
    },
}
