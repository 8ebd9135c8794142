//! API key management form.
//!
//! Checks run locally and block submission; a form that fails them never
//! produces a [`PermissionRequest`].

use crate::error::{Error, Result};
use crate::session::Redacted;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shortest accepted key owner name.
pub const MIN_NAME_LEN: usize = 4;

/// Shortest accepted new key.
pub const MIN_TOKEN_LEN: usize = 6;

/// Access granted to one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlPermission {
    pub url: String,
    pub is_write: bool,
}

impl UrlPermission {
    pub fn new(url: impl Into<String>, is_write: bool) -> Self {
        Self {
            url: url.into(),
            is_write,
        }
    }
}

impl Default for UrlPermission {
    fn default() -> Self {
        Self::new("/", false)
    }
}

/// Body of a permission write.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRequest {
    pub name: String,
    pub token: String,
    pub urls: Vec<UrlPermission>,
}

impl fmt::Debug for PermissionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionRequest")
            .field("name", &self.name)
            .field("token", &Redacted(&self.token))
            .field("urls", &self.urls)
            .finish()
    }
}

/// Per-field validation outcome. `true` marks the field as invalid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub name: bool,
    pub new_key: bool,
    pub confirm_key: bool,
}

impl FormErrors {
    pub fn any(&self) -> bool {
        self.name || self.new_key || self.confirm_key
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = [
            (self.name, "user name is invalid"),
            (self.new_key, "new key is incorrect"),
            (self.confirm_key, "confirm key is not equal"),
        ]
        .into_iter()
        .filter_map(|(failed, msg)| failed.then_some(msg))
        .collect();

        if messages.is_empty() {
            f.write_str("no errors")
        } else {
            f.write_str(&messages.join(", "))
        }
    }
}

/// Input of the "create new api key" form.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyForm {
    pub name: String,
    pub new_key: String,
    pub confirm_key: String,
    pub urls: Vec<UrlPermission>,
}

impl Default for KeyForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            new_key: String::new(),
            confirm_key: String::new(),
            urls: vec![UrlPermission::default()],
        }
    }
}

impl fmt::Debug for KeyForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyForm")
            .field("name", &self.name)
            .field("new_key", &Redacted(&self.new_key))
            .field("confirm_key", &Redacted(&self.confirm_key))
            .field("urls", &self.urls)
            .finish()
    }
}

impl KeyForm {
    /// Empty form with one `/` read-only row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Form with the three text fields filled in.
    pub fn with_fields(name: &str, new_key: &str, confirm_key: &str) -> Self {
        Self {
            name: name.to_string(),
            new_key: new_key.to_string(),
            confirm_key: confirm_key.to_string(),
            ..Self::default()
        }
    }

    /// Append a `/` read-only row.
    pub fn add_url(&mut self) {
        self.urls.push(UrlPermission::default());
    }

    /// Toggle write access on row `idx`. Returns false if there is no such row.
    pub fn set_write(&mut self, idx: usize, is_write: bool) -> bool {
        match self.urls.get_mut(idx) {
            Some(row) => {
                row.is_write = is_write;
                true
            }
            None => false,
        }
    }

    /// Check every field; all failures are reported at once.
    pub fn validate(&self) -> FormErrors {
        FormErrors {
            name: self.name.chars().count() < MIN_NAME_LEN,
            new_key: self.new_key.chars().count() < MIN_TOKEN_LEN,
            confirm_key: self.new_key != self.confirm_key,
        }
    }

    /// Validate and build the request body.
    pub fn to_request(&self) -> Result<PermissionRequest> {
        let errors = self.validate();
        if errors.any() {
            tracing::debug!(%errors, "key form rejected");
            return Err(Error::Validation(errors));
        }

        Ok(PermissionRequest {
            name: self.name.clone(),
            token: self.new_key.clone(),
            urls: self.urls.clone(),
        })
    }
}
