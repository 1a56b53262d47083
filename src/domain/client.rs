use serde::{Deserialize, Serialize};
use std::fmt;

use super::ClientKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClientId {
    fn from(s: String) -> Self {
        ClientId(s)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        ClientId(s.to_string())
    }
}

/// Client form contents, used for both creation and edits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientDraft {
    pub full_name: String,
    pub client_type: Option<ClientKind>,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub contact_person_name: String,
    pub contact_person_role: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: ClientId,
    pub details: ClientDraft,
}

impl Client {
    pub fn display_company(&self) -> &str {
        if self.details.company.trim().is_empty() {
            "No company"
        } else {
            &self.details.company
        }
    }

    /// Editable copy of the stored fields.
    pub fn to_draft(&self) -> ClientDraft {
        self.details.clone()
    }
}
