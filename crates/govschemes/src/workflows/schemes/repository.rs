use std::fmt;

use serde::{Deserialize, Serialize};

use super::catalog::{CatalogError, CatalogLoad};
use super::domain::{Profile, SchemeRecord, UserId};

/// Identity-keyed storage for user preferences.
pub trait ProfileStore: Send + Sync {
    fn get(&self, identity: &UserId) -> Result<Option<Profile>, StoreError>;
    fn upsert(&self, profile: Profile) -> Result<(), StoreError>;
    fn all(&self) -> Result<Vec<Profile>, StoreError>;
}

/// Append-only scheme catalog.
///
/// `load_all` must hand back records already normalized and validated;
/// rows that fail validation are reported in [`CatalogLoad::rejected`].
pub trait CatalogStore: Send + Sync {
    fn load_all(&self) -> Result<CatalogLoad, StoreError>;
    fn append(&self, record: SchemeRecord) -> Result<(), StoreError>;
}

/// Outbound hook fired after a scheme joins the catalog (e-mail, SMS adapters).
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, notice: SchemeNotice) -> Result<(), NotificationError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store data unreadable: {0}")]
    Csv(#[from] csv::Error),
    #[error("store update could not be committed: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("store catalog unreadable: {0}")]
    Catalog(#[from] CatalogError),
}

/// Payload handed to the notification dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeNotice {
    pub template: String,
    pub recipient: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub scheme_name: String,
    pub message: String,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// External systems the scheme service leans on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collaborator {
    ProfileStore,
    CatalogStore,
    NotificationDispatcher,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Collaborator::ProfileStore => "profile store",
            Collaborator::CatalogStore => "catalog store",
            Collaborator::NotificationDispatcher => "notification dispatcher",
        };
        f.write_str(label)
    }
}

/// A collaborator failed; rows already loaded are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{collaborator} unavailable: {detail}")]
pub struct CollaboratorUnavailableError {
    pub collaborator: Collaborator,
    pub detail: String,
}

impl CollaboratorUnavailableError {
    pub(crate) fn new(collaborator: Collaborator, source: impl fmt::Display) -> Self {
        Self {
            collaborator,
            detail: source.to_string(),
        }
    }
}
