//! Government scheme eligibility: profile merging, catalog filtering, and
//! the store/notification seams around them.
//!
//! The core is two pure operations, [`ProfileMerger::resolve`] and
//! [`EligibilityFilter::matching`]. Everything else in this module adapts
//! them to CSV-backed stores, an HTTP router, and outbound notifications.

pub mod catalog;
pub mod domain;
pub mod eligibility;
pub mod merge;
mod normalizer;
pub mod notify;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use catalog::{CatalogError, CatalogImporter, CatalogLoad, MalformedRecordError};
pub use domain::{
    Answer, AttributeParseError, Gender, Income, Profile, ProfileUpdate, Query, RecordDefect,
    SchemeDraft, SchemeRecord, SchemeSummary, StateName, UserId, Wildcard,
};
pub use eligibility::{Criterion, CriterionCheck, EligibilityFilter};
pub use merge::ProfileMerger;
pub use notify::NotificationAudience;
pub use repository::{
    CatalogStore, Collaborator, CollaboratorUnavailableError, NotificationDispatcher,
    NotificationError, ProfileStore, SchemeNotice, StoreError,
};
pub use router::scheme_router;
pub use service::{
    ExplainedSearch, SchemeAdded, SchemeExplanation, SchemeFinderService, SchemeServiceError,
    SearchOutcome,
};
pub use store::{CsvCatalogStore, CsvProfileStore};
