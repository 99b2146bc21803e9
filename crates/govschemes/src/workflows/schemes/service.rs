use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::catalog::CatalogLoad;
use super::domain::{Profile, ProfileUpdate, Query, RecordDefect, SchemeDraft, SchemeRecord, UserId};
use super::eligibility::{CriterionCheck, EligibilityFilter};
use super::merge::ProfileMerger;
use super::notify::{scheme_added_notice, NotificationAudience};
use super::repository::{
    CatalogStore, Collaborator, CollaboratorUnavailableError, NotificationDispatcher,
    ProfileStore,
};

/// Service composing the profile store, scheme catalog, and notification hook
/// around the merge-then-filter core.
pub struct SchemeFinderService<P, C, N> {
    profiles: Arc<P>,
    catalog: Arc<C>,
    notifier: Arc<N>,
    filter: EligibilityFilter,
    audience: NotificationAudience,
}

impl<P, C, N> SchemeFinderService<P, C, N>
where
    P: ProfileStore + 'static,
    C: CatalogStore + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn new(
        profiles: Arc<P>,
        catalog: Arc<C>,
        notifier: Arc<N>,
        audience: NotificationAudience,
    ) -> Self {
        Self {
            profiles,
            catalog,
            notifier,
            filter: EligibilityFilter::new(),
            audience,
        }
    }

    /// Resolve the query against the caller's stored profile, then filter the catalog.
    pub fn find(
        &self,
        identity: Option<&UserId>,
        query: &Query,
    ) -> Result<SearchOutcome, SchemeServiceError> {
        self.search(identity, query).map(|(outcome, _)| outcome)
    }

    /// Like [`find`](Self::find), plus a per-criterion breakdown of every
    /// catalog record from the same catalog read.
    pub fn find_explained(
        &self,
        identity: Option<&UserId>,
        query: &Query,
    ) -> Result<ExplainedSearch, SchemeServiceError> {
        let (outcome, load) = self.search(identity, query)?;
        let explanations = load
            .records
            .into_iter()
            .map(|record| SchemeExplanation {
                checks: self.filter.explain(&outcome.resolved, &record),
                record,
            })
            .collect();
        Ok(ExplainedSearch {
            outcome,
            explanations,
        })
    }

    fn search(
        &self,
        identity: Option<&UserId>,
        query: &Query,
    ) -> Result<(SearchOutcome, CatalogLoad), SchemeServiceError> {
        let profile = match identity {
            Some(identity) => self
                .profiles
                .get(identity)
                .map_err(|err| CollaboratorUnavailableError::new(Collaborator::ProfileStore, err))?,
            None => None,
        };

        let resolved = ProfileMerger::resolve(query, profile.as_ref());
        let load = self.load_catalog()?;
        let matches: Vec<SchemeRecord> = self
            .filter
            .matching(&resolved, &load.records)
            .into_iter()
            .cloned()
            .collect();

        info!(
            identity = identity.map(|id| id.0.as_str()).unwrap_or("anonymous"),
            profile_applied = profile.is_some(),
            catalog_size = load.records.len(),
            matches = matches.len(),
            rejected_rows = load.rejected_count(),
            "scheme search completed"
        );

        let outcome = SearchOutcome {
            resolved,
            matches,
            rejected_rows: load.rejected_count(),
        };
        Ok((outcome, load))
    }

    /// The whole catalog, for the "list all" view.
    pub fn list_all(&self) -> Result<CatalogLoad, SchemeServiceError> {
        self.load_catalog()
    }

    pub fn save_profile(
        &self,
        identity: UserId,
        update: ProfileUpdate,
    ) -> Result<Profile, SchemeServiceError> {
        if identity.is_blank() {
            return Err(SchemeServiceError::BlankIdentity);
        }

        let profile = update.into_profile(identity);
        self.profiles
            .upsert(profile.clone())
            .map_err(|err| CollaboratorUnavailableError::new(Collaborator::ProfileStore, err))?;
        info!(identity = %profile.identity, "profile preferences saved");
        Ok(profile)
    }

    pub fn profile(&self, identity: &UserId) -> Result<Option<Profile>, SchemeServiceError> {
        let profile = self
            .profiles
            .get(identity)
            .map_err(|err| CollaboratorUnavailableError::new(Collaborator::ProfileStore, err))?;
        Ok(profile)
    }

    pub fn profiles(&self) -> Result<Vec<Profile>, SchemeServiceError> {
        let profiles = self
            .profiles
            .all()
            .map_err(|err| CollaboratorUnavailableError::new(Collaborator::ProfileStore, err))?;
        Ok(profiles)
    }

    /// Validate and append a scheme, then notify the configured audience.
    ///
    /// Once the append succeeds the scheme stays in the catalog; notification
    /// problems are reported in [`SchemeAdded::failures`].
    pub fn add_scheme(&self, draft: SchemeDraft) -> Result<SchemeAdded, SchemeServiceError> {
        let record = draft.validate()?;
        self.catalog
            .append(record.clone())
            .map_err(|err| CollaboratorUnavailableError::new(Collaborator::CatalogStore, err))?;
        info!(scheme = %record.name, state = %record.state, "scheme added to catalog");

        let mut failures = Vec::new();
        let profiles = match self.profiles.all() {
            Ok(profiles) => profiles,
            Err(err) => {
                warn!(error = %err, "could not load profiles for scheme notifications");
                failures.push(CollaboratorUnavailableError::new(
                    Collaborator::ProfileStore,
                    err,
                ));
                Vec::new()
            }
        };

        let mut notified = 0;
        for profile in profiles
            .iter()
            .filter(|profile| self.audience.includes(profile, &record))
        {
            match self.notifier.dispatch(scheme_added_notice(profile, &record)) {
                Ok(()) => notified += 1,
                Err(err) => {
                    warn!(recipient = %profile.identity, error = %err, "scheme notification failed");
                    failures.push(CollaboratorUnavailableError::new(
                        Collaborator::NotificationDispatcher,
                        format!("{}: {err}", profile.identity),
                    ));
                }
            }
        }

        Ok(SchemeAdded {
            record,
            notified,
            failures,
        })
    }

    fn load_catalog(&self) -> Result<CatalogLoad, SchemeServiceError> {
        let load = self
            .catalog
            .load_all()
            .map_err(|err| CollaboratorUnavailableError::new(Collaborator::CatalogStore, err))?;
        for rejected in &load.rejected {
            warn!(row = rejected.row, error = %rejected, "catalog row rejected");
        }
        Ok(load)
    }
}

/// Outcome of one search: the effective query and the qualifying schemes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub resolved: Query,
    pub matches: Vec<SchemeRecord>,
    pub rejected_rows: usize,
}

/// One catalog record with the outcome of each criterion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemeExplanation {
    pub record: SchemeRecord,
    pub checks: Vec<CriterionCheck>,
}

impl SchemeExplanation {
    pub fn eligible(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }
}

/// A search together with the breakdown for every record it considered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainedSearch {
    pub outcome: SearchOutcome,
    pub explanations: Vec<SchemeExplanation>,
}

/// Outcome of adding a scheme to the catalog.
#[derive(Debug, Clone)]
pub struct SchemeAdded {
    pub record: SchemeRecord,
    pub notified: usize,
    pub failures: Vec<CollaboratorUnavailableError>,
}

/// Error raised by the scheme service.
#[derive(Debug, thiserror::Error)]
pub enum SchemeServiceError {
    #[error(transparent)]
    Collaborator(#[from] CollaboratorUnavailableError),
    #[error("scheme rejected: {0}")]
    InvalidScheme(#[from] RecordDefect),
    #[error("profile identity must not be blank")]
    BlankIdentity,
}
