use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::schemes::catalog::CatalogLoad;
use crate::workflows::schemes::domain::{
    Answer, Gender, Income, Profile, Query, SchemeDraft, SchemeRecord, StateName, UserId,
};
use crate::workflows::schemes::notify::NotificationAudience;
use crate::workflows::schemes::repository::{
    CatalogStore, NotificationDispatcher, NotificationError, ProfileStore, SchemeNotice,
    StoreError,
};
use crate::workflows::schemes::service::SchemeFinderService;

/// Query from the reference scenario: a married, non-student woman in Delhi.
pub(super) fn delhi_query() -> Query {
    Query {
        gender: Gender::Female,
        age: 30,
        state: StateName::new("delhi"),
        income: Income::new(50000.0).expect("valid income"),
        student: Answer::No,
        married: Answer::Yes,
    }
}

/// Record from the reference scenario; matches [`delhi_query`].
pub(super) fn scheme_x() -> SchemeRecord {
    SchemeRecord::new(
        "SchemeX",
        "delhi",
        Gender::Female,
        18,
        60,
        Income::UNBOUNDED,
        Answer::Any,
        Answer::Yes,
    )
    .expect("valid scheme")
}

/// Record whose every constraint is a wildcard.
pub(super) fn open_scheme(name: &str) -> SchemeRecord {
    SchemeRecord::new(
        name,
        StateName::CENTRAL,
        Gender::Any,
        0,
        u32::MAX,
        Income::UNBOUNDED,
        Answer::Any,
        Answer::Any,
    )
    .expect("valid scheme")
}

pub(super) fn draft(name: &str) -> SchemeDraft {
    SchemeDraft {
        name: name.to_string(),
        state: "Delhi".to_string(),
        gender: Gender::Female,
        start_age: 18,
        end_age: 45,
        income: Income::new(300000.0).expect("valid income"),
        student: Answer::Any,
        married: Answer::Any,
    }
}

pub(super) fn profile(identity: &str) -> Profile {
    Profile {
        identity: UserId::new(identity),
        email: format!("{identity}@example.org"),
        gender: Gender::Any,
        state: Some(StateName::new("Delhi")),
        student: Answer::Any,
        married: Answer::Any,
    }
}

pub(super) type MemoryService = SchemeFinderService<MemoryProfiles, MemoryCatalog, MemoryNotifier>;

pub(super) fn build_service(
    records: Vec<SchemeRecord>,
    audience: NotificationAudience,
) -> (
    MemoryService,
    Arc<MemoryProfiles>,
    Arc<MemoryCatalog>,
    Arc<MemoryNotifier>,
) {
    let profiles = Arc::new(MemoryProfiles::default());
    let catalog = Arc::new(MemoryCatalog::with_records(records));
    let notifier = Arc::new(MemoryNotifier::default());
    let service = SchemeFinderService::new(
        profiles.clone(),
        catalog.clone(),
        notifier.clone(),
        audience,
    );
    (service, profiles, catalog, notifier)
}

#[derive(Default, Clone)]
pub(super) struct MemoryProfiles {
    records: Arc<Mutex<Vec<Profile>>>,
}

impl ProfileStore for MemoryProfiles {
    fn get(&self, identity: &UserId) -> Result<Option<Profile>, StoreError> {
        let guard = self.records.lock().expect("profile mutex poisoned");
        Ok(guard
            .iter()
            .find(|profile| &profile.identity == identity)
            .cloned())
    }

    fn upsert(&self, profile: Profile) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("profile mutex poisoned");
        match guard
            .iter_mut()
            .find(|existing| existing.identity == profile.identity)
        {
            Some(existing) => *existing = profile,
            None => guard.push(profile),
        }
        Ok(())
    }

    fn all(&self) -> Result<Vec<Profile>, StoreError> {
        Ok(self.records.lock().expect("profile mutex poisoned").clone())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryCatalog {
    load: Arc<Mutex<CatalogLoad>>,
}

impl MemoryCatalog {
    pub(super) fn with_records(records: Vec<SchemeRecord>) -> Self {
        Self {
            load: Arc::new(Mutex::new(CatalogLoad {
                records,
                rejected: Vec::new(),
            })),
        }
    }

    pub(super) fn with_load(load: CatalogLoad) -> Self {
        Self {
            load: Arc::new(Mutex::new(load)),
        }
    }

    pub(super) fn names(&self) -> Vec<String> {
        self.load
            .lock()
            .expect("catalog mutex poisoned")
            .records
            .iter()
            .map(|record| record.name.clone())
            .collect()
    }
}

impl CatalogStore for MemoryCatalog {
    fn load_all(&self) -> Result<CatalogLoad, StoreError> {
        Ok(self.load.lock().expect("catalog mutex poisoned").clone())
    }

    fn append(&self, record: SchemeRecord) -> Result<(), StoreError> {
        self.load
            .lock()
            .expect("catalog mutex poisoned")
            .records
            .push(record);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<SchemeNotice>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<SchemeNotice> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationDispatcher for MemoryNotifier {
    fn dispatch(&self, notice: SchemeNotice) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

/// Dispatcher that refuses one recipient and accepts the rest.
pub(super) struct FlakyNotifier {
    pub(super) refuse: UserId,
    pub(super) delivered: Mutex<Vec<UserId>>,
}

impl NotificationDispatcher for FlakyNotifier {
    fn dispatch(&self, notice: SchemeNotice) -> Result<(), NotificationError> {
        if notice.recipient == self.refuse {
            return Err(NotificationError::Transport("smtp timeout".to_string()));
        }
        self.delivered
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice.recipient);
        Ok(())
    }
}

pub(super) struct UnavailableProfiles;

impl ProfileStore for UnavailableProfiles {
    fn get(&self, _identity: &UserId) -> Result<Option<Profile>, StoreError> {
        Err(StoreError::Unavailable("profile table locked".to_string()))
    }

    fn upsert(&self, _profile: Profile) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("profile table locked".to_string()))
    }

    fn all(&self) -> Result<Vec<Profile>, StoreError> {
        Err(StoreError::Unavailable("profile table locked".to_string()))
    }
}

pub(super) struct UnavailableCatalog;

impl CatalogStore for UnavailableCatalog {
    fn load_all(&self) -> Result<CatalogLoad, StoreError> {
        Err(StoreError::Unavailable("catalog share offline".to_string()))
    }

    fn append(&self, _record: SchemeRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("catalog share offline".to_string()))
    }
}

/// Catalog that remembers which thread served each load.
#[derive(Default)]
pub(super) struct ThreadRecordingCatalog {
    pub(super) threads: Mutex<Vec<std::thread::ThreadId>>,
}

impl CatalogStore for ThreadRecordingCatalog {
    fn load_all(&self) -> Result<CatalogLoad, StoreError> {
        self.threads
            .lock()
            .expect("catalog mutex poisoned")
            .push(std::thread::current().id());
        Ok(CatalogLoad::default())
    }

    fn append(&self, _record: SchemeRecord) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Catalog whose contents change after every load.
pub(super) struct ShiftingCatalog {
    pub(super) loads: Mutex<Vec<Vec<SchemeRecord>>>,
}

impl ShiftingCatalog {
    /// Serves `snapshots` in order, one per load; later loads see an empty catalog.
    pub(super) fn new(mut snapshots: Vec<Vec<SchemeRecord>>) -> Self {
        snapshots.reverse();
        Self {
            loads: Mutex::new(snapshots),
        }
    }
}

impl CatalogStore for ShiftingCatalog {
    fn load_all(&self) -> Result<CatalogLoad, StoreError> {
        let records = self
            .loads
            .lock()
            .expect("catalog mutex poisoned")
            .pop()
            .unwrap_or_default();
        Ok(CatalogLoad {
            records,
            rejected: Vec::new(),
        })
    }

    fn append(&self, _record: SchemeRecord) -> Result<(), StoreError> {
        Ok(())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
