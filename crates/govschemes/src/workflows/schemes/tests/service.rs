use std::sync::{Arc, Mutex};

use super::common::*;

use crate::workflows::schemes::catalog::{CatalogLoad, MalformedRecordError};
use crate::workflows::schemes::domain::{
    Answer, Gender, Profile, ProfileUpdate, RecordDefect, StateName, UserId,
};
use crate::workflows::schemes::notify::NotificationAudience;
use crate::workflows::schemes::repository::{Collaborator, ProfileStore};
use crate::workflows::schemes::service::{SchemeFinderService, SchemeServiceError};

#[test]
fn find_without_identity_filters_the_raw_query() {
    let (service, _, _, _) = build_service(
        vec![scheme_x(), open_scheme("National Pension")],
        NotificationAudience::All,
    );

    let outcome = service.find(None, &delhi_query()).expect("search succeeds");
    let names: Vec<&str> = outcome.matches.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["SchemeX", "National Pension"]);
    assert_eq!(outcome.resolved, delhi_query());
    assert_eq!(outcome.rejected_rows, 0);
}

#[test]
fn find_applies_stored_profile_before_filtering() {
    let (service, profiles, _, _) = build_service(
        vec![scheme_x(), open_scheme("National Pension")],
        NotificationAudience::All,
    );
    let mut stored = profile("ravi");
    stored.state = Some(StateName::new("Mumbai"));
    profiles.upsert(stored).expect("seed profile");

    let outcome = service
        .find(Some(&UserId::new("ravi")), &delhi_query())
        .expect("search succeeds");
    assert_eq!(outcome.resolved.state, StateName::new("mumbai"));
    let names: Vec<&str> = outcome.matches.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["National Pension"]);
}

#[test]
fn find_treats_unknown_identity_as_no_profile() {
    let (service, _, _, _) = build_service(vec![scheme_x()], NotificationAudience::All);

    let outcome = service
        .find(Some(&UserId::new("ghost")), &delhi_query())
        .expect("search succeeds");
    assert_eq!(outcome.resolved, delhi_query());
    assert_eq!(outcome.matches.len(), 1);
}

#[test]
fn find_reports_rejected_catalog_rows() {
    let load = CatalogLoad {
        records: vec![scheme_x()],
        rejected: vec![MalformedRecordError {
            row: 2,
            name: Some("Broken".to_string()),
            defect: RecordDefect::InvertedAgeRange { start: 60, end: 18 },
        }],
    };
    let service = SchemeFinderService::new(
        Arc::new(MemoryProfiles::default()),
        Arc::new(MemoryCatalog::with_load(load)),
        Arc::new(MemoryNotifier::default()),
        NotificationAudience::All,
    );

    let outcome = service.find(None, &delhi_query()).expect("search succeeds");
    assert_eq!(outcome.matches.len(), 1);
    assert_eq!(outcome.rejected_rows, 1);
}

#[test]
fn find_surfaces_unavailable_catalog() {
    let service = SchemeFinderService::new(
        Arc::new(MemoryProfiles::default()),
        Arc::new(UnavailableCatalog),
        Arc::new(MemoryNotifier::default()),
        NotificationAudience::All,
    );

    match service.find(None, &delhi_query()) {
        Err(SchemeServiceError::Collaborator(err)) => {
            assert_eq!(err.collaborator, Collaborator::CatalogStore);
            assert!(err.detail.contains("catalog share offline"));
        }
        other => panic!("expected collaborator error, got {other:?}"),
    }
}

#[test]
fn find_surfaces_unavailable_profile_store_only_when_identity_given() {
    let service = SchemeFinderService::new(
        Arc::new(UnavailableProfiles),
        Arc::new(MemoryCatalog::with_records(vec![scheme_x()])),
        Arc::new(MemoryNotifier::default()),
        NotificationAudience::All,
    );

    assert!(service.find(None, &delhi_query()).is_ok());
    assert!(matches!(
        service.find(Some(&UserId::new("ravi")), &delhi_query()),
        Err(SchemeServiceError::Collaborator(err)) if err.collaborator == Collaborator::ProfileStore
    ));
}

#[test]
fn save_profile_upserts_and_normalizes_state() {
    let (service, profiles, _, _) = build_service(Vec::new(), NotificationAudience::All);
    let update = ProfileUpdate {
        email: " asha@example.org ".to_string(),
        gender: Gender::Female,
        state: Some(" Tamil  Nadu ".to_string()),
        student: Answer::Yes,
        married: Answer::Any,
    };

    let saved = service
        .save_profile(UserId::new("asha"), update)
        .expect("profile saved");
    assert_eq!(saved.email, "asha@example.org");
    assert_eq!(saved.state, Some(StateName::new("tamil nadu")));

    let overwrite = ProfileUpdate {
        state: Some("any".to_string()),
        ..ProfileUpdate::default()
    };
    service
        .save_profile(UserId::new("asha"), overwrite)
        .expect("profile overwritten");

    let stored = profiles.all().expect("profiles listed");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0], Profile::blank(UserId::new("asha")));
}

#[test]
fn save_profile_rejects_blank_identity() {
    let (service, profiles, _, _) = build_service(Vec::new(), NotificationAudience::All);

    assert!(matches!(
        service.save_profile(UserId::new("   "), ProfileUpdate::default()),
        Err(SchemeServiceError::BlankIdentity)
    ));
    assert!(profiles.all().expect("profiles listed").is_empty());
}

#[test]
fn add_scheme_appends_and_notifies_every_profile() {
    let (service, profiles, catalog, notifier) =
        build_service(vec![scheme_x()], NotificationAudience::All);
    profiles.upsert(profile("asha")).expect("seed");
    profiles.upsert(profile("ravi")).expect("seed");

    let added = service.add_scheme(draft("Ladli Behna")).expect("scheme added");
    assert_eq!(added.record.state, StateName::new("delhi"));
    assert_eq!(added.notified, 2);
    assert!(added.failures.is_empty());
    assert_eq!(catalog.names(), vec!["SchemeX", "Ladli Behna"]);

    let events = notifier.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].recipient, UserId::new("asha"));
    assert_eq!(events[0].email.as_deref(), Some("asha@example.org"));
    assert_eq!(
        events[0].message,
        "Hello asha, a new scheme 'Ladli Behna' has been added that might be of interest to you. Check it out!"
    );
}

#[test]
fn matching_audience_skips_profiles_ruled_out_by_preferences() {
    let (service, profiles, _, notifier) = build_service(Vec::new(), NotificationAudience::Matching);
    profiles.upsert(profile("asha")).expect("seed");
    let mut elsewhere = profile("ravi");
    elsewhere.state = Some(StateName::new("Goa"));
    profiles.upsert(elsewhere).expect("seed");

    let added = service.add_scheme(draft("Ladli Behna")).expect("scheme added");
    assert_eq!(added.notified, 1);
    let recipients: Vec<UserId> = notifier
        .events()
        .into_iter()
        .map(|notice| notice.recipient)
        .collect();
    assert_eq!(recipients, vec![UserId::new("asha")]);
}

#[test]
fn add_scheme_rejects_invalid_draft_without_appending() {
    let (service, _, catalog, notifier) = build_service(Vec::new(), NotificationAudience::All);
    let mut invalid = draft("Inverted");
    invalid.start_age = 50;
    invalid.end_age = 20;

    assert!(matches!(
        service.add_scheme(invalid),
        Err(SchemeServiceError::InvalidScheme(RecordDefect::InvertedAgeRange { start: 50, end: 20 }))
    ));
    assert!(catalog.names().is_empty());
    assert!(notifier.events().is_empty());
}

#[test]
fn add_scheme_keeps_record_when_a_notification_fails() {
    let profiles = Arc::new(MemoryProfiles::default());
    profiles.upsert(profile("asha")).expect("seed");
    profiles.upsert(profile("ravi")).expect("seed");
    let catalog = Arc::new(MemoryCatalog::default());
    let notifier = Arc::new(FlakyNotifier {
        refuse: UserId::new("asha"),
        delivered: Mutex::new(Vec::new()),
    });
    let service = SchemeFinderService::new(
        profiles,
        catalog.clone(),
        notifier.clone(),
        NotificationAudience::All,
    );

    let added = service.add_scheme(draft("Ladli Behna")).expect("scheme added");
    assert_eq!(added.notified, 1);
    assert_eq!(added.failures.len(), 1);
    assert_eq!(
        added.failures[0].collaborator,
        Collaborator::NotificationDispatcher
    );
    assert!(added.failures[0].detail.starts_with("asha:"));
    assert_eq!(catalog.names(), vec!["Ladli Behna"]);
    assert_eq!(
        *notifier.delivered.lock().expect("notifier mutex poisoned"),
        vec![UserId::new("ravi")]
    );
}

#[test]
fn add_scheme_reports_unreadable_profiles_after_appending() {
    let catalog = Arc::new(MemoryCatalog::default());
    let service = SchemeFinderService::new(
        Arc::new(UnavailableProfiles),
        catalog.clone(),
        Arc::new(MemoryNotifier::default()),
        NotificationAudience::All,
    );

    let added = service.add_scheme(draft("Ladli Behna")).expect("scheme added");
    assert_eq!(added.notified, 0);
    assert_eq!(added.failures.len(), 1);
    assert_eq!(added.failures[0].collaborator, Collaborator::ProfileStore);
    assert_eq!(catalog.names(), vec!["Ladli Behna"]);
}

#[test]
fn add_scheme_fails_when_catalog_rejects_append() {
    let notifier = Arc::new(MemoryNotifier::default());
    let profiles = Arc::new(MemoryProfiles::default());
    profiles.upsert(profile("asha")).expect("seed");
    let service = SchemeFinderService::new(
        profiles,
        Arc::new(UnavailableCatalog),
        notifier.clone(),
        NotificationAudience::All,
    );

    assert!(matches!(
        service.add_scheme(draft("Ladli Behna")),
        Err(SchemeServiceError::Collaborator(err)) if err.collaborator == Collaborator::CatalogStore
    ));
    assert!(notifier.events().is_empty());
}

#[test]
fn explanations_cover_the_catalog_read_that_produced_the_matches() {
    let mut closed = scheme_x();
    closed.name = "Closed Window".to_string();
    closed.start_age = 50;
    let catalog = Arc::new(ShiftingCatalog::new(vec![
        vec![scheme_x(), closed],
        vec![open_scheme("Added Later")],
    ]));
    let service = SchemeFinderService::new(
        Arc::new(MemoryProfiles::default()),
        catalog.clone(),
        Arc::new(MemoryNotifier::default()),
        NotificationAudience::All,
    );

    let explained = service
        .find_explained(None, &delhi_query())
        .expect("search succeeds");

    let matched: Vec<&str> = explained
        .outcome
        .matches
        .iter()
        .map(|record| record.name.as_str())
        .collect();
    assert_eq!(matched, vec!["SchemeX"]);

    let explained_names: Vec<&str> = explained
        .explanations
        .iter()
        .map(|explanation| explanation.record.name.as_str())
        .collect();
    assert_eq!(explained_names, vec!["SchemeX", "Closed Window"]);
    assert!(explained.explanations[0].eligible());
    assert!(!explained.explanations[1].eligible());

    let remaining = catalog.loads.lock().expect("catalog mutex poisoned");
    assert_eq!(remaining.len(), 1);
}
