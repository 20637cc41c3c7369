use sac_core::avatar::FileAvatarSource;
use sac_core::config::AppConfig;
use sac_core::store::person_store::{
    PersonListing, PersonPatch, PersonRecord, StoreResult, StoredPerson,
};
use sac_core::visibility::gate::AuthorizationError;
use sac_core::visibility::session::MemorySessionStore;
use sac_core::visibility::timer::ManualClock;
use sac_core::{
    ChartService, Collaborators, Command, Event, MemoryPersonStore, PersonEdit, PersonId,
    PersonInput, PersonStore, PersonValidationError, ServiceError, SessionUser, StoreError,
    VisibilityMode,
};
use std::time::Duration;
use uuid::Uuid;

const START_MS: i64 = 1_700_000_000_123;

/// Memory store whose writes can be switched off.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryPersonStore,
    fail_writes: bool,
}

impl FlakyStore {
    fn check(&self) -> StoreResult<()> {
        if self.fail_writes {
            Err(StoreError::Unavailable("offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl PersonStore for FlakyStore {
    fn scan(&self) -> StoreResult<PersonListing> {
        self.inner.scan()
    }

    fn create(&mut self, record: &PersonRecord) -> StoreResult<PersonId> {
        self.check()?;
        self.inner.create(record)
    }

    fn update(&mut self, id: PersonId, patch: &PersonPatch) -> StoreResult<()> {
        self.check()?;
        self.inner.update(id, patch)
    }

    fn delete(&mut self, id: PersonId) -> StoreResult<()> {
        self.check()?;
        self.inner.delete(id)
    }
}

fn service_with<S: PersonStore>(store: S, clock: &ManualClock) -> ChartService<S> {
    let collaborators = Collaborators {
        avatars: Box::new(FileAvatarSource::new()),
        clock: Box::new(clock.clone()),
        session: Box::new(MemorySessionStore::new()),
    };
    let mut service = ChartService::new(AppConfig::default(), store, collaborators, 1280.0);
    service.start().unwrap();
    service
}

fn admin() -> SessionUser {
    SessionUser {
        user_id: "mo".to_string(),
        username: "Mo".to_string(),
        emoji: "🍰".to_string(),
    }
}

fn input(handle: &str, food_score: i64, character: i64) -> PersonInput {
    PersonInput {
        handle: handle.to_string(),
        food_score,
        character,
        image: None,
    }
}

fn added_id(service: &mut ChartService<impl PersonStore>, person: PersonInput) -> PersonId {
    match service.dispatch(Command::Add(person)).unwrap().event {
        Event::Added(id) => id,
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn add_edit_delete_end_to_end() {
    let clock = ManualClock::new(START_MS);
    let mut service = service_with(MemoryPersonStore::new(), &clock);
    service.dispatch(Command::LoginSucceeded(admin())).unwrap();

    let id = added_id(&mut service, input("a", 10, 90));
    let person = &service.people()[0];
    assert_eq!(person.handle(), "@a");
    assert_eq!(person.social_score(), 66);
    assert_eq!(person.id, Some(id));

    let stored = service.store().list().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].record.social_score, 66);
    assert_eq!(stored[0].record.timestamp, "2023-11-14T22:13:20.123Z");
    // No upload, so the placeholder is used.
    let avatar = stored[0].record.image_data_url.as_deref().unwrap();
    assert!(avatar.starts_with("https://ui-avatars.com/api/?name=a&"));

    let outcome = service
        .dispatch(Command::Edit {
            id,
            edit: PersonEdit {
                character: Some(20),
                ..PersonEdit::default()
            },
        })
        .unwrap();
    assert!(outcome.redraw);
    assert_eq!(service.people()[0].social_score(), 17);
    assert_eq!(service.people()[0].food_score(), 10);
    assert_eq!(service.store().list().unwrap()[0].record.social_score, 17);

    service.dispatch(Command::Delete(id)).unwrap();
    assert!(service.people().is_empty());
    assert!(service.store().is_empty());
}

#[test]
fn rename_refreshes_the_placeholder_avatar() {
    let clock = ManualClock::new(START_MS);
    let mut service = service_with(MemoryPersonStore::new(), &clock);
    service.dispatch(Command::LoginSucceeded(admin())).unwrap();
    let id = added_id(&mut service, input("before", 10, 90));

    service
        .dispatch(Command::Edit {
            id,
            edit: PersonEdit {
                handle: Some("renamed".to_string()),
                ..PersonEdit::default()
            },
        })
        .unwrap();

    let stored = service.store().list().unwrap();
    let avatar = stored[0].record.image_data_url.as_deref().unwrap();
    assert!(avatar.contains("name=renamed&"));
    assert!(!avatar.contains("name=before"));
    let in_memory = service.people()[0].avatar.as_ref().unwrap();
    assert_eq!(in_memory.as_str(), avatar);
}

#[test]
fn rename_keeps_an_uploaded_avatar() {
    let clock = ManualClock::new(START_MS);
    let dir = tempfile::tempdir().unwrap();
    let upload = dir.path().join("face.png");
    std::fs::write(&upload, [0x89, b'P', b'N', b'G']).unwrap();

    let mut service = service_with(MemoryPersonStore::new(), &clock);
    service.dispatch(Command::LoginSucceeded(admin())).unwrap();
    let id = added_id(
        &mut service,
        PersonInput {
            image: Some(upload),
            ..input("before", 10, 90)
        },
    );

    service
        .dispatch(Command::Edit {
            id,
            edit: PersonEdit {
                handle: Some("renamed".to_string()),
                ..PersonEdit::default()
            },
        })
        .unwrap();

    let stored = service.store().list().unwrap();
    let avatar = stored[0].record.image_data_url.as_deref().unwrap();
    assert!(avatar.starts_with("data:image/png;base64,"));
}

#[test]
fn out_of_range_input_is_rejected_without_mutation() {
    let clock = ManualClock::new(START_MS);
    let mut service = service_with(MemoryPersonStore::new(), &clock);
    service.dispatch(Command::LoginSucceeded(admin())).unwrap();
    let id = added_id(&mut service, input("@a", 10, 90));

    let err = service
        .dispatch(Command::Add(input("@b", 150, 50)))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(PersonValidationError::AxisOutOfRange { value: 150, .. })
    ));

    let err = service
        .dispatch(Command::Edit {
            id,
            edit: PersonEdit {
                food_score: Some(-5),
                ..PersonEdit::default()
            },
        })
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    assert_eq!(service.people().len(), 1);
    assert_eq!(service.people()[0].food_score(), 10);
    assert_eq!(service.store().len(), 1);
}

#[test]
fn mutations_require_an_authenticated_session() {
    let clock = ManualClock::new(START_MS);
    let mut service = service_with(MemoryPersonStore::new(), &clock);

    let err = service
        .dispatch(Command::Add(input("@a", 10, 90)))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Authorization(AuthorizationError::NotInteractive)
    ));

    service
        .dispatch(Command::SubmitViewOncePassword("peek".to_string()))
        .unwrap();
    assert!(matches!(
        service.dispatch(Command::Delete(Uuid::new_v4())),
        Err(ServiceError::Authorization(AuthorizationError::NotInteractive))
    ));
    assert!(service.store().is_empty());
}

#[test]
fn store_failures_roll_back() {
    let clock = ManualClock::new(START_MS);
    let mut service = service_with(FlakyStore::default(), &clock);
    service.dispatch(Command::LoginSucceeded(admin())).unwrap();
    let id = added_id(&mut service, input("@a", 10, 90));
    let before = service.people().to_vec();

    service.store_mut().fail_writes = true;

    let err = service
        .dispatch(Command::Add(input("@b", 50, 50)))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Persistence(StoreError::Unavailable(_))));
    assert_eq!(service.people(), before.as_slice());

    let err = service
        .dispatch(Command::Edit {
            id,
            edit: PersonEdit {
                handle: Some("@renamed".to_string()),
                food_score: Some(100),
                ..PersonEdit::default()
            },
        })
        .unwrap_err();
    assert!(matches!(err, ServiceError::Persistence(_)));
    assert_eq!(service.people(), before.as_slice());

    assert!(service.dispatch(Command::Delete(id)).is_err());
    assert_eq!(service.people(), before.as_slice());
}

#[test]
fn unknown_ids_are_reported() {
    let clock = ManualClock::new(START_MS);
    let mut service = service_with(MemoryPersonStore::new(), &clock);
    service.dispatch(Command::LoginSucceeded(admin())).unwrap();

    let missing = Uuid::new_v4();
    assert!(matches!(
        service.dispatch(Command::Delete(missing)),
        Err(ServiceError::UnknownPerson(id)) if id == missing
    ));
}

#[test]
fn load_skips_invalid_documents_and_recomputes_scores() {
    let legacy = StoredPerson {
        id: Uuid::new_v4(),
        record: PersonRecord {
            handle: "@legacy".to_string(),
            food_score: 150,
            character: 50,
            social_score: 80,
            image_data_url: None,
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        },
    };
    let stale = StoredPerson {
        id: Uuid::new_v4(),
        record: PersonRecord {
            handle: "stale".to_string(),
            food_score: 10,
            character: 90,
            social_score: 0,
            image_data_url: Some("data:image/png;base64,AAAA".to_string()),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        },
    };
    let stale_id = stale.id;
    let store = MemoryPersonStore::with_documents(vec![legacy, stale]);

    let clock = ManualClock::new(START_MS);
    let collaborators = Collaborators {
        avatars: Box::new(FileAvatarSource::new()),
        clock: Box::new(clock.clone()),
        session: Box::new(MemorySessionStore::new()),
    };
    let mut service = ChartService::new(AppConfig::default(), store, collaborators, 1280.0);
    let outcome = service.start().unwrap();

    match outcome.event {
        Event::Loaded(report) => {
            assert_eq!(report.loaded, 1);
            assert_eq!(report.skipped, 1);
            assert_eq!(report.rescored, 1);
        }
        other => panic!("unexpected event {other:?}"),
    }
    let person = &service.people()[0];
    assert_eq!(person.id, Some(stale_id));
    assert_eq!(person.handle(), "@stale");
    assert_eq!(person.social_score(), 66);
    assert!(person.avatar.as_ref().unwrap().is_embedded());
}

#[test]
fn list_entries_hide_scores_until_visible() {
    let clock = ManualClock::new(START_MS);
    let mut service = service_with(MemoryPersonStore::new(), &clock);
    service.dispatch(Command::LoginSucceeded(admin())).unwrap();
    added_id(&mut service, input("@a", 10, 90));
    service.dispatch(Command::Logout).unwrap();

    let entry = &service.list_entries()[0];
    assert_eq!(entry.handle, "@a");
    assert_eq!(entry.social_score, None);
    assert_eq!(entry.avatar, None);
    assert!(!entry.interactive);

    service
        .dispatch(Command::SubmitViewOncePassword("peek".to_string()))
        .unwrap();
    let entry = &service.list_entries()[0];
    assert_eq!(entry.social_score, Some(66));
    assert!(entry.avatar.is_some());
    assert!(!entry.interactive);
}

#[test]
fn view_once_expires_through_timer_polling() {
    let clock = ManualClock::new(START_MS);
    let mut service = service_with(MemoryPersonStore::new(), &clock);

    let outcome = service
        .dispatch(Command::SubmitViewOncePassword("peek".to_string()))
        .unwrap();
    assert!(outcome.redraw);
    assert_eq!(service.next_timer_deadline(), Some(START_MS + 15_000));

    clock.advance(Duration::from_millis(14_999));
    assert!(service.poll_timers().is_empty());
    assert!(service.gate().is_content_visible());

    clock.advance(Duration::from_millis(1));
    let outcomes = service.poll_timers();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].redraw);
    assert_eq!(service.gate().mode(), VisibilityMode::LoggedOut);
    assert_eq!(service.next_timer_deadline(), None);
}

#[test]
fn wrong_view_once_password_is_an_authorization_error() {
    let clock = ManualClock::new(START_MS);
    let mut service = service_with(MemoryPersonStore::new(), &clock);
    assert!(matches!(
        service.dispatch(Command::SubmitViewOncePassword("guess".to_string())),
        Err(ServiceError::Authorization(AuthorizationError::WrongPassword))
    ));
    assert_eq!(service.gate().mode(), VisibilityMode::LoggedOut);
}

#[test]
fn resize_switches_profiles_only_when_needed() {
    let clock = ManualClock::new(START_MS);
    let mut service = service_with(MemoryPersonStore::new(), &clock);

    let outcome = service
        .dispatch(Command::Resize { window_width: 700.0 })
        .unwrap();
    assert!(outcome.redraw);
    assert!(service.viewport().narrow);
    assert_eq!(service.viewport().width, 690.0);

    let outcome = service
        .dispatch(Command::Resize { window_width: 700.0 })
        .unwrap();
    assert!(!outcome.redraw);
    assert_eq!(outcome.event, Event::Unchanged);
}
