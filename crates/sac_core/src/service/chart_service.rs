//! Chart controller.
//!
//! # Responsibility
//! - Own the people sequence, the visibility gate and the timer queue.
//! - Turn UI commands into validated, persisted state changes.
//! - Paint the chart on request.
//!
//! # Invariants
//! - A load replaces the whole sequence at once; no render ever sees a
//!   partial load.
//! - add/edit/delete only touch the sequence after the store round trip
//!   succeeded; a store failure leaves it exactly as before.
//! - Edit and delete (and add) require an interactive (authenticated) gate.
//! - Validation happens before any store call.

use crate::avatar::{resolve_avatar, AvatarSource, FileAvatarSource};
use crate::config::AppConfig;
use crate::layout::{LayoutError, Placement, Viewport};
use crate::model::image::ImageRef;
use crate::model::person::{Person, PersonId, PersonValidationError};
use crate::render::{ChartRenderer, Surface};
use crate::store::person_store::{PersonPatch, PersonRecord, PersonStore, StoreError};
use crate::visibility::gate::{
    AuthorizationError, SessionUser, Transition, VisibilityGate, VisibilityMode,
};
use crate::visibility::session::{MemorySessionStore, SessionStore};
use crate::visibility::timer::{Clock, SystemClock, TimerId, TimerQueue};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Instant;

/// Service error surfaced to the UI shell.
#[derive(Debug)]
pub enum ServiceError {
    /// Bad input; nothing was mutated.
    Validation(PersonValidationError),
    /// Store round trip failed; in-memory state was left unchanged.
    Persistence(StoreError),
    /// Access rejected; nothing was mutated.
    Authorization(AuthorizationError),
    /// No person with this id in the current sequence.
    UnknownPerson(PersonId),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "failed to save changes: {err}"),
            Self::Authorization(err) => write!(f, "{err}"),
            Self::UnknownPerson(id) => write!(f, "person not found: {id}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::Authorization(err) => Some(err),
            Self::UnknownPerson(_) => None,
        }
    }
}

impl From<PersonValidationError> for ServiceError {
    fn from(value: PersonValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Persistence(value)
    }
}

impl From<AuthorizationError> for ServiceError {
    fn from(value: AuthorizationError) -> Self {
        Self::Authorization(value)
    }
}

/// Add-person form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonInput {
    pub handle: String,
    pub food_score: i64,
    pub character: i64,
    /// Uploaded avatar file.
    pub image: Option<PathBuf>,
}

/// Edit-person form input; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonEdit {
    pub handle: Option<String>,
    pub food_score: Option<i64>,
    pub character: Option<i64>,
    pub image: Option<PathBuf>,
}

/// UI action routed to the service.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load,
    Add(PersonInput),
    Edit { id: PersonId, edit: PersonEdit },
    Delete(PersonId),
    SubmitViewOncePassword(String),
    LoginSucceeded(SessionUser),
    Logout,
    /// Periodic re-read of the session's authentication flag.
    SyncSession,
    TimerFired(TimerId),
    Resize { window_width: f64 },
}

/// Summary of one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Documents rejected by validation (e.g. legacy out-of-range axes).
    pub skipped: usize,
    /// Documents whose stored social score disagreed with the axes.
    pub rescored: usize,
}

/// What a command changed.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Loaded(LoadReport),
    Added(PersonId),
    Edited(PersonId),
    Deleted(PersonId),
    VisibilityChanged(Transition),
    Resized(Viewport),
    Unchanged,
}

/// Result of a dispatched command.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// The previous render is stale.
    pub redraw: bool,
    pub event: Event,
}

impl Outcome {
    fn redraw(event: Event) -> Self {
        Self {
            redraw: true,
            event,
        }
    }

    fn unchanged() -> Self {
        Self {
            redraw: false,
            event: Event::Unchanged,
        }
    }

    fn from_transition(transition: Option<Transition>) -> Self {
        match transition {
            Some(transition) => Self::redraw(Event::VisibilityChanged(transition)),
            None => Self::unchanged(),
        }
    }

    /// Status-line message for the user, if any.
    pub fn notice(&self) -> Option<String> {
        match &self.event {
            Event::Loaded(report) if report.skipped > 0 => Some(format!(
                "loaded {} people, skipped {} invalid entries",
                report.loaded, report.skipped
            )),
            Event::Added(_) => Some("person added".to_string()),
            Event::Edited(_) => Some("person updated".to_string()),
            Event::Deleted(_) => Some("person deleted".to_string()),
            Event::VisibilityChanged(Transition {
                from: VisibilityMode::ViewOnce { .. },
                to: VisibilityMode::LoggedOut,
            }) => Some("view-once window closed".to_string()),
            _ => None,
        }
    }
}

/// List row projection; hidden fields are `None` unless content is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub id: Option<PersonId>,
    pub handle: String,
    pub social_score: Option<u8>,
    pub avatar: Option<ImageRef>,
    /// Clicking opens the edit/delete flow.
    pub interactive: bool,
}

/// External collaborators besides the person store.
pub struct Collaborators {
    pub avatars: Box<dyn AvatarSource>,
    pub clock: Box<dyn Clock>,
    pub session: Box<dyn SessionStore>,
}

impl Collaborators {
    /// File uploads, wall clock and a fresh in-memory session.
    pub fn system() -> Self {
        Self {
            avatars: Box::new(FileAvatarSource::new()),
            clock: Box::new(SystemClock),
            session: Box::new(MemorySessionStore::new()),
        }
    }
}

/// Single-threaded controller owning all chart state.
pub struct ChartService<S: PersonStore> {
    store: S,
    avatars: Box<dyn AvatarSource>,
    clock: Box<dyn Clock>,
    timers: TimerQueue,
    gate: VisibilityGate,
    renderer: ChartRenderer,
    config: AppConfig,
    people: Vec<Person>,
    viewport: Viewport,
}

impl<S: PersonStore> ChartService<S> {
    /// Creates a logged-out service with an empty sequence.
    ///
    /// Call [`ChartService::start`] to restore the session and load people.
    pub fn new(
        config: AppConfig,
        store: S,
        collaborators: Collaborators,
        window_width: f64,
    ) -> Self {
        let gate = VisibilityGate::new(&config.gate, collaborators.session);
        let viewport = Viewport::for_window(&config.chart, window_width);
        Self {
            store,
            avatars: collaborators.avatars,
            clock: collaborators.clock,
            timers: TimerQueue::new(),
            gate,
            renderer: ChartRenderer::new(config.chart.clone()),
            config,
            people: Vec::new(),
            viewport,
        }
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn gate(&self) -> &VisibilityGate {
        &self.gate
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Pending timers, for drivers that sleep until the next deadline.
    pub fn next_timer_deadline(&self) -> Option<i64> {
        self.timers.next_deadline()
    }

    /// Restores visibility from the session, then loads people.
    pub fn start(&mut self) -> Result<Outcome, ServiceError> {
        let now_ms = self.clock.now_ms();
        self.gate.restore(now_ms, &mut self.timers);
        self.load()
    }

    /// Routes one command.
    pub fn dispatch(&mut self, command: Command) -> Result<Outcome, ServiceError> {
        match command {
            Command::Load => self.load(),
            Command::Add(input) => self.add_person(input),
            Command::Edit { id, edit } => self.edit_person(id, edit),
            Command::Delete(id) => self.delete_person(id),
            Command::SubmitViewOncePassword(password) => self.submit_view_once_password(&password),
            Command::LoginSucceeded(user) => Ok(self.login(user)),
            Command::Logout => Ok(self.logout()),
            Command::SyncSession => Ok(self.sync_session()),
            Command::TimerFired(id) => Ok(self.on_timer(id)),
            Command::Resize { window_width } => Ok(self.resize(window_width)),
        }
    }

    /// Fires every due timer and returns the resulting outcomes.
    pub fn poll_timers(&mut self) -> Vec<Outcome> {
        let now_ms = self.clock.now_ms();
        self.timers
            .drain_due(now_ms)
            .into_iter()
            .map(|id| self.on_timer(id))
            .collect()
    }

    /// Replaces the sequence with the store's current contents.
    ///
    /// # Errors
    /// - `Persistence` when listing fails; the old sequence is kept.
    pub fn load(&mut self) -> Result<Outcome, ServiceError> {
        let started_at = Instant::now();
        let listing = self.store.scan().map_err(|err| {
            error!("event=people_load module=service status=error error={err}");
            ServiceError::from(err)
        })?;

        let mut report = LoadReport {
            skipped: listing.malformed,
            ..LoadReport::default()
        };
        let mut people = Vec::with_capacity(listing.documents.len());
        for document in listing.documents {
            let record = &document.record;
            let mut person = match Person::new(&record.handle, record.food_score, record.character)
            {
                Ok(person) => person,
                Err(err) => {
                    warn!(
                        "event=people_load module=service status=skip id={} error={}",
                        document.id, err
                    );
                    report.skipped += 1;
                    continue;
                }
            };
            if i64::from(person.social_score()) != record.social_score {
                report.rescored += 1;
            }
            let avatar = match document.avatar() {
                Some(image) => Some(image),
                None => resolve_avatar(self.avatars.as_ref(), None, person.handle()),
            };
            person.avatar = avatar;
            people.push(person.with_id(document.id));
        }

        report.loaded = people.len();
        self.people = people;
        info!(
            "event=people_load module=service status=ok loaded={} skipped={} rescored={} duration_ms={}",
            report.loaded,
            report.skipped,
            report.rescored,
            started_at.elapsed().as_millis()
        );
        Ok(Outcome::redraw(Event::Loaded(report)))
    }

    /// Validates, persists and appends a new person.
    ///
    /// # Errors
    /// - `Authorization` when not authenticated.
    /// - `Validation` for bad handle/axes.
    /// - `Persistence` when the store rejects the create.
    pub fn add_person(&mut self, input: PersonInput) -> Result<Outcome, ServiceError> {
        self.require_interactive()?;
        let mut person = Person::new(&input.handle, input.food_score, input.character)?;
        person.avatar = resolve_avatar(
            self.avatars.as_ref(),
            input.image.as_deref(),
            person.handle(),
        );

        let record = PersonRecord::from_person(&person, self.timestamp());
        let id = self.store.create(&record).map_err(|err| {
            error!("event=person_add module=service status=error error={err}");
            ServiceError::from(err)
        })?;

        info!(
            "event=person_add module=service status=ok id={} social_score={}",
            id,
            person.social_score()
        );
        self.people.push(person.with_id(id));
        Ok(Outcome::redraw(Event::Added(id)))
    }

    /// Applies an edit; the score is recomputed when an axis changes.
    ///
    /// A rename without a new image regenerates a placeholder avatar so it
    /// shows the new handle; uploaded images are left alone.
    ///
    /// # Errors
    /// - `Authorization`, `UnknownPerson`, `Validation`, `Persistence`.
    pub fn edit_person(
        &mut self,
        id: PersonId,
        edit: PersonEdit,
    ) -> Result<Outcome, ServiceError> {
        self.require_interactive()?;
        let index = self.index_of(id)?;

        let mut updated = self.people[index].clone();
        if let Some(handle) = edit.handle.as_deref() {
            updated.set_handle(handle)?;
        }
        let previous_handle = self.people[index].handle();
        let stale_placeholder = updated.handle() != previous_handle
            && updated.avatar.is_some()
            && updated.avatar == self.avatars.placeholder(previous_handle).ok();
        let food_score = edit
            .food_score
            .unwrap_or_else(|| i64::from(updated.food_score()));
        let character = edit
            .character
            .unwrap_or_else(|| i64::from(updated.character()));
        updated.set_axes(food_score, character)?;

        if let Some(path) = edit.image.as_deref() {
            match self.avatars.load_file(path) {
                Ok(image) => updated.avatar = Some(image),
                Err(err) => warn!(
                    "event=person_edit module=service status=ok avatar=kept error={err}"
                ),
            }
        } else if stale_placeholder {
            match self.avatars.placeholder(updated.handle()) {
                Ok(image) => updated.avatar = Some(image),
                Err(err) => warn!(
                    "event=person_edit module=service status=ok avatar=kept error={err}"
                ),
            }
        }

        let patch = PersonPatch::from_person(&updated, self.timestamp());
        self.store.update(id, &patch).map_err(|err| {
            error!("event=person_edit module=service status=error id={id} error={err}");
            ServiceError::from(err)
        })?;

        info!(
            "event=person_edit module=service status=ok id={} social_score={}",
            id,
            updated.social_score()
        );
        self.people[index] = updated;
        Ok(Outcome::redraw(Event::Edited(id)))
    }

    /// Removes a person from the store and the sequence.
    pub fn delete_person(&mut self, id: PersonId) -> Result<Outcome, ServiceError> {
        self.require_interactive()?;
        let index = self.index_of(id)?;

        self.store.delete(id).map_err(|err| {
            error!("event=person_delete module=service status=error id={id} error={err}");
            ServiceError::from(err)
        })?;

        info!("event=person_delete module=service status=ok id={id}");
        self.people.remove(index);
        Ok(Outcome::redraw(Event::Deleted(id)))
    }

    pub fn submit_view_once_password(&mut self, password: &str) -> Result<Outcome, ServiceError> {
        let now_ms = self.clock.now_ms();
        let transition = self
            .gate
            .submit_view_once_password(password, now_ms, &mut self.timers)?;
        // A restarted window keeps the mode but still needs a fresh render.
        Ok(match transition {
            Some(transition) => Outcome::redraw(Event::VisibilityChanged(transition)),
            None if self.gate.view_once_timer().is_some() => Outcome {
                redraw: true,
                event: Event::Unchanged,
            },
            None => Outcome::unchanged(),
        })
    }

    pub fn login(&mut self, user: SessionUser) -> Outcome {
        Outcome::from_transition(self.gate.login(user, &mut self.timers))
    }

    pub fn logout(&mut self) -> Outcome {
        Outcome::from_transition(self.gate.logout(&mut self.timers))
    }

    pub fn sync_session(&mut self) -> Outcome {
        Outcome::from_transition(self.gate.sync_session(&mut self.timers))
    }

    fn on_timer(&mut self, id: TimerId) -> Outcome {
        Outcome::from_transition(self.gate.on_timer(id))
    }

    /// Recomputes the viewport for a new window width.
    pub fn resize(&mut self, window_width: f64) -> Outcome {
        let viewport = Viewport::for_window(&self.config.chart, window_width);
        if viewport == self.viewport {
            return Outcome::unchanged();
        }
        self.viewport = viewport;
        Outcome::redraw(Event::Resized(viewport))
    }

    /// Paints the chart for the current viewport and visibility.
    pub fn render(&self, surface: &mut dyn Surface) -> Result<Vec<Placement>, LayoutError> {
        self.renderer
            .render(surface, &self.people, &self.viewport, &self.gate)
    }

    /// List rows in sequence order, gated by visibility.
    pub fn list_entries(&self) -> Vec<ListEntry> {
        let visible = self.gate.is_content_visible();
        let interactive = self.gate.is_interactive();
        self.people
            .iter()
            .map(|person| ListEntry {
                id: person.id,
                handle: person.handle().to_string(),
                social_score: visible.then(|| person.social_score()),
                avatar: if visible { person.avatar.clone() } else { None },
                interactive,
            })
            .collect()
    }

    fn require_interactive(&self) -> Result<(), AuthorizationError> {
        if self.gate.is_interactive() {
            Ok(())
        } else {
            Err(AuthorizationError::NotInteractive)
        }
    }

    fn index_of(&self, id: PersonId) -> Result<usize, ServiceError> {
        self.people
            .iter()
            .position(|person| person.id == Some(id))
            .ok_or(ServiceError::UnknownPerson(id))
    }

    fn timestamp(&self) -> String {
        rfc3339_millis(self.clock.now_ms())
    }
}

/// RFC 3339 UTC timestamp with millisecond precision.
pub fn rfc3339_millis(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
