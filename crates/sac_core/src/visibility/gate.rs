//! Visibility state machine.
//!
//! # Responsibility
//! - Decide whether avatars and scores are shown and whether list entries
//!   accept edit/delete.
//! - Mirror the current mode into session storage and restore it.
//!
//! # Invariants
//! - At most one view-once expiry timer is pending, and only while the
//!   mode is `ViewOnce`.
//! - Leaving `ViewOnce` for any reason cancels its timer.
//! - Every mode change is reported as a `Transition` so callers redraw.
//! - The shared password is a UX deterrent, not access control.

use super::session::{
    SessionStore, FLAG_TRUE, SESSION_AUTHENTICATED, SESSION_USERNAME, SESSION_USER_EMOJI,
    SESSION_USER_ID, SESSION_VIEW_ONLY, SESSION_VIEW_ONLY_START,
};
use super::timer::{TimerId, TimerScheduler};
use crate::config::GateConfig;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Process-wide visibility mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityMode {
    LoggedOut,
    /// Time-boxed view granted by the shared password.
    ViewOnce { expires_at_ms: i64 },
    Authenticated,
}

impl VisibilityMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoggedOut => "logged_out",
            Self::ViewOnce { .. } => "view_once",
            Self::Authenticated => "authenticated",
        }
    }
}

/// Mode change the caller must react to with a redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: VisibilityMode,
    pub to: VisibilityMode,
}

/// Logged-in administrator as stored in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: String,
    pub username: String,
    pub emoji: String,
}

/// Rejected access attempts. None of them change state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// Wrong view-once password.
    WrongPassword,
    /// Edit/delete attempted while not authenticated.
    NotInteractive,
    /// Login name does not match any board profile.
    UnknownProfile(String),
    /// Login password does not match the profile.
    WrongProfilePassword(String),
}

impl Display for AuthorizationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongPassword => write!(f, "incorrect view-once password"),
            Self::NotInteractive => write!(f, "editing requires an authenticated session"),
            Self::UnknownProfile(name) => write!(f, "unknown board member: {name}"),
            Self::WrongProfilePassword(name) => write!(f, "incorrect password for {name}"),
        }
    }
}

impl Error for AuthorizationError {}

/// Three-state visibility gate backed by session storage.
pub struct VisibilityGate {
    mode: VisibilityMode,
    user: Option<SessionUser>,
    view_once_timer: Option<TimerId>,
    view_once_duration: Duration,
    view_once_password: String,
    session: Box<dyn SessionStore>,
}

impl VisibilityGate {
    /// Creates a gate in `LoggedOut`; call [`VisibilityGate::restore`] to
    /// pick up an existing session.
    pub fn new(config: &GateConfig, session: Box<dyn SessionStore>) -> Self {
        Self {
            mode: VisibilityMode::LoggedOut,
            user: None,
            view_once_timer: None,
            view_once_duration: config.view_once_duration(),
            view_once_password: config.view_once_password.clone(),
            session,
        }
    }

    pub fn mode(&self) -> VisibilityMode {
        self.mode
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn session(&self) -> &dyn SessionStore {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> &mut dyn SessionStore {
        self.session.as_mut()
    }

    /// Pending expiry timer of the current view-once window.
    pub fn view_once_timer(&self) -> Option<TimerId> {
        self.view_once_timer
    }

    /// Avatars and scores are drawn.
    pub fn is_content_visible(&self) -> bool {
        matches!(
            self.mode,
            VisibilityMode::ViewOnce { .. } | VisibilityMode::Authenticated
        )
    }

    /// List entries accept edit/delete.
    pub fn is_interactive(&self) -> bool {
        self.mode == VisibilityMode::Authenticated
    }

    /// Opens (or restarts) a view-once window when `password` matches.
    ///
    /// While authenticated content is already visible, so a correct
    /// password changes nothing.
    ///
    /// # Errors
    /// - `WrongPassword`; state is left unchanged and retries are unlimited.
    pub fn submit_view_once_password(
        &mut self,
        password: &str,
        now_ms: i64,
        timers: &mut dyn TimerScheduler,
    ) -> Result<Option<Transition>, AuthorizationError> {
        if password != self.view_once_password {
            info!(
                "event=view_once module=visibility status=error mode={} error_code=wrong_password",
                self.mode.as_str()
            );
            return Err(AuthorizationError::WrongPassword);
        }

        if self.mode == VisibilityMode::Authenticated {
            debug!("event=view_once module=visibility status=ok mode=authenticated action=noop");
            return Ok(None);
        }

        self.cancel_view_once_timer(timers);
        let expires_at_ms = now_ms.saturating_add(duration_ms(self.view_once_duration));
        self.view_once_timer = Some(timers.schedule_at(expires_at_ms));
        self.session.set(SESSION_VIEW_ONLY, FLAG_TRUE);
        let started_ms = now_ms.to_string();
        self.session.set(SESSION_VIEW_ONLY_START, &started_ms);

        info!(
            "event=view_once module=visibility status=ok expires_at_ms={}",
            expires_at_ms
        );
        Ok(self.enter(VisibilityMode::ViewOnce { expires_at_ms }))
    }

    /// Records a successful login; supersedes any view-once window.
    pub fn login(
        &mut self,
        user: SessionUser,
        timers: &mut dyn TimerScheduler,
    ) -> Option<Transition> {
        self.cancel_view_once_timer(timers);
        self.clear_view_once_keys();

        self.session.set(SESSION_AUTHENTICATED, FLAG_TRUE);
        self.session.set(SESSION_USERNAME, &user.username);
        self.session.set(SESSION_USER_EMOJI, &user.emoji);
        self.session.set(SESSION_USER_ID, &user.user_id);
        info!(
            "event=login module=visibility status=ok user_id={}",
            user.user_id
        );
        self.user = Some(user);
        self.enter(VisibilityMode::Authenticated)
    }

    /// Ends the session whatever the current mode.
    pub fn logout(&mut self, timers: &mut dyn TimerScheduler) -> Option<Transition> {
        self.cancel_view_once_timer(timers);
        self.clear_view_once_keys();
        self.clear_auth_keys();
        self.user = None;
        info!("event=logout module=visibility status=ok");
        self.enter(VisibilityMode::LoggedOut)
    }

    /// Handles a fired timer. Timers other than the pending expiry are stale
    /// and ignored.
    pub fn on_timer(&mut self, id: TimerId) -> Option<Transition> {
        if self.view_once_timer != Some(id) {
            debug!("event=timer module=visibility status=ok action=ignore_stale");
            return None;
        }
        self.view_once_timer = None;
        if !matches!(self.mode, VisibilityMode::ViewOnce { .. }) {
            return None;
        }

        self.clear_view_once_keys();
        info!("event=view_once_expired module=visibility status=ok");
        self.enter(VisibilityMode::LoggedOut)
    }

    /// Rebuilds the mode from session storage at startup.
    ///
    /// An unexpired view-once window resumes with a timer for the remaining
    /// time; an expired or malformed one is cleared.
    pub fn restore(&mut self, now_ms: i64, timers: &mut dyn TimerScheduler) -> Option<Transition> {
        if self.session.flag(SESSION_AUTHENTICATED) {
            let user = self.user_from_session();
            return self.login(user, timers);
        }

        if !self.session.flag(SESSION_VIEW_ONLY) {
            return None;
        }

        let started_at = self
            .session
            .get(SESSION_VIEW_ONLY_START)
            .and_then(|value| value.parse::<i64>().ok());
        let Some(started_at) = started_at else {
            warn!("event=session_restore module=visibility status=error error_code=bad_view_only_start");
            self.clear_view_once_keys();
            return None;
        };

        let expires_at_ms = started_at.saturating_add(duration_ms(self.view_once_duration));
        if expires_at_ms <= now_ms {
            self.clear_view_once_keys();
            return None;
        }

        self.cancel_view_once_timer(timers);
        self.view_once_timer = Some(timers.schedule_at(expires_at_ms));
        info!(
            "event=session_restore module=visibility status=ok mode=view_once remaining_ms={}",
            expires_at_ms - now_ms
        );
        self.enter(VisibilityMode::ViewOnce { expires_at_ms })
    }

    /// Re-reads the authentication flag so logins/logouts done elsewhere in
    /// the same session take effect.
    pub fn sync_session(&mut self, timers: &mut dyn TimerScheduler) -> Option<Transition> {
        let flagged = self.session.flag(SESSION_AUTHENTICATED);
        match (flagged, self.mode) {
            (true, VisibilityMode::Authenticated) | (false, VisibilityMode::LoggedOut) => None,
            (true, _) => {
                let user = self.user_from_session();
                self.login(user, timers)
            }
            (false, VisibilityMode::Authenticated) => {
                self.user = None;
                self.clear_auth_keys();
                info!("event=session_sync module=visibility status=ok action=logged_out_elsewhere");
                self.enter(VisibilityMode::LoggedOut)
            }
            (false, VisibilityMode::ViewOnce { .. }) => None,
        }
    }

    fn enter(&mut self, to: VisibilityMode) -> Option<Transition> {
        let from = self.mode;
        self.mode = to;
        if from == to {
            return None;
        }
        debug!(
            "event=gate_transition module=visibility from={} to={}",
            from.as_str(),
            to.as_str()
        );
        Some(Transition { from, to })
    }

    fn cancel_view_once_timer(&mut self, timers: &mut dyn TimerScheduler) {
        if let Some(id) = self.view_once_timer.take() {
            timers.cancel(id);
        }
    }

    fn clear_view_once_keys(&mut self) {
        self.session.remove(SESSION_VIEW_ONLY);
        self.session.remove(SESSION_VIEW_ONLY_START);
    }

    fn clear_auth_keys(&mut self) {
        self.session.remove(SESSION_AUTHENTICATED);
        self.session.remove(SESSION_USERNAME);
        self.session.remove(SESSION_USER_EMOJI);
        self.session.remove(SESSION_USER_ID);
    }

    fn user_from_session(&self) -> SessionUser {
        SessionUser {
            user_id: self.session.get(SESSION_USER_ID).unwrap_or_default(),
            username: self.session.get(SESSION_USERNAME).unwrap_or_default(),
            emoji: self.session.get(SESSION_USER_EMOJI).unwrap_or_default(),
        }
    }
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
