//! Offer letter editing session: `form → preview → success`.
//!
//! `preview → form` is allowed (edit and retry). Nothing leaves `success`.
//! `submitting` is held only while the create request is in flight, so two
//! concurrent submits of the same preview cannot both reach the store.
//! Cancelling drops the session unless a submit is in flight; nothing was persisted before `success`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::offer::draft::{DraftValidationError, OfferLetterForm, OfferSubmission};
use crate::offer::template::TemplateResolution;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OfferSession {
    Form {
        form: OfferLetterForm,
    },
    Preview {
        form: OfferLetterForm,
        submission: OfferSubmission,
    },
    Submitting {
        form: OfferLetterForm,
        submission: OfferSubmission,
    },
    Success {
        offer_letter_id: Uuid,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("Cannot {action} while the session is in the '{from}' state")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    #[error(transparent)]
    Invalid(#[from] DraftValidationError),
}

impl OfferSession {
    pub fn new(form: OfferLetterForm) -> Self {
        OfferSession::Form { form }
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            OfferSession::Form { .. } => "form",
            OfferSession::Preview { .. } => "preview",
            OfferSession::Submitting { .. } => "submitting",
            OfferSession::Success { .. } => "success",
        }
    }

    /// The form being edited or previewed, if the session still has one.
    pub fn form(&self) -> Option<&OfferLetterForm> {
        match self {
            OfferSession::Form { form }
            | OfferSession::Preview { form, .. }
            | OfferSession::Submitting { form, .. } => Some(form),
            OfferSession::Success { .. } => None,
        }
    }

    fn reject(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            from: self.state_name(),
            action,
        }
    }

    /// Merges a partial form. Only allowed while editing.
    pub fn update_form(&mut self, patch: OfferLetterForm) -> Result<(), SessionError> {
        match self {
            OfferSession::Form { form } => {
                form.merge(patch);
                Ok(())
            }
            _ => Err(self.reject("edit the form")),
        }
    }

    /// `form → preview`. Validation failures leave the session in `form`.
    pub fn preview(
        &mut self,
        template: &TemplateResolution<'_>,
        today: NaiveDate,
    ) -> Result<(), SessionError> {
        let OfferSession::Form { form } = self else {
            return Err(self.reject("preview"));
        };
        let submission = form.validate(template, today)?;
        let form = std::mem::take(form);
        *self = OfferSession::Preview { form, submission };
        Ok(())
    }

    /// `preview → form`.
    pub fn edit(&mut self) -> Result<(), SessionError> {
        let OfferSession::Preview { form, .. } = self else {
            return Err(self.reject("return to editing"));
        };
        let form = std::mem::take(form);
        *self = OfferSession::Form { form };
        Ok(())
    }

    /// `preview → submitting`, handing out the payload to persist.
    pub fn begin_submit(&mut self) -> Result<OfferSubmission, SessionError> {
        let OfferSession::Preview { form, submission } = self else {
            return Err(self.reject("submit"));
        };
        let form = std::mem::take(form);
        let submission = submission.clone();
        *self = OfferSession::Submitting {
            form,
            submission: submission.clone(),
        };
        Ok(submission)
    }

    /// `submitting → success`.
    pub fn complete(&mut self, offer_letter_id: Uuid) -> Result<(), SessionError> {
        if !matches!(self, OfferSession::Submitting { .. }) {
            return Err(self.reject("complete submission"));
        }
        *self = OfferSession::Success { offer_letter_id };
        Ok(())
    }

    /// `submitting → preview` after a failed create, so the user can resubmit by hand.
    pub fn abort_submit(&mut self) {
        if let OfferSession::Submitting { form, submission } = self {
            let form = std::mem::take(form);
            let submission = submission.clone();
            *self = OfferSession::Preview { form, submission };
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Registry
// ────────────────────────────────────────────────────────────────────────────

/// Sessions untouched for this long are dropped on the next `open`.
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    session: OfferSession,
    touched_at: Instant,
}

/// In-memory session table shared by all handlers.
///
/// Abandoned sessions expire after an idle TTL. A session that is
/// `submitting` never expires and cannot be cancelled, so the in-flight
/// create always finds it again.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    idle_ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_idle_ttl(SESSION_IDLE_TTL)
    }
}

impl SessionRegistry {
    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            inner: Arc::default(),
            idle_ttl,
        }
    }

    fn is_live(&self, entry: &SessionEntry, now: Instant) -> bool {
        matches!(entry.session, OfferSession::Submitting { .. })
            || now.duration_since(entry.touched_at) < self.idle_ttl
    }

    pub async fn open(&self, session: OfferSession) -> Uuid {
        let id = Uuid::new_v4();
        let now = Instant::now();
        let mut sessions = self.inner.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| self.is_live(entry, now));
        let expired = before - sessions.len();
        if expired > 0 {
            debug!("Expired {expired} idle offer sessions");
        }

        sessions.insert(
            id,
            SessionEntry {
                session,
                touched_at: now,
            },
        );
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<OfferSession> {
        let sessions = self.inner.read().await;
        sessions
            .get(&id)
            .filter(|entry| self.is_live(entry, Instant::now()))
            .map(|entry| entry.session.clone())
    }

    /// Runs `f` against the session under the write lock and refreshes its idle timer.
    /// Returns `None` when the session does not exist or has expired.
    pub async fn update<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut OfferSession) -> T,
    ) -> Option<T> {
        let now = Instant::now();
        let mut sessions = self.inner.write().await;
        let entry = sessions
            .get_mut(&id)
            .filter(|entry| self.is_live(entry, now))?;
        entry.touched_at = now;
        Some(f(&mut entry.session))
    }

    /// Drops the session. Refused while a submit is in flight.
    /// `Ok(false)` means there was nothing to drop.
    pub async fn discard(&self, id: Uuid) -> Result<bool, SessionError> {
        let mut sessions = self.inner.write().await;
        match sessions.get(&id) {
            None => Ok(false),
            Some(entry) if matches!(entry.session, OfferSession::Submitting { .. }) => {
                Err(entry.session.reject("cancel"))
            }
            Some(_) => Ok(sessions.remove(&id).is_some()),
        }
    }
}
