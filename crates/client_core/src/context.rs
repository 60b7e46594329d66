use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::domain::{ListId, NoteId, UserId, UserProfile};
use tokio::sync::{broadcast, Mutex};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    SessionStarted {
        user_id: UserId,
    },
    SessionEnded,
    UnreadCountChanged(u32),
    FavouriteChanged {
        note_id: NoteId,
        favourite: bool,
    },
    ListMembershipChanged {
        list_id: ListId,
        note_id: NoteId,
        member: bool,
    },
    NotePurchased {
        note_id: NoteId,
    },
    Error(String),
}

#[derive(Default)]
struct ContextState {
    session: Option<Session>,
    unread_count: u32,
}

/// Application-wide state handed to every page: the signed-in session, the unread
/// notification counter, and an event feed. Cloning shares the same state.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    state: Mutex<ContextState>,
    events: broadcast::Sender<ClientEvent>,
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AppContext {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(ContextInner {
                state: Mutex::new(ContextState::default()),
                events,
            }),
        }
    }

    pub async fn start_session(&self, session: Session) {
        let user_id = session.user.user_id;
        {
            let mut guard = self.inner.state.lock().await;
            guard.session = Some(session);
            guard.unread_count = 0;
        }
        info!(user_id = user_id.0, "session: started");
        self.emit(ClientEvent::SessionStarted { user_id });
    }

    /// Clears the session and the unread counter. Ending an absent session is a no-op.
    pub async fn end_session(&self) {
        let ended = {
            let mut guard = self.inner.state.lock().await;
            guard.unread_count = 0;
            guard.session.take()
        };
        if let Some(session) = ended {
            info!(user_id = session.user.user_id.0, "session: ended");
            self.emit(ClientEvent::SessionEnded);
        }
    }

    /// Current session; an expired one counts as absent.
    pub async fn session(&self) -> Option<Session> {
        self.session_at(Utc::now()).await
    }

    pub async fn session_at(&self, now: DateTime<Utc>) -> Option<Session> {
        let guard = self.inner.state.lock().await;
        guard
            .session
            .as_ref()
            .filter(|session| !session.is_expired_at(now))
            .cloned()
    }

    pub async fn unread_count(&self) -> u32 {
        self.inner.state.lock().await.unread_count
    }

    pub async fn set_unread_count(&self, unread: u32) {
        let changed = {
            let mut guard = self.inner.state.lock().await;
            let changed = guard.unread_count != unread;
            guard.unread_count = unread;
            changed
        };
        if changed {
            self.emit(ClientEvent::UnreadCountChanged(unread));
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    pub(crate) fn emit(&self, event: ClientEvent) {
        let _ = self.inner.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/context_tests.rs"]
mod tests;
