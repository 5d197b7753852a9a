//! Auth-state seam over the external identity provider.
//!
//! Authentication itself happens elsewhere; this module only carries the
//! provider's reports. The state starts as [`AuthState::Unknown`] until the
//! provider has resolved whether a session was restored, and views wait on
//! that resolution through [`AuthWatch`].

use std::sync::Arc;

use tokio::sync::watch;

use nihongo_core::model::UserId;

//
// ─── PRINCIPAL ─────────────────────────────────────────────────────────────────
//

/// The signed-in identity as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    id: UserId,
    display_name: Option<String>,
    email: Option<String>,
    photo_url: Option<String>,
}

impl Principal {
    /// Creates a principal carrying only the provider uid.
    #[must_use]
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            display_name: None,
            email: None,
            photo_url: None,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Name the home view greets the user by.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }
}

//
// ─── AUTH STATE ────────────────────────────────────────────────────────────────
//

/// What the provider has reported so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// The provider has not yet said whether a session was restored.
    #[default]
    Unknown,
    SignedOut,
    SignedIn(Principal),
}

impl AuthState {
    /// Whether the provider has reported anything yet.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !matches!(self, AuthState::Unknown)
    }

    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            AuthState::SignedIn(principal) => Some(principal),
            _ => None,
        }
    }
}

//
// ─── AUTH SERVICE ──────────────────────────────────────────────────────────────
//

/// Owns the auth state and fans it out to subscribed views.
#[derive(Clone)]
pub struct AuthService {
    state: Arc<watch::Sender<AuthState>>,
}

impl AuthService {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(AuthState::Unknown);
        Self {
            state: Arc::new(sender),
        }
    }

    /// Records a signed-in principal, from a fresh sign-in or a restored
    /// session.
    pub fn sign_in(&self, principal: Principal) {
        self.state.send_replace(AuthState::SignedIn(principal));
    }

    /// Records the signed-out state, from an explicit sign-out or the
    /// provider reporting that no session was restored.
    pub fn sign_out(&self) {
        self.state.send_replace(AuthState::SignedOut);
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Registers a subscription for a view's lifetime.
    #[must_use]
    pub fn subscribe(&self) -> AuthWatch {
        AuthWatch {
            receiver: self.state.subscribe(),
        }
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }
}

impl Default for AuthService {
    fn default() -> Self {
        Self::new()
    }
}

//
// ─── AUTH WATCH ────────────────────────────────────────────────────────────────
//

/// One view's auth-state subscription.
///
/// Dropping the watch unregisters it. A watch whose service is gone reads
/// as signed out.
#[derive(Debug)]
pub struct AuthWatch {
    receiver: watch::Receiver<AuthState>,
}

impl AuthWatch {
    /// Snapshot of the current state.
    #[must_use]
    pub fn current(&self) -> AuthState {
        self.receiver.borrow().clone()
    }

    /// Waits for the next state change and returns the new value.
    pub async fn changed(&mut self) -> AuthState {
        if self.receiver.changed().await.is_err() {
            return AuthState::SignedOut;
        }
        self.current()
    }

    /// Waits until the provider has reported an initial state.
    pub async fn resolved(&mut self) -> AuthState {
        match self.receiver.wait_for(AuthState::is_resolved).await {
            Ok(state) => state.clone(),
            Err(_) => AuthState::SignedOut,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal::new(UserId::new("u1")).with_display_name("Aoi")
    }

    #[test]
    fn state_starts_unknown() {
        let auth = AuthService::new();
        assert_eq!(auth.state(), AuthState::Unknown);
        assert!(!auth.state().is_resolved());
    }

    #[test]
    fn sign_in_then_out_round_trips() {
        let auth = AuthService::new();
        auth.sign_in(principal());
        assert_eq!(auth.state().principal(), Some(&principal()));

        auth.sign_out();
        assert_eq!(auth.state(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn watch_sees_changes() {
        let auth = AuthService::new();
        let mut watch = auth.subscribe();

        auth.sign_in(principal());
        assert_eq!(watch.changed().await, AuthState::SignedIn(principal()));
    }

    #[tokio::test]
    async fn resolved_skips_past_unknown_only() {
        let auth = AuthService::new();
        auth.sign_out();

        let mut watch = auth.subscribe();
        assert_eq!(watch.resolved().await, AuthState::SignedOut);
    }

    #[test]
    fn dropping_a_watch_unregisters_it() {
        let auth = AuthService::new();
        let watch = auth.subscribe();
        assert_eq!(auth.subscriber_count(), 1);

        drop(watch);
        assert_eq!(auth.subscriber_count(), 0);
    }
}
