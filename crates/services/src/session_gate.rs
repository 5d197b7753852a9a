use crate::auth::{AuthService, AuthState, Principal};

/// What a protected view should do once the auth state is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Render for this principal.
    Render(Principal),
    /// Send the caller to the sign-in page.
    RedirectToSignIn,
}

/// Blocks protected views until the provider has reported its initial
/// state, then admits or redirects.
#[derive(Clone)]
pub struct SessionGate {
    auth: AuthService,
}

impl SessionGate {
    #[must_use]
    pub fn new(auth: AuthService) -> Self {
        Self { auth }
    }

    /// Decides whether a protected view may render.
    ///
    /// Waits out the initial `Unknown` state rather than redirecting on it,
    /// so a restored session is not bounced to sign-in while the provider
    /// is still loading.
    pub async fn admit(&self) -> GateDecision {
        let mut watch = self.auth.subscribe();
        match watch.resolved().await {
            AuthState::SignedIn(principal) => GateDecision::Render(principal),
            _ => GateDecision::RedirectToSignIn,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use nihongo_core::model::UserId;

    #[tokio::test]
    async fn signed_in_visitors_are_admitted() {
        let auth = AuthService::new();
        let gate = SessionGate::new(auth.clone());
        let principal = Principal::new(UserId::new("u1"));

        auth.sign_in(principal.clone());
        assert_eq!(gate.admit().await, GateDecision::Render(principal));
    }

    #[tokio::test]
    async fn signed_out_visitors_are_redirected() {
        let auth = AuthService::new();
        let gate = SessionGate::new(auth.clone());

        auth.sign_out();
        assert_eq!(gate.admit().await, GateDecision::RedirectToSignIn);
    }

    #[tokio::test]
    async fn admission_waits_for_the_initial_report() {
        let auth = AuthService::new();
        let gate = SessionGate::new(auth.clone());
        let principal = Principal::new(UserId::new("u1"));

        let pending = tokio::spawn({
            let gate = gate.clone();
            async move { gate.admit().await }
        });
        auth.sign_in(principal.clone());

        assert_eq!(pending.await.unwrap(), GateDecision::Render(principal));
    }
}
