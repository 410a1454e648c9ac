//! Process-wide session state with change notifications.

use tokio::sync::watch;

use crate::auth::{validate_email, AuthResult, AuthSession, IdentityProvider};

/// Holds the current session and publishes every replacement to subscribers.
pub struct SessionGate<P: IdentityProvider> {
    provider: P,
    sender: watch::Sender<Option<AuthSession>>,
}

impl<P: IdentityProvider> SessionGate<P> {
    /// Create a gate with no session; call [`Self::restore`] to rehydrate.
    pub fn new(provider: P) -> Self {
        let (sender, _) = watch::channel(None);
        Self { provider, sender }
    }

    #[must_use]
    pub fn current(&self) -> Option<AuthSession> {
        self.sender.borrow().clone()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.sender.borrow().is_some()
    }

    /// Subscribe to session replacements.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.sender.subscribe()
    }

    /// Replace the session with a provider-supplied value.
    pub fn notify(&self, session: Option<AuthSession>) {
        self.sender.send_replace(session);
    }

    /// Rehydrate the persisted session from the provider and publish it.
    pub async fn restore(&self) -> AuthResult<Option<AuthSession>> {
        let session = self.provider.current_session().await?;
        if let Some(restored) = &session {
            tracing::info!("Restored session for user {}", restored.user_id());
        }
        self.notify(session.clone());
        Ok(session)
    }

    /// Email a magic link. The session does not change until the flow completes.
    pub async fn sign_in_with_email(&self, email: &str) -> AuthResult<()> {
        let email = validate_email(email)?;
        self.provider.send_magic_link(&email).await
    }

    pub async fn verify_email_code(&self, email: &str, code: &str) -> AuthResult<AuthSession> {
        let session = self.provider.verify_email_code(email, code).await?;
        tracing::info!("Signed in as user {}", session.user_id());
        self.notify(Some(session.clone()));
        Ok(session)
    }

    pub async fn complete_magic_link(&self, redirect_url: &str) -> AuthResult<AuthSession> {
        let session = self.provider.session_from_redirect(redirect_url).await?;
        tracing::info!("Signed in as user {}", session.user_id());
        self.notify(Some(session.clone()));
        Ok(session)
    }

    /// Sign out remotely (when signed in) and publish the absent session.
    pub async fn sign_out(&self) -> AuthResult<()> {
        if let Some(session) = self.current() {
            self.provider.sign_out(&session).await?;
        }
        self.notify(None);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::auth::{AuthError, AuthUser};

    pub fn session_for(user_id: &str) -> AuthSession {
        AuthSession {
            access_token: format!("access-{user_id}"),
            refresh_token: format!("refresh-{user_id}"),
            expires_at: i64::MAX,
            user: AuthUser {
                id: user_id.to_string(),
                email: Some(format!("{user_id}@example.com")),
            },
        }
    }

    #[derive(Default)]
    pub struct FakeProvider {
        pub stored: Mutex<Option<AuthSession>>,
        pub links_sent: AtomicUsize,
        pub sign_outs: AtomicUsize,
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn current_session(&self) -> AuthResult<Option<AuthSession>> {
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn send_magic_link(&self, _email: &str) -> AuthResult<()> {
            self.links_sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn verify_email_code(&self, email: &str, code: &str) -> AuthResult<AuthSession> {
            if code != "123456" {
                return Err(AuthError::Api("Token has expired or is invalid (403)".into()));
            }
            let user = email.split('@').next().unwrap_or_default();
            let session = session_for(user);
            *self.stored.lock().unwrap() = Some(session.clone());
            Ok(session)
        }

        async fn session_from_redirect(&self, _redirect_url: &str) -> AuthResult<AuthSession> {
            Err(AuthError::InvalidRedirect("unsupported".into()))
        }

        async fn sign_out(&self, _session: &AuthSession) -> AuthResult<()> {
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            *self.stored.lock().unwrap() = None;
            Ok(())
        }
    }

    #[tokio::test]
    async fn restore_publishes_persisted_session() {
        let provider = FakeProvider::default();
        *provider.stored.lock().unwrap() = Some(session_for("alice"));
        let gate = SessionGate::new(provider);
        let mut receiver = gate.subscribe();

        let restored = gate.restore().await.unwrap();
        assert_eq!(restored.unwrap().user_id(), "alice");
        assert!(receiver.has_changed().unwrap());
        assert_eq!(
            receiver.borrow_and_update().as_ref().map(AuthSession::user_id),
            Some("alice")
        );
    }

    #[tokio::test]
    async fn invalid_email_is_rejected_without_request() {
        let gate = SessionGate::new(FakeProvider::default());
        let error = gate.sign_in_with_email("nope").await.unwrap_err();
        assert!(matches!(error, AuthError::InvalidEmail(_)));
        assert_eq!(gate.provider.links_sent.load(Ordering::SeqCst), 0);
        assert!(!gate.is_signed_in());
    }

    #[tokio::test]
    async fn failed_verification_leaves_session_unchanged() {
        let gate = SessionGate::new(FakeProvider::default());
        assert!(gate.verify_email_code("bob@example.com", "000000").await.is_err());
        assert!(gate.current().is_none());

        gate.verify_email_code("bob@example.com", "123456")
            .await
            .unwrap();
        assert_eq!(gate.current().unwrap().user_id(), "bob");
    }

    #[tokio::test]
    async fn sign_out_publishes_absent_session() {
        let gate = SessionGate::new(FakeProvider::default());
        gate.notify(Some(session_for("carol")));
        let mut receiver = gate.subscribe();

        gate.sign_out().await.unwrap();
        assert!(receiver.has_changed().unwrap());
        assert!(receiver.borrow_and_update().is_none());
        assert_eq!(gate.provider.sign_outs.load(Ordering::SeqCst), 1);
    }
}
