//! Bearer token verification and role-gated access control.
//!
//! [`AccessGate::require_authenticated`] turns a raw bearer string into a
//! [`User`]; [`RoleGuard`]s layer a predicate on top of it. Nothing is cached:
//! every call verifies the token and looks the subject up again.

use crate::auth::errors::{AuthError, UnauthenticatedReason};
use crate::database::models::User;
use crate::utils::jwt::JwtUtils;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, warn};

/// Lookup of principals by id.
///
/// `Ok(None)` means the user does not exist; `Err` is a failed lookup.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
}

/// Verifies tokens and resolves their subject to a user.
pub struct AccessGate {
    jwt: Arc<JwtUtils>,
    store: Arc<dyn PrincipalStore>,
}

impl AccessGate {
    pub fn new(jwt: Arc<JwtUtils>, store: Arc<dyn PrincipalStore>) -> Self {
        Self { jwt, store }
    }

    /// Resolves a bearer token to the user it was issued for.
    ///
    /// An empty or absent token fails with `MissingCredential` before any
    /// decoding or lookup happens.
    pub async fn require_authenticated(&self, token: Option<&str>) -> Result<User, AuthError> {
        self.resolve(token).await.map_err(|reason| {
            match reason {
                UnauthenticatedReason::LookupFailed => {
                    error!(reason = %reason, "Authentication failed")
                }
                _ => warn!(reason = %reason, "Authentication failed"),
            }
            AuthError::Unauthenticated(reason)
        })
    }

    /// Authenticates the token, then applies `guard` to the resolved user.
    pub async fn require_role<P>(
        &self,
        token: Option<&str>,
        guard: &RoleGuard<P>,
    ) -> Result<User, AuthError>
    where
        P: Fn(&User) -> bool,
    {
        let principal = self.require_authenticated(token).await?;
        guard.check(principal)
    }

    async fn resolve(&self, token: Option<&str>) -> Result<User, UnauthenticatedReason> {
        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(UnauthenticatedReason::MissingCredential),
        };

        let claims = self.jwt.decode(token)?;

        let user_id = claims
            .sub
            .as_deref()
            .and_then(|sub| sub.parse::<i64>().ok())
            .ok_or(UnauthenticatedReason::MalformedClaims)?;

        match self.store.find_by_id(user_id).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(UnauthenticatedReason::UnknownSubject),
            Err(e) => {
                error!("User lookup for subject {} failed: {}", user_id, e);
                Err(UnauthenticatedReason::LookupFailed)
            }
        }
    }
}

/// A predicate over an authenticated user.
pub struct RoleGuard<P> {
    predicate: P,
}

impl<P> RoleGuard<P>
where
    P: Fn(&User) -> bool,
{
    /// Passes `principal` through if the predicate holds, `Forbidden` otherwise.
    pub fn check(&self, principal: User) -> Result<User, AuthError> {
        if (self.predicate)(&principal) {
            Ok(principal)
        } else {
            warn!(user_id = principal.id, "Access denied by role guard");
            Err(AuthError::Forbidden)
        }
    }
}

/// Builds a guard from a role predicate.
pub fn require_role<P>(predicate: P) -> RoleGuard<P>
where
    P: Fn(&User) -> bool,
{
    RoleGuard { predicate }
}

pub fn is_admin(user: &User) -> bool {
    user.admin
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthSettings;
    use crate::utils::clock::FixedClock;
    use crate::utils::jwt::Claims;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use jsonwebtoken::Algorithm;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store that counts lookups.
    #[derive(Default)]
    struct StubStore {
        users: Vec<User>,
        fail: bool,
        lookups: AtomicUsize,
    }

    impl StubStore {
        fn with_users(users: Vec<User>) -> Self {
            Self {
                users,
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl PrincipalStore for StubStore {
        async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(self.users.iter().find(|u| u.id == id).cloned())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn user(id: i64, admin: bool) -> User {
        User {
            id,
            email: format!("user{}@example.com", id),
            name: None,
            phone: None,
            hashed_password: String::new(),
            admin,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn jwt() -> Arc<JwtUtils> {
        let settings = AuthSettings {
            secret_key: "gate-secret".to_string(),
            algorithm: Algorithm::HS256,
            access_token_ttl: Duration::minutes(60),
            refresh_token_ttl: Duration::days(7),
            bcrypt_cost: 4,
        };
        Arc::new(JwtUtils::with_clock(&settings, Arc::new(FixedClock(now()))))
    }

    fn gate(store: Arc<StubStore>) -> (AccessGate, Arc<JwtUtils>) {
        let jwt = jwt();
        (AccessGate::new(jwt.clone(), store), jwt)
    }

    #[tokio::test]
    async fn test_resolves_subject_to_user() {
        let store = Arc::new(StubStore::with_users(vec![user(42, false)]));
        let (gate, jwt) = gate(store.clone());

        let token = jwt.issue_access_token(Claims::for_subject("42"), None).unwrap();
        let principal = gate.require_authenticated(Some(&token)).await.unwrap();

        assert_eq!(principal.id, 42);
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_token_skips_lookup() {
        let store = Arc::new(StubStore::with_users(vec![user(1, true)]));
        let (gate, _) = gate(store.clone());

        let missing = AuthError::Unauthenticated(UnauthenticatedReason::MissingCredential);
        assert_eq!(gate.require_authenticated(Some("")).await.unwrap_err(), missing);
        assert_eq!(gate.require_authenticated(None).await.unwrap_err(), missing);
        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_and_expired_tokens_skip_lookup() {
        let store = Arc::new(StubStore::with_users(vec![user(1, false)]));
        let (gate, jwt) = gate(store.clone());

        let err = gate.require_authenticated(Some("invalid_token")).await.unwrap_err();
        assert_eq!(
            err,
            AuthError::Unauthenticated(UnauthenticatedReason::InvalidSignature)
        );

        let expired = jwt
            .issue_access_token(Claims::for_subject("1"), Some(Duration::seconds(-1)))
            .unwrap();
        let err = gate.require_authenticated(Some(&expired)).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthenticated(UnauthenticatedReason::Expired));

        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unparseable_subject_is_malformed() {
        let store = Arc::new(StubStore::with_users(vec![user(1, false)]));
        let (gate, jwt) = gate(store.clone());

        for claims in [Claims::default(), Claims::for_subject("not-a-number")] {
            let token = jwt.issue_access_token(claims, None).unwrap();
            let err = gate.require_authenticated(Some(&token)).await.unwrap_err();
            assert_eq!(
                err,
                AuthError::Unauthenticated(UnauthenticatedReason::MalformedClaims)
            );
        }
        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_subject() {
        let store = Arc::new(StubStore::with_users(vec![user(1, false)]));
        let (gate, jwt) = gate(store);

        let token = jwt.issue_access_token(Claims::for_subject("2"), None).unwrap();
        let err = gate.require_authenticated(Some(&token)).await.unwrap_err();
        assert_eq!(
            err,
            AuthError::Unauthenticated(UnauthenticatedReason::UnknownSubject)
        );
    }

    #[tokio::test]
    async fn test_lookup_failure_is_distinct_from_unknown_subject() {
        let store = Arc::new(StubStore::failing());
        let (gate, jwt) = gate(store.clone());

        let token = jwt.issue_access_token(Claims::for_subject("1"), None).unwrap();
        let err = gate.require_authenticated(Some(&token)).await.unwrap_err();
        assert_eq!(
            err,
            AuthError::Unauthenticated(UnauthenticatedReason::LookupFailed)
        );
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let store = Arc::new(StubStore::with_users(vec![user(5, false)]));
        let (gate, jwt) = gate(store);
        let admin_only = require_role(is_admin);

        let token = jwt.issue_access_token(Claims::for_subject("5"), None).unwrap();
        let err = gate.require_role(Some(&token), &admin_only).await.unwrap_err();
        assert_eq!(err, AuthError::Forbidden);
    }

    #[tokio::test]
    async fn test_admin_passes_role_guard() {
        let store = Arc::new(StubStore::with_users(vec![user(9, true)]));
        let (gate, jwt) = gate(store);
        let admin_only = require_role(is_admin);

        let token = jwt.issue_access_token(Claims::for_subject("9"), None).unwrap();
        let principal = gate.require_role(Some(&token), &admin_only).await.unwrap();
        assert_eq!(principal.id, 9);
    }

    #[tokio::test]
    async fn test_role_guard_reports_unauthenticated_first() {
        let store = Arc::new(StubStore::with_users(vec![user(9, true)]));
        let (gate, _) = gate(store.clone());
        let admin_only = require_role(is_admin);

        let err = gate.require_role(None, &admin_only).await.unwrap_err();
        assert_eq!(
            err,
            AuthError::Unauthenticated(UnauthenticatedReason::MissingCredential)
        );
        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_custom_predicate() {
        let has_phone = require_role(|u: &User| u.phone.is_some());

        let mut with_phone = user(3, false);
        with_phone.phone = Some("1234567".to_string());
        assert!(has_phone.check(with_phone).is_ok());
        assert_eq!(has_phone.check(user(4, false)).unwrap_err(), AuthError::Forbidden);
    }
}
