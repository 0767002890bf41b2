use chrono::{DateTime, Utc};
use despachos_core::{AppError, AppResult, UserIdentity};
use despachos_domain::GrantedPermissions;
use uuid::Uuid;

/// Authentication state of one front-end session.
///
/// Created at application start, passed explicitly to whatever needs it and
/// torn down on logout. Each change of identity or grants bumps
/// [`AuthSession::generation`] so derived navigation can detect staleness.
#[derive(Debug, Clone)]
pub struct AuthSession {
    session_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    generation: u64,
    identity: Option<UserIdentity>,
    granted: GrantedPermissions,
}

impl AuthSession {
    /// Creates an anonymous session.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            generation: 0,
            identity: None,
            granted: GrantedPermissions::empty(),
        }
    }

    /// Stores the identity and grants of a user who just logged in.
    pub fn login(&mut self, identity: UserIdentity, granted: GrantedPermissions) {
        self.identity = Some(identity);
        self.granted = granted;
        self.touch();
    }

    /// Replaces the grants of the logged-in user.
    pub fn refresh_permissions(&mut self, granted: GrantedPermissions) -> AppResult<()> {
        if self.identity.is_none() {
            return Err(AppError::Unauthorized(
                "cannot refresh permissions without an authenticated user".to_owned(),
            ));
        }

        self.granted = granted;
        self.touch();
        Ok(())
    }

    /// Clears identity and grants.
    pub fn logout(&mut self) {
        self.identity = None;
        self.granted = GrantedPermissions::empty();
        self.touch();
    }

    /// Returns the session identifier.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Returns when the session was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when identity or grants last changed.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the change counter.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the logged-in user, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    /// Returns whether a user is logged in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Returns the directly granted permissions. Empty when anonymous.
    #[must_use]
    pub fn granted(&self) -> &GrantedPermissions {
        &self.granted
    }

    fn touch(&mut self) {
        self.generation = self.generation.saturating_add(1);
        self.updated_at = Utc::now();
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}
