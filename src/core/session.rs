//! Admin session guard.
//!
//! A three-state machine (`LoggedOut`, `Locked`, `LoggedIn`) gating every catalog and zone
//! mutation. A successful login mints an opaque token stored in `admin_sessions`; guarded
//! operations must present a live token, so a session cannot be forged by editing
//! client-held state. Lock expiry is evaluated lazily against the supplied clock, while
//! idle expiry is only applied by [`SessionGuard::tick`].

use crate::{
    config::settings::SessionPolicy,
    core::{
        activity::{self, ActivityAction, NewActivity},
        credentials::{self, MIN_PASSWORD_LENGTH},
    },
    entities::{AdminSession as AdminSessionEntity, admin_session},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{Set, prelude::*};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// An authenticated admin session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    /// Opaque server-side token
    pub token: String,
    /// When the admin logged in
    pub login_at: DateTime<Utc>,
    /// Last authorized action
    pub last_activity: DateTime<Utc>,
}

/// Current guard state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No session; counts consecutive failed logins
    LoggedOut {
        /// Failures since the last success or lock expiry
        failed_attempts: u32,
    },
    /// Login refused until the given instant
    Locked {
        /// End of the lockout
        until: DateTime<Utc>,
    },
    /// Admin is authenticated
    LoggedIn(AdminSession),
}

/// Timed admin session state machine.
#[derive(Debug, Clone)]
pub struct SessionGuard {
    policy: SessionPolicy,
    state: SessionState,
}

impl SessionGuard {
    /// Creates a logged-out guard.
    #[must_use]
    pub const fn new(policy: SessionPolicy) -> Self {
        Self {
            policy,
            state: SessionState::LoggedOut { failed_attempts: 0 },
        }
    }

    /// Returns the state after applying any lock expiry due at `now`.
    pub fn state(&mut self, now: DateTime<Utc>) -> &SessionState {
        self.expire_lock(now);
        &self.state
    }

    /// True if an admin session is active.
    pub fn is_logged_in(&mut self, now: DateTime<Utc>) -> bool {
        matches!(self.state(now), SessionState::LoggedIn(_))
    }

    fn expire_lock(&mut self, now: DateTime<Utc>) {
        if let SessionState::Locked { until } = self.state {
            if now >= until {
                info!("Admin lockout expired");
                self.state = SessionState::LoggedOut { failed_attempts: 0 };
            }
        }
    }

    fn lock_error(until: DateTime<Utc>, now: DateTime<Utc>) -> Error {
        Error::Locked {
            retry_after_secs: (until - now).num_seconds().max(1),
        }
    }

    /// Attempts an admin login.
    ///
    /// While locked the password is not checked and the attempt is not counted. Logging
    /// in while already logged in returns the current session.
    ///
    /// # Errors
    /// * `Error::Locked` if the guard is (or has just become) locked
    /// * `Error::InvalidCredentials` with the attempts left before lockout
    /// * `Error::PasswordNotProvisioned` if no credential is stored; not counted as a failure
    #[instrument(skip(self, db, password))]
    pub async fn login(
        &mut self,
        db: &DatabaseConnection,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<AdminSession> {
        self.expire_lock(now);
        let failed_attempts = match &self.state {
            SessionState::Locked { until } => {
                warn!("Login attempt rejected while locked");
                return Err(Self::lock_error(*until, now));
            }
            SessionState::LoggedIn(session) => return Ok(session.clone()),
            SessionState::LoggedOut { failed_attempts } => *failed_attempts,
        };

        if !credentials::check_admin_password(db, password).await? {
            let failed_attempts = failed_attempts + 1;
            if failed_attempts >= self.policy.max_failed_attempts {
                let until = now + self.policy.lockout();
                warn!("Admin login locked until {}", until);
                self.state = SessionState::Locked { until };
                return Err(Self::lock_error(until, now));
            }
            warn!("Failed admin login attempt {}", failed_attempts);
            self.state = SessionState::LoggedOut { failed_attempts };
            return Err(Error::InvalidCredentials {
                remaining_attempts: self.policy.max_failed_attempts - failed_attempts,
            });
        }

        let session = AdminSession {
            token: Uuid::new_v4().to_string(),
            login_at: now,
            last_activity: now,
        };
        admin_session::ActiveModel {
            token: Set(session.token.clone()),
            login_at: Set(now),
            last_activity: Set(now),
        }
        .insert(db)
        .await?;
        activity::record_activity(
            db,
            NewActivity::system("Admin Login", ActivityAction::Login),
            now,
        )
        .await?;

        info!("Admin logged in");
        self.state = SessionState::LoggedIn(session.clone());
        Ok(session)
    }

    /// Ends the current session, if any.
    ///
    /// # Errors
    /// Returns an error if the token row cannot be deleted.
    pub async fn logout(&mut self, db: &DatabaseConnection) -> Result<()> {
        if let SessionState::LoggedIn(session) = &self.state {
            AdminSessionEntity::delete_by_id(session.token.clone())
                .exec(db)
                .await?;
            info!("Admin logged out");
        }
        self.state = SessionState::LoggedOut { failed_attempts: 0 };
        Ok(())
    }

    /// Periodic check: logs out a session idle for longer than the idle timeout and
    /// expires a finished lockout. Returns `true` if a session was ended.
    ///
    /// # Errors
    /// Returns an error if the token row cannot be deleted.
    pub async fn tick(&mut self, db: &DatabaseConnection, now: DateTime<Utc>) -> Result<bool> {
        self.expire_lock(now);
        let idle = match &self.state {
            SessionState::LoggedIn(session) => {
                now - session.last_activity > self.policy.idle_timeout()
            }
            _ => false,
        };
        if idle {
            info!("Admin session idle timeout");
            self.logout(db).await?;
        }
        Ok(idle)
    }

    /// Checks that a live admin session exists and records activity on it.
    ///
    /// # Errors
    /// Returns `Error::NotAuthenticated` if there is no session or its token is no longer
    /// stored. Nothing is changed in that case.
    pub async fn authorize(&mut self, db: &DatabaseConnection, now: DateTime<Utc>) -> Result<()> {
        self.expire_lock(now);
        let token = match &self.state {
            SessionState::LoggedIn(session) => session.token.clone(),
            _ => return Err(Error::NotAuthenticated),
        };

        let Some(row) = AdminSessionEntity::find_by_id(token).one(db).await? else {
            warn!("Admin session token no longer valid");
            self.state = SessionState::LoggedOut { failed_attempts: 0 };
            return Err(Error::NotAuthenticated);
        };

        let mut active: admin_session::ActiveModel = row.into();
        active.last_activity = Set(now);
        active.update(db).await?;
        if let SessionState::LoggedIn(session) = &mut self.state {
            session.last_activity = now;
        }
        Ok(())
    }

    /// Changes the admin password. Requires an active session and the current password.
    /// A wrong current password does not count toward lockout.
    ///
    /// # Errors
    /// * `Error::NotAuthenticated` without an active session
    /// * `Error::PasswordPolicy` for a wrong current password, a short new password, or a
    ///   confirmation mismatch
    #[instrument(skip_all)]
    pub async fn change_password(
        &mut self,
        db: &DatabaseConnection,
        current: &str,
        new_password: &str,
        confirm: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.authorize(db, now).await?;

        if !credentials::check_admin_password(db, current).await? {
            return Err(Error::PasswordPolicy {
                message: "current password is incorrect".to_string(),
            });
        }
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::PasswordPolicy {
                message: format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
            });
        }
        if new_password != confirm {
            return Err(Error::PasswordPolicy {
                message: "passwords do not match".to_string(),
            });
        }

        credentials::store_admin_password(db, new_password, now).await?;
        activity::record_activity(
            db,
            NewActivity::system("Password Changed", ActivityAction::PasswordChange),
            now,
        )
        .await?;
        info!("Admin password changed");
        Ok(())
    }
}

/// Deletes stored session tokens idle for longer than `idle_timeout`.
///
/// # Errors
/// Returns an error if the delete fails.
pub async fn purge_expired_sessions(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    idle_timeout: Duration,
) -> Result<u64> {
    let cutoff = now - idle_timeout;
    let deleted = AdminSessionEntity::delete_many()
        .filter(admin_session::Column::LastActivity.lt(cutoff))
        .exec(db)
        .await?
        .rows_affected;
    if deleted > 0 {
        info!("Purged {} expired admin session(s)", deleted);
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::SubsecRound;
    use crate::{
        core::activity::recent_activity,
        test_utils::{TEST_ADMIN_PASSWORD, setup_with_admin},
    };

    fn guard() -> SessionGuard {
        SessionGuard::new(SessionPolicy::default())
    }

    #[tokio::test]
    async fn test_login_success_records_activity() -> Result<()> {
        let db = setup_with_admin().await?;
        let mut guard = guard();
        let now = Utc::now();

        let session = guard.login(&db, TEST_ADMIN_PASSWORD, now).await?;
        assert!(guard.is_logged_in(now));
        assert!(
            AdminSessionEntity::find_by_id(session.token.clone())
                .one(&db)
                .await?
                .is_some()
        );

        let log = recent_activity(&db, 10).await?;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, "login");
        assert_eq!(log[0].material, "System");
        assert_eq!(log[0].unit, "Admin Login");
        Ok(())
    }

    #[tokio::test]
    async fn test_three_failures_lock_then_expire() -> Result<()> {
        let db = setup_with_admin().await?;
        let mut guard = guard();
        let now = Utc::now();

        assert!(matches!(
            guard.login(&db, "wrong-one", now).await,
            Err(Error::InvalidCredentials {
                remaining_attempts: 2
            })
        ));
        assert!(matches!(
            guard.login(&db, "wrong-two", now).await,
            Err(Error::InvalidCredentials {
                remaining_attempts: 1
            })
        ));
        assert!(matches!(
            guard.login(&db, "wrong-three", now).await,
            Err(Error::Locked { .. })
        ));
        let until = now + Duration::minutes(5);
        assert_eq!(guard.state(now), &SessionState::Locked { until });

        // Correct password while locked is still refused and does not extend the lock.
        let later = now + Duration::minutes(1);
        assert!(matches!(
            guard.login(&db, TEST_ADMIN_PASSWORD, later).await,
            Err(Error::Locked {
                retry_after_secs: 240
            })
        ));
        assert_eq!(guard.state(later), &SessionState::Locked { until });

        let after = now + Duration::minutes(5);
        assert_eq!(
            guard.state(after),
            &SessionState::LoggedOut { failed_attempts: 0 }
        );
        guard.login(&db, TEST_ADMIN_PASSWORD, after).await?;
        assert!(guard.is_logged_in(after));

        guard.logout(&db).await?;
        assert!(matches!(
            guard.login(&db, "wrong-again", after).await,
            Err(Error::InvalidCredentials {
                remaining_attempts: 2
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_success_resets_failure_counter() -> Result<()> {
        let db = setup_with_admin().await?;
        let mut guard = guard();
        let now = Utc::now();

        let _ = guard.login(&db, "wrong", now).await;
        let _ = guard.login(&db, "wrong", now).await;
        guard.login(&db, TEST_ADMIN_PASSWORD, now).await?;
        guard.logout(&db).await?;

        assert_eq!(
            guard.state(now),
            &SessionState::LoggedOut { failed_attempts: 0 }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_authorize_requires_login() -> Result<()> {
        let db = setup_with_admin().await?;
        let mut guard = guard();
        assert!(matches!(
            guard.authorize(&db, Utc::now()).await,
            Err(Error::NotAuthenticated)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_authorize_refreshes_activity() -> Result<()> {
        let db = setup_with_admin().await?;
        let mut guard = guard();
        let now = Utc::now().trunc_subsecs(0);
        let session = guard.login(&db, TEST_ADMIN_PASSWORD, now).await?;

        let later = now + Duration::minutes(20);
        guard.authorize(&db, later).await?;

        let row = AdminSessionEntity::find_by_id(session.token)
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(row.last_activity, later);

        // 20 minutes after the refreshed activity is still inside the timeout.
        assert!(!guard.tick(&db, later + Duration::minutes(20)).await?);
        assert!(guard.is_logged_in(later + Duration::minutes(20)));
        Ok(())
    }

    #[tokio::test]
    async fn test_tick_expires_idle_session() -> Result<()> {
        let db = setup_with_admin().await?;
        let mut guard = guard();
        let now = Utc::now();
        let session = guard.login(&db, TEST_ADMIN_PASSWORD, now).await?;

        assert!(!guard.tick(&db, now + Duration::minutes(30)).await?);
        assert!(guard.tick(&db, now + Duration::minutes(31)).await?);
        assert!(!guard.is_logged_in(now + Duration::minutes(31)));
        assert!(
            AdminSessionEntity::find_by_id(session.token)
                .one(&db)
                .await?
                .is_none()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_revoked_token_is_rejected() -> Result<()> {
        let db = setup_with_admin().await?;
        let mut guard = guard();
        let now = Utc::now();
        guard.login(&db, TEST_ADMIN_PASSWORD, now).await?;

        let purged =
            purge_expired_sessions(&db, now + Duration::minutes(45), Duration::minutes(30))
                .await?;
        assert_eq!(purged, 1);

        assert!(matches!(
            guard.authorize(&db, now + Duration::minutes(45)).await,
            Err(Error::NotAuthenticated)
        ));
        assert!(!guard.is_logged_in(now + Duration::minutes(45)));
        Ok(())
    }

    #[tokio::test]
    async fn test_change_password_rules() -> Result<()> {
        let db = setup_with_admin().await?;
        let mut guard = guard();
        let now = Utc::now();

        assert!(matches!(
            guard
                .change_password(&db, TEST_ADMIN_PASSWORD, "new-password", "new-password", now)
                .await,
            Err(Error::NotAuthenticated)
        ));

        guard.login(&db, TEST_ADMIN_PASSWORD, now).await?;
        assert!(matches!(
            guard
                .change_password(&db, "not-current", "new-password", "new-password", now)
                .await,
            Err(Error::PasswordPolicy { .. })
        ));
        assert!(matches!(
            guard
                .change_password(&db, TEST_ADMIN_PASSWORD, "short", "short", now)
                .await,
            Err(Error::PasswordPolicy { .. })
        ));
        assert!(matches!(
            guard
                .change_password(&db, TEST_ADMIN_PASSWORD, "new-password", "other-password", now)
                .await,
            Err(Error::PasswordPolicy { .. })
        ));

        guard
            .change_password(&db, TEST_ADMIN_PASSWORD, "new-password", "new-password", now)
            .await?;
        assert!(credentials::check_admin_password(&db, "new-password").await?);
        assert!(!credentials::check_admin_password(&db, TEST_ADMIN_PASSWORD).await?);

        let log = recent_activity(&db, 1).await?;
        assert_eq!(log[0].action, "password_change");
        assert_eq!(log[0].unit, "Password Changed");

        // Wrong current password did not lock the guard.
        assert!(guard.is_logged_in(now));
        Ok(())
    }
}
