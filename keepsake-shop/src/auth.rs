use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::{Duration, Utc};
use log::{info, warn};
use rand::rngs::OsRng;
use thiserror::Error;

use keepsake_core::{
    random_string, DatabaseError, NewSession, NewUser, PrimaryKey, SessionData, SharedDatabase,
};

pub struct Auth {
    db: SharedDatabase,
    argon: Argon2<'static>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// The session doesn't exist or has expired
    #[error("Invalid session")]
    InvalidSession,
    #[error("Username {0} already exists")]
    UsernameTaken(String),
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
}

impl Auth {
    const SESSION_DURATION_IN_DAYS: i64 = 7;
    const TOKEN_LENGTH: usize = 32;

    pub fn new(db: &SharedDatabase) -> Self {
        Self {
            db: db.clone(),
            argon: Argon2::default(),
        }
    }

    /// Logs in a user, returning a new session
    pub async fn login(&self, credentials: Credentials) -> Result<SessionData, AuthError> {
        self.db
            .clear_expired_sessions()
            .await
            .map_err(AuthError::Db)?;

        let user = self
            .db
            .user_by_username(&credentials.username)
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => AuthError::InvalidCredentials,
                err => AuthError::Db(err),
            })?;

        let stored_password = PasswordHash::parse(&user.password, Encoding::default())
            .map_err(|e| AuthError::HashError(e.to_string()))?;

        self.argon
            .verify_password(credentials.password.as_bytes(), &stored_password)
            .map_err(|_| {
                warn!("Failed login attempt for {}", credentials.username);
                AuthError::InvalidCredentials
            })?;

        self.create_session(user.id).await
    }

    /// Creates a seller account and logs it in
    pub async fn register(&self, credentials: Credentials) -> Result<SessionData, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = self
            .argon
            .hash_password(credentials.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let user = self
            .db
            .create_user(NewUser {
                username: credentials.username.clone(),
                password: hashed_password,
            })
            .await
            .map_err(|e| match e {
                e if e.is_conflict() => AuthError::UsernameTaken(credentials.username.clone()),
                err => AuthError::Db(err),
            })?;

        info!("Registered user {}", user.username);

        self.create_session(user.id).await
    }

    /// Deletes the associated session, if it exists
    pub async fn logout(&self, token: &str) -> Result<(), DatabaseError> {
        self.db.delete_session_by_token(token).await
    }

    /// Returns a session if it exists and hasn't expired
    pub async fn session(&self, token: &str) -> Result<SessionData, AuthError> {
        let session = self.db.session_by_token(token).await.map_err(|e| match e {
            e if e.is_not_found() => AuthError::InvalidSession,
            err => AuthError::Db(err),
        })?;

        if session.is_expired() {
            return Err(AuthError::InvalidSession);
        }

        Ok(session)
    }

    async fn create_session(&self, user_id: PrimaryKey) -> Result<SessionData, AuthError> {
        let expires_at = Utc::now() + Duration::days(Self::SESSION_DURATION_IN_DAYS);

        self.db
            .create_session(NewSession {
                token: random_string(Self::TOKEN_LENGTH),
                user_id,
                expires_at,
            })
            .await
            .map_err(AuthError::Db)
    }
}

#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use keepsake_impls::MemoryDatabase;

    use super::*;

    fn auth() -> Auth {
        let db: SharedDatabase = Arc::new(MemoryDatabase::new());
        Auth::new(&db)
    }

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let auth = auth();

        let registered = auth
            .register(credentials("seller", "correct horse"))
            .await
            .unwrap();
        assert_eq!(registered.user.username, "seller");
        assert_ne!(registered.user.password, "correct horse");

        let session = auth
            .login(credentials("seller", "correct horse"))
            .await
            .unwrap();
        assert_eq!(session.user.id, registered.user.id);
        assert_ne!(session.token, registered.token);
        assert_eq!(session.token.len(), 32);

        let resolved = auth.session(&session.token).await.unwrap();
        assert_eq!(resolved.user.username, "seller");
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let auth = auth();
        auth.register(credentials("seller", "correct horse"))
            .await
            .unwrap();

        let err = auth
            .login(credentials("seller", "battery staple"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = auth
            .login(credentials("nobody", "correct horse"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let auth = auth();
        auth.register(credentials("seller", "correct horse"))
            .await
            .unwrap();

        let err = auth
            .register(credentials("seller", "another one"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken(name) if name == "seller"));
    }

    #[tokio::test]
    async fn logout_invalidates_the_session() {
        let auth = auth();
        let session = auth
            .register(credentials("seller", "correct horse"))
            .await
            .unwrap();

        auth.logout(&session.token).await.unwrap();

        let err = auth.session(&session.token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSession));

        // Logging out twice is harmless
        auth.logout(&session.token).await.unwrap();
    }
}
