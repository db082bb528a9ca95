//! Session management
//!
//! One authenticated session per process, established on first use and
//! shared by every caller. The cached handle is immutable; it is only ever
//! replaced as a whole, after a call reports it invalid.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

use crate::error::{RpcError, RpcResult};
use crate::transport::RpcTransport;

/// Login inputs
#[derive(Clone)]
pub struct Credentials {
    pub url: String,
    pub database: String,
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(
        url: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// An authenticated handle to the backend
pub struct Session {
    pub url: String,
    pub database: String,
    pub username: String,
    /// Backend user id returned by login
    pub uid: i64,
    /// Increases with every (re-)authentication in this process
    pub generation: u64,
    pub established_at: DateTime<Utc>,
    token: String,
}

impl Session {
    /// Secret sent with every model call
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("uid", &self.uid)
            .field("generation", &self.generation)
            .field("established_at", &self.established_at)
            .finish_non_exhaustive()
    }
}

/// Owner of the process-wide session
///
/// Readers only take the read lock. Establishing a session is serialised by
/// `login_lock`, so concurrent callers that all find the slot empty wait for
/// a single login instead of each performing their own.
pub struct SessionManager {
    transport: Arc<dyn RpcTransport>,
    credentials: Credentials,
    current: RwLock<Option<Arc<Session>>>,
    login_lock: Mutex<()>,
    generation: AtomicU64,
    logins: AtomicU64,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn RpcTransport>, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
            current: RwLock::new(None),
            login_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            logins: AtomicU64::new(0),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Return the cached session, logging in first if there is none
    pub async fn ensure_session(&self) -> RpcResult<Arc<Session>> {
        if let Some(session) = self.current().await {
            return Ok(session);
        }

        let _guard = self.login_lock.lock().await;

        // Another caller may have finished logging in while we waited.
        if let Some(session) = self.current().await {
            return Ok(session);
        }

        let session = Arc::new(self.login().await?);
        *self.current.write().await = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Peek at the cached session without logging in
    pub async fn current(&self) -> Option<Arc<Session>> {
        self.current.read().await.as_ref().map(Arc::clone)
    }

    /// Drop `stale` so the next call re-authenticates
    ///
    /// Has no effect if the cached session has already been replaced by a
    /// newer one. Returns whether the cache was cleared.
    pub async fn invalidate(&self, stale: &Session) -> bool {
        let mut current = self.current.write().await;
        match current.as_ref() {
            Some(session) if session.generation == stale.generation => {
                warn!(
                    uid = stale.uid,
                    generation = stale.generation,
                    "session invalidated, next call re-authenticates"
                );
                *current = None;
                true
            }
            _ => false,
        }
    }

    /// Number of login round trips performed so far
    pub fn login_count(&self) -> u64 {
        self.logins.load(Ordering::Relaxed)
    }

    #[instrument(skip(self), fields(database = %self.credentials.database, username = %self.credentials.username))]
    async fn login(&self) -> RpcResult<Session> {
        self.logins.fetch_add(1, Ordering::Relaxed);

        let reply = self
            .transport
            .call(
                "common",
                "login",
                vec![
                    Value::from(self.credentials.database.as_str()),
                    Value::from(self.credentials.username.as_str()),
                    Value::from(self.credentials.password.as_str()),
                ],
            )
            .await?;

        let uid = match reply {
            Value::Number(n) => n
                .as_i64()
                .filter(|uid| *uid > 0)
                .ok_or_else(|| RpcError::Protocol(format!("unexpected login reply: {}", n)))?,
            Value::Bool(false) => {
                return Err(RpcError::Authentication(format!(
                    "credentials rejected for user '{}' on database '{}'",
                    self.credentials.username, self.credentials.database
                )))
            }
            other => {
                return Err(RpcError::Protocol(format!(
                    "unexpected login reply: {}",
                    other
                )))
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        info!(uid, generation, endpoint = %self.transport.endpoint(), "session established");

        Ok(Session {
            url: self.credentials.url.clone(),
            database: self.credentials.database.clone(),
            username: self.credentials.username.clone(),
            uid,
            generation,
            established_at: Utc::now(),
            token: self.credentials.password.clone(),
        })
    }
}
