//! Sessions: the handle records and queries use to reach a backend.
//!
//! A [`Session`] is a cheaply cloneable handle over an optional [`StoreBackend`]. A session
//! without a backend is *uninitialized*: binding against it leaves records without a database
//! and every lease fails with [`ConnectionError::NotInitialized`].
//!
//! Connections are obtained as scoped [`Lease`]s and released when the lease is dropped, on
//! every exit path.
//!
//! The module also keeps one process-wide default session, managed with [`install`],
//! [`current`] and [`close`].
//!
//! ```ignore
//! use docbind::{session::{self, Session}, memory::InMemoryStore};
//!
//! session::install(Session::connect(InMemoryStore::builder().database("app")).await?);
//!
//! let mut note = Note::default();
//! note.bind(&session::current())?;
//! ```

use log::debug;
use std::{
    fmt::{self, Debug},
    ops::Deref,
    sync::{Arc, PoisonError, RwLock},
};

use crate::{
    backend::{Connection, LeaseKind, StoreBackend, StoreBackendBuilder},
    error::{ConnectionError, DocumentStoreResult},
};

static DEFAULT_SESSION: RwLock<Option<Session>> = RwLock::new(None);

/// Handle over a store backend.
#[derive(Clone, Default)]
pub struct Session {
    backend: Option<Arc<dyn StoreBackend>>,
}

impl Session {
    pub fn new(backend: impl StoreBackend + 'static) -> Self {
        Self { backend: Some(Arc::new(backend)) }
    }

    /// Builds a backend and wraps it in a session.
    pub async fn connect<B>(builder: B) -> DocumentStoreResult<Self>
    where
        B: StoreBackendBuilder,
        B::Backend: 'static,
    {
        Ok(Self::new(builder.build().await?))
    }

    /// A session with no backend behind it.
    pub fn uninitialized() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    fn backend(&self) -> DocumentStoreResult<&Arc<dyn StoreBackend>> {
        Ok(self
            .backend
            .as_ref()
            .ok_or(ConnectionError::NotInitialized)?)
    }

    /// The database records bound through this session are placed in.
    pub fn default_database(&self) -> DocumentStoreResult<String> {
        Ok(self.backend()?.default_database().to_string())
    }

    /// Leases a connection. The connection is released when the lease is dropped.
    pub async fn lease(&self, kind: LeaseKind) -> DocumentStoreResult<Lease> {
        let connection = self.backend()?.lease(kind).await?;
        debug!("leased {kind:?} connection");

        Ok(Lease { connection })
    }

    /// Shuts the backend down. Other clones of this session keep a handle to the backend but
    /// its connections are no longer usable.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend()?.shutdown().await
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.backend {
            Some(backend) => f
                .debug_struct("Session")
                .field("backend", backend)
                .finish(),
            None => f.write_str("Session(uninitialized)"),
        }
    }
}

/// A scoped connection. Dereferences to [`Connection`].
#[derive(Debug)]
pub struct Lease {
    connection: Box<dyn Connection>,
}

impl Deref for Lease {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        self.connection.as_ref()
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        debug!("released {:?} connection", self.connection.kind());
    }
}

/// Installs the process-wide default session, returning the one it replaces.
pub fn install(session: Session) -> Option<Session> {
    DEFAULT_SESSION
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(session)
}

/// The process-wide default session, or an uninitialized one if none is installed.
pub fn current() -> Session {
    DEFAULT_SESSION
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_default()
}

/// Removes the process-wide default session and returns it so it can be shut down.
pub fn close() -> Option<Session> {
    DEFAULT_SESSION
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentStoreError;

    #[test]
    fn test_uninitialized_session_has_no_database() {
        let session = Session::uninitialized();

        assert!(!session.is_initialized());
        assert!(matches!(
            session.default_database(),
            Err(DocumentStoreError::Connection(ConnectionError::NotInitialized))
        ));
    }

    #[tokio::test]
    async fn test_uninitialized_session_refuses_leases() {
        let result = Session::default().lease(LeaseKind::Dedicated).await;

        assert!(matches!(
            result,
            Err(DocumentStoreError::Connection(ConnectionError::NotInitialized))
        ));
    }
}
