use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use log::debug;
use mea::mutex::Mutex;
use mongodb::{Client, ClientSession, Collection as MongoCollection, error::Error as MongoError};
use std::fmt;

use docbind_core::{
    backend::{Connection, FindSpec, LeaseKind, StoreBackend, StoreBackendBuilder, WriteAck},
    error::{ConnectionError, DocumentStoreError, DocumentStoreResult},
    schema::IDENTITY_KEY,
};

use crate::{config::MongoDbConfig, query::MongoQueryTranslator};

fn backend_error(err: MongoError) -> DocumentStoreError {
    DocumentStoreError::Backend(err.to_string())
}

/// MongoDB storage backend.
///
/// Shared leases reuse the client's connection pool. Dedicated leases each start their own
/// client session and run every operation inside it.
#[derive(Debug, Clone)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    fn default_database(&self) -> &str {
        &self.database
    }

    async fn lease(&self, kind: LeaseKind) -> DocumentStoreResult<Box<dyn Connection>> {
        let session = match kind {
            LeaseKind::Shared => None,
            LeaseKind::Dedicated => Some(Mutex::new(
                self.client
                    .start_session()
                    .await
                    .map_err(|e| ConnectionError::Lease(e.to_string()))?,
            )),
        };

        Ok(Box::new(MongoConnection {
            client: self.client.clone(),
            kind,
            session,
        }))
    }

    async fn shutdown(&self) -> DocumentStoreResult<()> {
        self.client.clone().shutdown().await;
        debug!("mongodb client shut down");

        Ok(())
    }
}

/// A connection leased from a [`MongoDbStore`].
pub struct MongoConnection {
    client: Client,
    kind: LeaseKind,
    session: Option<Mutex<ClientSession>>,
}

impl MongoConnection {
    fn collection(&self, database: &str, collection: &str) -> MongoCollection<Document> {
        self.client.database(database).collection(collection)
    }
}

impl fmt::Debug for MongoConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoConnection")
            .field("kind", &self.kind)
            .field("session", &self.session.is_some())
            .finish()
    }
}

#[async_trait]
impl Connection for MongoConnection {
    fn kind(&self) -> LeaseKind {
        self.kind
    }

    async fn upsert(
        &self,
        database: &str,
        collection: &str,
        id: Bson,
        document: Document,
    ) -> DocumentStoreResult<WriteAck> {
        let coll = self.collection(database, collection);
        let action = coll
            .replace_one(doc! { IDENTITY_KEY: id }, document)
            .upsert(true);

        let result = match &self.session {
            Some(session) => {
                let mut session = session.lock().await;
                action.session(&mut *session).await
            }
            None => action.await,
        }
        .map_err(backend_error)?;

        Ok(WriteAck {
            matched: result.matched_count,
            inserted: u64::from(result.upserted_id.is_some()),
        })
    }

    async fn find(
        &self,
        database: &str,
        collection: &str,
        spec: &FindSpec,
    ) -> DocumentStoreResult<Vec<Document>> {
        let filter = MongoQueryTranslator::translate(spec.filter.as_ref())?;
        let coll = self.collection(database, collection);
        let mut action = coll.find(filter);
        if spec.skip > 0 {
            action = action.skip(spec.skip as u64);
        }
        if spec.limit > 0 {
            action = action.limit(spec.limit as i64);
        }

        match &self.session {
            Some(session) => {
                let mut session = session.lock().await;
                let mut cursor = action.session(&mut *session).await.map_err(backend_error)?;

                let mut documents = Vec::new();
                while let Some(document) = cursor.next(&mut *session).await {
                    documents.push(document.map_err(backend_error)?);
                }
                Ok(documents)
            }
            None => action
                .await
                .map_err(backend_error)?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(backend_error),
        }
    }

    async fn find_by_id(
        &self,
        database: &str,
        collection: &str,
        id: &Bson,
    ) -> DocumentStoreResult<Option<Document>> {
        let coll = self.collection(database, collection);
        let action = coll.find_one(doc! { IDENTITY_KEY: id.clone() });

        let result = match &self.session {
            Some(session) => {
                let mut session = session.lock().await;
                action.session(&mut *session).await
            }
            None => action.await,
        };

        result.map_err(backend_error)
    }

    async fn drop_database(&self, database: &str) -> DocumentStoreResult<()> {
        let db = self.client.database(database);
        let action = db.drop();

        let result = match &self.session {
            Some(session) => {
                let mut session = session.lock().await;
                action.session(&mut *session).await
            }
            None => action.await,
        };

        result.map_err(backend_error)
    }
}

enum Source {
    Dsn(String),
    Config(MongoDbConfig),
}

/// Builder for [`MongoDbStore`], from a connection string or a [`MongoDbConfig`].
pub struct MongoDbStoreBuilder {
    source: Source,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            source: Source::Dsn(dsn.to_string()),
            database: database.to_string(),
        }
    }

    pub fn from_config(config: MongoDbConfig) -> Self {
        Self {
            database: config.database.clone(),
            source: Source::Config(config),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let options = match self.source {
            Source::Dsn(dsn) => mongodb::options::ClientOptions::parse(&dsn)
                .await
                .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            Source::Config(config) => config.client_options()?,
        };

        let client = Client::with_options(options)
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;
        debug!("mongodb client ready, default database {}", self.database);

        Ok(MongoDbStore::new(client, self.database))
    }
}
