//! Connection settings for the MongoDB backend.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use mongodb::options::{ClientOptions, Credential, ServerAddress};
use docbind_core::error::{DocumentStoreError, DocumentStoreResult};

/// Dial settings, deserializable from any serde source.
///
/// Missing fields take their defaults: a single `localhost:27017` host and the `test`
/// database. Credentials are only sent when a username is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoDbConfig {
    /// Seed list as `host[:port]` entries.
    pub hosts: Vec<String>,
    /// Default database records are bound to.
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Database holding the user's credentials. Defaults to [`database`](Self::database).
    pub auth_source: Option<String>,
    pub app_name: Option<String>,
    /// Connect timeout, in seconds.
    pub timeout: Option<u64>,
}

impl Default for MongoDbConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["localhost:27017".to_string()],
            database: "test".to_string(),
            username: None,
            password: None,
            auth_source: None,
            app_name: None,
            timeout: None,
        }
    }
}

impl MongoDbConfig {
    pub fn client_options(&self) -> DocumentStoreResult<ClientOptions> {
        let hosts = self
            .hosts
            .iter()
            .map(|host| {
                ServerAddress::parse(host)
                    .map_err(|e| DocumentStoreError::Initialization(e.to_string()))
            })
            .collect::<DocumentStoreResult<Vec<_>>>()?;

        if hosts.is_empty() {
            return Err(DocumentStoreError::Initialization(
                "at least one host is required".to_string(),
            ));
        }

        let mut options = ClientOptions::default();
        options.hosts = hosts;
        options.app_name = self.app_name.clone();
        options.connect_timeout = self.timeout.map(Duration::from_secs);

        if let Some(username) = &self.username {
            let mut credential = Credential::default();
            credential.username = Some(username.clone());
            credential.password = self.password.clone();
            credential.source = Some(
                self.auth_source
                    .clone()
                    .unwrap_or_else(|| self.database.clone()),
            );
            options.credential = Some(credential);
        }

        Ok(options)
    }
}
