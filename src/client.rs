//! Client connection facade.

use bson::doc;
use mongodb::options::{ClientOptions, Credential, ServerAddress};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::database::Database;
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};

/// A live connection to a server or cluster.
///
/// Owns exactly one driver client, built from an activated [`Descriptor`].
/// The driver manages pooling and thread safety internally; this facade adds
/// no locking beyond the idempotent-close guard. Database and collection
/// handles derived from a client share its connection.
#[derive(Debug)]
pub struct Client {
    inner: Mutex<Option<mongodb::Client>>,
    default_db: String,
    auto_id: bool,
}

impl Client {
    /// Build a client from an activated descriptor.
    ///
    /// Constructing the driver client performs no I/O; connections are
    /// established on first use. The driver accepts a single credential, so
    /// the first resolved entry wins and extras are logged and skipped.
    pub fn new(descriptor: &Descriptor) -> Result<Self> {
        let addresses = descriptor.addresses();
        if addresses.is_empty() {
            return Err(Error::config("descriptor has no server addresses"));
        }
        let default_db = descriptor
            .default_db()
            .ok_or_else(|| Error::config("descriptor has no default database"))?
            .to_string();
        let pool = descriptor.pool_options();

        let hosts: Vec<ServerAddress> = addresses
            .iter()
            .map(|a| ServerAddress::Tcp {
                host: a.host.clone(),
                port: Some(a.port),
            })
            .collect();
        let host_names: Vec<String> = addresses.iter().map(ToString::to_string).collect();

        let mut options = ClientOptions::builder().hosts(hosts).build();
        options.app_name = descriptor.name().map(str::to_string);
        options.max_pool_size = Some(pool.pool_size);
        options.connect_timeout = Some(pool.connect_timeout);
        options.default_database = Some(default_db.clone());
        if !descriptor.replicas() && addresses.len() == 1 {
            options.direct_connection = Some(true);
        }

        let credentials = descriptor.credentials();
        if let Some(auth) = credentials.first() {
            if credentials.len() > 1 {
                warn!(
                    count = credentials.len(),
                    "driver accepts a single credential, using the first entry"
                );
            }
            options.credential = Some(
                Credential::builder()
                    .username(auth.username.clone())
                    .password(auth.password.clone())
                    .source(auth.source.clone())
                    .build(),
            );
        }

        let inner = mongodb::Client::with_options(options)
            .map_err(|e| Error::connection(format!("failed to create client: {e}")))?;

        info!(
            hosts = ?host_names,
            database = %default_db,
            pool_size = pool.pool_size,
            wait_multiple = pool.wait_multiple,
            replicas = descriptor.replicas(),
            "mongodb client created"
        );

        Ok(Self {
            inner: Mutex::new(Some(inner)),
            default_db,
            auto_id: descriptor.create_id(),
        })
    }

    fn handle(&self) -> Result<mongodb::Client> {
        self.inner.lock().as_ref().cloned().ok_or(Error::Closed)
    }

    /// Whether the client is still open.
    pub fn is_open(&self) -> bool {
        self.inner.lock().is_some()
    }

    /// Whether collections opened through this client auto-assign string ids.
    pub fn auto_id(&self) -> bool {
        self.auto_id
    }

    /// Name of the default database.
    pub fn default_db(&self) -> &str {
        &self.default_db
    }

    /// List the names of known databases.
    pub async fn database_names(&self) -> Result<Vec<String>> {
        Ok(self.handle()?.list_database_names(None, None).await?)
    }

    /// A handle on the named database.
    pub fn database(&self, name: &str) -> Result<Database> {
        Ok(Database::new(self.handle()?.database(name), self.auto_id))
    }

    /// A handle on the default database.
    pub fn default_database(&self) -> Result<Database> {
        let handle = self.handle()?;
        Ok(Database::new(handle.database(&self.default_db), self.auto_id))
    }

    /// Ping the server; `false` on any failure.
    pub async fn is_healthy(&self) -> bool {
        match self.handle() {
            Ok(client) => client
                .database("admin")
                .run_command(doc! { "ping": 1 }, None)
                .await
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Release the underlying connection. Idempotent; handle requests after
    /// close fail with [`Error::Closed`].
    pub async fn close(&self) {
        let taken = self.inner.lock().take();
        if let Some(client) = taken {
            debug!("shutting down mongodb client");
            client.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;
    use std::collections::HashMap;

    fn descriptor() -> Descriptor {
        let props: HashMap<String, String> = HashMap::from(
            [
                ("t.name", "test"),
                ("t.db", "testdb"),
                ("t.createid", "true"),
                ("t.host.list", "a"),
                ("t.host.a.addr", "localhost"),
                ("t.host.a.port", "27017"),
            ]
            .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        let mut descriptor = Descriptor::new("t").unwrap();
        assert!(descriptor.activate(&props));
        descriptor
    }

    #[tokio::test]
    async fn test_client_construction_is_offline() {
        let client = Client::new(&descriptor()).unwrap();
        assert!(client.is_open());
        assert!(client.auto_id());
        assert_eq!(client.default_db(), "testdb");
    }

    #[tokio::test]
    async fn test_database_handles() {
        let client = Client::new(&descriptor()).unwrap();
        assert_eq!(client.default_database().unwrap().name(), "testdb");
        assert_eq!(client.database("other").unwrap().name(), "other");
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let client = Client::new(&descriptor()).unwrap();
        client.close().await;
        client.close().await;
        assert!(!client.is_open());
    }

    #[tokio::test]
    async fn test_handles_fail_after_close() {
        let client = Client::new(&descriptor()).unwrap();
        client.close().await;
        assert!(client.database("any").unwrap_err().is_closed());
        assert!(client.database_names().await.unwrap_err().is_closed());
        assert!(!client.is_healthy().await);
    }
}
