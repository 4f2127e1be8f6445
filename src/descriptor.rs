//! Cluster descriptors: typed connection configuration parsed from a flat
//! property namespace.
//!
//! A [`Descriptor`] is activated once against a [`PropertySource`], resolving
//! the keys under its prefix `P`:
//!
//! | key | meaning | default |
//! |---|---|---|
//! | `P.name` | display name | required |
//! | `P.db` | default database | required |
//! | `P.replicas` | replica-set flag | `false` |
//! | `P.createid` | auto-id flag | `false` |
//! | `P.host.list` | comma-separated logical host names | required |
//! | `P.host.<h>.addr`, `P.host.<h>.port` | address and port per host | required |
//! | `P.auth.list` | comma-separated credential names | optional |
//! | `P.auth.<a>.user`, `.pass`, `.db` | credential triple per name | required when listed |

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::error;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::props::PropertySource;

/// Default maximum connection pool size.
pub const DEFAULT_POOL_SIZE: u32 = 100;

/// Default blocked-thread wait multiplier.
pub const DEFAULT_WAIT_MULTIPLE: u32 = 100;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// A resolved server address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAddress {
    /// Host name or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A resolved credential triple.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthEntry {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
    /// Database the credential authenticates against.
    pub source: String,
}

impl fmt::Debug for AuthEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthEntry")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Connection-pool options applied when the client is built.
///
/// `wait_multiple` is the wait-queue multiplier of pool implementations that
/// cap waiters at `pool_size * wait_multiple`. The driver queues waiters
/// without a cap, so the value only shows up in construction logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Maximum pool size, floored at 1.
    pub pool_size: u32,
    /// Wait-queue multiplier.
    pub wait_multiple: u32,
    /// Connect timeout.
    pub connect_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            wait_multiple: DEFAULT_WAIT_MULTIPLE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Static configuration for one logical cluster, activated from properties.
///
/// Activation runs once: after the address list is populated, further
/// [`activate`](Descriptor::activate) calls are no-ops. The descriptor also
/// owns the one-time construction of its [`Client`]; every
/// [`client`](Descriptor::client) call returns the same instance.
pub struct Descriptor {
    prefix: String,
    name: Option<String>,
    default_db: Option<String>,
    replicas: bool,
    create_id: bool,
    pool_size: u32,
    wait_multiple: u32,
    connect_timeout: Duration,
    pool: Option<PoolOptions>,
    addresses: Vec<HostAddress>,
    credentials: Vec<AuthEntry>,
    client: Mutex<Option<Arc<Client>>>,
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("prefix", &self.prefix)
            .field("name", &self.name)
            .field("default_db", &self.default_db)
            .field("replicas", &self.replicas)
            .field("create_id", &self.create_id)
            .field("pool", &self.pool)
            .field("addresses", &self.addresses)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl Descriptor {
    /// Create an inactive descriptor for the given property prefix.
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into().trim().to_string();
        if prefix.is_empty() {
            return Err(Error::config("descriptor prefix is blank"));
        }
        Ok(Self {
            prefix,
            name: None,
            default_db: None,
            replicas: false,
            create_id: false,
            pool_size: DEFAULT_POOL_SIZE,
            wait_multiple: DEFAULT_WAIT_MULTIPLE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            pool: None,
            addresses: Vec::new(),
            credentials: Vec::new(),
            client: Mutex::new(None),
        })
    }

    /// Resolve configuration from `props` and mark the descriptor active.
    ///
    /// Returns `false` when a required key is missing or blank, a port fails
    /// to parse, or the host list resolves to no addresses; the failure is
    /// logged and the descriptor stays inactive. Once active, re-activation
    /// is a no-op returning `true`.
    pub fn activate(&mut self, props: &dyn PropertySource) -> bool {
        if self.is_active() {
            return true;
        }
        match self.init(props) {
            Ok(()) => true,
            Err(e) => {
                error!(prefix = %self.prefix, error = %e, "descriptor activation failed");
                false
            }
        }
    }

    fn init(&mut self, props: &dyn PropertySource) -> Result<()> {
        self.name = Some(require(props, &self.key("name"))?);
        self.default_db = Some(require(props, &self.key("db"))?);
        self.replicas = flag(props, &self.key("replicas"));
        self.create_id = flag(props, &self.key("createid"));

        let list = require(props, &self.key("host.list"))?;
        let mut addresses = Vec::new();
        for name in list.split(',') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let addr = require(props, &self.key(&format!("host.{name}.addr")))?;
            let port = require(props, &self.key(&format!("host.{name}.port")))?;
            let port = port.parse::<u16>().map_err(|_| {
                Error::config(format!("invalid port '{port}' for host '{name}'"))
            })?;
            addresses.push(HostAddress { host: addr, port });
        }
        if addresses.is_empty() {
            return Err(Error::config(format!(
                "'{}' resolves to no server addresses",
                self.key("host.list")
            )));
        }
        self.addresses = addresses;

        if let Some(list) = props.get(&self.key("auth.list")) {
            let mut credentials = Vec::new();
            for name in list.split(',') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                credentials.push(AuthEntry {
                    username: require(props, &self.key(&format!("auth.{name}.user")))?,
                    password: require(props, &self.key(&format!("auth.{name}.pass")))?,
                    source: require(props, &self.key(&format!("auth.{name}.db")))?,
                });
            }
            self.credentials = credentials;
        }

        if self.pool.is_none() {
            self.pool = Some(PoolOptions {
                pool_size: self.pool_size,
                wait_multiple: self.wait_multiple,
                connect_timeout: self.connect_timeout,
            });
        }
        Ok(())
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}.{suffix}", self.prefix)
    }

    /// Whether activation has populated the address list.
    pub fn is_active(&self) -> bool {
        !self.addresses.is_empty()
    }

    /// The property prefix this descriptor reads from.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Display name, set by activation.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Default database name, set by activation.
    pub fn default_db(&self) -> Option<&str> {
        self.default_db.as_deref()
    }

    /// Replica-set flag.
    pub fn replicas(&self) -> bool {
        self.replicas
    }

    /// Whether collections opened through the client auto-assign string ids.
    pub fn create_id(&self) -> bool {
        self.create_id
    }

    /// Resolved server addresses.
    pub fn addresses(&self) -> &[HostAddress] {
        &self.addresses
    }

    /// Resolved credentials, possibly empty.
    pub fn credentials(&self) -> &[AuthEntry] {
        &self.credentials
    }

    /// Pool options: the explicit set when given, otherwise the current
    /// knob values.
    pub fn pool_options(&self) -> PoolOptions {
        self.pool.unwrap_or(PoolOptions {
            pool_size: self.pool_size,
            wait_multiple: self.wait_multiple,
            connect_timeout: self.connect_timeout,
        })
    }

    /// Set the maximum pool size, floored at 1.
    pub fn set_pool_size(&mut self, pool_size: u32) {
        self.pool_size = pool_size.max(1);
    }

    /// Set the wait-queue multiplier.
    pub fn set_wait_multiple(&mut self, wait_multiple: u32) {
        self.wait_multiple = wait_multiple;
    }

    /// Set the connect timeout.
    pub fn set_connect_timeout(&mut self, connect_timeout: Duration) {
        self.connect_timeout = connect_timeout;
    }

    /// Install explicit pool options, overriding the defaults activation
    /// would build. The pool-size floor still applies.
    pub fn set_pool_options(&mut self, pool: PoolOptions) {
        self.pool = Some(PoolOptions {
            pool_size: pool.pool_size.max(1),
            ..pool
        });
    }

    /// The client for this cluster, built on first call.
    ///
    /// Exactly one [`Client`] is constructed per descriptor; concurrent
    /// callers race on a mutex and all receive the same instance. Fails when
    /// the descriptor was never activated.
    pub fn client(&self) -> Result<Arc<Client>> {
        let mut slot = self.client.lock();
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }
        if !self.is_active() {
            return Err(Error::config(format!(
                "descriptor '{}' is not activated",
                self.prefix
            )));
        }
        let client = Arc::new(Client::new(self)?);
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Close the client if one was built. Idempotent.
    pub async fn close(&self) {
        let client = self.client.lock().take();
        if let Some(client) = client {
            client.close().await;
        }
    }
}

fn require(props: &dyn PropertySource, name: &str) -> Result<String> {
    match props.get(name) {
        Some(value) => {
            let value = value.trim();
            if value.is_empty() {
                Err(Error::config(format!("property '{name}' is blank")))
            } else {
                Ok(value.to_string())
            }
        }
        None => Err(Error::config(format!("property '{name}' is missing"))),
    }
}

fn flag(props: &dyn PropertySource, name: &str) -> bool {
    props.get_or(name, "false").trim().eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn props() -> HashMap<String, String> {
        HashMap::from(
            [
                ("core.mongo.name", "orders"),
                ("core.mongo.db", "orderdb"),
                ("core.mongo.replicas", "true"),
                ("core.mongo.createid", "true"),
                ("core.mongo.host.list", "alpha, beta"),
                ("core.mongo.host.alpha.addr", "db-1.internal"),
                ("core.mongo.host.alpha.port", "27017"),
                ("core.mongo.host.beta.addr", "db-2.internal"),
                ("core.mongo.host.beta.port", "27018"),
                ("core.mongo.auth.list", "main"),
                ("core.mongo.auth.main.user", "svc"),
                ("core.mongo.auth.main.pass", "secret"),
                ("core.mongo.auth.main.db", "admin"),
            ]
            .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    #[test]
    fn test_blank_prefix_rejected() {
        assert!(Descriptor::new("  ").is_err());
    }

    #[test]
    fn test_activation_happy_path() {
        let mut descriptor = Descriptor::new("core.mongo").unwrap();
        assert!(!descriptor.is_active());
        assert!(descriptor.activate(&props()));

        assert!(descriptor.is_active());
        assert_eq!(descriptor.name(), Some("orders"));
        assert_eq!(descriptor.default_db(), Some("orderdb"));
        assert!(descriptor.replicas());
        assert!(descriptor.create_id());
        assert_eq!(
            descriptor.addresses(),
            &[
                HostAddress {
                    host: "db-1.internal".to_string(),
                    port: 27017
                },
                HostAddress {
                    host: "db-2.internal".to_string(),
                    port: 27018
                },
            ]
        );
        assert_eq!(descriptor.credentials().len(), 1);
        assert_eq!(descriptor.credentials()[0].username, "svc");
        assert_eq!(descriptor.credentials()[0].source, "admin");
        assert_eq!(descriptor.pool_options(), PoolOptions::default());
    }

    #[test]
    fn test_activation_missing_required_key() {
        let mut source = props();
        source.remove("core.mongo.db");

        let mut descriptor = Descriptor::new("core.mongo").unwrap();
        assert!(!descriptor.activate(&source));
        assert!(!descriptor.is_active());
    }

    #[test]
    fn test_activation_empty_host_list() {
        let mut source = props();
        source.insert("core.mongo.host.list".to_string(), " , ".to_string());

        let mut descriptor = Descriptor::new("core.mongo").unwrap();
        assert!(!descriptor.activate(&source));
        assert!(!descriptor.is_active());
    }

    #[test]
    fn test_activation_bad_port() {
        let mut source = props();
        source.insert(
            "core.mongo.host.alpha.port".to_string(),
            "not-a-port".to_string(),
        );

        let mut descriptor = Descriptor::new("core.mongo").unwrap();
        assert!(!descriptor.activate(&source));
        assert!(!descriptor.is_active());
    }

    #[test]
    fn test_activation_without_auth_list() {
        let mut source = props();
        source.remove("core.mongo.auth.list");
        source.remove("core.mongo.auth.main.user");

        let mut descriptor = Descriptor::new("core.mongo").unwrap();
        assert!(descriptor.activate(&source));
        assert!(descriptor.credentials().is_empty());
    }

    #[test]
    fn test_activation_is_idempotent() {
        let mut descriptor = Descriptor::new("core.mongo").unwrap();
        assert!(descriptor.activate(&props()));

        // a now-broken source no longer matters
        let empty: HashMap<String, String> = HashMap::new();
        assert!(descriptor.activate(&empty));
        assert_eq!(descriptor.name(), Some("orders"));
    }

    #[test]
    fn test_flag_defaults() {
        let mut source = props();
        source.remove("core.mongo.replicas");
        source.remove("core.mongo.createid");

        let mut descriptor = Descriptor::new("core.mongo").unwrap();
        assert!(descriptor.activate(&source));
        assert!(!descriptor.replicas());
        assert!(!descriptor.create_id());
    }

    #[test]
    fn test_pool_knob_floors() {
        let mut descriptor = Descriptor::new("core.mongo").unwrap();
        descriptor.set_pool_size(0);
        descriptor.set_wait_multiple(0);
        descriptor.set_connect_timeout(Duration::ZERO);
        assert!(descriptor.activate(&props()));

        let pool = descriptor.pool_options();
        assert_eq!(pool.pool_size, 1);
        assert_eq!(pool.wait_multiple, 0);
        assert_eq!(pool.connect_timeout, Duration::ZERO);
    }

    #[test]
    fn test_explicit_pool_options_survive_activation() {
        let mut descriptor = Descriptor::new("core.mongo").unwrap();
        descriptor.set_pool_options(PoolOptions {
            pool_size: 0,
            wait_multiple: 7,
            connect_timeout: Duration::from_secs(3),
        });
        assert!(descriptor.activate(&props()));

        let pool = descriptor.pool_options();
        assert_eq!(pool.pool_size, 1);
        assert_eq!(pool.wait_multiple, 7);
        assert_eq!(pool.connect_timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_client_is_a_lazy_singleton() {
        let mut descriptor = Descriptor::new("core.mongo").unwrap();
        assert!(descriptor.activate(&props()));

        let first = descriptor.client().unwrap();
        let second = descriptor.client().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_client_requires_activation() {
        let descriptor = Descriptor::new("core.mongo").unwrap();
        assert!(descriptor.client().unwrap_err().is_config());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut descriptor = Descriptor::new("core.mongo").unwrap();
        assert!(descriptor.activate(&props()));
        let _ = descriptor.client().unwrap();

        descriptor.close().await;
        descriptor.close().await;
    }

    #[test]
    fn test_auth_entry_debug_redacts_password() {
        let entry = AuthEntry {
            username: "svc".to_string(),
            password: "secret".to_string(),
            source: "admin".to_string(),
        };
        let rendered = format!("{entry:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
