//! # mongrove
//!
//! A configuration-driven facade over the MongoDB driver.
//!
//! This crate provides:
//! - Cluster descriptors activated from a flat property namespace
//!   (host lists, credentials, pool sizing)
//! - One-time client construction per descriptor
//! - Database and collection handles with id-normalizing writes
//! - Lazy, closeable cursors with skip/limit/sort refinement
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::collections::HashMap;
//! use mongrove::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> mongrove::Result<()> {
//!     let props: HashMap<String, String> = load_properties();
//!
//!     let mut descriptor = Descriptor::new("core.mongo")?;
//!     if !descriptor.activate(&props) {
//!         return Err(Error::config("core.mongo is not configured"));
//!     }
//!
//!     let client = descriptor.client()?;
//!     let orders = client.default_database()?.collection("orders");
//!
//!     orders.insert(doc! { "name": "widget", "qty": 3 }).await?;
//!
//!     let mut cursor = orders.query(doc! { "name": "widget" });
//!     while let Some(record) = cursor.next().await? {
//!         println!("{record}");
//!     }
//!
//!     descriptor.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration namespace
//!
//! Descriptors read keys under a caller-chosen prefix `P`: `P.name`, `P.db`,
//! `P.replicas`, `P.createid`, `P.host.list` plus `P.host.<h>.addr`/`.port`
//! per listed host, and optionally `P.auth.list` plus
//! `P.auth.<a>.user`/`.pass`/`.db` per listed credential. See
//! [`descriptor`] for the full table.

pub mod client;
pub mod collection;
pub mod cursor;
pub mod database;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod props;

pub use bson::oid::ObjectId;
pub use bson::{Bson, Document, doc};
pub use client::Client;
pub use collection::{Collection, FindSpec};
pub use cursor::Cursor;
pub use database::{CollectionOptions, Database};
pub use descriptor::{AuthEntry, Descriptor, HostAddress, PoolOptions};
pub use document::{AUTO_ID_FIELD, DocumentExt, ID_FIELD};
pub use error::{Error, Result};
pub use props::{EnvProperties, PropertySource};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::client::Client;
    pub use crate::collection::{Collection, FindSpec};
    pub use crate::cursor::Cursor;
    pub use crate::database::{CollectionOptions, Database};
    pub use crate::descriptor::{Descriptor, HostAddress, PoolOptions};
    pub use crate::document::{AUTO_ID_FIELD, DocumentExt, ID_FIELD};
    pub use crate::error::{Error, Result};
    pub use crate::props::{EnvProperties, PropertySource};
    pub use bson::oid::ObjectId;
    pub use bson::{Bson, Document, doc};
}
