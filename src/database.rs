//! Database handles.

use bson::Document;

use crate::collection::Collection;
use crate::error::{Error, Result};

/// Per-collection open options: the collection name and whether inserts
/// through the handle auto-assign string ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOptions {
    name: String,
    auto_id: bool,
}

impl CollectionOptions {
    /// Create options for the named collection.
    pub fn new(name: impl Into<String>, auto_id: bool) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(Error::config("collection name is blank"));
        }
        Ok(Self { name, auto_id })
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The auto-id flag.
    pub fn auto_id(&self) -> bool {
        self.auto_id
    }
}

/// A logical namespace of collections.
///
/// Stateless wrapper over the driver database handle; nothing is cached, so
/// listings always reflect the live server state.
#[derive(Clone, Debug)]
pub struct Database {
    inner: mongodb::Database,
    auto_id: bool,
}

impl Database {
    pub(crate) fn new(inner: mongodb::Database, auto_id: bool) -> Self {
        Self { inner, auto_id }
    }

    /// The database name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Delete the database.
    pub async fn drop(&self) -> Result<()> {
        self.inner.drop(None).await?;
        Ok(())
    }

    /// Live listing of collection names.
    pub async fn collection_names(&self) -> Result<Vec<String>> {
        Ok(self.inner.list_collection_names(None).await?)
    }

    /// Whether `name` appears in the live collection listing.
    pub async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collection_names().await?.iter().any(|c| c == name))
    }

    /// A handle on the named collection.
    ///
    /// Existence is not checked; the server creates the collection on first
    /// write. The handle inherits the client's auto-id flag.
    pub fn collection(&self, name: &str) -> Collection {
        Collection::new(self.inner.collection(name), self.auto_id)
    }

    /// A handle opened with explicit [`CollectionOptions`].
    pub fn collection_with(&self, options: &CollectionOptions) -> Collection {
        Collection::new(self.inner.collection(options.name()), options.auto_id())
    }

    /// Run a raw database command.
    pub async fn run_command(&self, command: Document) -> Result<Document> {
        Ok(self.inner.run_command(command, None).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_options_rejects_blank_name() {
        assert!(CollectionOptions::new("  ", true).is_err());

        let options = CollectionOptions::new(" audit ", true).unwrap();
        assert_eq!(options.name(), "audit");
        assert!(options.auto_id());
    }
}
