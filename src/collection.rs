//! Collection handles and the find specification.

use bson::{Bson, Document, doc};
use mongodb::IndexModel;
use mongodb::options::{FindOneOptions, FindOptions, IndexOptions, UpdateOptions};

use crate::cursor::Cursor;
use crate::document::{self, ID_FIELD};
use crate::error::Result;

/// Specification for a find: filter, optional field projection, identity
/// visibility, and skip/limit/sort refinements.
///
/// The identity field is **excluded by default**; set
/// [`include_id`](FindSpec::include_id) to surface it. When a projection is
/// supplied, the identity in/exclusion is merged into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindSpec {
    pub(crate) filter: Document,
    pub(crate) projection: Option<Document>,
    pub(crate) include_id: bool,
    pub(crate) skip: Option<u64>,
    pub(crate) limit: Option<i64>,
    pub(crate) sort: Option<Document>,
}

impl FindSpec {
    /// An empty specification: match everything, identity excluded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query filter.
    pub fn filter(mut self, filter: Document) -> Self {
        self.filter = filter;
        self
    }

    /// Set a field projection.
    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Include or exclude the identity field in results.
    pub fn include_id(mut self, include_id: bool) -> Self {
        self.include_id = include_id;
        self
    }

    /// Skip the first `skip` results.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Cap the number of results.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sort results by the given specification.
    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    /// The projection actually sent to the server, with the identity
    /// in/exclusion folded in.
    pub fn effective_projection(&self) -> Option<Document> {
        match &self.projection {
            Some(fields) => {
                let mut merged = fields.clone();
                merged.insert(ID_FIELD, self.include_id);
                Some(merged)
            }
            None if !self.include_id => Some(doc! { ID_FIELD: false }),
            None => None,
        }
    }

    pub(crate) fn to_options(&self) -> FindOptions {
        FindOptions::builder()
            .projection(self.effective_projection())
            .skip(self.skip)
            .limit(self.limit)
            .sort(self.sort.clone())
            .build()
    }
}

impl From<Document> for FindSpec {
    fn from(filter: Document) -> Self {
        Self::new().filter(filter)
    }
}

/// A named set of records.
///
/// Write payloads are numerically normalized before they reach the driver;
/// when the auto-id flag is set, inserts also assign a generated string `id`
/// to records lacking one.
#[derive(Clone)]
pub struct Collection {
    inner: mongodb::Collection<Document>,
    auto_id: bool,
}

impl Collection {
    pub(crate) fn new(inner: mongodb::Collection<Document>, auto_id: bool) -> Self {
        Self { inner, auto_id }
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// The full `db.collection` namespace.
    pub fn namespace(&self) -> String {
        self.inner.namespace().to_string()
    }

    /// Whether inserts auto-assign string ids.
    pub fn auto_id(&self) -> bool {
        self.auto_id
    }

    fn prepare(&self, mut record: Document) -> Document {
        document::normalize(&mut record);
        if self.auto_id {
            document::ensure_id(&mut record);
        }
        record
    }

    /// Build an index over `keys`.
    pub async fn create_index(&self, keys: Document) -> Result<&Self> {
        let model = IndexModel::builder().keys(keys).build();
        self.inner.create_index(model, None).await?;
        Ok(self)
    }

    /// Build an index over `keys` with explicit options.
    pub async fn create_index_with(&self, keys: Document, options: IndexOptions) -> Result<&Self> {
        let model = IndexModel::builder().keys(keys).options(options).build();
        self.inner.create_index(model, None).await?;
        Ok(self)
    }

    /// Delete the collection.
    pub async fn drop(&self) -> Result<()> {
        self.inner.drop(None).await?;
        Ok(())
    }

    /// Delete every record matching `query`.
    pub async fn remove(&self, query: Document) -> Result<&Self> {
        self.inner.delete_many(query, None).await?;
        Ok(self)
    }

    /// Insert one record.
    pub async fn insert(&self, record: Document) -> Result<&Self> {
        self.inner.insert_one(self.prepare(record), None).await?;
        Ok(self)
    }

    /// Insert a batch of records.
    pub async fn insert_many(&self, records: Vec<Document>) -> Result<&Self> {
        let prepared: Vec<Document> = records.into_iter().map(|r| self.prepare(r)).collect();
        self.inner.insert_many(prepared, None).await?;
        Ok(self)
    }

    /// Insert one record and return it, id-augmented when auto-id applies.
    pub async fn create(&self, record: Document) -> Result<Document> {
        let record = self.prepare(record);
        self.inner.insert_one(record.clone(), None).await?;
        Ok(record)
    }

    /// Count records, optionally filtered.
    pub async fn count(&self, filter: impl Into<Option<Document>>) -> Result<u64> {
        Ok(self.inner.count_documents(filter, None).await?)
    }

    /// A cursor over the records matching `spec`.
    ///
    /// The query does not run until the cursor is first consumed.
    pub fn find(&self, spec: impl Into<FindSpec>) -> Cursor {
        Cursor::new(self.inner.clone(), spec.into())
    }

    /// A cursor over every record, identity excluded.
    pub fn find_all(&self) -> Cursor {
        self.find(FindSpec::new())
    }

    /// A cursor over the records matching `filter`, identity excluded.
    pub fn query(&self, filter: Document) -> Cursor {
        self.find(FindSpec::from(filter))
    }

    /// The first record matching `filter`, identity excluded.
    pub async fn find_one(&self, filter: Document) -> Result<Option<Document>> {
        let options = FindOneOptions::builder()
            .projection(doc! { ID_FIELD: false })
            .build();
        Ok(self.inner.find_one(filter, options).await?)
    }

    /// General update entry point.
    ///
    /// Applies `update` to the matching record(s), inserting when `upsert`
    /// is set and nothing matches. Returns the (normalized) update document
    /// rather than server result metadata.
    pub async fn update(
        &self,
        query: Document,
        update: Document,
        upsert: bool,
        multi: bool,
    ) -> Result<Document> {
        let mut update = update;
        document::normalize(&mut update);
        let options = UpdateOptions::builder().upsert(upsert).build();
        if multi {
            self.inner.update_many(query, update.clone(), options).await?;
        } else {
            self.inner.update_one(query, update.clone(), options).await?;
        }
        Ok(update)
    }

    /// Update the first record matching `query`, no upsert.
    pub async fn update_one(&self, query: Document, update: Document) -> Result<Document> {
        self.update(query, update, false, false).await
    }

    /// Update every record matching `query`, no upsert; returns the count of
    /// modified records.
    pub async fn update_many(&self, query: Document, update: Document) -> Result<u64> {
        let mut update = update;
        document::normalize(&mut update);
        let options = UpdateOptions::builder().upsert(false).build();
        let result = self.inner.update_many(query, update, options).await?;
        Ok(result.modified_count)
    }

    /// Update the matching record(s), inserting when nothing matches.
    pub async fn upsert(&self, query: Document, update: Document) -> Result<Document> {
        self.update(query, update, true, true).await
    }

    /// Apply `update` to every record matching `query`, without upsert.
    ///
    /// Despite the name, this is a multi-document update: it does not return
    /// the matched record, and more than one record may be modified.
    pub async fn find_and_modify(&self, query: Document, update: Document) -> Result<Document> {
        self.update(query, update, false, true).await
    }

    /// Distinct values of `field`, optionally filtered. Materialized in the
    /// order the server reports.
    pub async fn distinct(
        &self,
        field: &str,
        filter: impl Into<Option<Document>>,
    ) -> Result<Vec<Bson>> {
        Ok(self.inner.distinct(field, filter, None).await?)
    }
}
