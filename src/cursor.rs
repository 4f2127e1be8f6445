//! Lazy, closeable cursors over query results.

use bson::Document;
use futures::TryStreamExt;
use tracing::debug;

use crate::collection::FindSpec;
use crate::error::Result;

/// A lazy sequence over the records matching a find specification.
///
/// The server-side query runs on first consumption, not at construction.
/// A cursor is **open** until it is closed, either explicitly or, when
/// auto-close is enabled (the default), as part of the [`has_next`]
/// exhaustion check; the closed state is permanent. Cursors are meant for
/// single-threaded, sequential consumption.
///
/// [`has_next`]: Cursor::has_next
pub struct Cursor {
    target: mongodb::Collection<Document>,
    spec: FindSpec,
    stream: Option<mongodb::Cursor<Document>>,
    pending: Option<Document>,
    closed: bool,
    auto_close: bool,
}

impl Cursor {
    pub(crate) fn new(target: mongodb::Collection<Document>, spec: FindSpec) -> Self {
        Self {
            target,
            spec,
            stream: None,
            pending: None,
            closed: false,
            auto_close: true,
        }
    }

    /// The specification this cursor iterates.
    pub fn spec(&self) -> &FindSpec {
        &self.spec
    }

    /// Whether the cursor has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether exhaustion closes the cursor. Defaults to `true`.
    pub fn auto_close(&self) -> bool {
        self.auto_close
    }

    /// Toggle auto-close-on-exhaustion.
    pub fn set_auto_close(&mut self, auto_close: bool) -> &mut Self {
        self.auto_close = auto_close;
        self
    }

    async fn fetch(&mut self) -> Result<Option<Document>> {
        if self.stream.is_none() {
            let stream = self
                .target
                .find(self.spec.filter.clone(), self.spec.to_options())
                .await?;
            self.stream = Some(stream);
        }
        match self.stream.as_mut() {
            Some(stream) => Ok(stream.try_next().await?),
            None => Ok(None),
        }
    }

    /// Whether another record is available.
    ///
    /// `Ok(false)` once closed, without touching the server. Otherwise runs
    /// the query if it has not run yet and buffers one record of lookahead.
    /// Exhaustion with auto-close enabled performs the close transition
    /// before reporting `false`; this release is part of the check's
    /// contract. Driver read failures propagate.
    pub async fn has_next(&mut self) -> Result<bool> {
        if self.closed {
            return Ok(false);
        }
        if self.pending.is_some() {
            return Ok(true);
        }
        match self.fetch().await? {
            Some(record) => {
                self.pending = Some(record);
                Ok(true)
            }
            None => {
                if self.auto_close {
                    self.close();
                }
                Ok(false)
            }
        }
    }

    /// The next record, or `None` once the sequence is exhausted or closed.
    pub async fn next(&mut self) -> Result<Option<Document>> {
        if self.has_next().await? {
            Ok(self.pending.take())
        } else {
            Ok(None)
        }
    }

    /// Drain the remaining records.
    pub async fn collect(&mut self) -> Result<Vec<Document>> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await? {
            records.push(record);
        }
        Ok(records)
    }

    /// Release the server-side cursor. Idempotent; the driver issues the
    /// server-side kill when the stream is dropped.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.pending = None;
        if self.stream.take().is_some() {
            debug!(collection = %self.target.name(), "cursor closed");
        }
    }

    /// A new cursor over the same query, skipping the first `skip` records.
    /// The receiving cursor is unaffected.
    pub fn skip(&self, skip: u64) -> Cursor {
        Cursor::new(self.target.clone(), self.spec.clone().skip(skip))
    }

    /// A new cursor over the same query, capped at `limit` records. The
    /// receiving cursor is unaffected.
    pub fn limit(&self, limit: i64) -> Cursor {
        Cursor::new(self.target.clone(), self.spec.clone().limit(limit))
    }

    /// A new cursor over the same query with the given sort. The receiving
    /// cursor is unaffected.
    pub fn sort(&self, sort: Document) -> Cursor {
        Cursor::new(self.target.clone(), self.spec.clone().sort(sort))
    }
}
