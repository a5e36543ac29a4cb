//! Fan-out collector: every source runs as its own task under its own timeout.
//!
//! The collector waits for all of them. A source that errors, times out or
//! panics contributes nothing and is logged; the rest carry on.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::models::{Posting, SearchCriteria};
use crate::sources::{SourceAdapter, SourceError, SourceKind};

/// How one source fared in a collection round.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: SourceKind,
    pub postings: usize,
    pub error: Option<SourceError>,
}

impl SourceOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Default)]
pub struct Collection {
    /// Postings from every successful source, in source order then provider order.
    pub postings: Vec<Posting>,
    /// One entry per source, in invocation order.
    pub outcomes: Vec<SourceOutcome>,
}

impl Collection {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }
}

pub async fn collect(
    sources: &[Arc<dyn SourceAdapter>],
    criteria: &SearchCriteria,
    timeout: Duration,
) -> Collection {
    let (kinds, tasks): (Vec<SourceKind>, Vec<_>) = sources
        .iter()
        .map(|source| {
            let kind = source.kind();
            let source = Arc::clone(source);
            let criteria = criteria.clone();
            let task = tokio::spawn(async move {
                match tokio::time::timeout(timeout, source.fetch(&criteria)).await {
                    Ok(result) => result,
                    Err(_) => Err(SourceError::Timeout(timeout)),
                }
            });
            (kind, task)
        })
        .unzip();

    let mut collection = Collection::default();
    for (kind, joined) in kinds.into_iter().zip(join_all(tasks).await) {
        let result = joined.unwrap_or_else(|e| Err(SourceError::Task(e.to_string())));
        match result {
            Ok(found) => {
                debug!(source = %kind, count = found.len(), "Source returned postings");
                collection.outcomes.push(SourceOutcome {
                    source: kind,
                    postings: found.len(),
                    error: None,
                });
                collection.postings.extend(found);
            }
            Err(e) => {
                warn!(source = %kind, error = %e, "Source failed; continuing without it");
                collection.outcomes.push(SourceOutcome {
                    source: kind,
                    postings: 0,
                    error: Some(e),
                });
            }
        }
    }

    collection
}
