//! Search handle: index, query, remove and count over one namespace

use crate::error::{AppError, Result};
use crate::search::analysis::Normalizer;
use crate::search::config::{SearchConfig, SearchConfigBuilder};
use crate::search::document::{DocId, Document};
use crate::search::error::{SearchError, SearchResult};
use crate::search::keys::KeyScheme;
use crate::search::metrics::SEARCH_METRICS;
use crate::search::query::{QueryPlan, QueryPlanner, SearchQuery};
use crate::search::remover::IndexRemover;
use crate::search::writer::IndexWriter;
use crate::state::SortedSetStore;
use std::sync::Arc;
use std::time::Instant;

/// Handle on one search namespace.
///
/// Cheap to clone; clones share the store connection.
#[derive(Clone)]
pub struct Search {
    store: Arc<dyn SortedSetStore>,
    keys: KeyScheme,
    normalizer: Normalizer,
    config: SearchConfig,
}

impl Search {
    /// Create a handle with the default configuration for `namespace`
    pub fn create(
        namespace: impl Into<String>,
        store: Arc<dyn SortedSetStore>,
    ) -> SearchResult<Self> {
        let config = SearchConfigBuilder::new().namespace(namespace).build();
        Self::with_config(config, store)
    }

    /// Create a handle from a full configuration
    pub fn with_config(config: SearchConfig, store: Arc<dyn SortedSetStore>) -> SearchResult<Self> {
        if config.namespace.is_empty() {
            return Err(SearchError::MissingNamespace);
        }

        tracing::debug!(
            namespace = %config.namespace,
            text_field = %config.text_field,
            backend = store.backend(),
            "Search handle created"
        );

        Ok(Self {
            store,
            keys: KeyScheme::new(config.namespace.clone()),
            normalizer: Normalizer::new(),
            config,
        })
    }

    pub fn namespace(&self) -> &str {
        self.keys.namespace()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SortedSetStore> {
        &self.store
    }

    /// Index every field of `document` under `doc_id` in one atomic batch.
    ///
    /// Indexing the same id again adds entries; it does not drop entries for values
    /// the document no longer holds. Call `remove` first to replace a document.
    pub async fn index(&self, document: &Document, doc_id: impl Into<DocId>) -> SearchResult<()> {
        let doc_id = doc_id.into();
        if doc_id.is_empty() {
            return Err(SearchError::MissingDocumentId);
        }

        let started = Instant::now();
        let commands = IndexWriter::new(&self.keys, &self.normalizer, &self.config.text_field)
            .build(document, &doc_id);
        let command_count = commands.len();

        let result = if commands.is_empty() {
            Ok(())
        } else {
            self.store
                .execute(commands)
                .await
                .map(|_| ())
                .map_err(|e| SearchError::IndexingFailed(e.to_string()))
        };

        self.record("index", result.is_ok(), started, command_count);
        match &result {
            Ok(()) => tracing::debug!(
                namespace = %self.namespace(),
                doc_id = %doc_id,
                fields = document.len(),
                commands = command_count,
                "Document indexed"
            ),
            Err(e) => tracing::warn!(
                namespace = %self.namespace(),
                doc_id = %doc_id,
                error = %e,
                "Document indexing failed"
            ),
        }
        result
    }

    /// Ids matching `query`, highest score first, restricted to ranks `start..=stop`
    pub async fn query(
        &self,
        query: &SearchQuery,
        start: isize,
        stop: isize,
    ) -> SearchResult<Vec<String>> {
        let started = Instant::now();

        let plan = match QueryPlanner::new(&self.keys, &self.normalizer).plan(query, start, stop) {
            Some(plan) => plan,
            None => {
                tracing::debug!(namespace = %self.namespace(), "Query has no keys, nothing to read");
                self.record("query", true, started, 0);
                return Ok(Vec::new());
            }
        };

        let command_count = plan.commands.len();
        let result = self
            .run_plan(plan)
            .await
            .map_err(|e| SearchError::QueryFailed(e.to_string()));

        self.record("query", result.is_ok(), started, command_count);
        match &result {
            Ok(ids) => tracing::debug!(
                namespace = %self.namespace(),
                fields = query.fields.len(),
                commands = command_count,
                hits = ids.len(),
                "Query executed"
            ),
            Err(e) => tracing::warn!(namespace = %self.namespace(), error = %e, "Query failed"),
        }
        result
    }

    /// Query with the configured default rank window
    pub async fn query_default(&self, query: &SearchQuery) -> SearchResult<Vec<String>> {
        self.query(query, self.config.default_start, self.config.default_stop)
            .await
    }

    async fn run_plan(&self, plan: QueryPlan) -> Result<Vec<String>> {
        let QueryPlan {
            commands,
            result_index,
            ..
        } = plan;

        let mut replies = self.store.execute(commands).await?;
        if result_index >= replies.len() {
            return Err(AppError::Store(format!(
                "Query batch returned {} replies, expected at least {}",
                replies.len(),
                result_index + 1
            )));
        }
        replies.swap_remove(result_index).into_members()
    }

    /// Remove a document from every index entry recorded for it.
    ///
    /// Unknown ids succeed without effect. The id stays in the global id set, so
    /// `count` does not decrease.
    pub async fn remove(&self, doc_id: impl Into<DocId>) -> SearchResult<()> {
        let doc_id = doc_id.into();
        if doc_id.is_empty() {
            return Err(SearchError::MissingDocumentId);
        }

        let started = Instant::now();
        let result = IndexRemover::new(&self.keys, self.store.as_ref())
            .remove(&doc_id)
            .await
            .map_err(|e| SearchError::RemovalFailed(e.to_string()));

        let command_count = result.as_ref().copied().unwrap_or(0);
        self.record("remove", result.is_ok(), started, command_count);
        match &result {
            Ok(_) => tracing::debug!(
                namespace = %self.namespace(),
                doc_id = %doc_id,
                commands = command_count,
                "Document removed"
            ),
            Err(e) => tracing::warn!(
                namespace = %self.namespace(),
                doc_id = %doc_id,
                error = %e,
                "Document removal failed"
            ),
        }
        result.map(|_| ())
    }

    /// Number of ids ever indexed in this namespace
    pub async fn count(&self) -> SearchResult<u64> {
        let started = Instant::now();
        let result = count_ids(self.store.as_ref(), &self.keys).await;
        self.record("count", result.is_ok(), started, 1);
        result
    }

    fn record(&self, operation: &str, success: bool, started: Instant, commands: usize) {
        if self.config.metrics_enabled {
            SEARCH_METRICS.record(operation, success, started.elapsed(), commands);
        }
    }
}

/// Number of ids ever indexed in `namespace`, without building a handle
pub async fn count(store: &dyn SortedSetStore, namespace: &str) -> SearchResult<u64> {
    if namespace.is_empty() {
        return Err(SearchError::MissingNamespace);
    }
    count_ids(store, &KeyScheme::new(namespace)).await
}

async fn count_ids(store: &dyn SortedSetStore, keys: &KeyScheme) -> SearchResult<u64> {
    store
        .cardinality(&keys.ids_key())
        .await
        .map_err(|e| SearchError::StoreError(e.to_string()))
}
