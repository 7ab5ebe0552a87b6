//! Store key naming
//!
//! Every key the index touches is built here, so the writer, the remover and the
//! query planner agree on names. The layout is fixed; data written by other
//! implementations of the same scheme stays readable.

/// Key names for one namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScheme {
    namespace: String,
}

impl KeyScheme {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// `{ns}:{field}:{value}:id`: sorted set of documents holding `value`
    pub fn value_key(&self, field: &str, value: &str) -> String {
        format!("{}:{}:{}:id", self.namespace, field, value)
    }

    /// `{ns}:id:{doc}:{field}`: tokens indexed for one document field
    pub fn reverse_index_key(&self, doc_id: &str, field: &str) -> String {
        format!("{}:id:{}:{}", self.namespace, doc_id, field)
    }

    /// `{ns}:id:{doc}:indices`: fields indexed for one document
    pub fn field_registry_key(&self, doc_id: &str) -> String {
        format!("{}:id:{}:indices", self.namespace, doc_id)
    }

    /// `{ns}:ids`: every document id ever indexed
    pub fn ids_key(&self) -> String {
        format!("{}:ids", self.namespace)
    }

    /// `{ns}:{field}:temp`: per-field aggregate of a query
    pub fn field_temp_key(&self, field: &str) -> String {
        format!("{}:{}:temp", self.namespace, field)
    }

    /// `{ns}:tempFinal`: cross-field aggregate of a query
    pub fn final_temp_key(&self) -> String {
        format!("{}:tempFinal", self.namespace)
    }
}
