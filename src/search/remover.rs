//! Index remover: undoes what the writer did for one document

use crate::error::Result;
use crate::search::document::DocId;
use crate::search::keys::KeyScheme;
use crate::state::{Command, SortedSetStore};
use futures::future::join_all;

/// Removes a document from every index entry recorded for it
pub struct IndexRemover<'a> {
    keys: &'a KeyScheme,
    store: &'a dyn SortedSetStore,
}

impl<'a> IndexRemover<'a> {
    pub fn new(keys: &'a KeyScheme, store: &'a dyn SortedSetStore) -> Self {
        Self { keys, store }
    }

    /// Commands removing one field of a document, given its reverse index set
    pub fn field_commands(&self, doc_id: &DocId, field: &str, tokens: &[String]) -> Vec<Command> {
        let mut commands = Vec::with_capacity(tokens.len() + 1);
        commands.push(Command::Del {
            key: self.keys.reverse_index_key(doc_id.as_str(), field),
        });
        commands.extend(tokens.iter().map(|token| Command::ZRem {
            key: self.keys.value_key(field, token),
            member: doc_id.to_string(),
        }));
        commands
    }

    /// Remove one field: read its reverse index set, then drop every entry in one batch
    async fn remove_field(&self, doc_id: &DocId, field: &str) -> Result<usize> {
        let tokens = self
            .store
            .members(&self.keys.reverse_index_key(doc_id.as_str(), field))
            .await?;
        let commands = self.field_commands(doc_id, field, &tokens);
        let count = commands.len();
        self.store.execute(commands).await?;

        tracing::debug!(doc_id = %doc_id, field = %field, tokens = tokens.len(), "Field removed from index");
        Ok(count)
    }

    /// Remove every indexed field of the document, fields in parallel, then drop its
    /// field registry. The global id set is left untouched.
    ///
    /// Every field batch runs to completion even when another one fails. The first
    /// failure is returned afterwards and the registry is kept, so fields that were
    /// removed stay removed and the failed ones can be retried.
    ///
    /// Returns the number of commands issued to the store.
    pub async fn remove(&self, doc_id: &DocId) -> Result<usize> {
        let registry_key = self.keys.field_registry_key(doc_id.as_str());
        let fields = self.store.members(&registry_key).await?;

        let results = join_all(
            fields
                .iter()
                .map(|field| self.remove_field(doc_id, field)),
        )
        .await;

        let mut commands = 0;
        for result in results {
            commands += result?;
        }

        self.store.delete(&registry_key).await?;

        Ok(commands + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_commands() {
        let keys = KeyScheme::new("ns");
        let store = crate::state::InMemoryStore::new();
        let remover = IndexRemover::new(&keys, &store);

        let commands = remover.field_commands(
            &DocId::from(4),
            "content",
            &["APL".to_string(), "PR".to_string()],
        );

        assert_eq!(
            commands,
            vec![
                Command::Del {
                    key: "ns:id:4:content".to_string()
                },
                Command::ZRem {
                    key: "ns:content:APL:id".to_string(),
                    member: "4".to_string()
                },
                Command::ZRem {
                    key: "ns:content:PR:id".to_string(),
                    member: "4".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_field_does_not_stop_other_fields() {
        use crate::search::analysis::Normalizer;
        use crate::search::document::Document;
        use crate::search::writer::IndexWriter;

        let keys = KeyScheme::new("p");
        let store = crate::state::InMemoryStore::new();
        let doc_id = DocId::from(9);

        let normalizer = Normalizer::new();
        let doc = Document::new().field("uid", 1).field("cid", 2);
        store
            .execute(IndexWriter::new(&keys, &normalizer, "content").build(&doc, &doc_id))
            .await
            .unwrap();

        // Turn the cid entry into a plain set so removing from it fails
        store
            .execute(vec![
                Command::Del {
                    key: "p:cid:2:id".to_string(),
                },
                Command::SAdd {
                    key: "p:cid:2:id".to_string(),
                    member: "9".to_string(),
                },
            ])
            .await
            .unwrap();

        let remover = IndexRemover::new(&keys, &store);
        assert!(remover.remove(&doc_id).await.is_err());

        assert_eq!(
            store.keys(),
            vec![
                "p:cid:2:id".to_string(),
                "p:id:9:cid".to_string(),
                "p:id:9:indices".to_string(),
                "p:ids".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_remove_unknown_document_is_noop() {
        let keys = KeyScheme::new("ns");
        let store = crate::state::InMemoryStore::new();
        let remover = IndexRemover::new(&keys, &store);

        assert!(remover.remove(&DocId::from("missing")).await.is_ok());
        assert!(store.keys().is_empty());
    }
}
