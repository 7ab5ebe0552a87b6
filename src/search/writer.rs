//! Index writer: turns a document into one batch of store mutations

use crate::search::analysis::Normalizer;
use crate::search::document::{DocId, Document, FieldValue};
use crate::search::keys::KeyScheme;
use crate::state::Command;

/// Builds the mutations that index a document
pub struct IndexWriter<'a> {
    keys: &'a KeyScheme,
    normalizer: &'a Normalizer,
    text_field: &'a str,
}

impl<'a> IndexWriter<'a> {
    pub fn new(keys: &'a KeyScheme, normalizer: &'a Normalizer, text_field: &'a str) -> Self {
        Self {
            keys,
            normalizer,
            text_field,
        }
    }

    /// Commands indexing every field of `document` under `doc_id`.
    ///
    /// Fields with nothing to index (falsy values, text without terms) contribute no
    /// commands and are not registered. An empty result means the document indexes
    /// nothing.
    pub fn build(&self, document: &Document, doc_id: &DocId) -> Vec<Command> {
        let mut commands = Vec::new();

        for (field, value) in document.fields() {
            if field.is_empty() {
                continue;
            }

            let tokens = if field == self.text_field {
                self.text_entries(field, value, doc_id, &mut commands)
            } else {
                self.exact_entries(field, value, doc_id, &mut commands)
            };

            if tokens == 0 {
                continue;
            }

            commands.push(Command::SAdd {
                key: self.keys.field_registry_key(doc_id.as_str()),
                member: field.clone(),
            });
            commands.push(Command::SAdd {
                key: self.keys.ids_key(),
                member: doc_id.to_string(),
            });
        }

        commands
    }

    fn text_entries(
        &self,
        field: &str,
        value: &FieldValue,
        doc_id: &DocId,
        commands: &mut Vec<Command>,
    ) -> usize {
        let text = value
            .indexable()
            .iter()
            .map(|scalar| scalar.to_string())
            .collect::<Vec<_>>()
            .join(" ");

        let terms = self.normalizer.index_terms(&text);
        for term in &terms {
            commands.push(Command::ZAdd {
                key: self.keys.value_key(field, &term.class),
                score: term.frequency as f64,
                member: doc_id.to_string(),
            });
            commands.push(Command::SAdd {
                key: self.keys.reverse_index_key(doc_id.as_str(), field),
                member: term.class.clone(),
            });
        }
        terms.len()
    }

    fn exact_entries(
        &self,
        field: &str,
        value: &FieldValue,
        doc_id: &DocId,
        commands: &mut Vec<Command>,
    ) -> usize {
        let scalars = value.indexable();
        for scalar in &scalars {
            let rendered = scalar.to_string();
            commands.push(Command::ZAdd {
                key: self.keys.value_key(field, &rendered),
                score: scalar.score(),
                member: doc_id.to_string(),
            });
            commands.push(Command::SAdd {
                key: self.keys.reverse_index_key(doc_id.as_str(), field),
                member: rendered,
            });
        }
        scalars.len()
    }
}
