//! Search queries and the planner that turns them into store commands

use crate::search::analysis::Normalizer;
use crate::search::document::Scalar;
use crate::search::error::{SearchError, SearchResult};
use crate::search::keys::KeyScheme;
use crate::state::Command;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the terms of a free-text query combine
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Every term must match
    #[default]
    All,
    /// At least one term must match
    Any,
}

/// What one field of a query asks for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTerm {
    /// Exact value
    Value(Scalar),
    /// Any of these exact values
    AnyOf(Vec<Scalar>),
    /// Free text, normalized the same way as indexed text
    Text(String),
}

/// Structured search query.
///
/// Fields always combine with AND. Within a field, `AnyOf` values combine with OR and
/// free-text terms follow the match mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub fields: BTreeMap<String, QueryTerm>,

    #[serde(default)]
    pub match_mode: MatchMode,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match documents whose `field` equals `value`
    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.fields
            .insert(field.into(), QueryTerm::Value(value.into()));
        self
    }

    /// Match documents whose `field` equals any of `values`
    pub fn with_any_of<T: Into<Scalar>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.fields.insert(
            field.into(),
            QueryTerm::AnyOf(values.into_iter().map(Into::into).collect()),
        );
        self
    }

    /// Match free text in `field`
    pub fn with_text(mut self, field: impl Into<String>, text: impl Into<String>) -> Self {
        self.fields.insert(field.into(), QueryTerm::Text(text.into()));
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a query from a JSON object such as `{"content": "apple", "cid": [2, 4]}`.
    ///
    /// Strings on `text_field` become free text, arrays become `AnyOf`, every other
    /// scalar is an exact value.
    pub fn from_json(value: &serde_json::Value, text_field: &str) -> SearchResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| SearchError::InvalidQuery("query must be a JSON object".to_string()))?;

        let mut query = SearchQuery::new();
        for (field, raw) in object {
            let term = match raw {
                serde_json::Value::String(text) if field == text_field => {
                    QueryTerm::Text(text.clone())
                }
                serde_json::Value::Array(values) => QueryTerm::AnyOf(
                    values
                        .iter()
                        .map(|v| scalar_from_json(field, v))
                        .collect::<SearchResult<Vec<_>>>()?,
                ),
                other => QueryTerm::Value(scalar_from_json(field, other)?),
            };
            query.fields.insert(field.clone(), term);
        }
        Ok(query)
    }
}

fn scalar_from_json(field: &str, value: &serde_json::Value) -> SearchResult<Scalar> {
    serde_json::from_value(value.clone()).map_err(|_| {
        SearchError::InvalidQuery(format!(
            "field '{}' must be a string, number or boolean, got {}",
            field, value
        ))
    })
}

/// Commands answering a query, to be executed as one atomic batch
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub commands: Vec<Command>,

    /// Position of the ranged read whose reply is the result
    pub result_index: usize,

    /// Key the ranged read runs against
    pub final_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combine {
    Union,
    Intersect,
}

impl Combine {
    fn command(self, destination: String, keys: Vec<String>) -> Command {
        match self {
            Combine::Union => Command::ZUnionStore { destination, keys },
            Combine::Intersect => Command::ZInterStore { destination, keys },
        }
    }
}

/// Turns a query into the smallest batch of aggregate, read and trim commands
pub struct QueryPlanner<'a> {
    keys: &'a KeyScheme,
    normalizer: &'a Normalizer,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(keys: &'a KeyScheme, normalizer: &'a Normalizer) -> Self {
        Self { keys, normalizer }
    }

    fn field_keys(&self, field: &str, term: &QueryTerm, mode: MatchMode) -> (Vec<String>, Combine) {
        match term {
            QueryTerm::Value(value) => (
                vec![self.keys.value_key(field, &value.to_string())],
                Combine::Union,
            ),
            QueryTerm::AnyOf(values) => {
                let mut keys: Vec<String> = Vec::with_capacity(values.len());
                for value in values {
                    let key = self.keys.value_key(field, &value.to_string());
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
                (keys, Combine::Union)
            }
            QueryTerm::Text(text) => {
                let keys = self
                    .normalizer
                    .query_terms(text)
                    .iter()
                    .map(|class| self.keys.value_key(field, class))
                    .collect();
                let combine = match mode {
                    MatchMode::All => Combine::Intersect,
                    MatchMode::Any => Combine::Union,
                };
                (keys, combine)
            }
        }
    }

    /// Plan a query over the rank window `[start, stop]`.
    ///
    /// Returns `None` when no field yields a key; such a query matches nothing and
    /// needs no store access. Fields that yield no key (text made only of stop words,
    /// an empty list) are left out of the plan.
    pub fn plan(&self, query: &SearchQuery, start: isize, stop: isize) -> Option<QueryPlan> {
        let mut commands = Vec::new();
        let mut field_results: Vec<String> = Vec::new();
        let mut ephemeral: Vec<String> = Vec::new();

        for (field, term) in &query.fields {
            let (mut keys, combine) = self.field_keys(field, term, query.match_mode);
            match keys.len() {
                0 => continue,
                1 => field_results.extend(keys.pop()),
                _ => {
                    let temp = self.keys.field_temp_key(field);
                    commands.push(combine.command(temp.clone(), keys));
                    field_results.push(temp.clone());
                    ephemeral.push(temp);
                }
            }
        }

        let final_key = match field_results.len() {
            0 => return None,
            1 => field_results.remove(0),
            _ => {
                let temp = self.keys.final_temp_key();
                commands.push(Command::ZInterStore {
                    destination: temp.clone(),
                    keys: field_results,
                });
                ephemeral.push(temp.clone());
                temp
            }
        };

        let result_index = commands.len();
        commands.push(Command::ZRevRange {
            key: final_key.clone(),
            start,
            stop,
        });

        // Aggregate keys are shared by name across queries; trim them in the same batch
        commands.extend(
            ephemeral
                .into_iter()
                .map(|key| Command::ZRemRangeByRank { key, start, stop }),
        );

        Some(QueryPlan {
            commands,
            result_index,
            final_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner_fixture() -> (KeyScheme, Normalizer) {
        (KeyScheme::new("ns"), Normalizer::new())
    }

    #[test]
    fn test_single_value_reads_key_directly() {
        let (keys, normalizer) = planner_fixture();
        let planner = QueryPlanner::new(&keys, &normalizer);

        let plan = planner
            .plan(&SearchQuery::new().with_value("uid", 5), 0, -1)
            .unwrap();

        assert_eq!(plan.final_key, "ns:uid:5:id");
        assert_eq!(plan.result_index, 0);
        assert_eq!(
            plan.commands,
            vec![Command::ZRevRange {
                key: "ns:uid:5:id".to_string(),
                start: 0,
                stop: -1
            }]
        );
    }

    #[test]
    fn test_list_value_unions_into_field_temp() {
        let (keys, normalizer) = planner_fixture();
        let planner = QueryPlanner::new(&keys, &normalizer);

        let plan = planner
            .plan(&SearchQuery::new().with_any_of("cid", [2, 4]), 0, 9)
            .unwrap();

        assert_eq!(
            plan.commands,
            vec![
                Command::ZUnionStore {
                    destination: "ns:cid:temp".to_string(),
                    keys: vec!["ns:cid:2:id".to_string(), "ns:cid:4:id".to_string()],
                },
                Command::ZRevRange {
                    key: "ns:cid:temp".to_string(),
                    start: 0,
                    stop: 9
                },
                Command::ZRemRangeByRank {
                    key: "ns:cid:temp".to_string(),
                    start: 0,
                    stop: 9
                },
            ]
        );
        assert_eq!(plan.result_index, 1);
    }

    #[test]
    fn test_text_all_intersects_and_any_unions() {
        let (keys, normalizer) = planner_fixture();
        let planner = QueryPlanner::new(&keys, &normalizer);

        let all = planner
            .plan(&SearchQuery::new().with_text("content", "apple orange"), 0, -1)
            .unwrap();
        assert!(matches!(all.commands[0], Command::ZInterStore { .. }));

        let any = planner
            .plan(
                &SearchQuery::new()
                    .with_text("content", "apple orange")
                    .with_match_mode(MatchMode::Any),
                0,
                -1,
            )
            .unwrap();
        assert_eq!(
            any.commands[0],
            Command::ZUnionStore {
                destination: "ns:content:temp".to_string(),
                keys: vec![
                    "ns:content:APL:id".to_string(),
                    "ns:content:ORNK:id".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_match_mode_does_not_affect_exact_lists() {
        let (keys, normalizer) = planner_fixture();
        let planner = QueryPlanner::new(&keys, &normalizer);

        let plan = planner
            .plan(&SearchQuery::new().with_any_of("cid", [2, 4]), 0, -1)
            .unwrap();
        assert!(matches!(plan.commands[0], Command::ZUnionStore { .. }));
    }

    #[test]
    fn test_fields_intersect_into_final_temp() {
        let (keys, normalizer) = planner_fixture();
        let planner = QueryPlanner::new(&keys, &normalizer);

        let query = SearchQuery::new()
            .with_any_of("cid", [2, 4])
            .with_text("content", "orange")
            .with_value("uid", 4);
        let plan = planner.plan(&query, 0, -1).unwrap();

        assert_eq!(plan.final_key, "ns:tempFinal");
        assert_eq!(
            plan.commands,
            vec![
                Command::ZUnionStore {
                    destination: "ns:cid:temp".to_string(),
                    keys: vec!["ns:cid:2:id".to_string(), "ns:cid:4:id".to_string()],
                },
                Command::ZInterStore {
                    destination: "ns:tempFinal".to_string(),
                    keys: vec![
                        "ns:cid:temp".to_string(),
                        "ns:content:ORNK:id".to_string(),
                        "ns:uid:4:id".to_string()
                    ],
                },
                Command::ZRevRange {
                    key: "ns:tempFinal".to_string(),
                    start: 0,
                    stop: -1
                },
                Command::ZRemRangeByRank {
                    key: "ns:cid:temp".to_string(),
                    start: 0,
                    stop: -1
                },
                Command::ZRemRangeByRank {
                    key: "ns:tempFinal".to_string(),
                    start: 0,
                    stop: -1
                },
            ]
        );
        assert_eq!(plan.result_index, 2);
    }

    #[test]
    fn test_direct_keys_never_trimmed() {
        let (keys, normalizer) = planner_fixture();
        let planner = QueryPlanner::new(&keys, &normalizer);

        let query = SearchQuery::new()
            .with_value("label", "temperature")
            .with_value("uid", 1);
        let plan = planner.plan(&query, 0, -1).unwrap();

        let trimmed: Vec<&Command> = plan
            .commands
            .iter()
            .filter(|c| matches!(c, Command::ZRemRangeByRank { .. }))
            .collect();
        assert_eq!(
            trimmed,
            vec![&Command::ZRemRangeByRank {
                key: "ns:tempFinal".to_string(),
                start: 0,
                stop: -1
            }]
        );
    }

    #[test]
    fn test_empty_query_has_no_plan() {
        let (keys, normalizer) = planner_fixture();
        let planner = QueryPlanner::new(&keys, &normalizer);

        assert!(planner.plan(&SearchQuery::new(), 0, -1).is_none());
        assert!(planner
            .plan(&SearchQuery::new().with_text("content", "the and of"), 0, -1)
            .is_none());
        assert!(planner
            .plan(&SearchQuery::new().with_any_of("cid", Vec::<i32>::new()), 0, -1)
            .is_none());
    }

    #[test]
    fn test_keyless_field_left_out() {
        let (keys, normalizer) = planner_fixture();
        let planner = QueryPlanner::new(&keys, &normalizer);

        let query = SearchQuery::new()
            .with_text("content", "the")
            .with_value("uid", 5);
        let plan = planner.plan(&query, 0, -1).unwrap();
        assert_eq!(plan.final_key, "ns:uid:5:id");
    }

    #[test]
    fn test_from_json() {
        let query = SearchQuery::from_json(
            &serde_json::json!({"content": "apple", "cid": [2, 4], "uid": 5, "name": "bob"}),
            "content",
        )
        .unwrap();

        assert_eq!(
            query.fields.get("content"),
            Some(&QueryTerm::Text("apple".to_string()))
        );
        assert_eq!(
            query.fields.get("cid"),
            Some(&QueryTerm::AnyOf(vec![Scalar::Number(2.0), Scalar::Number(4.0)]))
        );
        assert_eq!(
            query.fields.get("uid"),
            Some(&QueryTerm::Value(Scalar::Number(5.0)))
        );
        assert_eq!(
            query.fields.get("name"),
            Some(&QueryTerm::Value(Scalar::Text("bob".to_string())))
        );

        assert!(SearchQuery::from_json(&serde_json::json!([1, 2]), "content").is_err());
        assert!(SearchQuery::from_json(&serde_json::json!({"x": {"y": 1}}), "content").is_err());
    }
}
