use crate::error::{AppError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A single store command. Each variant maps onto exactly one Redis command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SAdd { key: String, member: String },
    SRem { key: String, member: String },
    SMembers { key: String },
    SCard { key: String },
    Del { key: String },
    /// Adds `member` with `score`, overwriting the score of an existing member
    ZAdd { key: String, score: f64, member: String },
    ZRem { key: String, member: String },
    /// Members by rank, highest score first; negative ranks count from the end
    ZRevRange { key: String, start: isize, stop: isize },
    /// Removes members by ascending rank
    ZRemRangeByRank { key: String, start: isize, stop: isize },
    ZUnionStore { destination: String, keys: Vec<String> },
    ZInterStore { destination: String, keys: Vec<String> },
}

impl Command {
    /// Redis command name
    pub fn name(&self) -> &'static str {
        match self {
            Command::SAdd { .. } => "SADD",
            Command::SRem { .. } => "SREM",
            Command::SMembers { .. } => "SMEMBERS",
            Command::SCard { .. } => "SCARD",
            Command::Del { .. } => "DEL",
            Command::ZAdd { .. } => "ZADD",
            Command::ZRem { .. } => "ZREM",
            Command::ZRevRange { .. } => "ZREVRANGE",
            Command::ZRemRangeByRank { .. } => "ZREMRANGEBYRANK",
            Command::ZUnionStore { .. } => "ZUNIONSTORE",
            Command::ZInterStore { .. } => "ZINTERSTORE",
        }
    }

    /// Key mutated by this command, if any
    pub fn written_key(&self) -> Option<&str> {
        match self {
            Command::SAdd { key, .. }
            | Command::SRem { key, .. }
            | Command::Del { key }
            | Command::ZAdd { key, .. }
            | Command::ZRem { key, .. }
            | Command::ZRemRangeByRank { key, .. } => Some(key.as_str()),
            Command::ZUnionStore { destination, .. } | Command::ZInterStore { destination, .. } => {
                Some(destination.as_str())
            }
            Command::SMembers { .. } | Command::SCard { .. } | Command::ZRevRange { .. } => None,
        }
    }
}

/// Reply to a single command within a batch
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Integer(i64),
    Members(Vec<String>),
}

impl Reply {
    pub fn into_members(self) -> Result<Vec<String>> {
        match self {
            Reply::Members(members) => Ok(members),
            Reply::Integer(n) => Err(AppError::Store(format!(
                "Expected a member list reply, got integer {}",
                n
            ))),
        }
    }

    pub fn as_integer(&self) -> Result<i64> {
        match self {
            Reply::Integer(n) => Ok(*n),
            Reply::Members(_) => Err(AppError::Store(
                "Expected an integer reply, got a member list".to_string(),
            )),
        }
    }
}

/// Sorted-set / set key-value store.
///
/// `execute` must apply a batch atomically: no other batch observes or interleaves
/// with a partially applied batch, and a failing batch reports one error.
#[async_trait]
pub trait SortedSetStore: Send + Sync {
    /// Execute commands as one atomic batch, returning replies in command order
    async fn execute(&self, commands: Vec<Command>) -> Result<Vec<Reply>>;

    /// Backend name used in logs and metrics
    fn backend(&self) -> &'static str;

    /// Members of a set
    async fn members(&self, key: &str) -> Result<Vec<String>> {
        let replies = self
            .execute(vec![Command::SMembers {
                key: key.to_string(),
            }])
            .await?;
        single_reply(replies)?.into_members()
    }

    /// Cardinality of a set
    async fn cardinality(&self, key: &str) -> Result<u64> {
        let replies = self
            .execute(vec![Command::SCard {
                key: key.to_string(),
            }])
            .await?;
        let n = single_reply(replies)?.as_integer()?;
        Ok(n.max(0) as u64)
    }

    /// Delete a key of any type
    async fn delete(&self, key: &str) -> Result<()> {
        self.execute(vec![Command::Del {
            key: key.to_string(),
        }])
        .await?;
        Ok(())
    }
}

fn single_reply(replies: Vec<Reply>) -> Result<Reply> {
    replies
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Store("Store returned no reply".to_string()))
}

#[derive(Debug, Clone)]
enum Entry {
    Set(BTreeSet<String>),
    SortedSet(HashMap<String, f64>),
}

/// In-memory store with Redis semantics (for tests and development).
///
/// A batch runs under one lock. Keys touched by a failing batch are restored to
/// their state before the batch.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    data: Arc<Mutex<HashMap<String, Entry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys currently holding data, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Score of a sorted-set member
    pub fn score(&self, key: &str, member: &str) -> Option<f64> {
        match self.data.lock().get(key) {
            Some(Entry::SortedSet(scores)) => scores.get(member).copied(),
            _ => None,
        }
    }
}

#[async_trait]
impl SortedSetStore for InMemoryStore {
    async fn execute(&self, commands: Vec<Command>) -> Result<Vec<Reply>> {
        let mut data = self.data.lock();
        let mut journal: HashMap<String, Option<Entry>> = HashMap::new();
        let mut replies = Vec::with_capacity(commands.len());

        for command in &commands {
            if let Some(key) = command.written_key() {
                if !journal.contains_key(key) {
                    journal.insert(key.to_string(), data.get(key).cloned());
                }
            }

            match apply(&mut data, command) {
                Ok(reply) => replies.push(reply),
                Err(e) => {
                    for (key, previous) in journal {
                        match previous {
                            Some(entry) => {
                                data.insert(key, entry);
                            }
                            None => {
                                data.remove(&key);
                            }
                        }
                    }
                    tracing::debug!(command = command.name(), error = %e, "Batch rolled back");
                    return Err(e);
                }
            }
        }

        Ok(replies)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

fn wrong_type(key: &str) -> AppError {
    AppError::Store(format!(
        "WRONGTYPE Operation against key '{}' holding the wrong kind of value",
        key
    ))
}

fn set_mut<'a>(data: &'a mut HashMap<String, Entry>, key: &str) -> Result<&'a mut BTreeSet<String>> {
    match data
        .entry(key.to_string())
        .or_insert_with(|| Entry::Set(BTreeSet::new()))
    {
        Entry::Set(set) => Ok(set),
        Entry::SortedSet(_) => Err(wrong_type(key)),
    }
}

fn sorted_set_mut<'a>(
    data: &'a mut HashMap<String, Entry>,
    key: &str,
) -> Result<&'a mut HashMap<String, f64>> {
    match data
        .entry(key.to_string())
        .or_insert_with(|| Entry::SortedSet(HashMap::new()))
    {
        Entry::SortedSet(scores) => Ok(scores),
        Entry::Set(_) => Err(wrong_type(key)),
    }
}

fn remove_if_empty(data: &mut HashMap<String, Entry>, key: &str) {
    let empty = match data.get(key) {
        Some(Entry::Set(set)) => set.is_empty(),
        Some(Entry::SortedSet(scores)) => scores.is_empty(),
        None => false,
    };
    if empty {
        data.remove(key);
    }
}

/// Members of a sorted set ordered by ascending score, ties broken by member
fn ascending(scores: &HashMap<String, f64>) -> Vec<(String, f64)> {
    let mut entries: Vec<(String, f64)> = scores.iter().map(|(m, s)| (m.clone(), *s)).collect();
    entries.sort_by(|a, b| match a.1.total_cmp(&b.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });
    entries
}

/// Resolve a rank window the way Redis does; `None` when the window is empty
pub(crate) fn rank_window(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (start + len).max(0) } else { start };
    let mut stop = if stop < 0 { stop + len } else { stop };
    if start > stop || start >= len {
        return None;
    }
    if stop >= len {
        stop = len - 1;
    }
    Some((start as usize, stop as usize))
}

/// Source scores for an aggregate; plain sets contribute score 1
fn aggregate_sources(
    data: &HashMap<String, Entry>,
    keys: &[String],
) -> Result<Vec<HashMap<String, f64>>> {
    if keys.is_empty() {
        return Err(AppError::Store(
            "at least 1 input key is needed for aggregate store commands".to_string(),
        ));
    }
    keys.iter()
        .map(|key| match data.get(key) {
            Some(Entry::SortedSet(scores)) => Ok(scores.clone()),
            Some(Entry::Set(set)) => Ok(set.iter().map(|m| (m.clone(), 1.0)).collect()),
            None => Ok(HashMap::new()),
        })
        .collect()
}

fn store_aggregate(
    data: &mut HashMap<String, Entry>,
    destination: &str,
    result: HashMap<String, f64>,
) -> Reply {
    let len = result.len() as i64;
    if result.is_empty() {
        data.remove(destination);
    } else {
        data.insert(destination.to_string(), Entry::SortedSet(result));
    }
    Reply::Integer(len)
}

fn apply(data: &mut HashMap<String, Entry>, command: &Command) -> Result<Reply> {
    match command {
        Command::SAdd { key, member } => {
            let added = set_mut(data, key)?.insert(member.clone());
            Ok(Reply::Integer(added as i64))
        }
        Command::SRem { key, member } => {
            let removed = match data.get_mut(key) {
                Some(Entry::Set(set)) => set.remove(member),
                Some(Entry::SortedSet(_)) => return Err(wrong_type(key)),
                None => false,
            };
            remove_if_empty(data, key);
            Ok(Reply::Integer(removed as i64))
        }
        Command::SMembers { key } => match data.get(key) {
            Some(Entry::Set(set)) => Ok(Reply::Members(set.iter().cloned().collect())),
            Some(Entry::SortedSet(_)) => Err(wrong_type(key)),
            None => Ok(Reply::Members(Vec::new())),
        },
        Command::SCard { key } => match data.get(key) {
            Some(Entry::Set(set)) => Ok(Reply::Integer(set.len() as i64)),
            Some(Entry::SortedSet(_)) => Err(wrong_type(key)),
            None => Ok(Reply::Integer(0)),
        },
        Command::Del { key } => Ok(Reply::Integer(data.remove(key).is_some() as i64)),
        Command::ZAdd { key, score, member } => {
            if score.is_nan() {
                return Err(AppError::Store("ERR value is not a valid float".to_string()));
            }
            let previous = sorted_set_mut(data, key)?.insert(member.clone(), *score);
            Ok(Reply::Integer(previous.is_none() as i64))
        }
        Command::ZRem { key, member } => {
            let removed = match data.get_mut(key) {
                Some(Entry::SortedSet(scores)) => scores.remove(member).is_some(),
                Some(Entry::Set(_)) => return Err(wrong_type(key)),
                None => false,
            };
            remove_if_empty(data, key);
            Ok(Reply::Integer(removed as i64))
        }
        Command::ZRevRange { key, start, stop } => {
            let scores = match data.get(key) {
                Some(Entry::SortedSet(scores)) => scores,
                Some(Entry::Set(_)) => return Err(wrong_type(key)),
                None => return Ok(Reply::Members(Vec::new())),
            };
            let mut ordered = ascending(scores);
            ordered.reverse();
            let members = match rank_window(ordered.len(), *start, *stop) {
                Some((from, to)) => ordered[from..=to].iter().map(|(m, _)| m.clone()).collect(),
                None => Vec::new(),
            };
            Ok(Reply::Members(members))
        }
        Command::ZRemRangeByRank { key, start, stop } => {
            let removed = match data.get_mut(key) {
                Some(Entry::SortedSet(scores)) => {
                    let ordered = ascending(scores);
                    match rank_window(ordered.len(), *start, *stop) {
                        Some((from, to)) => {
                            for (member, _) in &ordered[from..=to] {
                                scores.remove(member);
                            }
                            (to - from + 1) as i64
                        }
                        None => 0,
                    }
                }
                Some(Entry::Set(_)) => return Err(wrong_type(key)),
                None => 0,
            };
            remove_if_empty(data, key);
            Ok(Reply::Integer(removed))
        }
        Command::ZUnionStore { destination, keys } => {
            let mut result: HashMap<String, f64> = HashMap::new();
            for source in aggregate_sources(data, keys)? {
                for (member, score) in source {
                    *result.entry(member).or_insert(0.0) += score;
                }
            }
            Ok(store_aggregate(data, destination, result))
        }
        Command::ZInterStore { destination, keys } => {
            let mut sources = aggregate_sources(data, keys)?.into_iter();
            let mut result = sources.next().unwrap_or_default();
            for source in sources {
                result = result
                    .into_iter()
                    .filter_map(|(member, score)| {
                        source.get(&member).map(|other| (member, score + other))
                    })
                    .collect();
            }
            Ok(store_aggregate(data, destination, result))
        }
    }
}
