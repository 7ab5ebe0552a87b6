use crate::error::{AppError, Result};
use crate::state::{Command, Reply, SortedSetStore};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Pipeline, Value};

/// Redis-backed sorted-set store.
///
/// Batches are sent as a `MULTI`/`EXEC` pipeline over a shared connection manager,
/// which handles reconnects.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Create a new Redis store
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| AppError::Store(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Store(format!("Failed to connect to Redis: {}", e)))?;

        // Test connection
        let mut test_conn = connection.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut test_conn)
            .await
            .map_err(|e| AppError::Store(format!("Redis connection test failed: {}", e)))?;

        tracing::info!("Initialized Redis store");

        Ok(Self { connection })
    }

    fn append_command(pipe: &mut Pipeline, command: &Command) {
        pipe.cmd(command.name());
        match command {
            Command::SAdd { key, member }
            | Command::SRem { key, member }
            | Command::ZRem { key, member } => {
                pipe.arg(key).arg(member);
            }
            Command::SMembers { key } | Command::SCard { key } | Command::Del { key } => {
                pipe.arg(key);
            }
            Command::ZAdd { key, score, member } => {
                pipe.arg(key).arg(*score).arg(member);
            }
            Command::ZRevRange { key, start, stop }
            | Command::ZRemRangeByRank { key, start, stop } => {
                pipe.arg(key).arg(*start).arg(*stop);
            }
            Command::ZUnionStore { destination, keys }
            | Command::ZInterStore { destination, keys } => {
                pipe.arg(destination).arg(keys.len()).arg(keys);
            }
        }
    }

    fn to_reply(command: &Command, value: Value) -> Result<Reply> {
        match value {
            Value::Int(n) => Ok(Reply::Integer(n)),
            Value::Nil => Ok(Reply::Members(Vec::new())),
            Value::Bulk(_) => redis::from_redis_value::<Vec<String>>(&value)
                .map(Reply::Members)
                .map_err(|e| {
                    AppError::Store(format!(
                        "Failed to decode {} reply: {}",
                        command.name(),
                        e
                    ))
                }),
            other => Err(AppError::Store(format!(
                "Unexpected {} reply: {:?}",
                command.name(),
                other
            ))),
        }
    }
}

#[async_trait]
impl SortedSetStore for RedisStore {
    async fn execute(&self, commands: Vec<Command>) -> Result<Vec<Reply>> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in &commands {
            Self::append_command(&mut pipe, command);
        }

        let mut conn = self.connection.clone();
        let values: Vec<Value> = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Store(format!("Failed to execute batch: {}", e)))?;

        if values.len() != commands.len() {
            return Err(AppError::Store(format!(
                "Batch returned {} replies for {} commands",
                values.len(),
                commands.len()
            )));
        }

        commands
            .iter()
            .zip(values)
            .map(|(command, value)| Self::to_reply(command, value))
            .collect()
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
