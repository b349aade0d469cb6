// ABOUTME: Redis list implementation of the job queue
// ABOUTME: RPUSH to enqueue, BLPOP with no timeout to dequeue

use async_trait::async_trait;
use kiln_core::Job;
use redis::aio::MultiplexedConnection;
use redis::Client;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::{JobQueue, Result};

/// Job queue stored in a Redis list
pub struct RedisJobQueue {
    client: Client,
    key: String,
    conn: OnceCell<MultiplexedConnection>,
}

impl RedisJobQueue {
    /// Create a queue for `redis://{host}:{port}/0` using the list `key`.
    ///
    /// No connection is made until the first command; that connection is
    /// then shared by every later command.
    pub fn new(host: &str, port: u16, key: &str) -> Result<Self> {
        let client = Client::open(format!("redis://{}:{}/0", host, port))?;
        Ok(Self {
            client,
            key: key.to_string(),
            conn: OnceCell::new(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    // Commands pipeline on one socket, so anything sent while BLPOP is
    // blocked waits behind it. The worker only issues LLEN between pops.
    async fn connection(&self) -> Result<MultiplexedConnection> {
        let conn = self
            .conn
            .get_or_try_init(|| self.client.get_multiplexed_async_connection())
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Redis connection OK");
        Ok(())
    }

    async fn enqueue(&self, job: &Job) -> Result<usize> {
        let payload = serde_json::to_string(job)?;
        let mut conn = self.connection().await?;

        let depth: usize = redis::cmd("RPUSH")
            .arg(&self.key)
            .arg(&payload)
            .query_async(&mut conn)
            .await?;

        info!(run_id = %job.run_id, depth, "Job enqueued");
        debug!("Job payload: {}", payload);
        Ok(depth)
    }

    async fn dequeue(&self) -> Result<Job> {
        let mut conn = self.connection().await?;

        // Timeout 0 blocks until an element arrives
        let (_, payload): (String, String) = redis::cmd("BLPOP")
            .arg(&self.key)
            .arg(0)
            .query_async(&mut conn)
            .await?;

        Ok(serde_json::from_str(&payload)?)
    }

    async fn len(&self) -> Result<usize> {
        let mut conn = self.connection().await?;
        let depth: usize = redis::cmd("LLEN")
            .arg(&self.key)
            .query_async(&mut conn)
            .await?;
        Ok(depth)
    }
}
