use super::{Batch, BatchOp, Kv, ScoreBound};
use crate::error::Result;
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use tracing::info;

/// Redis-backed [`Kv`]. `ConnectionManager` multiplexes and reconnects under
/// the hood, so cloning the handle per call is the intended usage.
#[derive(Clone)]
pub struct RedisKv {
    conn: ConnectionManager,
}

impl RedisKv {
    pub async fn connect(url: &str) -> Result<Self> {
        info!(url, "connecting to redis");
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Kv for RedisKv {
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.hget(key, field).await?)
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(key, field, value).await?;
        Ok(())
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.hdel(key, field).await?;
        Ok(removed > 0)
    }

    async fn hkeys(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.hkeys(key).await?)
    }

    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> Result<i64> {
        let mut conn = self.conn.clone();
        Ok(conn.hincr(key, field, delta).await?)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(key).await?)
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let added: i64 = conn.zadd(key, member, score).await?;
        Ok(added > 0)
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.zrem(key, member).await?;
        Ok(removed > 0)
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        let mut conn = self.conn.clone();
        Ok(conn.zscore(key, member).await?)
    }

    async fn zscores(&self, key: &str, members: &[String]) -> Result<Vec<Option<f64>>> {
        if members.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        for member in members {
            pipe.zscore(key, member);
        }
        Ok(pipe.query_async(&mut conn).await?)
    }

    async fn zmin_score(&self, key: &str) -> Result<Option<f64>> {
        let mut conn = self.conn.clone();
        let first: Vec<(String, f64)> = conn.zrange_withscores(key, 0, 0).await?;
        Ok(first.into_iter().next().map(|(_, score)| score))
    }

    async fn zcount(&self, key: &str, min: ScoreBound, max: ScoreBound) -> Result<u64> {
        let mut conn = self.conn.clone();
        Ok(conn.zcount(key, min.to_arg(), max.to_arg()).await?)
    }

    async fn zrange_by_score(
        &self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
        limit: Option<usize>,
    ) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let members = match limit {
            Some(count) => {
                conn.zrangebyscore_limit(key, min.to_arg(), max.to_arg(), 0, count as isize)
                    .await?
            }
            None => conn.zrangebyscore(key, min.to_arg(), max.to_arg()).await?,
        };
        Ok(members)
    }

    async fn apply(&self, batch: Batch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();

        for op in &batch.ops {
            match op {
                BatchOp::Del(keys) => {
                    pipe.del(&keys[..]).ignore();
                }
                BatchOp::HSet { key, field, value } => {
                    pipe.hset(key, field, value).ignore();
                }
                BatchOp::HDel { key, field } => {
                    pipe.hdel(key, field).ignore();
                }
                BatchOp::ZAdd { key, score, member } => {
                    pipe.zadd(key, member, *score).ignore();
                }
            }
        }

        pipe.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }
}
