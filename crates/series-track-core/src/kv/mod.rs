//! Thin abstraction over the key-value store.
//!
//! The trait mirrors the handful of Redis primitives the store is built on:
//! hash fields, sorted sets with score ranges, atomic hash increments, and an
//! all-or-nothing batched apply (MULTI/EXEC). The production implementation
//! is [`RedisKv`]; tests run against an in-memory double.

mod redis_kv;

pub use redis_kv::RedisKv;

use crate::error::Result;
use async_trait::async_trait;

/// One end of a sorted-set score range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    NegInf,
    PosInf,
    Incl(f64),
    Excl(f64),
}

impl ScoreBound {
    /// Redis range-argument form (`-inf`, `+inf`, `42`, `(42`).
    pub fn to_arg(self) -> String {
        match self {
            ScoreBound::NegInf => "-inf".to_string(),
            ScoreBound::PosInf => "+inf".to_string(),
            ScoreBound::Incl(v) => format!("{v}"),
            ScoreBound::Excl(v) => format!("({v}"),
        }
    }

    pub(crate) fn admits_lower(self, score: f64) -> bool {
        match self {
            ScoreBound::NegInf => true,
            ScoreBound::PosInf => false,
            ScoreBound::Incl(v) => score >= v,
            ScoreBound::Excl(v) => score > v,
        }
    }

    pub(crate) fn admits_upper(self, score: f64) -> bool {
        match self {
            ScoreBound::NegInf => false,
            ScoreBound::PosInf => true,
            ScoreBound::Incl(v) => score <= v,
            ScoreBound::Excl(v) => score < v,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum BatchOp {
    Del(Vec<String>),
    HSet { key: String, field: String, value: String },
    HDel { key: String, field: String },
    ZAdd { key: String, score: f64, member: String },
}

/// A queue of writes applied in order as one atomic unit. Readers observe
/// either none of the batch or all of it.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub(crate) ops: Vec<BatchOp>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn del(&mut self, keys: Vec<String>) -> &mut Self {
        self.ops.push(BatchOp::Del(keys));
        self
    }

    pub fn hset(&mut self, key: &str, field: &str, value: &str) -> &mut Self {
        self.ops.push(BatchOp::HSet {
            key: key.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn hdel(&mut self, key: &str, field: &str) -> &mut Self {
        self.ops.push(BatchOp::HDel { key: key.to_string(), field: field.to_string() });
        self
    }

    pub fn zadd(&mut self, key: &str, score: f64, member: &str) -> &mut Self {
        self.ops.push(BatchOp::ZAdd {
            key: key.to_string(),
            score,
            member: member.to_string(),
        });
        self
    }
}

#[async_trait]
pub trait Kv: Send + Sync {
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>>;
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()>;
    /// Returns true when the field existed.
    async fn hdel(&self, key: &str, field: &str) -> Result<bool>;
    async fn hkeys(&self, key: &str) -> Result<Vec<String>>;
    /// Atomic increment; creating the field at `delta` when absent.
    async fn hincrby(&self, key: &str, field: &str, delta: i64) -> Result<i64>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Returns true when the member was newly added (as opposed to rescored).
    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool>;
    /// Returns true when the member existed.
    async fn zrem(&self, key: &str, member: &str) -> Result<bool>;
    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>>;
    /// Scores for several members in one round trip, position-aligned.
    async fn zscores(&self, key: &str, members: &[String]) -> Result<Vec<Option<f64>>>;
    /// Lowest score in the set, if any.
    async fn zmin_score(&self, key: &str) -> Result<Option<f64>>;
    async fn zcount(&self, key: &str, min: ScoreBound, max: ScoreBound) -> Result<u64>;
    /// Members ordered by ascending score, optionally truncated.
    async fn zrange_by_score(
        &self,
        key: &str,
        min: ScoreBound,
        max: ScoreBound,
        limit: Option<usize>,
    ) -> Result<Vec<String>>;

    /// Apply a write batch atomically, in order.
    async fn apply(&self, batch: Batch) -> Result<()>;
}
