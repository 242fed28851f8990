//! 进程内 TTL 缓存。
//!
//! - 新鲜度在读取时按注入的时钟惰性判断：`now - cached_at < ttl`；
//! - 过期条目读取时视为不存在，实际占用由 moka 的后台淘汰与容量上限回收；
//! - 不做同键请求合并：并发未命中会各自回源，后写入者覆盖先写入者。

mod clock;
pub mod keys;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use moka::future::Cache;

pub use clock::{Clock, ManualClock, SystemClock};

use crate::features::meta::MetaInfo;
use crate::features::stats::EntityBundle;

/// 缓存条目：写入后不再修改，刷新时整体覆盖
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub cached_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// 相对 `now` 的年龄；时钟回拨时按 0 计
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        (now - self.cached_at).max(TimeDelta::zero())
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now - self.cached_at < ttl
    }
}

/// 共享的 TTL 缓存服务（克隆后共享同一底层存储）
#[derive(Clone)]
pub struct TtlCache<V> {
    inner: Cache<String, CacheEntry<V>>,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration, max_entries: u64, clock: Arc<dyn Clock>) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self {
            inner,
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            clock,
        }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.get_with_meta(key).await.map(|entry| entry.value)
    }

    /// 返回值与写入时间；过期条目视为不存在（不会修改条目本身）
    pub async fn get_with_meta(&self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.inner.get(key).await?;
        if entry.is_fresh(self.clock.now(), self.ttl) {
            Some(entry)
        } else {
            None
        }
    }

    /// 写入并以当前时间打戳
    pub async fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let entry = CacheEntry {
            key: key.clone(),
            value,
            cached_at: self.clock.now(),
        };
        self.inner.insert(key, entry).await;
    }

    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    /// 当前条目数（近似值，含尚未被回收的过期条目）
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

/// 进程级缓存中存放的值
#[derive(Debug, Clone)]
pub enum CachedValue {
    /// 实体及其子记录/版本与派生统计
    Bundle(Arc<EntityBundle>),
    /// 名称与主页链接
    Meta(Arc<MetaInfo>),
    /// 次级标识符映射（slug ↔ ID）
    Lookup(String),
}

/// 应用使用的缓存实例类型
pub type StatsCache = TtlCache<CachedValue>;
