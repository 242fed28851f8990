//! 统计服务：按 (平台, 实体类型, 标识符) 查缓存，未命中时回源、聚合并写回缓存。

pub mod aggregator;
pub mod models;

use std::sync::Arc;

use chrono::TimeDelta;
use serde_json::Value;

use crate::error::AppError;
use crate::features::cache::keys::{self, LookupKind};
use crate::features::cache::{CachedValue, StatsCache};
use crate::features::platform::client::PlatformClient;
use crate::features::platform::{self, EntityProfile, EntityType, Platform};

pub use models::{AggregateStats, DerivedStats, EntityBundle, ProjectStats, VersionEntry};

/// 标识符长度上限
const MAX_IDENTIFIER_LEN: usize = 64;

/// 带缓存来源信息的结果
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: T,
    pub from_cache: bool,
    /// 缓存命中时条目的年龄
    pub age: Option<TimeDelta>,
}

impl<T> Cached<T> {
    pub(crate) fn fresh(value: T) -> Self {
        Self {
            value,
            from_cache: false,
            age: None,
        }
    }

    /// 年龄（分钟，四舍五入）；未命中缓存时为 None
    pub fn age_minutes(&self) -> Option<i64> {
        self.age.map(|a| (a.num_seconds() + 30) / 60)
    }
}

/// 日志中的缓存来源描述
pub(crate) fn cache_note<T>(cached: &Cached<T>) -> String {
    let mut note = match cached.age_minutes() {
        Some(m) => format!("api: cached ({m}m ago)"),
        None => "api: N/A".to_string(),
    };
    if let Some(crawler) = crate::request_id::current_crawler() {
        note.push_str(&format!(", crawler: {crawler}"));
    }
    note
}

/// 标识符只允许 slug/ID 常见字符，且至少含一个字母或数字
///
/// 纯标点（如 `.`、`..`）拼进上游路径后会被 URL 规范化改写成别的端点。
pub fn validate_identifier(id: &str) -> Result<(), AppError> {
    let ok = id.len() <= MAX_IDENTIFIER_LEN
        && id.bytes().any(|b| b.is_ascii_alphanumeric())
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.');
    if ok {
        Ok(())
    } else {
        Err(AppError::Validation(format!("非法的标识符: {id:?}")))
    }
}

/// 统计服务（克隆后共享同一缓存与上游客户端）
#[derive(Clone)]
pub struct StatsService {
    cache: StatsCache,
    client: Arc<dyn PlatformClient>,
}

impl StatsService {
    pub fn new(cache: StatsCache, client: Arc<dyn PlatformClient>) -> Self {
        Self { cache, client }
    }

    pub fn cache(&self) -> &StatsCache {
        &self.cache
    }

    /// 平台支持的实体组合视图；不支持时为参数错误
    pub fn profile(&self, platform: Platform, entity: EntityType) -> Result<EntityProfile, AppError> {
        platform::profile(platform, entity)
            .ok_or_else(|| AppError::Validation(format!("{platform} 不支持实体类型 {entity}")))
    }

    /// 读取实体统计（缓存优先）
    pub async fn load(
        &self,
        platform: Platform,
        entity: EntityType,
        id: &str,
    ) -> Result<Cached<Arc<EntityBundle>>, AppError> {
        let profile = self.profile(platform, entity)?;
        validate_identifier(id)?;

        let key = keys::stats_key(platform, entity, id);
        if let Some(entry) = self.cache.get_with_meta(&key).await {
            let age = entry.age(self.cache.now());
            if let CachedValue::Bundle(bundle) = entry.value {
                return Ok(Cached {
                    value: bundle,
                    from_cache: true,
                    age: Some(age),
                });
            }
        }

        let upstream_id = self.resolve_upstream_id(&profile, id).await?;
        let t0 = std::time::Instant::now();
        let bundle = Arc::new(self.fetch_bundle(&profile, &upstream_id).await?);
        tracing::debug!(
            platform = %platform,
            entity = %entity,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "回源完成: {id}"
        );

        self.cache.set(key, CachedValue::Bundle(bundle.clone())).await;
        Ok(Cached::fresh(bundle))
    }

    /// 把请求标识符解析为上游可用的 ID
    ///
    /// - 平台不要求数字 ID：原样使用；
    /// - 要求数字 ID 且输入为数字：原样使用；
    /// - 支持 slug 反查：查缓存或上游，并同时写入反向映射；
    /// - 其它情况为参数错误。
    pub async fn resolve_upstream_id(
        &self,
        profile: &EntityProfile,
        id: &str,
    ) -> Result<String, AppError> {
        let descriptor = profile.descriptor;
        let resolved = profile.resolved();
        if !descriptor.requires_numeric_id(resolved) || id.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(id.to_string());
        }
        if !descriptor.supports_slug_lookup(resolved) {
            return Err(AppError::Validation(format!(
                "Invalid {} {} id: must be a number",
                descriptor.platform, profile.entity
            )));
        }

        let platform = descriptor.platform;
        let key = keys::lookup_key(platform, LookupKind::Slug, id);
        if let Some(CachedValue::Lookup(found)) = self.cache.get(&key).await {
            return Ok(found);
        }

        let found = self
            .client
            .lookup_slug(platform, resolved, id)
            .await?
            .ok_or_else(|| AppError::NotFound(profile.error_message().to_string()))?;
        tracing::info!("{} slug 解析: \"{id}\" → {found}", descriptor.name);

        self.cache
            .set(key, CachedValue::Lookup(found.clone()))
            .await;
        self.cache
            .set(
                keys::lookup_key(platform, LookupKind::IdToSlug, &found),
                CachedValue::Lookup(id.to_string()),
            )
            .await;
        Ok(found)
    }

    /// 通过反向映射查找数字 ID 对应的 slug（仅在曾经解析过时存在）
    pub async fn known_slug(&self, platform: Platform, upstream_id: &str) -> Option<String> {
        match self
            .cache
            .get(&keys::lookup_key(platform, LookupKind::IdToSlug, upstream_id))
            .await
        {
            Some(CachedValue::Lookup(slug)) => Some(slug),
            _ => None,
        }
    }

    /// 读取主记录；不存在时给出平台对应的未找到提示
    pub async fn fetch_primary(
        &self,
        profile: &EntityProfile,
        upstream_id: &str,
    ) -> Result<Value, AppError> {
        self.client
            .fetch_entity(profile.platform(), profile.resolved(), upstream_id)
            .await?
            .ok_or_else(|| AppError::NotFound(profile.error_message().to_string()))
    }

    async fn fetch_bundle(
        &self,
        profile: &EntityProfile,
        upstream_id: &str,
    ) -> Result<EntityBundle, AppError> {
        let platform = profile.platform();
        let fields = profile.fields();

        let (raw, children, versions, stats, activity) = if profile.resolved().is_aggregate() {
            let raw = self.fetch_primary(profile, upstream_id).await?;
            let children = self
                .client
                .fetch_children(platform, profile.resolved(), upstream_id, &raw)
                .await?;
            let stats = DerivedStats::Aggregate(aggregator::aggregate(&children, fields));
            let activity = aggregator::child_dates(&children, fields);
            (raw, children, Vec::new(), stats, activity)
        } else {
            let (raw, raw_versions) = futures_util::try_join!(
                self.fetch_primary(profile, upstream_id),
                self.client.fetch_versions(platform, upstream_id)
            )?;
            let versions =
                aggregator::normalize_versions(&raw_versions, &profile.descriptor.versions);
            let stats = DerivedStats::Project(aggregator::project_stats(&raw, fields, &versions));
            let activity = versions.iter().filter_map(|v| v.date_published).collect();
            (raw, Vec::new(), versions, stats, activity)
        };

        let title = aggregator::read_str(&raw, fields.title).unwrap_or_else(|| upstream_id.to_string());
        Ok(EntityBundle {
            platform,
            entity: profile.entity,
            upstream_id: upstream_id.to_string(),
            icon: profile.icon_for(&raw),
            title,
            raw,
            children,
            versions,
            stats,
            activity,
        })
    }
}
