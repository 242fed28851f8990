//! 实体名称与主页链接查询。

pub mod handler;

use std::sync::Arc;

use serde::Serialize;

use crate::error::AppError;
use crate::features::cache::CachedValue;
use crate::features::cache::keys;
use crate::features::platform::{EntityType, Platform};
use crate::features::stats::aggregator::read_str;
use crate::features::stats::{Cached, StatsService, validate_identifier};

/// 名称与主页链接
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct MetaInfo {
    /// 显示名称
    #[schema(example = "Sodium")]
    pub name: String,
    /// 平台上的主页链接；无法确定时为空
    #[schema(example = "https://modrinth.com/project/sodium")]
    pub url: Option<String>,
}

/// 读取名称与链接（缓存优先，键为 `meta:<platform>:<entity>:<id>`）
///
/// 名称依次取主记录标题、曾解析过的 slug、请求标识符本身。
pub async fn load_meta(
    service: &StatsService,
    platform: Platform,
    entity: EntityType,
    id: &str,
) -> Result<Cached<Arc<MetaInfo>>, AppError> {
    let profile = service.profile(platform, entity)?;
    validate_identifier(id)?;

    let cache = service.cache();
    let key = keys::meta_key(platform, entity, id);
    if let Some(entry) = cache.get_with_meta(&key).await {
        let age = entry.age(cache.now());
        if let CachedValue::Meta(meta) = entry.value {
            return Ok(Cached {
                value: meta,
                from_cache: true,
                age: Some(age),
            });
        }
    }

    let upstream_id = service.resolve_upstream_id(&profile, id).await?;
    let raw = service.fetch_primary(&profile, &upstream_id).await?;
    let name = match read_str(&raw, profile.fields().title) {
        Some(name) => name,
        None => service
            .known_slug(platform, &upstream_id)
            .await
            .unwrap_or_else(|| id.to_string()),
    };
    let meta = Arc::new(MetaInfo {
        name,
        url: profile.homepage(&raw, id),
    });

    cache.set(key, CachedValue::Meta(meta.clone())).await;
    Ok(Cached::fresh(meta))
}
