//! 缓存键格式。键是 (命名空间, 平台, 实体类型, 标识符) 的纯函数，格式变更会导致全部缓存失效。

use crate::features::platform::{EntityType, Platform};

/// 统计数据键；Modrinth 沿用不带平台段的历史格式
pub fn stats_key(platform: Platform, entity: EntityType, id: &str) -> String {
    match platform {
        Platform::Modrinth => format!("badge:{entity}:{id}"),
        other => format!("badge:{other}:{entity}:{id}"),
    }
}

/// 名称/链接元数据键
pub fn meta_key(platform: Platform, entity: EntityType, id: &str) -> String {
    format!("meta:{platform}:{entity}:{id}")
}

/// 次级标识符映射的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// slug → 数字 ID
    Slug,
    /// 数字 ID → slug（反向映射，用于生成主页链接）
    IdToSlug,
}

impl LookupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LookupKind::Slug => "slugLookup",
            LookupKind::IdToSlug => "idSlugLookup",
        }
    }
}

pub fn lookup_key(platform: Platform, kind: LookupKind, value: &str) -> String {
    format!("{platform}:{}:{value}", kind.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_formats_are_stable() {
        assert_eq!(
            stats_key(Platform::Modrinth, EntityType::User, "jellysquid"),
            "badge:user:jellysquid"
        );
        assert_eq!(
            stats_key(Platform::CurseForge, EntityType::Mod, "238222"),
            "badge:curseforge:mod:238222"
        );
        assert_eq!(
            meta_key(Platform::Hangar, EntityType::Project, "ViaVersion"),
            "meta:hangar:project:ViaVersion"
        );
        assert_eq!(
            lookup_key(Platform::CurseForge, LookupKind::Slug, "jei"),
            "curseforge:slugLookup:jei"
        );
    }

    #[test]
    fn distinct_tuples_never_collide() {
        let a = stats_key(Platform::Hangar, EntityType::User, "x");
        let b = stats_key(Platform::CurseForge, EntityType::User, "x");
        let c = stats_key(Platform::Modrinth, EntityType::User, "x");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
        assert_eq!(a, stats_key(Platform::Hangar, EntityType::User, "x"));
    }
}
