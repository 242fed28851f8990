//! 平台注册表：按平台标识查询展示名称、统计字段映射、图标与术语。
//!
//! 所有差异都写在静态表里（`registry.rs`），新增平台只需要追加一条描述，
//! 不需要改动任何调用点。

pub mod client;
mod registry;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::features::image::icons::Glyph;

pub use registry::DESCRIPTORS;

/// 通用的未找到提示（平台或映射缺失时使用）
pub const GENERIC_NOT_FOUND: &str = "Resource not found";

/// 支持的模组托管平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Modrinth,
    #[serde(rename = "curseforge")]
    CurseForge,
    Hangar,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Modrinth, Platform::CurseForge, Platform::Hangar];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Modrinth => "modrinth",
            Platform::CurseForge => "curseforge",
            Platform::Hangar => "hangar",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(id))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| AppError::Validation(format!("不支持的平台: {s}")))
    }
}

/// 被汇总的记录类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Project,
    User,
    Organization,
    Collection,
    Mod,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        EntityType::Project,
        EntityType::User,
        EntityType::Organization,
        EntityType::Collection,
        EntityType::Mod,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Project => "project",
            EntityType::User => "user",
            EntityType::Organization => "organization",
            EntityType::Collection => "collection",
            EntityType::Mod => "mod",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s))
    }

    /// 聚合实体：统计值来自其子项目列表
    pub fn is_aggregate(self) -> bool {
        matches!(
            self,
            EntityType::User | EntityType::Organization | EntityType::Collection
        )
    }

    /// 卡片头部的实体类型图标（项目类由平台分类表决定）
    pub fn glyph(self) -> Glyph {
        match self {
            EntityType::Project | EntityType::Mod => Glyph::Box,
            EntityType::User => Glyph::User,
            EntityType::Organization => Glyph::Building,
            EntityType::Collection => Glyph::Collection,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| AppError::Validation(format!("不支持的实体类型: {s}")))
    }
}

/// 派生统计中的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatKey {
    Downloads,
    Followers,
    VersionCount,
    Rank,
    Views,
    TotalDownloads,
    TotalFollowers,
    ProjectCount,
}

impl StatKey {
    /// 是否使用 1.2K / 3.4M 紧凑格式显示
    pub fn is_compact(self) -> bool {
        matches!(
            self,
            StatKey::Downloads
                | StatKey::Followers
                | StatKey::Views
                | StatKey::TotalDownloads
                | StatKey::TotalFollowers
        )
    }
}

/// 一个统计项：显示标签 + 派生字段 + 徽章路由中的短名
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatField {
    pub label: &'static str,
    pub key: StatKey,
    pub slug: &'static str,
}

/// 原始 JSON 上的字段位置（JSON Pointer）
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    /// 主记录显示名
    pub title: &'static str,
    /// 下载量：单实体读主记录，聚合实体读每个子记录
    pub downloads: &'static str,
    /// 关注/收藏量，读取规则同 `downloads`
    pub followers: &'static str,
    /// 平台排名（仅部分平台提供）
    pub rank: Option<&'static str>,
    /// 浏览量（仅 Hangar 项目提供）
    pub views: Option<&'static str>,
    /// 版本数：数组取长度、数字直接使用；缺省时使用版本列表长度
    pub version_count: Option<&'static str>,
    /// 子记录显示名（聚合实体）
    pub child_title: &'static str,
    /// 子记录日期（聚合实体的活动曲线数据源）
    pub child_date: Option<&'static str>,
    /// 主页链接
    pub url: Option<UrlSource>,
}

/// 主页链接来源
#[derive(Debug, Clone, Copy)]
pub enum UrlSource {
    /// 模板，`{id}` 替换为请求标识符
    Template(&'static str),
    /// 直接读取主记录上的字段
    Pointer(&'static str),
    /// 模板中的 `{}` 替换为主记录字段，`{id}` 替换为请求标识符；字段缺失时没有链接
    Format {
        template: &'static str,
        pointer: &'static str,
    },
}

impl UrlSource {
    pub fn resolve(&self, raw: &Value, id: &str) -> Option<String> {
        let field = |p: &str| {
            raw.pointer(p)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        match *self {
            UrlSource::Template(t) => Some(t.replace("{id}", id)),
            UrlSource::Pointer(p) => field(p),
            UrlSource::Format { template, pointer } => {
                field(pointer).map(|v| template.replace("{id}", id).replace("{}", &v))
            }
        }
    }
}

/// 版本/文件记录的字段位置
#[derive(Debug, Clone, Copy)]
pub struct VersionFields {
    pub number: &'static str,
    pub date: &'static str,
    pub loaders: &'static str,
    pub game_versions: &'static str,
    pub downloads: &'static str,
}

/// 单个实体类型的配置
#[derive(Debug)]
pub struct EntityConfig {
    pub entity: EntityType,
    pub stats: &'static [StatField],
    pub fields: FieldMap,
}

/// 实体类型别名：`from` 没有自己的配置时复用 `to` 的配置
#[derive(Debug, Clone, Copy)]
pub struct EntityAlias {
    pub from: EntityType,
    pub to: EntityType,
}

/// 分类 → 图标映射（各平台分类体系不同，因此按平台单独配置）
#[derive(Debug)]
pub struct Classification {
    pub field: &'static str,
    pub glyphs: &'static [(&'static str, Glyph)],
    pub fallback: Glyph,
}

/// 界面术语
#[derive(Debug, Clone, Copy)]
pub struct Terminology {
    /// 版本列表标题（"Latest Versions" / "Latest Files"）
    pub latest_versions: &'static str,
    /// 聚合实体的项目列表标题
    pub top_projects: &'static str,
}

/// 平台描述（进程生命周期内只读）
#[derive(Debug)]
pub struct PlatformDescriptor {
    pub platform: Platform,
    pub name: &'static str,
    pub default_color: &'static str,
    pub logo: Glyph,
    /// 平台 logo 始终使用品牌色，不跟随调用方传入的强调色
    pub logo_uses_brand_color: bool,
    pub entities: &'static [EntityConfig],
    pub aliases: &'static [EntityAlias],
    /// 未找到提示，与统计配置独立，可以单独覆盖别名实体
    pub errors: &'static [(EntityType, &'static str)],
    /// 要求纯数字 ID 的实体类型
    pub numeric_ids: &'static [EntityType],
    /// 支持 slug → ID 反查的实体类型
    pub slug_lookup: &'static [EntityType],
    pub terminology: Terminology,
    pub versions: VersionFields,
    pub classification: Classification,
}

impl PlatformDescriptor {
    /// 按别名表解析实体配置
    pub fn entity_config(&self, entity: EntityType) -> Option<&'static EntityConfig> {
        let direct = |e: EntityType| self.entities.iter().find(|c| c.entity == e);
        direct(entity).or_else(|| {
            self.aliases
                .iter()
                .find(|a| a.from == entity)
                .and_then(|a| direct(a.to))
        })
    }

    /// 未找到提示：自身 → 别名目标 → 通用提示
    pub fn error_message(&self, entity: EntityType) -> &'static str {
        let direct = |e: EntityType| {
            self.errors
                .iter()
                .find(|(k, _)| *k == e)
                .map(|(_, msg)| *msg)
        };
        direct(entity)
            .or_else(|| {
                self.aliases
                    .iter()
                    .find(|a| a.from == entity)
                    .and_then(|a| direct(a.to))
            })
            .unwrap_or(GENERIC_NOT_FOUND)
    }

    pub fn requires_numeric_id(&self, entity: EntityType) -> bool {
        self.numeric_ids.contains(&entity)
    }

    pub fn supports_slug_lookup(&self, entity: EntityType) -> bool {
        self.slug_lookup.contains(&entity)
    }

    /// 按分类字段选择项目图标，未识别时回退到平台的通用图标
    pub fn classify(&self, raw: &Value) -> Glyph {
        let key = match raw.pointer(self.classification.field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return self.classification.fallback,
        };
        self.classification
            .glyphs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, g)| *g)
            .unwrap_or(self.classification.fallback)
    }
}

/// (平台, 实体类型) 的组合视图：标签、字段、图标与错误提示都从这里取
#[derive(Debug, Clone, Copy)]
pub struct EntityProfile {
    pub descriptor: &'static PlatformDescriptor,
    /// 调用方请求的实体类型
    pub entity: EntityType,
    /// 别名解析后的配置
    pub config: &'static EntityConfig,
}

impl EntityProfile {
    pub fn platform(&self) -> Platform {
        self.descriptor.platform
    }

    /// 实际向上游请求的实体类型（别名解析后）
    pub fn resolved(&self) -> EntityType {
        self.config.entity
    }

    pub fn stat_fields(&self) -> &'static [StatField] {
        self.config.stats
    }

    /// 按短名查找统计项（徽章路由使用）
    pub fn stat_by_slug(&self, slug: &str) -> Option<&'static StatField> {
        self.config
            .stats
            .iter()
            .find(|f| f.slug.eq_ignore_ascii_case(slug))
    }

    /// 某个派生字段在该平台上的显示标签
    pub fn label_for(&self, key: StatKey) -> Option<&'static str> {
        self.config
            .stats
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.label)
    }

    pub fn fields(&self) -> &'static FieldMap {
        &self.config.fields
    }

    /// 卡片头部图标：项目类按平台分类，其它按实体类型
    pub fn icon_for(&self, raw: &Value) -> Glyph {
        if self.resolved().is_aggregate() {
            self.resolved().glyph()
        } else {
            self.descriptor.classify(raw)
        }
    }

    pub fn error_message(&self) -> &'static str {
        self.descriptor.error_message(self.entity)
    }

    /// 实体主页链接
    pub fn homepage(&self, raw: &Value, id: &str) -> Option<String> {
        self.config.fields.url.and_then(|u| u.resolve(raw, id))
    }

    /// 列表区标题
    pub fn list_title(&self) -> &'static str {
        if self.resolved().is_aggregate() {
            self.descriptor.terminology.top_projects
        } else {
            self.descriptor.terminology.latest_versions
        }
    }
}

/// 按平台取描述
pub fn descriptor(platform: Platform) -> &'static PlatformDescriptor {
    // DESCRIPTORS 与 Platform 变体顺序一致
    let idx = match platform {
        Platform::Modrinth => 0,
        Platform::CurseForge => 1,
        Platform::Hangar => 2,
    };
    &DESCRIPTORS[idx]
}

/// 按平台标识字符串解析描述
pub fn resolve(platform_id: &str) -> Option<&'static PlatformDescriptor> {
    Platform::parse(platform_id).map(descriptor)
}

/// 统计字段映射；平台或实体不存在时返回 None
pub fn stat_fields_for(platform_id: &str, entity: EntityType) -> Option<&'static [StatField]> {
    resolve(platform_id)
        .and_then(|d| d.entity_config(entity))
        .map(|c| c.stats)
}

/// 未找到提示；平台未知时回退到通用提示
pub fn error_message_for(platform_id: &str, entity: EntityType) -> &'static str {
    resolve(platform_id)
        .map(|d| d.error_message(entity))
        .unwrap_or(GENERIC_NOT_FOUND)
}

/// 组合视图；平台不支持该实体类型时返回 None
pub fn profile(platform: Platform, entity: EntityType) -> Option<EntityProfile> {
    let descriptor = descriptor(platform);
    descriptor.entity_config(entity).map(|config| EntityProfile {
        descriptor,
        entity,
        config,
    })
}
