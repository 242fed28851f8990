use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::features::image::icons::Glyph;
use crate::features::platform::{EntityType, Platform, StatKey};

/// 跨平台统一的版本/文件记录
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub version_number: String,
    pub date_published: Option<DateTime<Utc>>,
    pub loaders: Vec<String>,
    pub game_versions: Vec<String>,
    pub downloads: u64,
}

/// 单项目统计（直接读取主记录）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub downloads: u64,
    pub followers: u64,
    pub version_count: u64,
    pub rank: Option<u64>,
    pub views: Option<u64>,
}

/// 聚合实体统计（来自子项目列表）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_downloads: u64,
    pub total_followers: u64,
    pub project_count: u64,
    pub most_popular: Option<Value>,
    /// 按下载量降序的前 5 个子项目（同值保持原顺序）
    pub top_projects: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DerivedStats {
    Project(ProjectStats),
    Aggregate(AggregateStats),
}

impl DerivedStats {
    /// 按派生字段取值；该类统计没有此字段时返回 None
    pub fn value(&self, key: StatKey) -> Option<u64> {
        match (self, key) {
            (DerivedStats::Project(p), StatKey::Downloads) => Some(p.downloads),
            (DerivedStats::Project(p), StatKey::Followers) => Some(p.followers),
            (DerivedStats::Project(p), StatKey::VersionCount) => Some(p.version_count),
            (DerivedStats::Project(p), StatKey::Rank) => p.rank,
            (DerivedStats::Project(p), StatKey::Views) => p.views,
            (DerivedStats::Aggregate(a), StatKey::TotalDownloads) => Some(a.total_downloads),
            (DerivedStats::Aggregate(a), StatKey::TotalFollowers) => Some(a.total_followers),
            (DerivedStats::Aggregate(a), StatKey::ProjectCount) => Some(a.project_count),
            _ => None,
        }
    }
}

/// 一次回源的完整结果（缓存值，写入后只读）
#[derive(Debug, Clone)]
pub struct EntityBundle {
    pub platform: Platform,
    /// 调用方请求的实体类型
    pub entity: EntityType,
    /// 实际请求上游使用的标识符（slug 已解析为 ID）
    pub upstream_id: String,
    pub title: String,
    pub icon: Glyph,
    pub raw: Value,
    /// 聚合实体的全部子项目
    pub children: Vec<Value>,
    /// 项目的全部版本，按发布时间降序
    pub versions: Vec<VersionEntry>,
    pub stats: DerivedStats,
    /// 活动曲线的数据源：全部版本日期（项目）或全部子项目日期（聚合实体），不截断
    pub activity: Vec<DateTime<Utc>>,
}
