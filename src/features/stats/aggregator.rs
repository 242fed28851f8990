//! 统计聚合：字段名全部来自平台注册表的字段映射，这里不出现任何平台字段名。
//!
//! 缺失或类型不符的字段一律按 0 / 空处理，不视为错误。

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::models::{AggregateStats, ProjectStats, VersionEntry};
use crate::features::platform::{FieldMap, VersionFields};

/// 聚合实体展示的子项目数量上限
pub const TOP_PROJECTS: usize = 5;

/// 读取非负整数；浮点四舍五入，数字字符串也接受
pub fn read_u64(raw: &Value, pointer: &str) -> u64 {
    match raw.pointer(pointer) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f.round() as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

pub fn read_str(raw: &Value, pointer: &str) -> Option<String> {
    match raw.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 字符串列表：数组取字符串元素，对象取键名
pub fn read_strings(raw: &Value, pointer: &str) -> Vec<String> {
    match raw.pointer(pointer) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

pub fn read_date(raw: &Value, pointer: &str) -> Option<DateTime<Utc>> {
    let s = raw.pointer(pointer)?.as_str()?;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// 聚合子项目列表
///
/// - 总量为逐项求和，数量为列表长度；
/// - 前 5 按下载量全排序后截断（稳定排序，同值保持原顺序）；
/// - 最热门项目以首项为初值、严格大于才替换，空列表为 None。
pub fn aggregate(children: &[Value], fields: &FieldMap) -> AggregateStats {
    let downloads = |v: &Value| read_u64(v, fields.downloads);

    let mut total_downloads = 0u64;
    let mut total_followers = 0u64;
    for child in children {
        total_downloads = total_downloads.saturating_add(downloads(child));
        total_followers = total_followers.saturating_add(read_u64(child, fields.followers));
    }

    let most_popular = children
        .iter()
        .fold(None::<&Value>, |best, child| match best {
            Some(b) if downloads(child) > downloads(b) => Some(child),
            Some(b) => Some(b),
            None => Some(child),
        })
        .cloned();

    let mut ranked: Vec<&Value> = children.iter().collect();
    ranked.sort_by_key(|v| std::cmp::Reverse(downloads(v)));
    let top_projects = ranked.into_iter().take(TOP_PROJECTS).cloned().collect();

    AggregateStats {
        total_downloads,
        total_followers,
        project_count: children.len() as u64,
        most_popular,
        top_projects,
    }
}

/// 单项目统计：直接读取主记录字段
///
/// 版本数优先读字段（数组取长度、数字直接使用），缺省时使用版本列表长度。
pub fn project_stats(raw: &Value, fields: &FieldMap, versions: &[VersionEntry]) -> ProjectStats {
    let version_count = match fields.version_count.and_then(|p| raw.pointer(p)) {
        Some(Value::Array(items)) => items.len() as u64,
        Some(v @ Value::Number(_)) => v.as_u64().unwrap_or(0),
        _ => versions.len() as u64,
    };
    ProjectStats {
        downloads: read_u64(raw, fields.downloads),
        followers: read_u64(raw, fields.followers),
        version_count,
        rank: fields
            .rank
            .and_then(|p| raw.pointer(p))
            .and_then(Value::as_u64),
        views: fields.views.map(|p| read_u64(raw, p)),
    }
}

/// 统一版本记录并按发布时间降序排列（无日期的排在最后，同值保持原顺序）
pub fn normalize_versions(raw: &[Value], fields: &VersionFields) -> Vec<VersionEntry> {
    let mut versions: Vec<VersionEntry> = raw
        .iter()
        .map(|v| VersionEntry {
            version_number: read_str(v, fields.number).unwrap_or_else(|| "?".to_string()),
            date_published: read_date(v, fields.date),
            loaders: read_strings(v, fields.loaders),
            game_versions: read_strings(v, fields.game_versions),
            downloads: read_u64(v, fields.downloads),
        })
        .collect();
    versions.sort_by_key(|v| std::cmp::Reverse(v.date_published));
    versions
}

/// 子项目的日期（聚合实体活动曲线的数据源）
pub fn child_dates(children: &[Value], fields: &FieldMap) -> Vec<DateTime<Utc>> {
    let Some(pointer) = fields.child_date else {
        return Vec::new();
    };
    children
        .iter()
        .filter_map(|c| read_date(c, pointer))
        .collect()
}
