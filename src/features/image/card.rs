//! 统计卡片。
//!
//! 先计算布局（[`CardLayout`]：截断后的标题、统计格、列表行、活动曲线、页脚），
//! 再统一写出 SVG。区块顺序固定为 header → stats → divider → versions → footer。

use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::icons::{Glyph, place_icon};
use super::sparkline::ActivitySeries;
use super::svg::{escape_xml, format_date, format_number, relative_time, truncate_with_ellipsis};
use crate::error::AppError;
use crate::features::platform::{EntityProfile, StatKey};
use crate::features::stats::aggregator::{read_date, read_str, read_u64};
use crate::features::stats::{DerivedStats, EntityBundle};
use crate::features::theme::ThemeColors;

pub const CARD_WIDTH: u32 = 450;
/// 无列表时的高度，也是有列表时的基础高度
pub const BASE_HEIGHT: u32 = 130;
pub const ROW_HEIGHT: u32 = 50;
pub const TITLE_MAX_WIDTH: usize = 22;
const ROW_TITLE_MAX_WIDTH: usize = 30;

const STAT_COLUMNS: [f64; 3] = [15.0, 155.0, 270.0];
const RIGHT_EDGE: f64 = 435.0;
const LIST_TOP: u32 = 120;
const SPARKLINE: (f64, f64, f64, f64) = (330.0, 12.0, 105.0, 28.0);

/// 卡片渲染选项
#[derive(Debug, Clone)]
pub struct CardOptions {
    pub show_versions: bool,
    pub max_versions: usize,
    pub show_sparklines: bool,
    pub relative_time: bool,
    pub from_cache: bool,
    /// 缓存命中时条目的年龄（分钟）
    pub cache_age_minutes: Option<i64>,
}

impl Default for CardOptions {
    fn default() -> Self {
        Self {
            show_versions: true,
            max_versions: 5,
            show_sparklines: true,
            relative_time: false,
            from_cache: false,
            cache_age_minutes: None,
        }
    }
}

/// 列表中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRow {
    pub title: String,
    pub detail: String,
    pub downloads: String,
    pub date: String,
}

/// 计算完成、尚未转义的卡片布局
#[derive(Debug, Clone)]
pub struct CardLayout {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub platform_glyph: Glyph,
    pub entity_glyph: Glyph,
    pub stats: Vec<(&'static str, String)>,
    pub list_title: &'static str,
    pub rows: Vec<CardRow>,
    pub sparkline: Option<ActivitySeries>,
    pub footer_status: String,
    pub attribution: String,
    /// 平台 logo 固定使用品牌色时的颜色
    pub brand_color: Option<&'static str>,
}

/// 统计值的显示文本（排名带 `#`，大数用紧凑格式）
pub(crate) fn format_stat(key: StatKey, value: u64) -> String {
    match key {
        StatKey::Rank => format!("#{value}"),
        k if k.is_compact() => format_number(value),
        _ => value.to_string(),
    }
}

fn row_date(date: Option<DateTime<Utc>>, relative: bool, now: DateTime<Utc>) -> String {
    match date {
        Some(d) if relative => relative_time(d, now),
        Some(d) => format_date(d),
        None => String::new(),
    }
}

/// 游戏版本范围摘要：`1.20.1 – 1.21`
fn version_span(game_versions: &[String]) -> String {
    match game_versions {
        [] => String::new(),
        [only] => only.clone(),
        [first, .., last] => format!("{first} – {last}"),
    }
}

impl CardLayout {
    pub fn build(
        bundle: &EntityBundle,
        profile: &EntityProfile,
        options: &CardOptions,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let aggregate = profile.resolved().is_aggregate();
        match (&bundle.stats, aggregate) {
            (DerivedStats::Aggregate(_), true) | (DerivedStats::Project(_), false) => {}
            _ => {
                return Err(AppError::ImageRendererError(format!(
                    "派生统计与实体类型 {} 不匹配",
                    profile.entity
                )));
            }
        }

        let mut stats = Vec::with_capacity(STAT_COLUMNS.len());
        for field in profile.stat_fields().iter().take(STAT_COLUMNS.len()) {
            let value = match bundle.stats.value(field.key) {
                Some(v) => format_stat(field.key, v),
                // 排名只有部分项目提供
                None if field.key == StatKey::Rank => "N/A".to_string(),
                None => {
                    return Err(AppError::ImageRendererError(format!(
                        "缺少统计字段 {:?}",
                        field.key
                    )));
                }
            };
            stats.push((field.label, value));
        }

        let rows = if !options.show_versions {
            Vec::new()
        } else if let DerivedStats::Aggregate(agg) = &bundle.stats {
            agg.top_projects
                .iter()
                .take(options.max_versions)
                .map(|child| Self::child_row(child, profile, options, now))
                .collect()
        } else {
            bundle
                .versions
                .iter()
                .take(options.max_versions)
                .map(|v| CardRow {
                    title: truncate_with_ellipsis(&v.version_number, ROW_TITLE_MAX_WIDTH),
                    detail: [v.loaders.join(", "), version_span(&v.game_versions)]
                        .into_iter()
                        .filter(|s| !s.is_empty())
                        .collect::<Vec<_>>()
                        .join(" · "),
                    downloads: format_number(v.downloads),
                    date: row_date(v.date_published, options.relative_time, now),
                })
                .collect()
        };

        let height = if rows.is_empty() {
            BASE_HEIGHT
        } else {
            BASE_HEIGHT + ROW_HEIGHT * rows.len() as u32
        };

        let descriptor = profile.descriptor;
        let footer_status = match (options.from_cache, options.cache_age_minutes) {
            (true, Some(m)) => format!("cached {m}m ago"),
            (true, None) => "cached".to_string(),
            (false, _) => "live".to_string(),
        };

        Ok(Self {
            width: CARD_WIDTH,
            height,
            title: truncate_with_ellipsis(&bundle.title, TITLE_MAX_WIDTH),
            platform_glyph: descriptor.logo,
            entity_glyph: bundle.icon,
            stats,
            list_title: profile.list_title(),
            rows,
            // 活动曲线使用全部日期，不受列表截断影响
            sparkline: options
                .show_sparklines
                .then(|| ActivitySeries::from_dates(&bundle.activity)),
            footer_status,
            attribution: format!("{} · modcard", descriptor.name),
            brand_color: descriptor
                .logo_uses_brand_color
                .then_some(descriptor.default_color),
        })
    }

    fn child_row(
        child: &Value,
        profile: &EntityProfile,
        options: &CardOptions,
        now: DateTime<Utc>,
    ) -> CardRow {
        let fields = profile.fields();
        let title = read_str(child, fields.child_title).unwrap_or_else(|| "Unknown".to_string());
        let followers_label = profile
            .label_for(StatKey::TotalFollowers)
            .unwrap_or("Followers");
        CardRow {
            title: truncate_with_ellipsis(&title, ROW_TITLE_MAX_WIDTH),
            detail: format!(
                "{} {followers_label}",
                format_number(read_u64(child, fields.followers))
            ),
            downloads: format_number(read_u64(child, fields.downloads)),
            date: row_date(
                fields.child_date.and_then(|p| read_date(child, p)),
                options.relative_time,
                now,
            ),
        }
    }

    /// 写出 SVG；所有来自上游的文本在此转义
    pub fn render(&self, colors: &ThemeColors) -> Result<String, AppError> {
        let fmt_err = |e| AppError::ImageRendererError(format!("SVG formatting error: {e}"));
        let (w, h) = (self.width, self.height);
        let text = &colors.text_color;
        let muted = &colors.muted_text_color;
        let accent = &colors.accent_color;

        let mut svg = String::with_capacity(4096 + self.rows.len() * 512);
        writeln!(
            svg,
            r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg" font-family="Inter, sans-serif">"#
        )
        .map_err(fmt_err)?;
        writeln!(
            svg,
            r#"<rect x="0.5" y="0.5" width="{}" height="{}" rx="6" fill="{}" stroke="{}"/>"#,
            w - 1,
            h - 1,
            colors.background_color,
            colors.border_color
        )
        .map_err(fmt_err)?;

        // header
        writeln!(svg, r#"<g id="header">"#).map_err(fmt_err)?;
        let logo_color = self.brand_color.unwrap_or(accent.as_str());
        writeln!(svg, "{}", place_icon(self.platform_glyph, logo_color, 15.0, 15.0, 24.0, 24.0))
            .map_err(fmt_err)?;
        writeln!(svg, "{}", place_icon(Glyph::ChevronRight, text, 41.0, 15.0, 16.0, 24.0))
            .map_err(fmt_err)?;
        writeln!(svg, "{}", place_icon(self.entity_glyph, text, 58.0, 15.0, 24.0, 24.0))
            .map_err(fmt_err)?;
        writeln!(
            svg,
            r#"<text x="87" y="35" font-size="20" font-weight="bold" fill="{text}">{}</text>"#,
            escape_xml(&self.title)
        )
        .map_err(fmt_err)?;
        if let Some(series) = &self.sparkline {
            let (sx, sy, sw, sh) = SPARKLINE;
            writeln!(svg, "{}", series.render(sx, sy, sw, sh, accent)).map_err(fmt_err)?;
        }
        writeln!(svg, "</g>").map_err(fmt_err)?;

        // stats
        writeln!(svg, r#"<g id="stats">"#).map_err(fmt_err)?;
        for ((label, value), x) in self.stats.iter().zip(STAT_COLUMNS) {
            writeln!(
                svg,
                r#"<text x="{x}" y="62" font-size="12" fill="{muted}">{}</text>"#,
                escape_xml(label)
            )
            .map_err(fmt_err)?;
            writeln!(
                svg,
                r#"<text x="{x}" y="84" font-size="20" font-weight="bold" fill="{text}">{}</text>"#,
                escape_xml(value)
            )
            .map_err(fmt_err)?;
        }
        writeln!(svg, "</g>").map_err(fmt_err)?;

        if !self.rows.is_empty() {
            writeln!(
                svg,
                r#"<g id="divider"><line x1="15" y1="96" x2="{RIGHT_EDGE}" y2="96" stroke="{}" stroke-width="1"/></g>"#,
                colors.border_color
            )
            .map_err(fmt_err)?;

            writeln!(svg, r#"<g id="versions">"#).map_err(fmt_err)?;
            writeln!(
                svg,
                r#"<text x="15" y="114" font-size="12" font-weight="bold" fill="{muted}">{}</text>"#,
                escape_xml(self.list_title)
            )
            .map_err(fmt_err)?;
            for (i, row) in self.rows.iter().enumerate() {
                let top = (LIST_TOP + ROW_HEIGHT * i as u32) as f64;
                writeln!(
                    svg,
                    r#"<text x="15" y="{}" font-size="13" font-weight="bold" fill="{text}">{}</text>"#,
                    top + 18.0,
                    escape_xml(&row.title)
                )
                .map_err(fmt_err)?;
                writeln!(
                    svg,
                    r#"<text x="15" y="{}" font-size="11" fill="{muted}">{}</text>"#,
                    top + 34.0,
                    escape_xml(&row.detail)
                )
                .map_err(fmt_err)?;
                writeln!(
                    svg,
                    r#"<text x="{RIGHT_EDGE}" y="{}" font-size="12" font-weight="bold" text-anchor="end" fill="{accent}">{}</text>"#,
                    top + 18.0,
                    escape_xml(&row.downloads)
                )
                .map_err(fmt_err)?;
                writeln!(
                    svg,
                    r#"<text x="{RIGHT_EDGE}" y="{}" font-size="11" text-anchor="end" fill="{muted}">{}</text>"#,
                    top + 34.0,
                    escape_xml(&row.date)
                )
                .map_err(fmt_err)?;
            }
            writeln!(svg, "</g>").map_err(fmt_err)?;
        }

        // footer
        let baseline = h - 8;
        writeln!(svg, r#"<g id="footer" font-size="10" fill="{muted}">"#).map_err(fmt_err)?;
        writeln!(
            svg,
            r#"<text x="15" y="{baseline}">{}</text>"#,
            escape_xml(&self.footer_status)
        )
        .map_err(fmt_err)?;
        writeln!(
            svg,
            r#"<text x="{RIGHT_EDGE}" y="{baseline}" text-anchor="end">{}</text>"#,
            escape_xml(&self.attribution)
        )
        .map_err(fmt_err)?;
        writeln!(svg, "</g>").map_err(fmt_err)?;
        write!(svg, "</svg>").map_err(fmt_err)?;

        Ok(svg)
    }
}

/// 计算布局并生成卡片 SVG
pub fn render_card(
    bundle: &EntityBundle,
    profile: &EntityProfile,
    options: &CardOptions,
    colors: &ThemeColors,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    CardLayout::build(bundle, profile, options, now)?.render(colors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::platform::{EntityType, Platform, profile};
    use crate::features::stats::aggregator::aggregate;
    use crate::features::stats::{ProjectStats, VersionEntry};
    use crate::features::theme;
    use chrono::TimeDelta;
    use serde_json::json;

    fn project_bundle(title: &str, version_count: usize) -> (EntityBundle, EntityProfile) {
        let profile = profile(Platform::Modrinth, EntityType::Project).expect("profile");
        let start = Utc::now() - TimeDelta::days(500);
        let versions: Vec<VersionEntry> = (0..version_count)
            .rev()
            .map(|i| VersionEntry {
                version_number: format!("1.{i}.0"),
                date_published: Some(start + TimeDelta::days(i as i64 * 7)),
                loaders: vec!["fabric".into(), "quilt".into()],
                game_versions: vec!["1.20.1".into(), "1.21".into()],
                downloads: 1500,
            })
            .collect();
        let bundle = EntityBundle {
            platform: Platform::Modrinth,
            entity: EntityType::Project,
            upstream_id: "sodium".into(),
            title: title.into(),
            icon: Glyph::Box,
            raw: json!({}),
            children: Vec::new(),
            activity: versions.iter().filter_map(|v| v.date_published).collect(),
            versions,
            stats: DerivedStats::Project(ProjectStats {
                downloads: 1_234_567,
                followers: 890,
                version_count: version_count as u64,
                rank: None,
                views: None,
            }),
        };
        (bundle, profile)
    }

    fn colors() -> ThemeColors {
        theme::resolve("1bd96a", None).expect("theme")
    }

    #[test]
    fn displayed_rows_are_truncated_but_sparkline_uses_all_dates() {
        let (bundle, profile) = project_bundle("Sodium", 40);
        let options = CardOptions {
            max_versions: 3,
            ..CardOptions::default()
        };
        let layout = CardLayout::build(&bundle, &profile, &options, Utc::now()).expect("layout");
        assert_eq!(layout.rows.len(), 3);
        assert_eq!(layout.sparkline.as_ref().map(ActivitySeries::total), Some(40));
        assert_eq!(layout.height, BASE_HEIGHT + 3 * ROW_HEIGHT);
        assert_eq!(layout.rows[0].title, "1.39.0");
        assert_eq!(layout.rows[0].detail, "fabric, quilt · 1.20.1 – 1.21");
    }

    #[test]
    fn height_without_list_is_fixed() {
        let (bundle, profile) = project_bundle("Sodium", 10);
        let hidden = CardOptions {
            show_versions: false,
            ..CardOptions::default()
        };
        let layout = CardLayout::build(&bundle, &profile, &hidden, Utc::now()).expect("layout");
        assert_eq!(layout.height, BASE_HEIGHT);

        let (empty, profile) = project_bundle("Sodium", 0);
        let svg = render_card(&empty, &profile, &CardOptions::default(), &colors(), Utc::now())
            .expect("render");
        assert!(svg.contains(r#"height="130""#));
        assert!(!svg.contains(r#"id="divider""#));
        assert!(svg.contains(r#"<g id="sparkline">"#));
    }

    #[test]
    fn title_is_truncated_then_escaped() {
        let (bundle, profile) = project_bundle("<script>&\"' and a very long tail", 2);
        let svg = render_card(&bundle, &profile, &CardOptions::default(), &colors(), Utc::now())
            .expect("render");
        assert!(svg.contains("&lt;script&gt;&amp;&quot;&apos; and a ver…</text>"));
        assert!(!svg.contains("<script>"));
    }

    #[test]
    fn sections_keep_fixed_order() {
        let (bundle, profile) = project_bundle("Sodium", 4);
        let svg = render_card(&bundle, &profile, &CardOptions::default(), &colors(), Utc::now())
            .expect("render");
        let pos = |id: &str| svg.find(&format!(r#"id="{id}""#)).expect(id);
        assert!(pos("header") < pos("stats"));
        assert!(pos("stats") < pos("divider"));
        assert!(pos("divider") < pos("versions"));
        assert!(pos("versions") < pos("footer"));
        assert!(svg.contains(">1.2M</text>"));
        assert!(svg.contains(">Latest Versions</text>"));
    }

    #[test]
    fn aggregate_card_lists_top_projects_and_reports_cache_age() {
        let profile = profile(Platform::Modrinth, EntityType::User).expect("profile");
        let children = vec![
            json!({ "title": "Lithium", "downloads": 10, "followers": 3, "published": "2023-05-01T00:00:00Z" }),
            json!({ "title": "Sodium", "downloads": 30, "followers": 9, "published": "2022-01-01T00:00:00Z" }),
        ];
        let agg = aggregate(&children, profile.fields());
        let bundle = EntityBundle {
            platform: Platform::Modrinth,
            entity: EntityType::User,
            upstream_id: "jellysquid".into(),
            title: "jellysquid3".into(),
            icon: Glyph::User,
            raw: json!({}),
            children: children.clone(),
            versions: Vec::new(),
            stats: DerivedStats::Aggregate(agg),
            activity: Vec::new(),
        };
        let options = CardOptions {
            from_cache: true,
            cache_age_minutes: Some(5),
            ..CardOptions::default()
        };
        let layout = CardLayout::build(&bundle, &profile, &options, Utc::now()).expect("layout");
        assert_eq!(layout.list_title, "Top Projects");
        assert_eq!(layout.rows[0].title, "Sodium");
        assert_eq!(layout.rows[0].date, "2022-01-01");
        assert_eq!(layout.footer_status, "cached 5m ago");
        assert!(layout.sparkline.as_ref().is_some_and(ActivitySeries::is_flat));
        let labels: Vec<_> = layout.stats.iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, ["Downloads", "Followers", "Projects"]);
    }

    #[test]
    fn mismatched_stats_fail_before_markup() {
        let (bundle, _) = project_bundle("Sodium", 1);
        let user = profile(Platform::Modrinth, EntityType::User).expect("profile");
        let err = CardLayout::build(&bundle, &user, &CardOptions::default(), Utc::now())
            .expect_err("project stats on a user card");
        assert!(matches!(err, AppError::ImageRendererError(_)));
    }

    #[test]
    fn curseforge_logo_keeps_brand_color_and_missing_rank_shows_na() {
        let profile = profile(Platform::CurseForge, EntityType::Mod).expect("profile");
        let (mut bundle, _) = project_bundle("JEI", 1);
        bundle.platform = Platform::CurseForge;
        let colors = theme::resolve("123456", None).expect("theme");
        let svg = render_card(&bundle, &profile, &CardOptions::default(), &colors, Utc::now())
            .expect("render");
        assert!(svg.contains(r##"fill="#F16436""##));
        assert!(svg.contains(">N/A</text>"));
        assert!(svg.contains(">Latest Files</text>"));
    }
}
