//! 图标字形表。所有图标都以 24x24 的 viewBox 绘制，颜色在调用时传入。

use serde::Serialize;

/// 图标名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Glyph {
    Box,
    User,
    Building,
    Collection,
    Plug,
    Paintbrush,
    Earth,
    PackageOpen,
    Glasses,
    Datapack,
    Optifine,
    Canvas,
    ChevronRight,
    Modrinth,
    CurseForge,
    Hangar,
}

const GLYPH_NAMES: &[(Glyph, &str)] = &[
    (Glyph::Box, "box"),
    (Glyph::User, "user"),
    (Glyph::Building, "building"),
    (Glyph::Collection, "collection"),
    (Glyph::Plug, "plug"),
    (Glyph::Paintbrush, "paintbrush"),
    (Glyph::Earth, "earth"),
    (Glyph::PackageOpen, "package-open"),
    (Glyph::Glasses, "glasses"),
    (Glyph::Datapack, "datapack"),
    (Glyph::Optifine, "optifine"),
    (Glyph::Canvas, "canvas"),
    (Glyph::ChevronRight, "chevron-right"),
    (Glyph::Modrinth, "modrinth"),
    (Glyph::CurseForge, "curseforge"),
    (Glyph::Hangar, "hangar"),
];

impl Glyph {
    pub fn name(self) -> &'static str {
        GLYPH_NAMES
            .iter()
            .find(|(g, _)| *g == self)
            .map(|(_, n)| *n)
            .unwrap_or("box")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        GLYPH_NAMES.iter().find(|(_, n)| *n == name).map(|(g, _)| *g)
    }

    /// 描边类图标的路径数据；品牌图标为填充图形，单独处理
    fn stroke_paths(self) -> &'static str {
        match self {
            Glyph::Box => {
                r#"<path d="M21 8a2 2 0 0 0-1-1.73l-7-4a2 2 0 0 0-2 0l-7 4A2 2 0 0 0 3 8v8a2 2 0 0 0 1 1.73l7 4a2 2 0 0 0 2 0l7-4A2 2 0 0 0 21 16Z"/><path d="m3.3 7 8.7 5 8.7-5"/><path d="M12 22V12"/>"#
            }
            Glyph::User => r#"<circle cx="12" cy="8" r="5"/><path d="M20 21a8 8 0 0 0-16 0"/>"#,
            Glyph::Building => {
                r#"<rect x="4" y="2" width="16" height="20" rx="2"/><path d="M9 22v-4h6v4"/><path d="M8 6h.01M16 6h.01M12 6h.01M12 10h.01M12 14h.01M16 10h.01M16 14h.01M8 10h.01M8 14h.01"/>"#
            }
            Glyph::Collection => {
                r#"<path d="m12 2 10 5-10 5L2 7z"/><path d="m2 17 10 5 10-5"/><path d="m2 12 10 5 10-5"/>"#
            }
            Glyph::Plug => {
                r#"<path d="M12 22v-5"/><path d="M9 8V2"/><path d="M15 8V2"/><path d="M18 8v5a4 4 0 0 1-4 4h-4a4 4 0 0 1-4-4V8Z"/>"#
            }
            Glyph::Paintbrush => {
                r#"<path d="M18.37 2.63 14 7l-1.59-1.59a2 2 0 0 0-2.82 0L8 7l9 9 1.59-1.59a2 2 0 0 0 0-2.82L17 10l4.37-4.37a2.12 2.12 0 1 0-3-3Z"/><path d="M9 8c-2 3-4 3.5-7 4l8 10c2-1 6-5 6-7"/>"#
            }
            Glyph::Earth => {
                r#"<circle cx="12" cy="12" r="10"/><path d="M12 2a14.5 14.5 0 0 0 0 20 14.5 14.5 0 0 0 0-20"/><path d="M2 12h20"/>"#
            }
            Glyph::PackageOpen => {
                r#"<path d="M12 22v-9"/><path d="M15.17 2.21a1.67 1.67 0 0 1 1.63 0L21 4.57a1.93 1.93 0 0 1 0 3.36L8.82 14.79a1.66 1.66 0 0 1-1.64 0L3 12.43a1.93 1.93 0 0 1 0-3.36z"/><path d="M20 13v3.87a2.06 2.06 0 0 1-1.11 1.83l-6 3.08a1.93 1.93 0 0 1-1.78 0l-6-3.08A2.06 2.06 0 0 1 4 16.87V13"/>"#
            }
            Glyph::Glasses => {
                r#"<circle cx="6" cy="15" r="4"/><circle cx="18" cy="15" r="4"/><path d="M14 15a2 2 0 0 0-2-1 2 2 0 0 0-2 1"/><path d="M2.5 13 5 7c.7-1.3 1.4-2 3-2"/><path d="M21.5 13 19 7c-.7-1.3-1.5-2-3-2"/>"#
            }
            Glyph::Datapack => {
                r#"<path d="M8 3H7a2 2 0 0 0-2 2v5a2 2 0 0 1-2 2 2 2 0 0 1 2 2v5c0 1.1.9 2 2 2h1"/><path d="M16 21h1a2 2 0 0 0 2-2v-5c0-1.1.9-2 2-2a2 2 0 0 1-2-2V5a2 2 0 0 0-2-2h-1"/>"#
            }
            // 光照强化类渲染模组
            Glyph::Optifine => {
                r#"<circle cx="12" cy="12" r="4"/><path d="M12 2v2M12 20v2M4.93 4.93l1.41 1.41M17.66 17.66l1.41 1.41M2 12h2M20 12h2M6.34 17.66l-1.41 1.41M19.07 4.93l-1.41 1.41"/>"#
            }
            Glyph::Canvas => {
                r#"<rect x="3" y="3" width="18" height="18" rx="2"/><path d="m3 16 5-5 4 4 3-3 6 6"/><circle cx="15.5" cy="8.5" r="1.5"/>"#
            }
            Glyph::ChevronRight => r#"<path d="m9 18 6-6-6-6"/>"#,
            Glyph::Modrinth | Glyph::CurseForge | Glyph::Hangar => "",
        }
    }
}

/// 生成图标的 SVG 片段（不含外层 `<svg>`，由调用方决定位置与尺寸）
pub fn icon(glyph: Glyph, color: &str) -> String {
    match glyph {
        Glyph::Modrinth => format!(
            r#"<circle cx="12" cy="12" r="9.5" fill="none" stroke="{color}" stroke-width="2.5"/><path d="M7.5 15.5 12 6.5l4.5 9z" fill="{color}"/>"#
        ),
        Glyph::CurseForge => format!(
            r#"<path d="M2 7h6.5l.8 2.2h12.7c-.6 2.8-2.6 4.6-5.4 5.2l.9 2.6H7.6l.9-2.6C5.4 13.8 3.2 11 2 7z" fill="{color}"/><rect x="7" y="18" width="10" height="2" rx="1" fill="{color}"/>"#
        ),
        Glyph::Hangar => format!(
            r#"<path d="M3 20V10l9-6 9 6v10h-5v-6H8v6z" fill="{color}"/>"#
        ),
        other => format!(
            r#"<g fill="none" stroke="{color}" stroke-width="2" stroke-linecap="round" stroke-linejoin="round">{}</g>"#,
            other.stroke_paths()
        ),
    }
}

/// 把图标放在指定位置，尺寸按 24x24 的 viewBox 缩放
pub fn place_icon(glyph: Glyph, color: &str, x: f64, y: f64, width: f64, height: f64) -> String {
    format!(
        r#"<svg x="{x}" y="{y}" width="{width}" height="{height}" viewBox="0 0 24 24">{}</svg>"#,
        icon(glyph, color)
    )
}
