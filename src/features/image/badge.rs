//! 两段式徽章：左侧标签（中性底色）+ 右侧数值（强调色）。

use std::fmt::Write;

use super::svg::escape_xml;
use crate::error::AppError;
use crate::features::theme::ThemeColors;

pub const BADGE_HEIGHT: u32 = 20;
const LABEL_BACKGROUND: &str = "#8b949e";
const BADGE_TEXT: &str = "#ffffff";

/// 一次渲染的输入
#[derive(Debug, Clone)]
pub struct Badge<'a> {
    pub label: &'a str,
    pub value: &'a str,
}

impl Badge<'_> {
    pub fn label_width(&self) -> u32 {
        self.label.chars().count() as u32 * 7 + 20
    }

    pub fn value_width(&self) -> u32 {
        self.value.chars().count() as u32 * 8 + 20
    }

    pub fn width(&self) -> u32 {
        self.label_width() + self.value_width()
    }
}

/// 生成徽章 SVG；文本在嵌入前转义
pub fn render_badge(badge: &Badge<'_>, colors: &ThemeColors) -> Result<String, AppError> {
    let fmt_err = |e| AppError::ImageRendererError(format!("SVG formatting error: {e}"));

    let lw = badge.label_width();
    let vw = badge.value_width();
    let w = lw + vw;
    let h = BADGE_HEIGHT;
    let accent = &colors.accent_color;
    let background = &colors.background_color;
    let border = &colors.border_color;

    let mut svg = String::with_capacity(1024);
    writeln!(
        svg,
        r#"<svg width="{w}" height="{h}" xmlns="http://www.w3.org/2000/svg">"#
    )
    .map_err(fmt_err)?;
    writeln!(
        svg,
        r#"  <defs><clipPath id="badge_clip"><rect width="{w}" height="{h}" rx="4.5"/></clipPath></defs>"#
    )
    .map_err(fmt_err)?;
    writeln!(svg, r#"  <g clip-path="url(#badge_clip)">"#).map_err(fmt_err)?;
    writeln!(
        svg,
        r#"    <rect stroke="{border}" fill="{background}" rx="4.5" x="0.5" y="0.5" width="{}" height="{}" vector-effect="non-scaling-stroke"/>"#,
        w - 1,
        h - 1
    )
    .map_err(fmt_err)?;
    writeln!(
        svg,
        r#"    <path d="M 5 1H {lw}V {} H 5A 4 4 0 0 1 1 {} V 5A 4 4 0 0 1 5 1Z" fill="{LABEL_BACKGROUND}"/>"#,
        h - 1,
        h - 5
    )
    .map_err(fmt_err)?;
    writeln!(
        svg,
        r#"    <path d="M {} 1 H {} A 4 4 0 0 1 {} 5 V {} A 4 4 0 0 1 {} {} H {} Z" fill="{accent}"/>"#,
        lw - 1,
        w - 5,
        w - 1,
        h - 5,
        w - 5,
        h - 1,
        lw - 1
    )
    .map_err(fmt_err)?;
    writeln!(svg, "  </g>").map_err(fmt_err)?;
    writeln!(
        svg,
        r#"  <g fill="{BADGE_TEXT}" text-anchor="middle" font-family="'Segoe UI', Ubuntu, sans-serif" font-size="11" font-weight="500">"#
    )
    .map_err(fmt_err)?;
    writeln!(
        svg,
        r#"    <text x="{}" y="14.5">{}</text>"#,
        lw as f64 / 2.0,
        escape_xml(badge.label)
    )
    .map_err(fmt_err)?;
    writeln!(
        svg,
        r#"    <text x="{}" y="14.5">{}</text>"#,
        lw as f64 + vw as f64 / 2.0,
        escape_xml(badge.value)
    )
    .map_err(fmt_err)?;
    writeln!(svg, "  </g>").map_err(fmt_err)?;
    write!(svg, "</svg>").map_err(fmt_err)?;

    Ok(svg)
}
