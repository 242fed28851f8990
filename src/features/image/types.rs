use serde::{Deserialize, Serialize};

use super::card::CardOptions;
use crate::error::AppError;
use crate::features::theme::{self, ThemeColors};

/// 卡片列表行数上限
pub const MAX_VERSIONS_LIMIT: usize = 20;

/// 输出图片格式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, utoipa::ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// SVG（默认）
    #[default]
    Svg,
    /// PNG（服务端栅格化，宽度不超过配置上限）
    Png,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Svg => "image/svg+xml",
            OutputFormat::Png => "image/png",
        }
    }
}

/// 样式参数（徽章与卡片共用，通过 Query 传入）
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StyleQuery {
    /// 强调色（十六进制，`#` 可省略）；缺省使用平台品牌色
    pub color: Option<String>,
    /// 背景色（十六进制或 `transparent`）
    pub background_color: Option<String>,
    /// 是否显示版本/项目列表（默认 true）
    pub show_versions: Option<bool>,
    /// 列表最多行数（默认 5，上限 20）
    pub max_versions: Option<usize>,
    /// 是否显示活动曲线（默认 true）
    pub show_sparklines: Option<bool>,
    /// 列表日期使用相对时间（默认 false）
    pub relative_time: Option<bool>,
    /// 输出格式：svg|png
    #[serde(default)]
    pub format: OutputFormat,
}

impl StyleQuery {
    /// 解析主题色；未指定强调色时使用 `default_accent`
    pub fn theme(&self, default_accent: &str) -> Result<ThemeColors, AppError> {
        let accent = self
            .color
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(default_accent);
        theme::resolve(accent, self.background_color.as_deref())
    }

    /// 卡片选项（缓存来源与年龄在读取统计后填入）
    pub fn card_options(&self) -> Result<CardOptions, AppError> {
        let defaults = CardOptions::default();
        let max_versions = self.max_versions.unwrap_or(defaults.max_versions);
        if max_versions > MAX_VERSIONS_LIMIT {
            return Err(AppError::Validation(format!(
                "maxVersions 不能超过 {MAX_VERSIONS_LIMIT}"
            )));
        }
        Ok(CardOptions {
            show_versions: self.show_versions.unwrap_or(defaults.show_versions),
            max_versions,
            show_sparklines: self.show_sparklines.unwrap_or(defaults.show_sparklines),
            relative_time: self.relative_time.unwrap_or(defaults.relative_time),
            ..defaults
        })
    }
}
