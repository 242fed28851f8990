//! 主题配色：由强调色与可选背景色推导出整套颜色。

use serde::Serialize;

use crate::error::AppError;

/// 缺省背景（透明，嵌入 README 时跟随页面底色）
pub const DEFAULT_BACKGROUND: &str = "transparent";
pub const TEXT_COLOR: &str = "#8b949e";
pub const MUTED_TEXT_COLOR: &str = "#6e7681";
pub const BORDER_COLOR: &str = "#E4E2E2";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeColors {
    pub accent_color: String,
    pub background_color: String,
    pub text_color: String,
    pub muted_text_color: String,
    pub border_color: String,
}

/// 规范化十六进制颜色：`#` 可省略，接受 3/6/8 位，保留原大小写
pub fn normalize_hex(input: &str) -> Result<String, AppError> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    let valid = matches!(digits.len(), 3 | 6 | 8) && digits.bytes().all(|b| b.is_ascii_hexdigit());
    if valid {
        Ok(format!("#{digits}"))
    } else {
        Err(AppError::Validation(format!("非法的颜色值: {input:?}")))
    }
}

/// 推导配色；背景缺省为透明，也接受字面量 `transparent`
pub fn resolve(accent: &str, background: Option<&str>) -> Result<ThemeColors, AppError> {
    let background_color = match background.map(str::trim) {
        None | Some("") => DEFAULT_BACKGROUND.to_string(),
        Some(bg) if bg.eq_ignore_ascii_case(DEFAULT_BACKGROUND) => DEFAULT_BACKGROUND.to_string(),
        Some(bg) => normalize_hex(bg)?,
    };
    Ok(ThemeColors {
        accent_color: normalize_hex(accent)?,
        background_color,
        text_color: TEXT_COLOR.to_string(),
        muted_text_color: MUTED_TEXT_COLOR.to_string(),
        border_color: BORDER_COLOR.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_prefix_is_optional() {
        let a = resolve("1bd96a", None).expect("bare");
        let b = resolve("#1bd96a", None).expect("prefixed");
        assert_eq!(a.accent_color, "#1bd96a");
        assert_eq!(a, b);
    }

    #[test]
    fn background_defaults_to_transparent_and_accepts_override() {
        assert_eq!(resolve("fff", None).expect("ok").background_color, DEFAULT_BACKGROUND);
        assert_eq!(
            resolve("fff", Some("0d1117")).expect("ok").background_color,
            "#0d1117"
        );
        assert_eq!(
            resolve("fff", Some("Transparent")).expect("ok").background_color,
            DEFAULT_BACKGROUND
        );
    }

    #[test]
    fn fixed_colors_do_not_follow_accent() {
        let a = resolve("#F16436", None).expect("ok");
        let b = resolve("#3371ED", Some("#000")).expect("ok");
        assert_eq!(a.text_color, b.text_color);
        assert_eq!(a.muted_text_color, b.muted_text_color);
        assert_eq!(a.border_color, b.border_color);
    }

    #[test]
    fn malformed_colors_are_rejected() {
        for bad in ["", "#12", "zzzzzz", "#1bd96a\"/><script>", "1234567", "##1bd96a", "##abc"] {
            assert!(
                matches!(normalize_hex(bad), Err(AppError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(resolve("1bd96a", Some("red")).is_err());
    }
}
