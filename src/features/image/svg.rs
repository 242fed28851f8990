//! 徽章与卡片共用的文本工具。

use chrono::{DateTime, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// SVG 文本与属性转义（`& < > " '`）
pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// 紧凑数字：`1234` → `1.2K`，`3400000` → `3.4M`
pub fn format_number(n: u64) -> String {
    const UNITS: [(f64, &str); 3] = [(1e9, "B"), (1e6, "M"), (1e3, "K")];
    let value = n as f64;
    for (i, (base, suffix)) in UNITS.iter().enumerate() {
        if value < *base {
            continue;
        }
        let scaled = (value / base * 10.0).round() / 10.0;
        // 四舍五入后进位到上一档（如 999_950 → 1M）
        if scaled >= 1000.0 && i > 0 {
            let (upper, upper_suffix) = UNITS[i - 1];
            return trim_decimal((value / upper * 10.0).round() / 10.0, upper_suffix);
        }
        return trim_decimal(scaled, suffix);
    }
    n.to_string()
}

fn trim_decimal(v: f64, suffix: &str) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}{suffix}")
    } else {
        format!("{v:.1}{suffix}")
    }
}

/// 按显示宽度截断，超出时以 `…` 结尾（结果宽度不超过 `max_width`）
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let budget = max_width.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

/// 版本行中的日期
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// 相对时间（`3 days ago`）
pub fn relative_time(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - date).num_seconds().max(0);
    let (n, unit) = match secs {
        s if s < 60 => return "just now".to_string(),
        s if s < 3600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3600, "hour"),
        s if s < 86_400 * 30 => (s / 86_400, "day"),
        s if s < 86_400 * 365 => (s / (86_400 * 30), "month"),
        s => (s / (86_400 * 365), "year"),
    };
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}
