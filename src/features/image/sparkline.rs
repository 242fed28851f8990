//! 活动曲线：把日期序列分桶计数后归一化为折线。

use chrono::{DateTime, Utc};

/// 分桶数量
pub const BUCKETS: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySeries {
    counts: Vec<u32>,
    total: usize,
}

impl ActivitySeries {
    /// 按最早到最晚日期等宽分桶；没有日期时为全零（平线）
    pub fn from_dates(dates: &[DateTime<Utc>]) -> Self {
        let mut counts = vec![0u32; BUCKETS];
        let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) else {
            return Self { counts, total: 0 };
        };
        let span = (*max - *min).num_seconds();
        for d in dates {
            let idx = if span == 0 {
                BUCKETS - 1
            } else {
                let offset = (*d - *min).num_seconds() as f64 / span as f64;
                ((offset * BUCKETS as f64) as usize).min(BUCKETS - 1)
            };
            counts[idx] += 1;
        }
        Self {
            counts,
            total: dates.len(),
        }
    }

    /// 参与计数的日期总数
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn is_flat(&self) -> bool {
        self.total == 0
    }

    /// 归一化后的折线坐标；最高桶贴顶，平线贴底
    pub fn points(&self, x: f64, y: f64, width: f64, height: f64) -> Vec<(f64, f64)> {
        let peak = self.counts.iter().copied().max().unwrap_or(0).max(1) as f64;
        let step = width / (BUCKETS - 1) as f64;
        self.counts
            .iter()
            .enumerate()
            .map(|(i, c)| (x + step * i as f64, y + height - (*c as f64 / peak) * height))
            .collect()
    }

    /// 生成折线与浅色填充区域
    pub fn render(&self, x: f64, y: f64, width: f64, height: f64, color: &str) -> String {
        let points = self.points(x, y, width, height);
        let line = points
            .iter()
            .map(|(px, py)| format!("{px:.1},{py:.1}"))
            .collect::<Vec<_>>()
            .join(" ");
        let baseline = y + height;
        format!(
            r#"<g id="sparkline"><polygon points="{x:.1},{baseline:.1} {line} {:.1},{baseline:.1}" fill="{color}" fill-opacity="0.15"/><polyline points="{line}" fill="none" stroke="{color}" stroke-width="1.5" stroke-linejoin="round" stroke-linecap="round"/></g>"#,
            x + width
        )
    }
}
