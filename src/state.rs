use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::AppConfig;
use crate::features::cache::{Clock, StatsCache};
use crate::features::image::Rasterizer;
use crate::features::platform::client::PlatformClient;
use crate::features::stats::StatsService;

/// 聚合的应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 统计服务（持有进程级缓存与上游客户端）
    pub stats: StatsService,
    /// SVG → PNG 栅格化器（字体库启动时加载）
    pub rasterizer: Arc<Rasterizer>,
    /// 控制并发渲染的信号量（限制 CPU 密集型任务数量）
    pub render_semaphore: Arc<Semaphore>,
}

impl AppState {
    pub fn new(stats: StatsService, rasterizer: Arc<Rasterizer>, max_parallel: usize) -> Self {
        Self {
            stats,
            rasterizer,
            render_semaphore: Arc::new(Semaphore::new(max_parallel.max(1))),
        }
    }

    /// 按配置组装；上游客户端与时钟由调用方注入
    pub fn from_config(
        config: &AppConfig,
        client: Arc<dyn PlatformClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = StatsCache::new(config.cache.ttl(), config.cache.max_entries, clock);
        Self::new(
            StatsService::new(cache, client),
            Arc::new(Rasterizer::new(&config.image)),
            config.image.effective_parallelism(),
        )
    }

    /// 响应 `Cache-Control: max-age`（秒），与缓存新鲜期一致
    pub fn cache_max_age(&self) -> u64 {
        self.stats.cache().ttl().num_seconds().max(0) as u64
    }
}
