use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::features::platform::Platform;

/// 全局配置单例（仅供二进制入口使用，库内组件显式接收各自的配置片段）
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（未设置 RUST_LOG 时生效）
    pub level: String,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API 路由前缀（为空表示挂在根路径）
    #[serde(default)]
    pub prefix: String,
}

/// 统计数据缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 条目新鲜期（秒），同时用作响应的 `Cache-Control: max-age`
    #[serde(default = "CacheConfig::default_ttl")]
    pub ttl_secs: u64,
    /// 最大条目数，超出后由后台淘汰
    #[serde(default = "CacheConfig::default_max_entries")]
    pub max_entries: u64,
}

impl CacheConfig {
    fn default_ttl() -> u64 {
        3600
    }
    fn default_max_entries() -> u64 {
        10_000
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: Self::default_ttl(),
            max_entries: Self::default_max_entries(),
        }
    }
}

/// 图片渲染配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRenderConfig {
    /// 字体目录（启动时一次性加载其中的 ttf/otf）
    #[serde(default = "ImageRenderConfig::default_fonts_dir")]
    pub fonts_dir: String,
    /// 缺省字体族（SVG 未指定或指定字体不可用时回退）
    #[serde(default = "ImageRenderConfig::default_font_family")]
    pub default_font_family: String,
    /// 是否加载系统字体（默认关闭，保证不同部署环境输出一致）
    #[serde(default)]
    pub load_system_fonts: bool,
    /// PNG 输出最大宽度（只缩小不放大）
    #[serde(default = "ImageRenderConfig::default_max_width")]
    pub max_width: u32,
    /// 并发栅格化任务上限（0 表示使用 CPU 核数）
    #[serde(default)]
    pub max_parallel: u32,
    /// 速度优先（降低抗锯齿与压缩等级）
    #[serde(default)]
    pub optimize_speed: bool,
}

impl ImageRenderConfig {
    fn default_fonts_dir() -> String {
        "public/fonts".to_string()
    }
    fn default_font_family() -> String {
        "Inter".to_string()
    }
    fn default_max_width() -> u32 {
        800
    }

    pub fn fonts_path(&self) -> PathBuf {
        PathBuf::from(&self.fonts_dir)
    }

    /// 实际使用的并发栅格化上限
    pub fn effective_parallelism(&self) -> usize {
        if self.max_parallel == 0 {
            num_cpus::get()
        } else {
            self.max_parallel as usize
        }
    }
}

impl Default for ImageRenderConfig {
    fn default() -> Self {
        Self {
            fonts_dir: Self::default_fonts_dir(),
            default_font_family: Self::default_font_family(),
            load_system_fonts: false,
            max_width: Self::default_max_width(),
            max_parallel: 0,
            optimize_speed: false,
        }
    }
}

/// 单个上游平台的连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// API 基地址
    pub base_url: String,
    /// 可选 API Key（CurseForge 需要，以 `x-api-key` 头发送）
    #[serde(default)]
    pub api_key: Option<String>,
    /// 请求超时（秒）
    #[serde(default = "UpstreamConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    fn default_timeout() -> u64 {
        30
    }

    fn with_base(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: None,
            timeout_secs: Self::default_timeout(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 上游平台配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformsConfig {
    /// 请求上游时使用的 User-Agent
    #[serde(default = "PlatformsConfig::default_user_agent")]
    pub user_agent: String,
    #[serde(default = "PlatformsConfig::default_modrinth")]
    pub modrinth: UpstreamConfig,
    #[serde(default = "PlatformsConfig::default_curseforge")]
    pub curseforge: UpstreamConfig,
    #[serde(default = "PlatformsConfig::default_hangar")]
    pub hangar: UpstreamConfig,
}

impl PlatformsConfig {
    fn default_user_agent() -> String {
        format!("modcard-backend/{}", env!("CARGO_PKG_VERSION"))
    }
    fn default_modrinth() -> UpstreamConfig {
        UpstreamConfig::with_base("https://api.modrinth.com")
    }
    fn default_curseforge() -> UpstreamConfig {
        UpstreamConfig::with_base("https://api.curseforge.com")
    }
    fn default_hangar() -> UpstreamConfig {
        UpstreamConfig::with_base("https://hangar.papermc.io/api/v1")
    }

    /// 按平台取连接配置
    pub fn upstream(&self, platform: Platform) -> &UpstreamConfig {
        match platform {
            Platform::Modrinth => &self.modrinth,
            Platform::CurseForge => &self.curseforge,
            Platform::Hangar => &self.hangar,
        }
    }

    /// 所有平台的连接配置
    pub fn all(&self) -> HashMap<Platform, UpstreamConfig> {
        Platform::ALL
            .iter()
            .map(|p| (*p, self.upstream(*p).clone()))
            .collect()
    }
}

impl Default for PlatformsConfig {
    fn default() -> Self {
        Self {
            user_agent: Self::default_user_agent(),
            modrinth: Self::default_modrinth(),
            curseforge: Self::default_curseforge(),
            hangar: Self::default_hangar(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub api: ApiConfig,
    /// 统计数据缓存配置
    #[serde(default)]
    pub cache: CacheConfig,
    /// 图片渲染配置
    #[serde(default)]
    pub image: ImageRenderConfig,
    /// 上游平台配置
    #[serde(default)]
    pub platforms: PlatformsConfig,
}

impl AppConfig {
    /// 从配置文件加载配置，支持环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();

        tracing::info!("正在从 {:?} 加载配置文件", config_path);

        let defaults = ConfigBuilder::try_from(&AppConfig::default())?;
        let builder = ConfigBuilder::builder()
            .add_source(defaults)
            // 配置文件可选：缺失时全部使用默认值
            .add_source(File::from(config_path).required(false))
            // 支持环境变量覆盖，例如：APP_SERVER__PORT
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        builder.try_deserialize()
    }

    /// 获取全局配置单例
    pub fn global() -> &'static AppConfig {
        CONFIG.get().expect("配置未初始化，请先调用 init_global()")
    }

    /// 初始化全局配置
    pub fn init_global() -> Result<(), ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        Ok(())
    }

    /// 获取配置文件路径
    fn get_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            api: ApiConfig {
                prefix: String::new(),
            },
            cache: CacheConfig::default(),
            image: ImageRenderConfig::default(),
            platforms: PlatformsConfig::default(),
        }
    }
}
