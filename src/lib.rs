/// 统一错误处理模块
pub mod error;

/// 配置模块
pub mod config;

/// 功能聚合模块
pub mod features;

/// 应用状态聚合模块
pub mod state;

/// 优雅退出管理模块
pub mod shutdown;

/// HTTP Client 复用工具
pub mod http;

/// 请求上下文（request_id 与爬虫标注）
pub mod request_id;

/// OpenAPI 文档
pub mod openapi;

use axum::{Router, routing::get};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// 导出常用类型供外部使用
pub use config::AppConfig;
pub use error::AppError;
pub use shutdown::{ShutdownManager, ShutdownReason};
pub use state::AppState;

/// 组装全部路由：`/health` 与文档在根路径，业务接口挂在 `prefix` 下
pub fn build_router(state: AppState, prefix: &str) -> Router {
    let api_router = Router::<AppState>::new()
        .merge(features::image::create_image_router())
        .merge(features::meta::handler::create_meta_router());

    let app = Router::<AppState>::new()
        .route("/health", get(features::health::handler::health_check))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()));
    let app = if prefix.is_empty() || prefix == "/" {
        app.merge(api_router)
    } else {
        app.nest(prefix, api_router)
    };

    app.with_state(state)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
}
