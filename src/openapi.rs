use utoipa::openapi::server::{ServerBuilder, ServerVariableBuilder};
use utoipa::{Modify, OpenApi};

/// 为 Swagger UI 提供正确的“业务接口前缀”Servers 配置。
///
/// 业务接口挂载在 `config.api.prefix` 下（默认为空），`/health` 始终在根路径。
struct ApiServers;

impl Modify for ApiServers {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let api = ServerBuilder::new()
            .url("{api_prefix}")
            .description(Some("业务接口"))
            .parameter(
                "api_prefix",
                ServerVariableBuilder::new()
                    .default_value("")
                    .description(Some(
                        "业务接口前缀：对应 config.api.prefix（可通过 APP_API__PREFIX 覆盖）",
                    )),
            )
            .build();

        let root = ServerBuilder::new()
            .url("/")
            .description(Some("根路径（用于 /health）"))
            .build();

        openapi.servers = Some(vec![api, root]);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::image::handler::get_badge,
        crate::features::image::handler::get_card,
        crate::features::meta::handler::get_meta,
    ),
    components(schemas(
        crate::error::AppError,
        crate::error::ProblemDetails,
        crate::features::health::handler::HealthResponse,
        crate::features::meta::MetaInfo,
        crate::features::platform::Platform,
        crate::features::platform::EntityType,
        crate::features::image::OutputFormat,
    )),
    modifiers(&ApiServers),
    tags(
        (
            name = "Image",
            description = "徽章与统计卡片：SVG 输出，可选服务端栅格化为 PNG。"
        ),
        (name = "Meta", description = "实体名称与主页链接。"),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "Modcard Backend API",
        version = env!("CARGO_PKG_VERSION"),
        description = "模组平台统计徽章与卡片服务（Axum + utoipa）。数据来自 Modrinth、CurseForge、Hangar，进程内缓存一小时。"
    )
)]
pub struct ApiDoc;
