use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::error::AppError;
use crate::features::platform::{EntityType, Platform};
use crate::features::stats::cache_note;
use crate::state::AppState;

use super::{MetaInfo, load_meta};

#[utoipa::path(
    get,
    path = "/meta/{platform}/{entity}/{id}",
    summary = "查询实体名称与主页链接",
    description = "返回实体在平台上的显示名称与主页链接。CurseForge 用户只接受数字 ID；项目 slug 会先解析为数字 ID。",
    params(
        ("platform" = Platform, Path, description = "平台：modrinth|curseforge|hangar"),
        ("entity" = EntityType, Path, description = "实体类型：project|user|organization|collection|mod"),
        ("id" = String, Path, description = "slug 或数字 ID")
    ),
    responses(
        (status = 200, description = "名称与链接", body = MetaInfo),
        (status = 400, description = "参数错误", body = AppError),
        (status = 404, description = "实体不存在", body = AppError),
        (status = 502, description = "上游平台错误", body = AppError)
    ),
    tag = "Meta"
)]
pub async fn get_meta(
    State(state): State<AppState>,
    Path((platform, entity, id)): Path<(String, String, String)>,
) -> Result<Response, AppError> {
    let platform: Platform = platform.parse()?;
    let entity: EntityType = entity.parse()?;

    let cached = load_meta(&state.stats, platform, entity, &id).await?;
    tracing::info!(
        "Showing {platform} {entity} meta for \"{id}\" ({})",
        cache_note(&cached)
    );

    let cache_control = HeaderValue::from_str(&format!("public, max-age={}", state.cache_max_age()))
        .map_err(|e| AppError::Internal(format!("构造缓存头失败: {e}")))?;
    let mut res = Json(cached.value.as_ref().clone()).into_response();
    res.headers_mut().insert(header::CACHE_CONTROL, cache_control);
    Ok(res)
}

pub fn create_meta_router() -> Router<AppState> {
    Router::new().route("/meta/:platform/:entity/:id", get(get_meta))
}
