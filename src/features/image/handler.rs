use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::time::Instant;

use crate::error::AppError;
use crate::features::platform::{EntityType, Platform};
use crate::features::stats::cache_note;
use crate::state::AppState;

use super::badge::{Badge, render_badge};
use super::card::{format_stat, render_card};
use super::types::{OutputFormat, StyleQuery};

/// 统计值缺失时徽章显示的文本
const MISSING_VALUE: &str = "N/A";

/// 组装图片响应：内容类型与缓存头
fn image_response(format: OutputFormat, body: Vec<u8>, max_age: u64) -> Result<Response, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(format.content_type()),
    );
    let cache_control = HeaderValue::from_str(&format!("public, max-age={max_age}"))
        .map_err(|e| AppError::Internal(format!("构造缓存头失败: {e}")))?;
    headers.insert(header::CACHE_CONTROL, cache_control);
    Ok((StatusCode::OK, headers, Bytes::from(body)).into_response())
}

/// 按输出格式编码；PNG 在渲染信号量许可下于阻塞线程池中栅格化
async fn encode(state: &AppState, svg: String, format: OutputFormat) -> Result<Vec<u8>, AppError> {
    match format {
        OutputFormat::Svg => Ok(svg.into_bytes()),
        OutputFormat::Png => {
            let t0 = Instant::now();
            let sem = state.render_semaphore.clone();
            let _permit = sem
                .acquire_owned()
                .await
                .map_err(|e| AppError::Internal(format!("获取渲染信号量失败: {e}")))?;
            let waited = t0.elapsed();
            let png = state.rasterizer.clone().render_png_async(svg).await?;
            tracing::debug!(
                "PNG 输出: 等待许可={:?}, 总耗时={:?}, 大小={}B",
                waited,
                t0.elapsed(),
                png.len()
            );
            Ok(png)
        }
    }
}

#[utoipa::path(
    get,
    path = "/badge/{platform}/{entity}/{id}/{stat}",
    summary = "生成统计徽章",
    description = "两段式徽章：左侧为统计项标签，右侧为数值（强调色）。统计项按平台与实体类型决定，例如 downloads、followers、versions、projects、rank、views（Hangar 项目）。",
    params(
        ("platform" = Platform, Path, description = "平台：modrinth|curseforge|hangar"),
        ("entity" = EntityType, Path, description = "实体类型：project|user|organization|collection|mod"),
        ("id" = String, Path, description = "slug 或数字 ID"),
        ("stat" = String, Path, description = "统计项短名"),
        StyleQuery
    ),
    responses(
        (status = 200, description = "SVG（或 PNG）徽章"),
        (status = 400, description = "参数错误", body = AppError),
        (status = 404, description = "实体不存在", body = AppError),
        (status = 502, description = "上游平台错误", body = AppError)
    ),
    tag = "Image"
)]
pub async fn get_badge(
    State(state): State<AppState>,
    Path((platform, entity, id, stat)): Path<(String, String, String, String)>,
    Query(q): Query<StyleQuery>,
) -> Result<Response, AppError> {
    let platform: Platform = platform.parse()?;
    let entity: EntityType = entity.parse()?;
    let profile = state.stats.profile(platform, entity)?;
    let field = profile.stat_by_slug(&stat).ok_or_else(|| {
        AppError::Validation(format!("{platform} {entity} 不支持统计项 {stat}"))
    })?;
    let colors = q.theme(profile.descriptor.default_color)?;

    let cached = state.stats.load(platform, entity, &id).await?;
    let value = cached
        .value
        .stats
        .value(field.key)
        .map(|v| format_stat(field.key, v))
        .unwrap_or_else(|| MISSING_VALUE.to_string());
    tracing::info!(
        "Showing {} badge for {platform} {entity} \"{id}\": {value} ({})",
        field.slug,
        cache_note(&cached)
    );

    let svg = render_badge(
        &Badge {
            label: field.label,
            value: &value,
        },
        &colors,
    )?;
    let body = encode(&state, svg, q.format).await?;
    image_response(q.format, body, state.cache_max_age())
}

#[utoipa::path(
    get,
    path = "/card/{platform}/{entity}/{id}",
    summary = "生成统计卡片",
    description = "450 宽的统计卡片：标题、三列统计、最新版本（或聚合实体的热门项目）列表、活动曲线与缓存状态。`format=png` 时在服务端栅格化，宽度不超过配置上限。",
    params(
        ("platform" = Platform, Path, description = "平台：modrinth|curseforge|hangar"),
        ("entity" = EntityType, Path, description = "实体类型：project|user|organization|collection|mod"),
        ("id" = String, Path, description = "slug 或数字 ID"),
        StyleQuery
    ),
    responses(
        (status = 200, description = "SVG 或 PNG 卡片"),
        (status = 400, description = "参数错误", body = AppError),
        (status = 404, description = "实体不存在", body = AppError),
        (status = 500, description = "渲染失败", body = AppError),
        (status = 502, description = "上游平台错误", body = AppError)
    ),
    tag = "Image"
)]
pub async fn get_card(
    State(state): State<AppState>,
    Path((platform, entity, id)): Path<(String, String, String)>,
    Query(q): Query<StyleQuery>,
) -> Result<Response, AppError> {
    let platform: Platform = platform.parse()?;
    let entity: EntityType = entity.parse()?;
    let profile = state.stats.profile(platform, entity)?;
    let colors = q.theme(profile.descriptor.default_color)?;
    let mut options = q.card_options()?;

    let cached = state.stats.load(platform, entity, &id).await?;
    options.from_cache = cached.from_cache;
    options.cache_age_minutes = cached.age_minutes();
    tracing::info!(
        "Showing {platform} {entity} card for \"{id}\" ({})",
        cache_note(&cached)
    );

    let t0 = Instant::now();
    let now = state.stats.cache().now();
    let svg = render_card(&cached.value, &profile, &options, &colors, now)?;
    tracing::debug!("卡片 SVG 生成耗时 {:?}, 长度 {}", t0.elapsed(), svg.len());

    let body = encode(&state, svg, q.format).await?;
    image_response(q.format, body, state.cache_max_age())
}

pub fn create_image_router() -> Router<AppState> {
    Router::new()
        .route("/badge/:platform/:entity/:id/:stat", get(get_badge))
        .route("/card/:platform/:entity/:id", get(get_card))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_carry_type_and_max_age() {
        let res = image_response(OutputFormat::Svg, b"<svg/>".to_vec(), 3600).expect("response");
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/svg+xml");
        assert_eq!(res.headers()[header::CACHE_CONTROL], "public, max-age=3600");

        let png = image_response(OutputFormat::Png, vec![0x89], 60).expect("response");
        assert_eq!(png.headers()[header::CONTENT_TYPE], "image/png");
    }
}
