//! 上游平台客户端。
//!
//! 核心逻辑只依赖 [`PlatformClient`] 这一接口：给定标识符返回原始 JSON。
//! [`RestPlatformClient`] 是基于 reqwest 的默认实现，各平台的差异全部写在
//! `ENDPOINTS` 表中，测试与嵌入方可以替换为任意实现。

use std::collections::HashMap;

use futures_util::future::BoxFuture;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde_json::Value;

use super::{EntityType, Platform};
use crate::config::{PlatformsConfig, UpstreamConfig};
use crate::error::AppError;

/// 上游平台接口（对象安全，便于在 `AppState` 中以 `Arc<dyn PlatformClient>` 共享）
pub trait PlatformClient: Send + Sync {
    /// 主记录；上游确认不存在时返回 `Ok(None)`
    fn fetch_entity<'a>(
        &'a self,
        platform: Platform,
        entity: EntityType,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Value>, AppError>>;

    /// 聚合实体的子项目列表；部分平台需要主记录中的字段（如合集的项目 ID 列表）
    fn fetch_children<'a>(
        &'a self,
        platform: Platform,
        entity: EntityType,
        id: &'a str,
        primary: &'a Value,
    ) -> BoxFuture<'a, Result<Vec<Value>, AppError>>;

    /// 项目的版本/文件列表（未截断）
    fn fetch_versions<'a>(
        &'a self,
        platform: Platform,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Value>, AppError>>;

    /// slug → 数字 ID
    fn lookup_slug<'a>(
        &'a self,
        platform: Platform,
        entity: EntityType,
        slug: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, AppError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resource {
    Entity,
    Children,
    Versions,
    SlugSearch,
}

/// 列表端点的分页方式：路径模板已带页大小参数，这里只追加偏移量
#[derive(Debug, Clone, Copy)]
struct Paging {
    /// 偏移量参数名（CurseForge 为 `index`，Hangar 为 `offset`）
    offset_param: &'static str,
    page_size: usize,
    /// 响应中的总条数字段
    total: &'static str,
}

/// 分页拉取的条数上限（CurseForge 要求 index + pageSize 不超过 10000）
const MAX_LISTED_ITEMS: usize = 10_000;

const CURSEFORGE_PAGING: Paging = Paging {
    offset_param: "index",
    page_size: 50,
    total: "/pagination/totalCount",
};

const HANGAR_PAGING: Paging = Paging {
    offset_param: "offset",
    page_size: 25,
    total: "/pagination/count",
};

/// 一条上游端点描述
#[derive(Debug)]
struct Endpoint {
    platform: Platform,
    /// 版本端点对所有项目类实体通用，此时为 None
    entity: Option<EntityType>,
    resource: Resource,
    /// 路径模板：`{id}` 为请求标识符，`{ids}` 为从主记录读出的 ID 列表
    path: &'static str,
    /// 响应外层包装（如 CurseForge 的 `/data`、Hangar 的 `/result`）
    unwrap: Option<&'static str>,
    /// `{ids}` 的来源字段（主记录上的字符串数组）
    ids_from: Option<&'static str>,
    /// 分页列表；None 表示一次返回全部
    paging: Option<Paging>,
}

const fn ep(
    platform: Platform,
    entity: Option<EntityType>,
    resource: Resource,
    path: &'static str,
    unwrap: Option<&'static str>,
) -> Endpoint {
    Endpoint {
        platform,
        entity,
        resource,
        path,
        unwrap,
        ids_from: None,
        paging: None,
    }
}

const fn paged(
    platform: Platform,
    entity: Option<EntityType>,
    resource: Resource,
    path: &'static str,
    unwrap: &'static str,
    paging: Paging,
) -> Endpoint {
    Endpoint {
        platform,
        entity,
        resource,
        path,
        unwrap: Some(unwrap),
        ids_from: None,
        paging: Some(paging),
    }
}

static ENDPOINTS: &[Endpoint] = &[
    // Modrinth
    ep(Platform::Modrinth, Some(EntityType::Project), Resource::Entity, "/v2/project/{id}", None),
    ep(Platform::Modrinth, None, Resource::Versions, "/v2/project/{id}/version", None),
    ep(Platform::Modrinth, Some(EntityType::User), Resource::Entity, "/v2/user/{id}", None),
    ep(Platform::Modrinth, Some(EntityType::User), Resource::Children, "/v2/user/{id}/projects", None),
    ep(Platform::Modrinth, Some(EntityType::Organization), Resource::Entity, "/v3/organization/{id}", None),
    ep(Platform::Modrinth, Some(EntityType::Organization), Resource::Children, "/v3/organization/{id}/projects", None),
    ep(Platform::Modrinth, Some(EntityType::Collection), Resource::Entity, "/v3/collection/{id}", None),
    Endpoint {
        platform: Platform::Modrinth,
        entity: Some(EntityType::Collection),
        resource: Resource::Children,
        path: "/v2/projects?ids={ids}",
        unwrap: None,
        ids_from: Some("/projects"),
        paging: None,
    },
    // CurseForge
    ep(Platform::CurseForge, Some(EntityType::Mod), Resource::Entity, "/v1/mods/{id}", Some("/data")),
    paged(
        Platform::CurseForge,
        None,
        Resource::Versions,
        "/v1/mods/{id}/files?pageSize=50",
        "/data",
        CURSEFORGE_PAGING,
    ),
    ep(
        Platform::CurseForge,
        Some(EntityType::Mod),
        Resource::SlugSearch,
        "/v1/mods/search?gameId=432&slug={id}",
        Some("/data/0/id"),
    ),
    ep(Platform::CurseForge, Some(EntityType::User), Resource::Entity, "/v1/users/{id}", Some("/data")),
    paged(
        Platform::CurseForge,
        Some(EntityType::User),
        Resource::Children,
        "/v1/mods/search?gameId=432&authorId={id}&sortField=6&sortOrder=desc&pageSize=50",
        "/data",
        CURSEFORGE_PAGING,
    ),
    // Hangar
    ep(Platform::Hangar, Some(EntityType::Project), Resource::Entity, "/projects/{id}", None),
    paged(
        Platform::Hangar,
        None,
        Resource::Versions,
        "/projects/{id}/versions?limit=25",
        "/result",
        HANGAR_PAGING,
    ),
    ep(Platform::Hangar, Some(EntityType::User), Resource::Entity, "/users/{id}", None),
    paged(
        Platform::Hangar,
        Some(EntityType::User),
        Resource::Children,
        "/projects?owner={id}&limit=25",
        "/result",
        HANGAR_PAGING,
    ),
];

fn endpoint(platform: Platform, entity: Option<EntityType>, resource: Resource) -> Option<&'static Endpoint> {
    ENDPOINTS
        .iter()
        .find(|e| e.platform == platform && e.resource == resource && e.entity == entity)
}

/// 展开路径模板；`{ids}` 序列化为 JSON 数组
fn expand_path(template: &str, id: &str, ids: Option<&[String]>) -> String {
    let mut path = template.replace("{id}", id);
    if let Some(ids) = ids {
        let encoded = serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string());
        path = path.replace("{ids}", &encoded);
    }
    path
}

/// 读取主记录上的 ID 列表（字符串或数字）
fn collect_ids(primary: &Value, pointer: &str) -> Vec<String> {
    primary
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn unwrap_body(body: Value, pointer: Option<&str>) -> Option<Value> {
    match pointer {
        Some(p) => body.pointer(p).cloned(),
        None => Some(body),
    }
}

fn into_list(body: Value, platform: Platform, path: &str) -> Result<Vec<Value>, AppError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        _ => Err(AppError::Upstream(format!(
            "{platform} 响应格式异常（期望数组）: {path}"
        ))),
    }
}

/// 基于 reqwest 的默认上游实现
#[derive(Clone)]
pub struct RestPlatformClient {
    client: reqwest::Client,
    upstreams: HashMap<Platform, UpstreamConfig>,
}

impl RestPlatformClient {
    pub fn new(config: &PlatformsConfig) -> Result<Self, AppError> {
        let client = crate::http::upstream_client(&config.user_agent)
            .map_err(|e| AppError::Internal(format!("初始化 HTTP Client 失败: {e}")))?
            .clone();
        Ok(Self::with_client(client, config))
    }

    /// 使用外部提供的 Client（测试中指向本地服务）
    pub fn with_client(client: reqwest::Client, config: &PlatformsConfig) -> Self {
        Self {
            client,
            upstreams: config.all(),
        }
    }

    /// GET 一个上游路径；404 → `Ok(None)`，其它非 2xx → `Upstream`
    async fn get_json(&self, platform: Platform, path: &str) -> Result<Option<Value>, AppError> {
        let upstream = self
            .upstreams
            .get(&platform)
            .ok_or_else(|| AppError::Internal(format!("缺少平台配置: {platform}")))?;
        let url = format!("{}{}", upstream.base_url.trim_end_matches('/'), path);

        let mut req = self
            .client
            .get(&url)
            .timeout(upstream.timeout())
            .header(ACCEPT, "application/json");
        if let Some(key) = upstream.api_key.as_deref() {
            req = req.header("x-api-key", key);
        }

        let t0 = std::time::Instant::now();
        let resp = req.send().await?;
        let status = resp.status();
        tracing::debug!(
            platform = %platform,
            %status,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "上游请求: {path}"
        );

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "{platform} 返回 {status}: {path}"
            )));
        }
        Ok(Some(resp.json::<Value>().await?))
    }

    /// 拉取列表端点；分页端点按偏移量逐页拉取，直到短页、达到总数或条数上限
    async fn fetch_list(
        &self,
        platform: Platform,
        ep: &Endpoint,
        path: &str,
    ) -> Result<Vec<Value>, AppError> {
        let Some(paging) = ep.paging else {
            let body = self.get_json(platform, path).await?;
            return match body.and_then(|b| unwrap_body(b, ep.unwrap)) {
                Some(list) => into_list(list, platform, path),
                None => Ok(Vec::new()),
            };
        };

        let mut items = Vec::new();
        let mut pages = 0usize;
        loop {
            let page_path = format!("{path}&{}={}", paging.offset_param, items.len());
            let Some(body) = self.get_json(platform, &page_path).await? else {
                break;
            };
            pages += 1;
            let total = body.pointer(paging.total).and_then(Value::as_u64);
            let page = match unwrap_body(body, ep.unwrap) {
                Some(list) => into_list(list, platform, &page_path)?,
                None => Vec::new(),
            };
            let fetched = page.len();
            items.extend(page);

            if fetched < paging.page_size || total.is_some_and(|t| items.len() as u64 >= t) {
                break;
            }
            if items.len() + paging.page_size > MAX_LISTED_ITEMS {
                tracing::warn!(
                    platform = %platform,
                    "列表超过 {MAX_LISTED_ITEMS} 条，停止翻页: {path}"
                );
                break;
            }
        }
        tracing::debug!(platform = %platform, pages, items = items.len(), "分页拉取完成: {path}");
        Ok(items)
    }

    fn require(
        platform: Platform,
        entity: Option<EntityType>,
        resource: Resource,
    ) -> Result<&'static Endpoint, AppError> {
        endpoint(platform, entity, resource).ok_or_else(|| {
            let entity = entity.map(|e| e.as_str()).unwrap_or("*");
            AppError::Validation(format!("{platform} 不支持 {entity} 的 {resource:?} 查询"))
        })
    }
}

impl PlatformClient for RestPlatformClient {
    fn fetch_entity<'a>(
        &'a self,
        platform: Platform,
        entity: EntityType,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Value>, AppError>> {
        Box::pin(async move {
            let ep = Self::require(platform, Some(entity), Resource::Entity)?;
            let path = expand_path(ep.path, id, None);
            let Some(body) = self.get_json(platform, &path).await? else {
                return Ok(None);
            };
            match unwrap_body(body, ep.unwrap) {
                Some(Value::Null) | None => Ok(None),
                Some(v @ Value::Object(_)) => Ok(Some(v)),
                Some(_) => Err(AppError::Upstream(format!(
                    "{platform} 响应格式异常（期望对象）: {path}"
                ))),
            }
        })
    }

    fn fetch_children<'a>(
        &'a self,
        platform: Platform,
        entity: EntityType,
        id: &'a str,
        primary: &'a Value,
    ) -> BoxFuture<'a, Result<Vec<Value>, AppError>> {
        Box::pin(async move {
            let ep = Self::require(platform, Some(entity), Resource::Children)?;
            let ids = ep.ids_from.map(|p| collect_ids(primary, p));
            if ids.as_ref().is_some_and(Vec::is_empty) {
                return Ok(Vec::new());
            }
            let path = expand_path(ep.path, id, ids.as_deref());
            self.fetch_list(platform, ep, &path).await
        })
    }

    fn fetch_versions<'a>(
        &'a self,
        platform: Platform,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Value>, AppError>> {
        Box::pin(async move {
            let ep = Self::require(platform, None, Resource::Versions)?;
            let path = expand_path(ep.path, id, None);
            self.fetch_list(platform, ep, &path).await
        })
    }

    fn lookup_slug<'a>(
        &'a self,
        platform: Platform,
        entity: EntityType,
        slug: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, AppError>> {
        Box::pin(async move {
            let ep = Self::require(platform, Some(entity), Resource::SlugSearch)?;
            let path = expand_path(ep.path, slug, None);
            let body = self.get_json(platform, &path).await?;
            Ok(match body.and_then(|b| unwrap_body(b, ep.unwrap)) {
                Some(Value::Number(n)) => Some(n.to_string()),
                Some(Value::String(s)) if !s.is_empty() => Some(s),
                _ => None,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::{Path, Query},
        http::StatusCode as AxumStatus,
        routing::get,
    };
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn every_platform_can_fetch_versions() {
        for p in Platform::ALL {
            assert!(endpoint(p, None, Resource::Versions).is_some(), "{p}");
        }
    }

    #[test]
    fn curseforge_slug_search_targets_minecraft() {
        let ep = endpoint(Platform::CurseForge, Some(EntityType::Mod), Resource::SlugSearch)
            .expect("slug search endpoint");
        assert!(ep.path.contains("gameId=432"));
    }

    #[test]
    fn collection_children_expand_ids_from_primary() {
        let primary = json!({ "projects": ["AANobbMI", "P7dR8mSH", 42] });
        let ids = collect_ids(&primary, "/projects");
        assert_eq!(ids, ["AANobbMI", "P7dR8mSH", "42"]);
        let path = expand_path("/v2/projects?ids={ids}", "c1", Some(&ids));
        assert_eq!(path, r#"/v2/projects?ids=["AANobbMI","P7dR8mSH","42"]"#);
        assert!(collect_ids(&json!({}), "/projects").is_empty());
    }

    async fn start_fake_upstream() -> String {
        let app = Router::new()
            .route(
                "/v1/mods/:id",
                get(|Path(id): Path<String>| async move {
                    if id == "238222" {
                        Ok(Json(json!({ "data": { "id": 238222, "name": "JEI" } })))
                    } else {
                        Err(AxumStatus::NOT_FOUND)
                    }
                }),
            )
            .route(
                "/v1/mods/:id/files",
                get(|| async { Json(json!({ "data": [{ "displayName": "a" }, { "displayName": "b" }] })) }),
            )
            .route(
                "/v1/users/:id",
                get(|| async { AxumStatus::SERVICE_UNAVAILABLE }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind tcp listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    fn client_for(base: &str) -> RestPlatformClient {
        let mut cfg = PlatformsConfig::default();
        cfg.curseforge.base_url = base.to_string();
        cfg.curseforge.api_key = Some("test-key".into());
        RestPlatformClient::with_client(reqwest::Client::new(), &cfg)
    }

    #[tokio::test]
    async fn rest_client_unwraps_and_maps_statuses() {
        let base = start_fake_upstream().await;
        let client = client_for(&base);

        let jei = client
            .fetch_entity(Platform::CurseForge, EntityType::Mod, "238222")
            .await
            .expect("request ok")
            .expect("entity present");
        assert_eq!(jei["name"], "JEI");

        let missing = client
            .fetch_entity(Platform::CurseForge, EntityType::Mod, "1")
            .await
            .expect("404 is not an error");
        assert!(missing.is_none());

        let files = client
            .fetch_versions(Platform::CurseForge, "238222")
            .await
            .expect("files");
        assert_eq!(files.len(), 2);

        let err = client
            .fetch_entity(Platform::CurseForge, EntityType::User, "7")
            .await
            .expect_err("503 must propagate");
        assert!(matches!(err, AppError::Upstream(_)), "got {err:?}");
    }

    /// Hangar 风格的分页服务：按 limit/offset 切片并带 pagination.count
    async fn start_paged_upstream(total: usize, hits: Arc<AtomicUsize>) -> String {
        let app = Router::new().route(
            "/projects/:id/versions",
            get(move |Query(q): Query<HashMap<String, String>>| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    let limit: usize = q.get("limit").and_then(|v| v.parse().ok()).unwrap_or(25);
                    let offset: usize = q.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
                    let result: Vec<_> = (offset..total.min(offset + limit))
                        .map(|i| json!({ "name": format!("v{i}") }))
                        .collect();
                    Json(json!({
                        "pagination": { "limit": limit, "offset": offset, "count": total },
                        "result": result,
                    }))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind tcp listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    fn hangar_client_for(base: &str) -> RestPlatformClient {
        let mut cfg = PlatformsConfig::default();
        cfg.hangar.base_url = base.to_string();
        RestPlatformClient::with_client(reqwest::Client::new(), &cfg)
    }

    #[tokio::test]
    async fn versions_beyond_first_page_are_fetched() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = start_paged_upstream(60, hits.clone()).await;
        let versions = hangar_client_for(&base)
            .fetch_versions(Platform::Hangar, "ViaVersion")
            .await
            .expect("versions");
        assert_eq!(versions.len(), 60);
        assert_eq!(versions[59]["name"], "v59");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn paging_stops_once_total_is_reached() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = start_paged_upstream(50, hits.clone()).await;
        let versions = hangar_client_for(&base)
            .fetch_versions(Platform::Hangar, "ViaVersion")
            .await
            .expect("versions");
        assert_eq!(versions.len(), 50);
        // 第二页恰好满页，count 已达到，不再请求第三页
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn curseforge_author_projects_page_by_index() {
        let app = Router::new().route(
            "/v1/mods/search",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let size: usize = q.get("pageSize").and_then(|v| v.parse().ok()).unwrap_or(50);
                let index: usize = q.get("index").and_then(|v| v.parse().ok()).unwrap_or(0);
                let data: Vec<_> = (index..70.min(index + size))
                    .map(|i| json!({ "id": i, "name": format!("mod{i}") }))
                    .collect();
                Json(json!({
                    "data": data,
                    "pagination": { "index": index, "pageSize": size, "totalCount": 70 },
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind tcp listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let children = client_for(&format!("http://{addr}"))
            .fetch_children(Platform::CurseForge, EntityType::User, "42", &json!({}))
            .await
            .expect("children");
        assert_eq!(children.len(), 70);
        assert_eq!(children[69]["name"], "mod69");
    }

    #[tokio::test]
    async fn unsupported_resource_is_a_validation_error() {
        let client = client_for("http://127.0.0.1:9");
        let err = client
            .lookup_slug(Platform::Hangar, EntityType::Project, "x")
            .await
            .expect_err("hangar has no slug search");
        assert!(matches!(err, AppError::Validation(_)));
    }
}
