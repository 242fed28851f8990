use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

/// 上游代理写入的爬虫分类头
pub const CRAWLER_HEADER: &str = "x-crawler";

/// 请求上下文中的 request_id。
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 爬虫分类（不透明字符串，只用于日志）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlerClass(pub String);

/// 请求级只读上下文
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub crawler: Option<CrawlerClass>,
}

tokio::task_local! {
    /// 当前异步任务绑定的请求上下文，用于错误响应透传与日志标注。
    static TASK_CONTEXT: RequestContext;
}

/// 获取当前请求上下文中的 request_id。
pub fn current_request_id() -> Option<String> {
    TASK_CONTEXT
        .try_with(|ctx| ctx.request_id.0.clone())
        .ok()
}

/// 获取当前请求的爬虫分类（未标注或不在请求上下文中时为 None）。
pub fn current_crawler() -> Option<String> {
    TASK_CONTEXT
        .try_with(|ctx| ctx.crawler.as_ref().map(|c| c.0.clone()))
        .ok()
        .flatten()
}

fn is_valid_request_id(v: &str) -> bool {
    !v.is_empty()
        && v.len() <= 128
        && v.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.')
}

fn resolve_request_id(req: &Request) -> String {
    if let Some(raw) = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        && is_valid_request_id(raw)
    {
        return raw.to_string();
    }
    format!("req_{}", Uuid::new_v4().simple())
}

fn resolve_crawler(req: &Request) -> Option<CrawlerClass> {
    req.headers()
        .get(CRAWLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= 64)
        .map(|v| CrawlerClass(v.to_string()))
}

/// 全局请求上下文中间件：
/// - 优先透传客户端传入的 `X-Request-Id`，缺失或非法时服务端自动生成
/// - 读取 `X-Crawler` 作为爬虫分类标注
/// - request_id 回写到响应头，上下文注入请求扩展与任务本地存储
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = resolve_request_id(&req);
    let ctx = RequestContext {
        request_id: RequestId(request_id.clone()),
        crawler: resolve_crawler(&req),
    };
    req.extensions_mut().insert(ctx.request_id.clone());
    req.extensions_mut().insert(ctx.clone());

    let mut res = TASK_CONTEXT
        .scope(ctx, async move { next.run(req).await })
        .await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        res.headers_mut().insert("x-request-id", value);
    }

    res
}
