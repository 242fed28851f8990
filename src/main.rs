use std::sync::Arc;

use modcard_backend::features::cache::SystemClock;
use modcard_backend::features::platform::client::RestPlatformClient;
use modcard_backend::{AppState, ShutdownManager, build_router, config::AppConfig};
use tower_http::compression::CompressionLayer;

fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    // PNG 已经是压缩格式，SVG/JSON 仍然压缩。
    SizeAbove::default()
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
}

#[cfg(test)]
mod compression_predicate_tests {
    use super::compression_predicate;
    use axum::body::Body;
    use axum::http::{Response as HttpResponse, header};
    use tower_http::compression::predicate::Predicate;

    fn should_compress_for(ct: &str) -> bool {
        // 命中 SizeAbove（默认 32B），避免因为 body 太小导致测试不稳定。
        let body_bytes = vec![b'x'; 2048];
        let resp = HttpResponse::builder()
            .header(header::CONTENT_TYPE, ct)
            .body(Body::from(body_bytes))
            .unwrap();
        compression_predicate().should_compress(&resp)
    }

    #[test]
    fn compression_predicate_disables_png_but_allows_svg() {
        assert!(!should_compress_for("image/png"));
        assert!(should_compress_for("image/svg+xml"));
    }

    #[test]
    fn compression_predicate_allows_json_problems() {
        assert!(should_compress_for("application/json"));
        assert!(should_compress_for("application/problem+json"));
    }
}

#[tokio::main]
async fn main() {
    // Load config
    if let Err(e) = AppConfig::init_global() {
        eprintln!("Config init failed: {e}");
        std::process::exit(1);
    }
    let config = AppConfig::global();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "modcard_backend={},tower_http=info",
                    config.logging.level
                )
                .into()
            }),
        )
        .init();

    let shutdown_manager = ShutdownManager::new();
    if let Err(e) = shutdown_manager.start_signal_handler() {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    let client = match RestPlatformClient::new(&config.platforms) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            tracing::error!("上游客户端初始化失败: {}", e);
            std::process::exit(1);
        }
    };
    let app_state = AppState::from_config(config, client, Arc::new(SystemClock));
    tracing::info!(
        "缓存: ttl={}s, 上限 {} 条; 并发栅格化上限 {}",
        config.cache.ttl_secs,
        config.cache.max_entries,
        config.image.effective_parallelism()
    );

    // 应用内响应压缩：对 SVG/JSON 启用 gzip/brotli，PNG 原样返回。
    let app = build_router(app_state, &config.api.prefix)
        .layer(CompressionLayer::new().compress_when(compression_predicate()));

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!(
        "Badge API: http://{}{}/badge/{{platform}}/{{entity}}/{{id}}/{{stat}}",
        addr,
        config.api.prefix
    );
    tracing::info!(
        "Card API: http://{}{}/card/{{platform}}/{{entity}}/{{id}}",
        addr,
        config.api.prefix
    );

    let graceful = axum::serve(listener, app).with_graceful_shutdown(async move {
        let reason = shutdown_manager.wait_for_shutdown().await;
        tracing::info!("接收到退出信号: {:?}，开始优雅关闭HTTP服务器...", reason);
    });

    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    tracing::info!("服务器已优雅关闭");
}
