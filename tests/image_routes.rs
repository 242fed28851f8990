mod common;

use std::time::Duration;

use axum::http::{StatusCode, header};
use common::{body_bytes, body_json, body_text, get, test_app, test_app_with_prefix};

#[tokio::test]
async fn badge_contract_and_headers() {
    let app = test_app();
    let resp = get(&app.router, "/badge/modrinth/project/sodium/downloads").await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/svg+xml");
    assert_eq!(resp.headers()[header::CACHE_CONTROL], "public, max-age=3600");
    assert!(resp.headers().contains_key("x-request-id"));

    let svg = body_text(resp).await;
    // 7×9+20 + 8×4+20
    assert!(svg.starts_with(r#"<svg width="135" height="20""#), "{svg}");
    let label = svg.find(">Downloads</text>").expect("label");
    let value = svg.find(">1.2K</text>").expect("value");
    assert!(label < value);
    assert!(svg.contains(r##"fill="#1bd96a""##), "brand colour is the default accent");
}

#[tokio::test]
async fn badge_style_options_apply() {
    let app = test_app();
    let svg = body_text(
        get(
            &app.router,
            "/badge/hangar/project/ViaVersion/stars?color=ABC&backgroundColor=0d1117",
        )
        .await,
    )
    .await;
    assert!(svg.contains(">Stars</text>"));
    assert!(svg.contains(">400</text>"));
    assert!(svg.contains(r##"fill="#ABC""##));
    assert!(svg.contains(r##"fill="#0d1117""##));
}

#[tokio::test]
async fn curseforge_slug_is_resolved_once_for_every_stat() {
    let app = test_app();
    let downloads = body_text(get(&app.router, "/badge/curseforge/project/jei/downloads").await).await;
    assert!(downloads.contains(">3.4M</text>"));
    let rank = body_text(get(&app.router, "/badge/curseforge/project/jei/rank").await).await;
    assert!(rank.contains(">#12</text>"));

    assert_eq!(app.upstream.slug_calls(), 1);
    assert_eq!(app.upstream.entity_calls(), 1);
}

#[tokio::test]
async fn cached_entries_expire_after_an_hour() {
    let app = test_app();
    let uri = "/card/modrinth/project/sodium";

    let first = body_text(get(&app.router, uri).await).await;
    assert!(first.contains("live"));

    app.clock.advance(Duration::from_secs(5 * 60));
    let second = body_text(get(&app.router, uri).await).await;
    assert!(second.contains("cached 5m ago"), "{second}");
    assert_eq!(app.upstream.entity_calls(), 1);

    app.clock.advance(Duration::from_secs(3600));
    let third = body_text(get(&app.router, uri).await).await;
    assert!(third.contains("live"));
    assert_eq!(app.upstream.entity_calls(), 2);
}

#[tokio::test]
async fn project_card_lists_capped_versions() {
    let app = test_app();
    let resp = get(&app.router, "/card/modrinth/project/sodium?maxVersions=2&relativeTime=false").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/svg+xml");

    let svg = body_text(resp).await;
    assert!(svg.starts_with(r#"<svg width="450" height="230""#), "{svg}");
    assert!(svg.contains("Latest Versions"));
    // 最新的版本排在最前
    let newest = svg.find("0.5.2").expect("newest version");
    let older = svg.find("0.5.1").expect("second version");
    assert!(newest < older);
    assert!(!svg.contains("0.5.0"));
}

#[tokio::test]
async fn hidden_list_keeps_base_height() {
    let app = test_app();
    let svg = body_text(get(&app.router, "/card/modrinth/project/sodium?showVersions=false").await).await;
    assert!(svg.starts_with(r#"<svg width="450" height="130""#), "{svg}");
    assert!(!svg.contains(r#"id="divider""#));
}

#[tokio::test]
async fn aggregate_card_ranks_top_projects() {
    let app = test_app();
    let svg = body_text(get(&app.router, "/card/modrinth/user/jellysquid").await).await;
    assert!(svg.starts_with(r#"<svg width="450" height="280""#), "{svg}");
    assert!(svg.contains("Top Projects"));
    let lithium = svg.find(">Lithium<").expect("top project");
    let sodium = svg.find(">Sodium<").expect("second project");
    assert!(lithium < sodium);
    assert!(svg.contains(">45</text>"), "total downloads");
}

#[tokio::test]
async fn organization_card_names_v3_projects() {
    let app = test_app();
    let svg = body_text(get(&app.router, "/card/modrinth/organization/caffeinemc").await).await;
    assert!(svg.contains("Top Projects"));
    let sodium = svg.find(">Sodium<").expect("top project");
    let lithium = svg.find(">Lithium<").expect("second project");
    assert!(sodium < lithium);
    assert!(!svg.contains(">Unknown<"), "{svg}");
}

#[tokio::test]
async fn hangar_views_badge_is_compact() {
    let app = test_app();
    let svg = body_text(get(&app.router, "/badge/hangar/project/ViaVersion/views").await).await;
    assert!(svg.contains(">Views</text>"));
    assert!(svg.contains(">12.3K</text>"), "{svg}");

    // 卡片仍只展示前三项统计
    let card = body_text(get(&app.router, "/card/hangar/project/ViaVersion").await).await;
    assert!(card.contains(">Versions<"), "{card}");
    assert!(!card.contains(">Views<"));
}

#[tokio::test]
async fn png_output_is_rasterized() {
    let app = test_app();
    let resp = get(&app.router, "/card/modrinth/project/sodium?format=png").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(resp.headers()[header::CACHE_CONTROL], "public, max-age=3600");

    let bytes = body_bytes(resp).await;
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
    assert_eq!(width, 450);
}

#[tokio::test]
async fn missing_entity_uses_registry_message() {
    let app = test_app();
    let resp = get(&app.router, "/badge/hangar/mod/missing/downloads").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "application/problem+json"
    );
    let json = body_json(resp).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["detail"], "Project not found");
    assert!(json["requestId"].is_string());
}

#[tokio::test]
async fn invalid_inputs_are_bad_requests() {
    let app = test_app();
    for uri in [
        "/badge/github/project/sodium/downloads",
        "/badge/modrinth/project/sodium/stars",
        "/badge/modrinth/project/sodium/downloads?color=zzz",
        "/card/modrinth/project/sodium?maxVersions=21",
        "/card/hangar/organization/paper",
    ] {
        let resp = get(&app.router, uri).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        let json = body_json(resp).await;
        assert_eq!(json["code"], "VALIDATION_FAILED", "{uri}");
    }
    assert_eq!(app.upstream.entity_calls(), 0);
}

#[tokio::test]
async fn api_prefix_nests_business_routes_only() {
    let app = test_app_with_prefix("/api");
    assert_eq!(
        get(&app.router, "/api/badge/modrinth/project/sodium/downloads")
            .await
            .status(),
        StatusCode::OK
    );
    assert_eq!(
        get(&app.router, "/badge/modrinth/project/sodium/downloads")
            .await
            .status(),
        StatusCode::NOT_FOUND
    );

    let health = get(&app.router, "/health").await;
    assert_eq!(health.status(), StatusCode::OK);
    let json = body_json(health).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "modcard-backend");
    assert!(json["cacheEntries"].as_u64().is_some());
}
