#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response};
use chrono::Utc;
use futures_util::future::BoxFuture;
use modcard_backend::config::ImageRenderConfig;
use modcard_backend::features::cache::{ManualClock, StatsCache};
use modcard_backend::features::image::Rasterizer;
use modcard_backend::features::platform::client::PlatformClient;
use modcard_backend::features::platform::{EntityType, Platform};
use modcard_backend::features::stats::StatsService;
use modcard_backend::{AppError, AppState, build_router};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

/// 内存中的上游平台：按 (平台, 实体, ID) 返回预置数据并记录调用次数
#[derive(Default)]
pub struct FakeUpstream {
    pub entities: HashMap<(Platform, EntityType, String), Value>,
    pub children: HashMap<(Platform, String), Vec<Value>>,
    pub versions: HashMap<(Platform, String), Vec<Value>>,
    pub slugs: HashMap<(Platform, String), String>,
    pub entity_calls: AtomicUsize,
    pub slug_calls: AtomicUsize,
}

impl FakeUpstream {
    pub fn entity_calls(&self) -> usize {
        self.entity_calls.load(Ordering::SeqCst)
    }

    pub fn slug_calls(&self) -> usize {
        self.slug_calls.load(Ordering::SeqCst)
    }
}

impl PlatformClient for FakeUpstream {
    fn fetch_entity<'a>(
        &'a self,
        platform: Platform,
        entity: EntityType,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Value>, AppError>> {
        self.entity_calls.fetch_add(1, Ordering::SeqCst);
        let found = self.entities.get(&(platform, entity, id.to_string())).cloned();
        Box::pin(async move { Ok(found) })
    }

    fn fetch_children<'a>(
        &'a self,
        platform: Platform,
        _entity: EntityType,
        id: &'a str,
        _primary: &'a Value,
    ) -> BoxFuture<'a, Result<Vec<Value>, AppError>> {
        let list = self
            .children
            .get(&(platform, id.to_string()))
            .cloned()
            .unwrap_or_default();
        Box::pin(async move { Ok(list) })
    }

    fn fetch_versions<'a>(
        &'a self,
        platform: Platform,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Value>, AppError>> {
        let list = self
            .versions
            .get(&(platform, id.to_string()))
            .cloned()
            .unwrap_or_default();
        Box::pin(async move { Ok(list) })
    }

    fn lookup_slug<'a>(
        &'a self,
        platform: Platform,
        _entity: EntityType,
        slug: &'a str,
    ) -> BoxFuture<'a, Result<Option<String>, AppError>> {
        self.slug_calls.fetch_add(1, Ordering::SeqCst);
        let found = self.slugs.get(&(platform, slug.to_string())).cloned();
        Box::pin(async move { Ok(found) })
    }
}

/// 预置几个典型实体：Modrinth 项目、用户与组织，CurseForge 模组，Hangar 项目
pub fn seeded_upstream() -> FakeUpstream {
    let mut up = FakeUpstream::default();

    up.entities.insert(
        (Platform::Modrinth, EntityType::Project, "sodium".into()),
        json!({
            "title": "Sodium",
            "project_type": "mod",
            "downloads": 1234,
            "followers": 56,
            "versions": ["a", "b", "c"]
        }),
    );
    up.versions.insert(
        (Platform::Modrinth, "sodium".into()),
        (0..3)
            .map(|i| {
                json!({
                    "version_number": format!("0.5.{i}"),
                    "date_published": format!("2024-0{}-01T00:00:00Z", i + 1),
                    "loaders": ["fabric"],
                    "game_versions": ["1.20.1", "1.21"],
                    "downloads": 100 * (i + 1)
                })
            })
            .collect(),
    );

    up.entities.insert(
        (Platform::Modrinth, EntityType::User, "jellysquid".into()),
        json!({ "username": "jellysquid" }),
    );
    up.children.insert(
        (Platform::Modrinth, "jellysquid".into()),
        vec![
            json!({ "title": "Sodium", "downloads": 10, "followers": 1, "published": "2024-01-01T00:00:00Z" }),
            json!({ "title": "Lithium", "downloads": 30, "followers": 2, "published": "2024-02-01T00:00:00Z" }),
            json!({ "title": "Phosphor", "downloads": 5, "followers": 0 }),
        ],
    );

    // 组织的子项目来自 v3 接口，显示名字段为 name
    up.entities.insert(
        (Platform::Modrinth, EntityType::Organization, "caffeinemc".into()),
        json!({ "name": "CaffeineMC", "projects": ["AANobbMI", "gvQqBUqZ"] }),
    );
    up.children.insert(
        (Platform::Modrinth, "caffeinemc".into()),
        vec![
            json!({ "name": "Sodium", "downloads": 70, "followers": 4, "published": "2024-01-01T00:00:00Z" }),
            json!({ "name": "Lithium", "downloads": 20, "followers": 1, "published": "2024-03-01T00:00:00Z" }),
        ],
    );

    up.entities.insert(
        (Platform::CurseForge, EntityType::Mod, "238222".into()),
        json!({
            "name": "Just Enough Items (JEI)",
            "classId": 6,
            "downloadCount": 3_400_000,
            "thumbsUpCount": 10,
            "gamePopularityRank": 12,
            "links": { "websiteUrl": "https://www.curseforge.com/minecraft/mc-mods/jei" }
        }),
    );
    up.slugs
        .insert((Platform::CurseForge, "jei".into()), "238222".into());

    up.entities.insert(
        (Platform::Hangar, EntityType::Project, "ViaVersion".into()),
        json!({
            "name": "ViaVersion",
            "namespace": { "owner": "ViaVersion" },
            "stats": { "downloads": 999_950, "stars": 400, "views": 12_345 }
        }),
    );

    up
}

pub struct TestApp {
    pub router: Router,
    pub upstream: Arc<FakeUpstream>,
    pub clock: Arc<ManualClock>,
}

pub fn test_app_with_prefix(prefix: &str) -> TestApp {
    let upstream = Arc::new(seeded_upstream());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let cache = StatsCache::new(Duration::from_secs(3600), 1000, clock.clone());
    let stats = StatsService::new(cache, upstream.clone());
    let rasterizer = Rasterizer::new(&ImageRenderConfig {
        fonts_dir: "tests/no-fonts".into(),
        ..ImageRenderConfig::default()
    });
    let state = AppState::new(stats, Arc::new(rasterizer), 2);
    TestApp {
        router: build_router(state, prefix),
        upstream,
        clock,
    }
}

pub fn test_app() -> TestApp {
    test_app_with_prefix("")
}

pub async fn get(router: &Router, uri: &str) -> Response<Body> {
    router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .expect("oneshot")
}

pub async fn body_bytes(resp: Response<Body>) -> Vec<u8> {
    to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

pub async fn body_text(resp: Response<Body>) -> String {
    String::from_utf8(body_bytes(resp).await).expect("utf-8 body")
}

pub async fn body_json(resp: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).expect("json body")
}
