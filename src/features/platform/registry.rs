use super::{
    Classification, EntityAlias, EntityConfig, EntityType, FieldMap, Platform, PlatformDescriptor,
    StatField, StatKey, Terminology, UrlSource, VersionFields,
};
use crate::features::image::icons::Glyph;

const fn stat(label: &'static str, key: StatKey, slug: &'static str) -> StatField {
    StatField { label, key, slug }
}

const AGGREGATE_STATS: &[StatField] = &[
    stat("Downloads", StatKey::TotalDownloads, "downloads"),
    stat("Followers", StatKey::TotalFollowers, "followers"),
    stat("Projects", StatKey::ProjectCount, "projects"),
];

const MODRINTH_CHILD: FieldMap = FieldMap {
    title: "/name",
    downloads: "/downloads",
    followers: "/followers",
    rank: None,
    views: None,
    version_count: None,
    child_title: "/title",
    child_date: Some("/published"),
    url: None,
};

/// 全部平台描述
pub static DESCRIPTORS: [PlatformDescriptor; 3] = [
    PlatformDescriptor {
        platform: Platform::Modrinth,
        name: "Modrinth",
        default_color: "#1bd96a",
        logo: Glyph::Modrinth,
        logo_uses_brand_color: false,
        entities: &[
            EntityConfig {
                entity: EntityType::Project,
                stats: &[
                    stat("Downloads", StatKey::Downloads, "downloads"),
                    stat("Followers", StatKey::Followers, "followers"),
                    stat("Versions", StatKey::VersionCount, "versions"),
                ],
                fields: FieldMap {
                    title: "/title",
                    downloads: "/downloads",
                    followers: "/followers",
                    rank: None,
                    views: None,
                    version_count: Some("/versions"),
                    child_title: "/title",
                    child_date: None,
                    url: Some(UrlSource::Template("https://modrinth.com/project/{id}")),
                },
            },
            EntityConfig {
                entity: EntityType::User,
                stats: AGGREGATE_STATS,
                fields: FieldMap {
                    title: "/username",
                    url: Some(UrlSource::Template("https://modrinth.com/user/{id}")),
                    ..MODRINTH_CHILD
                },
            },
            EntityConfig {
                entity: EntityType::Organization,
                stats: AGGREGATE_STATS,
                fields: FieldMap {
                    // v3 项目对象只有 name 没有 title
                    child_title: "/name",
                    url: Some(UrlSource::Template("https://modrinth.com/organization/{id}")),
                    ..MODRINTH_CHILD
                },
            },
            EntityConfig {
                entity: EntityType::Collection,
                stats: AGGREGATE_STATS,
                fields: FieldMap {
                    url: Some(UrlSource::Template("https://modrinth.com/collection/{id}")),
                    ..MODRINTH_CHILD
                },
            },
        ],
        aliases: &[EntityAlias {
            from: EntityType::Mod,
            to: EntityType::Project,
        }],
        errors: &[
            (EntityType::Project, "Project not found"),
            (EntityType::User, "User not found"),
            (EntityType::Organization, "Organization not found"),
            (EntityType::Collection, "Collection not found"),
            (EntityType::Mod, "Mod not found"),
        ],
        numeric_ids: &[],
        slug_lookup: &[],
        terminology: Terminology {
            latest_versions: "Latest Versions",
            top_projects: "Top Projects",
        },
        versions: VersionFields {
            number: "/version_number",
            date: "/date_published",
            loaders: "/loaders",
            game_versions: "/game_versions",
            downloads: "/downloads",
        },
        classification: Classification {
            field: "/project_type",
            glyphs: &[
                ("mod", Glyph::Box),
                ("modpack", Glyph::PackageOpen),
                ("resourcepack", Glyph::Paintbrush),
                ("shader", Glyph::Glasses),
                ("plugin", Glyph::Plug),
                ("datapack", Glyph::Datapack),
            ],
            fallback: Glyph::Box,
        },
    },
    PlatformDescriptor {
        platform: Platform::CurseForge,
        name: "CurseForge",
        default_color: "#F16436",
        logo: Glyph::CurseForge,
        logo_uses_brand_color: true,
        entities: &[
            EntityConfig {
                entity: EntityType::Mod,
                stats: &[
                    stat("Downloads", StatKey::Downloads, "downloads"),
                    stat("Rank", StatKey::Rank, "rank"),
                    stat("Files", StatKey::VersionCount, "files"),
                ],
                fields: FieldMap {
                    title: "/name",
                    downloads: "/downloadCount",
                    followers: "/thumbsUpCount",
                    rank: Some("/gamePopularityRank"),
                    views: None,
                    version_count: None,
                    child_title: "/name",
                    child_date: None,
                    url: Some(UrlSource::Pointer("/links/websiteUrl")),
                },
            },
            EntityConfig {
                entity: EntityType::User,
                stats: &[
                    stat("Downloads", StatKey::TotalDownloads, "downloads"),
                    stat("Likes", StatKey::TotalFollowers, "likes"),
                    stat("Projects", StatKey::ProjectCount, "projects"),
                ],
                fields: FieldMap {
                    title: "/username",
                    downloads: "/downloadCount",
                    followers: "/thumbsUpCount",
                    rank: None,
                    views: None,
                    version_count: None,
                    child_title: "/name",
                    child_date: Some("/dateCreated"),
                    url: Some(UrlSource::Format {
                        template: "https://www.curseforge.com/members/{}",
                        pointer: "/username",
                    }),
                },
            },
        ],
        aliases: &[EntityAlias {
            from: EntityType::Project,
            to: EntityType::Mod,
        }],
        errors: &[
            (EntityType::Project, "Mod not found"),
            (EntityType::User, "User not found"),
            (EntityType::Organization, "Organization not found"),
            (EntityType::Collection, "Collection not found"),
            (EntityType::Mod, "Mod not found"),
        ],
        numeric_ids: &[EntityType::Mod, EntityType::User],
        slug_lookup: &[EntityType::Mod],
        terminology: Terminology {
            latest_versions: "Latest Files",
            top_projects: "Top Projects",
        },
        versions: VersionFields {
            number: "/displayName",
            date: "/fileDate",
            loaders: "/modLoaders",
            game_versions: "/gameVersions",
            downloads: "/downloadCount",
        },
        classification: Classification {
            field: "/classId",
            glyphs: &[
                ("5", Glyph::Plug),
                ("6", Glyph::Box),
                ("12", Glyph::Paintbrush),
                ("17", Glyph::Earth),
                ("4471", Glyph::PackageOpen),
                ("4546", Glyph::Glasses),
                ("6552", Glyph::Glasses),
                ("6768", Glyph::Glasses),
                ("6945", Glyph::Datapack),
                ("84200", Glyph::Canvas),
                ("84203", Glyph::Optifine),
            ],
            fallback: Glyph::Box,
        },
    },
    PlatformDescriptor {
        platform: Platform::Hangar,
        name: "Hangar",
        default_color: "#3371ED",
        logo: Glyph::Hangar,
        logo_uses_brand_color: false,
        entities: &[
            EntityConfig {
                entity: EntityType::Project,
                stats: &[
                    stat("Downloads", StatKey::Downloads, "downloads"),
                    stat("Stars", StatKey::Followers, "stars"),
                    stat("Versions", StatKey::VersionCount, "versions"),
                    // 只出现在徽章中，卡片取前三项
                    stat("Views", StatKey::Views, "views"),
                ],
                fields: FieldMap {
                    title: "/name",
                    downloads: "/stats/downloads",
                    followers: "/stats/stars",
                    rank: None,
                    views: Some("/stats/views"),
                    version_count: None,
                    child_title: "/name",
                    child_date: None,
                    url: Some(UrlSource::Format {
                        template: "https://hangar.papermc.io/{}/{id}",
                        pointer: "/namespace/owner",
                    }),
                },
            },
            EntityConfig {
                entity: EntityType::User,
                stats: &[
                    stat("Downloads", StatKey::TotalDownloads, "downloads"),
                    stat("Stars", StatKey::TotalFollowers, "stars"),
                    stat("Projects", StatKey::ProjectCount, "projects"),
                ],
                fields: FieldMap {
                    title: "/name",
                    downloads: "/stats/downloads",
                    followers: "/stats/stars",
                    rank: None,
                    views: None,
                    version_count: None,
                    child_title: "/name",
                    child_date: Some("/createdAt"),
                    url: Some(UrlSource::Template("https://hangar.papermc.io/{id}")),
                },
            },
        ],
        aliases: &[EntityAlias {
            from: EntityType::Mod,
            to: EntityType::Project,
        }],
        errors: &[
            (EntityType::Project, "Project not found"),
            (EntityType::User, "User not found"),
            (EntityType::Organization, "Organization not found"),
            (EntityType::Collection, "Collection not found"),
            (EntityType::Mod, "Project not found"),
        ],
        numeric_ids: &[],
        slug_lookup: &[],
        terminology: Terminology {
            latest_versions: "Latest Versions",
            top_projects: "Top Projects",
        },
        versions: VersionFields {
            number: "/name",
            date: "/createdAt",
            loaders: "/platformDependencies",
            game_versions: "/platformDependencies/PAPER",
            downloads: "/stats/totalDownloads",
        },
        classification: Classification {
            field: "/category",
            glyphs: &[
                ("admin_tools", Glyph::Plug),
                ("dev_tools", Glyph::Datapack),
                ("world_management", Glyph::Earth),
                ("games", Glyph::Box),
                ("gameplay", Glyph::Box),
                ("chat", Glyph::User),
            ],
            fallback: Glyph::Plug,
        },
    },
];
