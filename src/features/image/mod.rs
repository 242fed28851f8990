//! 徽章、卡片与 PNG 输出。

pub mod badge;
pub mod card;
pub mod handler;
pub mod icons;
pub mod raster;
pub mod sparkline;
pub mod svg;
mod types;

pub use badge::{Badge, render_badge};
pub use card::{CardLayout, CardOptions, render_card};
pub use handler::create_image_router;
pub use raster::Rasterizer;
pub use types::{OutputFormat, StyleQuery};
