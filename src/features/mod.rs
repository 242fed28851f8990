pub mod cache;
pub mod health;
pub mod image;
pub mod meta;
pub mod platform;
pub mod stats;
pub mod theme;
