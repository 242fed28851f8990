//! SVG → PNG 栅格化。
//!
//! 字体在启动时一次性读入内存（逐个文件读取，读完即释放句柄），之后所有渲染共享同一个
//! 字体库。栅格化是 CPU 密集操作，异步调用方应通过 [`Rasterizer::render_png_async`]
//! 把它移出 tokio worker。

use std::fs;
use std::path::Path;
use std::sync::Arc;

use resvg::usvg::{self, Options as UsvgOptions, fontdb};
use resvg::{
    render,
    tiny_skia::{Pixmap, Transform},
};

use crate::config::ImageRenderConfig;
use crate::error::AppError;

/// 按最大宽度等比缩放，不放大；返回 (宽, 高, 缩放系数)
pub fn fit_to_width(width: u32, height: u32, max_width: u32) -> (u32, u32, f32) {
    if max_width == 0 || width <= max_width {
        return (width, height, 1.0);
    }
    let scale = max_width as f32 / width as f32;
    let h = ((height as f32 * scale).round() as u32).max(1);
    (max_width, h, scale)
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
}

/// 加载字体目录；目录缺失或单个文件读取失败只记录告警
fn load_font_db(config: &ImageRenderConfig) -> fontdb::Database {
    let mut db = fontdb::Database::new();
    if config.load_system_fonts {
        db.load_system_fonts();
    }

    let dir = config.fonts_path();
    match fs::read_dir(&dir) {
        Ok(entries) => {
            for path in entries.flatten().map(|e| e.path()) {
                if !path.is_file() || !is_font_file(&path) {
                    continue;
                }
                match fs::read(&path) {
                    Ok(data) => db.load_font_data(data),
                    Err(e) => tracing::error!("加载字体文件失败 '{}': {}", path.display(), e),
                }
            }
        }
        Err(e) => tracing::warn!("字体目录不可用 '{}': {}", dir.display(), e),
    }

    let family = config.default_font_family.clone();
    db.set_sans_serif_family(family.clone());
    db.set_serif_family(family);

    if db.is_empty() {
        tracing::warn!("未加载任何字体，PNG 输出中的文字将不可见");
    } else {
        tracing::info!("已加载 {} 个字体 face", db.len());
    }
    db
}

/// tiny-skia 的像素是预乘 alpha，PNG 读取方按直通 alpha 解释，编码前需还原
fn demultiplied_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    data
}

/// 栅格化器（进程内共享，内部只读）
pub struct Rasterizer {
    font_db: Arc<fontdb::Database>,
    default_family: String,
    max_width: u32,
    optimize_speed: bool,
}

impl Rasterizer {
    pub fn new(config: &ImageRenderConfig) -> Self {
        Self {
            font_db: Arc::new(load_font_db(config)),
            default_family: config.default_font_family.clone(),
            max_width: config.max_width,
            optimize_speed: config.optimize_speed,
        }
    }

    pub fn max_width(&self) -> u32 {
        self.max_width
    }

    fn options(&self) -> UsvgOptions<'_> {
        let speed = self.optimize_speed;
        UsvgOptions {
            fontdb: self.font_db.clone(),
            font_family: self.default_family.clone(),
            shape_rendering: if speed {
                usvg::ShapeRendering::OptimizeSpeed
            } else {
                usvg::ShapeRendering::GeometricPrecision
            },
            text_rendering: if speed {
                usvg::TextRendering::OptimizeSpeed
            } else {
                usvg::TextRendering::OptimizeLegibility
            },
            ..Default::default()
        }
    }

    /// 同步渲染（阻塞当前线程）
    pub fn render_png(&self, svg: &str) -> Result<Vec<u8>, AppError> {
        let t0 = std::time::Instant::now();

        let tree = usvg::Tree::from_data(svg.as_bytes(), &self.options())
            .map_err(|e| AppError::ImageRendererError(format!("Failed to parse SVG: {e}")))?;
        let t_parse = t0.elapsed();

        let src = tree.size().to_int_size();
        let (dst_w, dst_h, scale) = fit_to_width(src.width(), src.height(), self.max_width);
        let mut pixmap = Pixmap::new(dst_w, dst_h)
            .ok_or_else(|| AppError::ImageRendererError("Failed to create pixmap".to_string()))?;
        render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
        let rgba = demultiplied_rgba(&pixmap);
        let t_raster = t0.elapsed();

        let mut out = Vec::with_capacity((dst_w * dst_h) as usize);
        {
            let mut encoder = png::Encoder::new(&mut out, dst_w, dst_h);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            if self.optimize_speed {
                encoder.set_compression(png::Compression::Fast);
                encoder.set_filter(png::FilterType::NoFilter);
            } else {
                encoder.set_compression(png::Compression::Default);
                encoder.set_filter(png::FilterType::Paeth);
            }
            let mut writer = encoder
                .write_header()
                .map_err(|e| AppError::ImageRendererError(format!("PNG write_header error: {e}")))?;
            writer.write_image_data(&rgba).map_err(|e| {
                AppError::ImageRendererError(format!("PNG write_image_data error: {e}"))
            })?;
            writer
                .finish()
                .map_err(|e| AppError::ImageRendererError(format!("PNG finish error: {e}")))?;
        }

        tracing::debug!(
            "PNG渲染分段: 解析={:?}, 栅格化={:?}, 编码={:?}, 尺寸={}x{}",
            t_parse,
            t_raster - t_parse,
            t0.elapsed() - t_raster,
            dst_w,
            dst_h
        );
        Ok(out)
    }

    /// 在阻塞线程池中渲染
    pub async fn render_png_async(self: Arc<Self>, svg: String) -> Result<Vec<u8>, AppError> {
        tokio::task::spawn_blocking(move || self.render_png(&svg))
            .await
            .map_err(|e| AppError::Internal(format!("渲染任务异常退出: {e}")))?
    }
}
