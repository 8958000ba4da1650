//! PNG charts for the analytics endpoints, returned base64-encoded.

use base64::Engine as _;
use image::{DynamicImage, ImageFormat, Pixel, Rgba, RgbaImage};
use logwatch_parser::{MergedSeries, ScatterPoint, Severity};
use std::io::Cursor;

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 600;
const MARGIN: u32 = 50;
const POINT_RADIUS: i64 = 5;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const AXIS: Rgba<u8> = Rgba([90, 90, 90, 255]);
const GRID: Rgba<u8> = Rgba([225, 225, 225, 255]);

/// Series colours for the multi-file chart, reused in order.
const PALETTE: [Rgba<u8>; 8] = [
    Rgba([31, 119, 180, 255]),
    Rgba([255, 127, 14, 255]),
    Rgba([44, 160, 44, 255]),
    Rgba([214, 39, 40, 255]),
    Rgba([148, 103, 189, 255]),
    Rgba([140, 86, 75, 255]),
    Rgba([227, 119, 194, 255]),
    Rgba([127, 127, 127, 255]),
];

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

fn severity_color(severity: Severity) -> Rgba<u8> {
    // 70% opacity so stacked dots stay distinguishable
    match severity {
        Severity::Error => Rgba([220, 20, 20, 178]),
        Severity::Warn => Rgba([255, 165, 0, 178]),
        Severity::Info => Rgba([30, 90, 230, 178]),
        Severity::Debug => Rgba([20, 150, 40, 178]),
        Severity::Other => Rgba([128, 128, 128, 178]),
    }
}

/// Events by hour of day: one dot per record, x = hour, y = jitter.
pub fn severity_scatter(points: &[ScatterPoint]) -> Result<String, RenderError> {
    let mut img = canvas();
    let (plot_w, plot_h) = plot_size();

    for hour in 0..=24 {
        let x = MARGIN + hour * plot_w / 24;
        vline(&mut img, x, GRID);
    }
    axes(&mut img);

    for point in points {
        let x = MARGIN as f64 + (point.hour as f64 + 0.5) / 24.0 * plot_w as f64;
        let y = MARGIN as f64 + (1.0 - point.jitter) * plot_h as f64;
        fill_circle(&mut img, x as i64, y as i64, POINT_RADIUS, severity_color(point.severity));
    }

    encode_png(img)
}

/// Grouped bars: one group per hourly bucket, one bar per file.
pub fn hourly_bars(merged: &MergedSeries) -> Result<String, RenderError> {
    let mut img = canvas();
    let (plot_w, plot_h) = plot_size();

    let buckets = merged.axis.len().max(1) as u32;
    let group_w = plot_w / buckets;
    let files = merged.files.len().max(1) as u32;
    let bar_w = (group_w * 4 / 5 / files).max(1);
    let max_count = merged
        .files
        .iter()
        .flat_map(|f| f.counts.iter().copied())
        .max()
        .unwrap_or(0)
        .max(1);

    for (i, key) in merged.axis.iter().enumerate() {
        // mark day boundaries
        if key.hour == 0 || i == 0 {
            vline(&mut img, MARGIN + i as u32 * group_w, GRID);
        }
    }
    axes(&mut img);

    for (file_idx, file) in merged.files.iter().enumerate() {
        let color = PALETTE[file_idx % PALETTE.len()];
        for (bucket_idx, &count) in file.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let bar_h = (count as u64 * plot_h as u64 / max_count as u64) as u32;
            let x = MARGIN + bucket_idx as u32 * group_w + group_w / 10 + file_idx as u32 * bar_w;
            let y = MARGIN + plot_h - bar_h;
            fill_rect(&mut img, x, y, bar_w, bar_h, color);
        }
    }

    encode_png(img)
}

fn canvas() -> RgbaImage {
    RgbaImage::from_pixel(WIDTH, HEIGHT, BACKGROUND)
}

fn plot_size() -> (u32, u32) {
    (WIDTH - 2 * MARGIN, HEIGHT - 2 * MARGIN)
}

fn axes(img: &mut RgbaImage) {
    let (plot_w, plot_h) = plot_size();
    fill_rect(img, MARGIN, MARGIN + plot_h, plot_w, 2, AXIS);
}

fn vline(img: &mut RgbaImage, x: u32, color: Rgba<u8>) {
    let (_, plot_h) = plot_size();
    fill_rect(img, x, MARGIN, 1, plot_h, color);
}

fn fill_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    for py in y..(y + h).min(img.height()) {
        for px in x..(x + w).min(img.width()) {
            img.get_pixel_mut(px, py).blend(&color);
        }
    }
}

fn fill_circle(img: &mut RgbaImage, cx: i64, cy: i64, r: i64, color: Rgba<u8>) {
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy > r * r {
                continue;
            }
            let (px, py) = (cx + dx, cy + dy);
            if px < 0 || py < 0 || px >= img.width() as i64 || py >= img.height() as i64 {
                continue;
            }
            img.get_pixel_mut(px as u32, py as u32).blend(&color);
        }
    }
}

fn encode_png(img: RgbaImage) -> Result<String, RenderError> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img).write_to(&mut buf, ImageFormat::Png)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(buf.into_inner()))
}
