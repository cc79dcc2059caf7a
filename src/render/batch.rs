//! Rect batch contract and the software pixel-buffer backend.
//!
//! Both backends accumulate many small rectangle draws and commit them in a
//! single flush at `end`, so per-frame cost is one upload/blit rather than
//! one call per rectangle. Backend choice happens once at construction and
//! is invisible to callers.

use std::collections::HashMap;

use tracing::warn;

use super::accel::AccelBatch;

/// Batched rectangle drawing. Coordinates are CSS pixels; backends convert
/// to device pixels once per frame. Colors are packed `0xRRGGBBAA`.
pub trait RectBatch {
    fn begin(&mut self, width: f32, height: f32, scale_factor: f32);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: u32);
    /// Flushes the accumulated rectangles and composites the frame.
    fn end(&mut self);
}

/// Receives the software backend's finished frame. Pixels are packed
/// `0xAARRGGBB` rows, `width * height` long, in device pixels.
pub trait PresentTarget {
    fn present(&mut self, pixels: &[u32], width: u32, height: u32);
}

/// Swallows frames; useful for measurements and tests.
pub struct NullPresent;

impl PresentTarget for NullPresent {
    fn present(&mut self, _pixels: &[u32], _width: u32, _height: u32) {}
}

/// Everything the accelerated backend needs from the embedder. Acquiring an
/// adapter is the embedder's problem; when it has none to offer the factory
/// goes straight to the software path.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub format: wgpu::TextureFormat,
}

/// Builds a batch renderer, preferring the accelerated path and falling
/// back to software transparently on any initialization failure. Callers
/// never learn which backend is active.
pub fn create_batch(gpu: Option<GpuContext>, target: Box<dyn PresentTarget>) -> Box<dyn RectBatch> {
    if let Some(gpu) = gpu {
        match AccelBatch::try_new(gpu) {
            Ok(batch) => return Box::new(batch),
            Err(err) => {
                warn!(%err, "accelerated rect backend unavailable, using software path");
            }
        }
    }
    Box::new(SoftwareBatch::new(target))
}

pub struct SoftwareBatch {
    target: Box<dyn PresentTarget>,
    pixels: Vec<u32>,
    width: u32,
    height: u32,
    scale: f32,
    /// Packed device-pixel value per discrete input color key.
    packed_cache: HashMap<u32, u32>,
}

impl SoftwareBatch {
    pub fn new(target: Box<dyn PresentTarget>) -> Self {
        Self {
            target,
            pixels: Vec::new(),
            width: 0,
            height: 0,
            scale: 1.0,
            packed_cache: HashMap::new(),
        }
    }

    /// Device-pixel contents of the frame being built (or just presented).
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn device_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl RectBatch for SoftwareBatch {
    fn begin(&mut self, width: f32, height: f32, scale_factor: f32) {
        self.scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        self.width = ((width * self.scale).round() as u32).max(1);
        self.height = ((height * self.scale).round() as u32).max(1);
        self.pixels.clear();
        self.pixels.resize((self.width * self.height) as usize, 0);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: u32) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let x0 = ((x * self.scale).round() as i64).clamp(0, self.width as i64) as u32;
        let y0 = ((y * self.scale).round() as i64).clamp(0, self.height as i64) as u32;
        let x1 = (((x + w) * self.scale).round() as i64).clamp(0, self.width as i64) as u32;
        let y1 = (((y + h) * self.scale).round() as i64).clamp(0, self.height as i64) as u32;
        if x1 <= x0 || y1 <= y0 {
            return;
        }
        let packed = *self
            .packed_cache
            .entry(color)
            .or_insert_with(|| pack_argb(color));
        for row in y0..y1 {
            let start = (row * self.width + x0) as usize;
            let end = (row * self.width + x1) as usize;
            self.pixels[start..end].fill(packed);
        }
    }

    fn end(&mut self) {
        self.target.present(&self.pixels, self.width, self.height);
    }
}

/// `0xRRGGBBAA` -> `0xAARRGGBB` (the usual 32-bit framebuffer layout).
fn pack_argb(rgba: u32) -> u32 {
    let r = (rgba >> 24) & 0xFF;
    let g = (rgba >> 16) & 0xFF;
    let b = (rgba >> 8) & 0xFF;
    let a = rgba & 0xFF;
    (a << 24) | (r << 16) | (g << 8) | b
}
