use std::collections::HashMap;

use crate::{surface::SurfaceSize, ui::Rect};

pub type Color = [u8; 4];

// A tiny block font (no external deps). Every font id maps onto it at different weights.
const GLYPH_W: u32 = 3;
const GLYPH_H: u32 = 5;

pub const COLOR_PLACEHOLDER_A: Color = [180, 40, 170, 255];
pub const COLOR_PLACEHOLDER_B: Color = [40, 40, 48, 255];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FontId {
    #[default]
    Body,
    Title,
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub font: FontId,
    /// Line height in pixels.
    pub size: u32,
    pub color: Color,
}

impl TextStyle {
    pub const fn new(font: FontId, size: u32, color: Color) -> Self {
        Self { font, size, color }
    }

    pub const fn body(size: u32, color: Color) -> Self {
        Self::new(FontId::Body, size, color)
    }

    pub const fn title(size: u32, color: Color) -> Self {
        Self::new(FontId::Title, size, color)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub u32);

/// Pixel scale used to rasterize a line of `size` pixels with the block font.
pub fn text_scale(size: u32) -> u32 {
    (size / (GLYPH_H + 1)).max(1)
}

/// Width and height in pixels of `text` drawn at `size` (widest line wins).
pub fn measure_text(text: &str, size: u32) -> (u32, u32) {
    let scale = text_scale(size);
    let adv_x = (GLYPH_W + 1) * scale;
    let adv_y = (GLYPH_H + 1) * scale;
    let mut widest = 0u32;
    let mut lines = 0u32;
    for line in text.split('\n') {
        lines += 1;
        let chars = line.chars().count() as u32;
        widest = widest.max((chars * adv_x).saturating_sub(scale));
    }
    (widest, lines * adv_y)
}

/// Unified 2D rendering interface.
///
/// Game code only talks to this trait. The windowed host backs it with a CPU rasterizer over
/// the `pixels` frame; tests back it with the same rasterizer over an in-memory buffer or with
/// `RecordingRenderer`.
pub trait Renderer2d {
    fn begin_frame(&mut self, size: SurfaceSize);
    fn size(&self) -> SurfaceSize;

    /// Opaque fill.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Alpha-blended rect over existing content (alpha is applied to `color`'s RGB).
    fn blend_rect(&mut self, rect: Rect, color: Color, alpha: u8);

    fn fill_rounded_rect(&mut self, rect: Rect, radius: u32, color: Color);
    fn fill_ellipse(&mut self, bounds: Rect, color: Color);
    fn fill_polygon(&mut self, points: &[(i32, i32)], color: Color);
    fn line(&mut self, from: (i32, i32), to: (i32, i32), thickness: u32, color: Color);
    fn draw_text(&mut self, x: i32, y: i32, text: &str, style: TextStyle);

    /// Draws a registered image scaled into `dest`. Returns `false` when the image is not
    /// available, in which case a placeholder was drawn instead.
    fn blit_image(&mut self, image: ImageId, dest: Rect) -> bool;

    fn push_clip(&mut self, rect: Rect);
    fn pop_clip(&mut self);

    fn rect_outline(&mut self, rect: Rect, color: Color) {
        if rect.is_empty() {
            return;
        }
        self.fill_rect(Rect::new(rect.x, rect.y, rect.w, 1), color);
        self.fill_rect(Rect::new(rect.x, rect.bottom() - 1, rect.w, 1), color);
        self.fill_rect(Rect::new(rect.x, rect.y, 1, rect.h), color);
        self.fill_rect(Rect::new(rect.right() - 1, rect.y, 1, rect.h), color);
    }

    fn fill_circle(&mut self, center: (i32, i32), radius: u32, color: Color) {
        let r = radius as i32;
        self.fill_ellipse(
            Rect::new(center.0 - r, center.1 - r, radius * 2, radius * 2),
            color,
        );
    }

    fn clear(&mut self, color: Color) {
        let s = self.size();
        self.fill_rect(Rect::from_size(s.width, s.height), color);
    }
}

/// Code-drawn stand-in for a missing image asset.
pub fn draw_placeholder(gfx: &mut dyn Renderer2d, dest: Rect) {
    gfx.fill_rect(dest, COLOR_PLACEHOLDER_B);
    let cell = (dest.w.min(dest.h) / 4).max(4);
    let mut y = dest.y;
    let mut row = 0;
    while y < dest.bottom() {
        let mut x = dest.x;
        let mut col = 0;
        while x < dest.right() {
            if (row + col) % 2 == 0 {
                let w = cell.min((dest.right() - x) as u32);
                let h = cell.min((dest.bottom() - y) as u32);
                gfx.fill_rect(Rect::new(x, y, w, h), COLOR_PLACEHOLDER_A);
            }
            x += cell as i32;
            col += 1;
        }
        y += cell as i32;
        row += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize).checked_mul(height as usize)?.checked_mul(4)?;
        (pixels.len() == expected && expected > 0).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    fn sample(&self, u: u32, v: u32) -> Color {
        let idx = ((v.min(self.height - 1) * self.width + u.min(self.width - 1)) * 4) as usize;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }
}

/// CPU renderer that draws into an RGBA frame buffer.
pub struct CpuRenderer<'a> {
    frame: &'a mut [u8],
    size: SurfaceSize,
    clips: Vec<Rect>,
    images: HashMap<ImageId, RgbaImage>,
}

impl<'a> CpuRenderer<'a> {
    pub fn new(frame: &'a mut [u8], size: SurfaceSize) -> Self {
        Self {
            frame,
            size,
            clips: Vec::new(),
            images: HashMap::new(),
        }
    }

    pub fn register_image(&mut self, id: ImageId, image: RgbaImage) {
        self.images.insert(id, image);
    }

    pub fn clip_depth(&self) -> usize {
        self.clips.len()
    }

    fn active_clip(&self) -> Option<Rect> {
        let surface = Rect::from_size(self.size.width, self.size.height);
        match self.clips.last() {
            Some(clip) => clip.intersection(&surface),
            None if surface.is_empty() => None,
            None => Some(surface),
        }
    }

    fn frame_ok(&self) -> bool {
        self.size.rgba_len() > 0 && self.frame.len() >= self.size.rgba_len()
    }

    /// Paints the half-open span `[x0, x1)` on row `y`, honoring the clip stack.
    fn span(&mut self, y: i32, x0: i32, x1: i32, color: Color, alpha: u8) {
        let Some(clip) = self.active_clip() else {
            return;
        };
        if y < clip.y || y >= clip.bottom() {
            return;
        }
        let x0 = x0.max(clip.x);
        let x1 = x1.min(clip.right());
        if x0 >= x1 {
            return;
        }
        let stride = self.size.width as usize * 4;
        let row_start = y as usize * stride;
        let start = row_start + x0 as usize * 4;
        let end = row_start + x1 as usize * 4;
        let row = &mut self.frame[start..end];
        if alpha == 255 {
            for px in row.chunks_exact_mut(4) {
                px.copy_from_slice(&color);
            }
            return;
        }
        let a = alpha as u32;
        let inv = 255 - a;
        for px in row.chunks_exact_mut(4) {
            for c in 0..3 {
                px[c] = ((px[c] as u32 * inv + color[c] as u32 * a + 127) / 255) as u8;
            }
            px[3] = 255;
        }
    }

    fn fill_rect_alpha(&mut self, rect: Rect, color: Color, alpha: u8) {
        if !self.frame_ok() || rect.is_empty() || alpha == 0 {
            return;
        }
        for y in rect.y..rect.bottom() {
            self.span(y, rect.x, rect.right(), color, alpha);
        }
    }

    fn draw_char(&mut self, x: i32, y: i32, ch: char, color: Color, scale: u32, bold: bool) {
        let rows = glyph_rows(ch);
        let s = scale as i32;
        for (row, bits) in rows.into_iter().enumerate() {
            let py0 = y + row as i32 * s;
            for col in 0..GLYPH_W {
                let mask = 1u8 << (GLYPH_W - 1 - col);
                if (bits & mask) == 0 {
                    continue;
                }
                let px0 = x + col as i32 * s;
                let extra = if bold { (s / 3).max(1) } else { 0 };
                for dy in 0..s {
                    self.span(py0 + dy, px0, px0 + s + extra, color, 255);
                }
            }
        }
    }
}

impl Renderer2d for CpuRenderer<'_> {
    fn begin_frame(&mut self, size: SurfaceSize) {
        self.size = size;
        self.clips.clear();
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.fill_rect_alpha(rect, color, 255);
    }

    fn blend_rect(&mut self, rect: Rect, color: Color, alpha: u8) {
        self.fill_rect_alpha(rect, color, alpha);
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: u32, color: Color) {
        if !self.frame_ok() || rect.is_empty() {
            return;
        }
        let r = radius.min(rect.w / 2).min(rect.h / 2) as i32;
        if r == 0 {
            self.fill_rect(rect, color);
            return;
        }
        let rf = r as f32;
        for y in rect.y..rect.bottom() {
            let from_top = y - rect.y;
            let from_bottom = rect.bottom() - 1 - y;
            let edge = from_top.min(from_bottom);
            let inset = if edge < r {
                let dy = rf - (edge as f32 + 0.5);
                (rf - (rf * rf - dy * dy).max(0.0).sqrt()).round() as i32
            } else {
                0
            };
            self.span(y, rect.x + inset, rect.right() - inset, color, 255);
        }
    }

    fn fill_ellipse(&mut self, bounds: Rect, color: Color) {
        if !self.frame_ok() || bounds.is_empty() {
            return;
        }
        let rx = bounds.w as f32 / 2.0;
        let ry = bounds.h as f32 / 2.0;
        let cx = bounds.x as f32 + rx;
        let cy = bounds.y as f32 + ry;
        for y in bounds.y..bounds.bottom() {
            let ny = (y as f32 + 0.5 - cy) / ry;
            let t = 1.0 - ny * ny;
            if t <= 0.0 {
                continue;
            }
            let half = rx * t.sqrt();
            let x0 = (cx - half).round() as i32;
            let x1 = (cx + half).round() as i32;
            self.span(y, x0, x1, color, 255);
        }
    }

    fn fill_polygon(&mut self, points: &[(i32, i32)], color: Color) {
        if !self.frame_ok() || points.len() < 3 {
            return;
        }
        let min_y = points.iter().map(|p| p.1).min().unwrap_or(0);
        let max_y = points.iter().map(|p| p.1).max().unwrap_or(0);
        let mut crossings: Vec<f32> = Vec::with_capacity(points.len());
        for y in min_y..max_y {
            let sy = y as f32 + 0.5;
            crossings.clear();
            for i in 0..points.len() {
                let (x0, y0) = points[i];
                let (x1, y1) = points[(i + 1) % points.len()];
                let (fy0, fy1) = (y0 as f32, y1 as f32);
                if (fy0 <= sy && fy1 > sy) || (fy1 <= sy && fy0 > sy) {
                    let t = (sy - fy0) / (fy1 - fy0);
                    crossings.push(x0 as f32 + t * (x1 - x0) as f32);
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for pair in crossings.chunks_exact(2) {
                self.span(y, pair[0].round() as i32, pair[1].round() as i32, color, 255);
            }
        }
    }

    fn line(&mut self, from: (i32, i32), to: (i32, i32), thickness: u32, color: Color) {
        let t = thickness.max(1) as f32 / 2.0;
        let dx = (to.0 - from.0) as f32;
        let dy = (to.1 - from.1) as f32;
        let len = (dx * dx + dy * dy).sqrt();
        if len < 0.5 {
            let half = t.ceil() as i32;
            self.fill_rect(
                Rect::new(from.0 - half, from.1 - half, (half * 2) as u32, (half * 2) as u32),
                color,
            );
            return;
        }
        let nx = -dy / len * t;
        let ny = dx / len * t;
        let quad = [
            (
                (from.0 as f32 + nx).round() as i32,
                (from.1 as f32 + ny).round() as i32,
            ),
            (
                (to.0 as f32 + nx).round() as i32,
                (to.1 as f32 + ny).round() as i32,
            ),
            (
                (to.0 as f32 - nx).round() as i32,
                (to.1 as f32 - ny).round() as i32,
            ),
            (
                (from.0 as f32 - nx).round() as i32,
                (from.1 as f32 - ny).round() as i32,
            ),
        ];
        self.fill_polygon(&quad, color);
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, style: TextStyle) {
        if !self.frame_ok() {
            return;
        }
        let scale = text_scale(style.size);
        let adv_x = ((GLYPH_W + 1) * scale) as i32;
        let adv_y = ((GLYPH_H + 1) * scale) as i32;
        let bold = matches!(style.font, FontId::Title);

        let mut cursor_x = x;
        let mut cursor_y = y;
        for ch in text.chars() {
            match ch {
                '\n' => {
                    cursor_x = x;
                    cursor_y += adv_y;
                    continue;
                }
                ' ' => {
                    cursor_x += adv_x;
                    continue;
                }
                _ => {}
            }
            self.draw_char(cursor_x, cursor_y, ch, style.color, scale, bold);
            cursor_x += adv_x;
        }
    }

    fn blit_image(&mut self, image: ImageId, dest: Rect) -> bool {
        if !self.frame_ok() || dest.is_empty() {
            return false;
        }
        let Some(img) = self.images.remove(&image) else {
            draw_placeholder(self, dest);
            return false;
        };
        for dy in 0..dest.h {
            let v = dy * img.height / dest.h;
            for dx in 0..dest.w {
                let u = dx * img.width / dest.w;
                let px = img.sample(u, v);
                let x = dest.x + dx as i32;
                let y = dest.y + dy as i32;
                self.span(y, x, x + 1, [px[0], px[1], px[2], 255], px[3]);
            }
        }
        self.images.insert(image, img);
        true
    }

    fn push_clip(&mut self, rect: Rect) {
        let next = match self.clips.last() {
            Some(current) => current.intersection(&rect).unwrap_or(Rect::new(0, 0, 0, 0)),
            None => rect,
        };
        self.clips.push(next);
    }

    fn pop_clip(&mut self) {
        self.clips.pop();
    }
}

fn glyph_rows(ch: char) -> [u8; GLYPH_H as usize] {
    let c = ch.to_ascii_uppercase();
    match c {
        // Digits
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],

        // Letters
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b111, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b110, 0b100, 0b110, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b101, 0b111, 0b111, 0b111, 0b101],
        'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'R' => [0b111, 0b101, 0b111, 0b110, 0b101],
        'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],

        // Punctuation
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '[' => [0b110, 0b100, 0b100, 0b100, 0b110],
        ']' => [0b011, 0b001, 0b001, 0b001, 0b011],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '?' => [0b111, 0b001, 0b010, 0b000, 0b010],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '*' => [0b000, 0b101, 0b010, 0b101, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '<' => [0b001, 0b010, 0b100, 0b010, 0b001],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],

        _ => [0b111, 0b001, 0b010, 0b000, 0b010], // '?'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * width + x) * 4) as usize;
        [frame[i], frame[i + 1], frame[i + 2], frame[i + 3]]
    }

    #[test]
    fn fill_rect_clips_negative_origins() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut gfx = CpuRenderer::new(&mut frame, SurfaceSize::new(4, 4));
        gfx.fill_rect(Rect::new(-2, -2, 3, 3), [9, 9, 9, 255]);
        assert_eq!(pixel(&frame, 4, 0, 0), [9, 9, 9, 255]);
        assert_eq!(pixel(&frame, 4, 1, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn clip_stack_limits_and_restores_drawing() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        let mut gfx = CpuRenderer::new(&mut frame, SurfaceSize::new(8, 8));
        gfx.push_clip(Rect::new(2, 2, 2, 2));
        gfx.fill_rect(Rect::from_size(8, 8), [1, 2, 3, 255]);
        assert_eq!(gfx.clip_depth(), 1);
        gfx.pop_clip();
        gfx.fill_rect(Rect::new(7, 7, 1, 1), [4, 5, 6, 255]);
        assert_eq!(pixel(&frame, 8, 2, 2), [1, 2, 3, 255]);
        assert_eq!(pixel(&frame, 8, 1, 1), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 8, 7, 7), [4, 5, 6, 255]);
    }

    #[test]
    fn nested_disjoint_clips_draw_nothing() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        let mut gfx = CpuRenderer::new(&mut frame, SurfaceSize::new(8, 8));
        gfx.push_clip(Rect::new(0, 0, 2, 2));
        gfx.push_clip(Rect::new(4, 4, 2, 2));
        gfx.fill_rect(Rect::from_size(8, 8), [7, 7, 7, 255]);
        assert!(frame.iter().all(|&b| b == 0));
    }

    #[test]
    fn ellipse_covers_center_but_not_corners() {
        let mut frame = vec![0u8; 10 * 10 * 4];
        let mut gfx = CpuRenderer::new(&mut frame, SurfaceSize::new(10, 10));
        gfx.fill_ellipse(Rect::from_size(10, 10), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 10, 5, 5), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 10, 0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn polygon_fills_triangle_interior() {
        let mut frame = vec![0u8; 10 * 10 * 4];
        let mut gfx = CpuRenderer::new(&mut frame, SurfaceSize::new(10, 10));
        gfx.fill_polygon(&[(0, 0), (10, 0), (0, 10)], [0, 255, 0, 255]);
        assert_eq!(pixel(&frame, 10, 1, 1), [0, 255, 0, 255]);
        assert_eq!(pixel(&frame, 10, 9, 9), [0, 0, 0, 0]);
    }

    #[test]
    fn missing_image_draws_placeholder() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        let mut gfx = CpuRenderer::new(&mut frame, SurfaceSize::new(8, 8));
        assert!(!gfx.blit_image(ImageId(3), Rect::from_size(8, 8)));
        assert_eq!(pixel(&frame, 8, 0, 0), COLOR_PLACEHOLDER_A);
    }

    #[test]
    fn registered_image_is_scaled_into_destination() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut gfx = CpuRenderer::new(&mut frame, SurfaceSize::new(4, 4));
        let img = RgbaImage::new(1, 1, vec![10, 20, 30, 255]).unwrap();
        gfx.register_image(ImageId(1), img);
        assert!(gfx.blit_image(ImageId(1), Rect::from_size(4, 4)));
        assert_eq!(pixel(&frame, 4, 3, 3), [10, 20, 30, 255]);
    }

    #[test]
    fn measure_text_uses_widest_line() {
        let (w, h) = measure_text("AB\nABCD", 12);
        // scale 2: advance 8 per glyph, minus trailing gap.
        assert_eq!(w, 4 * 8 - 2);
        assert_eq!(h, 2 * 12);
    }
}
