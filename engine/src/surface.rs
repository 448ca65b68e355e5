use std::convert::Infallible;

use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// A resizable RGBA surface.
///
/// This is the abstraction layer between:
/// - rendering (writing RGBA pixels into `frame_mut()`), and
/// - presentation (showing those pixels in a window, or keeping them for inspection).
///
/// Both the windowed host and headless tests draw through it.
pub trait Surface {
    type Error;

    fn size(&self) -> SurfaceSize;
    fn frame_mut(&mut self) -> &mut [u8];

    fn resize(&mut self, size: SurfaceSize) -> Result<(), Self::Error>;
    fn present(&mut self) -> Result<(), Self::Error>;
}

/// A simple in-memory RGBA surface for headless execution and tests.
#[derive(Debug, Clone)]
pub struct RgbaBufferSurface {
    size: SurfaceSize,
    buf: Vec<u8>,
    presented_frames: u64,
}

impl RgbaBufferSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            buf: vec![0u8; size.rgba_len()],
            presented_frames: 0,
        }
    }

    pub fn frame(&self) -> &[u8] {
        &self.buf
    }

    pub fn presented_frames(&self) -> u64 {
        self.presented_frames
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let idx = ((y as usize) * (self.size.width as usize) + x as usize) * 4;
        let px = self.buf.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn digest(&self) -> String {
        frame_digest(&self.buf)
    }
}

impl Surface for RgbaBufferSurface {
    type Error = Infallible;

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn frame_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), Self::Error> {
        self.size = size;
        self.buf.resize(size.rgba_len(), 0u8);
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.presented_frames = self.presented_frames.saturating_add(1);
        Ok(())
    }
}

/// Hex SHA-256 of an RGBA frame. Two draws of the same state must hash identically.
pub fn frame_digest(frame: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(frame);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_keeps_buffer_length_in_sync() {
        let mut s = RgbaBufferSurface::new(SurfaceSize::new(4, 4));
        assert_eq!(s.frame().len(), 64);
        s.resize(SurfaceSize::new(2, 3)).unwrap();
        assert_eq!(s.frame().len(), 24);
    }

    #[test]
    fn digest_changes_when_a_pixel_changes() {
        let mut s = RgbaBufferSurface::new(SurfaceSize::new(2, 2));
        let before = s.digest();
        s.frame_mut()[0] = 255;
        assert_ne!(before, s.digest());
        assert_eq!(s.digest().len(), 64);
    }

    #[test]
    fn pixel_reads_are_bounds_checked() {
        let s = RgbaBufferSurface::new(SurfaceSize::new(2, 2));
        assert_eq!(s.pixel(1, 1), Some([0, 0, 0, 0]));
        assert_eq!(s.pixel(2, 0), None);
    }
}
