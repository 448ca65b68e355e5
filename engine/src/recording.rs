//! A renderer that records draw calls instead of rasterizing them.
//!
//! Tests use it to assert on what a scene drew (texts, clip balance) without comparing pixels.

use crate::graphics::{Color, ImageId, Renderer2d, TextStyle};
use crate::surface::SurfaceSize;
use crate::ui::Rect;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect { rect: Rect, color: Color },
    BlendRect { rect: Rect, color: Color, alpha: u8 },
    RoundedRect { rect: Rect, radius: u32, color: Color },
    Ellipse { bounds: Rect, color: Color },
    Polygon { points: Vec<(i32, i32)>, color: Color },
    Line { from: (i32, i32), to: (i32, i32), thickness: u32, color: Color },
    Text { x: i32, y: i32, text: String, style: TextStyle },
    Image { image: ImageId, dest: Rect },
    PushClip { rect: Rect },
    PopClip,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    size: SurfaceSize,
    commands: Vec<DrawCommand>,
    clip_depth: usize,
    max_clip_depth: usize,
    unbalanced_pops: usize,
}

impl RecordingRenderer {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_text_containing(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| t.contains(needle))
    }

    /// True when every pushed clip was popped and nothing popped an empty stack.
    pub fn clips_balanced(&self) -> bool {
        self.clip_depth == 0 && self.unbalanced_pops == 0
    }

    pub fn max_clip_depth(&self) -> usize {
        self.max_clip_depth
    }
}

impl Renderer2d for RecordingRenderer {
    fn begin_frame(&mut self, size: SurfaceSize) {
        self.size = size;
        self.commands.clear();
        self.clip_depth = 0;
        self.max_clip_depth = 0;
        self.unbalanced_pops = 0;
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn blend_rect(&mut self, rect: Rect, color: Color, alpha: u8) {
        self.commands
            .push(DrawCommand::BlendRect { rect, color, alpha });
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: u32, color: Color) {
        self.commands.push(DrawCommand::RoundedRect {
            rect,
            radius,
            color,
        });
    }

    fn fill_ellipse(&mut self, bounds: Rect, color: Color) {
        self.commands.push(DrawCommand::Ellipse { bounds, color });
    }

    fn fill_polygon(&mut self, points: &[(i32, i32)], color: Color) {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
            color,
        });
    }

    fn line(&mut self, from: (i32, i32), to: (i32, i32), thickness: u32, color: Color) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            thickness,
            color,
        });
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, style: TextStyle) {
        self.commands.push(DrawCommand::Text {
            x,
            y,
            text: text.to_string(),
            style,
        });
    }

    fn blit_image(&mut self, image: ImageId, dest: Rect) -> bool {
        self.commands.push(DrawCommand::Image { image, dest });
        false
    }

    fn push_clip(&mut self, rect: Rect) {
        self.clip_depth += 1;
        self.max_clip_depth = self.max_clip_depth.max(self.clip_depth);
        self.commands.push(DrawCommand::PushClip { rect });
    }

    fn pop_clip(&mut self) {
        if self.clip_depth == 0 {
            self.unbalanced_pops += 1;
        } else {
            self.clip_depth -= 1;
        }
        self.commands.push(DrawCommand::PopClip);
    }
}
