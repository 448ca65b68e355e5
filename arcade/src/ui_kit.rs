//! Shared drawing pieces: palette, panels, buttons, grid layout and menu lists.

use engine::graphics::{Color, Renderer2d, TextStyle, measure_text};
use engine::input::{InputEvent, Key};
use engine::surface::SurfaceSize;
use engine::ui::{Anchor, Insets, Rect, Size};

pub const COLOR_BG: Color = [18, 18, 26, 255];
pub const COLOR_PANEL_BG: Color = [28, 28, 40, 255];
pub const COLOR_PANEL_BORDER: Color = [60, 60, 84, 255];
pub const COLOR_BUTTON: Color = [52, 70, 120, 255];
pub const COLOR_BUTTON_SELECTED: Color = [84, 110, 190, 255];
pub const COLOR_BUTTON_DISABLED: Color = [44, 44, 56, 255];
pub const COLOR_TEXT: Color = [235, 235, 245, 255];
pub const COLOR_TEXT_DIM: Color = [150, 150, 170, 255];
pub const COLOR_ACCENT: Color = [255, 200, 60, 255];
pub const COLOR_GOOD: Color = [90, 210, 120, 255];
pub const COLOR_BAD: Color = [230, 80, 80, 255];
pub const COLOR_OVERLAY: Color = [0, 0, 0, 255];
pub const OVERLAY_ALPHA: u8 = 170;

pub const TEXT_SMALL: u32 = 12;
pub const TEXT_BODY: u32 = 18;
pub const TEXT_TITLE: u32 = 30;

pub const HEADER_HEIGHT: u32 = 56;
const BUTTON_RADIUS: u32 = 6;

pub fn screen_rect(size: SurfaceSize) -> Rect {
    Rect::from_size(size.width, size.height)
}

pub fn text_centered(gfx: &mut dyn Renderer2d, area: Rect, text: &str, style: TextStyle) {
    let (w, h) = measure_text(text, style.size);
    let placed = area.place(Size::new(w, h), Anchor::Center);
    gfx.draw_text(placed.x, placed.y, text, style);
}

pub fn panel(gfx: &mut dyn Renderer2d, rect: Rect) {
    gfx.fill_rounded_rect(rect, 8, COLOR_PANEL_BORDER);
    gfx.fill_rounded_rect(rect.inset(Insets::all(2)), 7, COLOR_PANEL_BG);
}

/// Dims the whole surface, for pause and result overlays.
pub fn dim(gfx: &mut dyn Renderer2d) {
    let s = gfx.size();
    gfx.blend_rect(screen_rect(s), COLOR_OVERLAY, OVERLAY_ALPHA);
}

/// Title bar with the scene name on the left and the coin balance on the right.
pub fn header(gfx: &mut dyn Renderer2d, title: &str, coins: u64) -> Rect {
    let s = gfx.size();
    let bar = Rect::new(0, 0, s.width, HEADER_HEIGHT);
    gfx.fill_rect(bar, COLOR_PANEL_BG);
    gfx.fill_rect(Rect::new(0, bar.bottom() - 2, s.width, 2), COLOR_PANEL_BORDER);
    let style = TextStyle::title(TEXT_BODY + 6, COLOR_TEXT);
    let (_, th) = measure_text(title, style.size);
    gfx.draw_text(16, (HEADER_HEIGHT.saturating_sub(th) / 2) as i32, title, style);

    let coins_text = format!("COINS {coins}");
    let coin_style = TextStyle::body(TEXT_BODY, COLOR_ACCENT);
    let (cw, ch) = measure_text(&coins_text, coin_style.size);
    gfx.draw_text(
        s.width as i32 - cw as i32 - 16,
        (HEADER_HEIGHT.saturating_sub(ch) / 2) as i32,
        &coins_text,
        coin_style,
    );
    bar
}

/// The play area below the header.
pub fn body_rect(size: SurfaceSize) -> Rect {
    Rect::new(
        0,
        HEADER_HEIGHT as i32,
        size.width,
        size.height.saturating_sub(HEADER_HEIGHT),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonLook {
    Normal,
    Selected,
    Disabled,
}

pub fn button(gfx: &mut dyn Renderer2d, rect: Rect, label: &str, look: ButtonLook) {
    let (fill, text) = match look {
        ButtonLook::Normal => (COLOR_BUTTON, COLOR_TEXT),
        ButtonLook::Selected => (COLOR_BUTTON_SELECTED, COLOR_TEXT),
        ButtonLook::Disabled => (COLOR_BUTTON_DISABLED, COLOR_TEXT_DIM),
    };
    gfx.fill_rounded_rect(rect, BUTTON_RADIUS, fill);
    text_centered(gfx, rect, label, TextStyle::body(TEXT_BODY, text));
}

/// A vertical list of labelled entries with keyboard selection, used by every scene menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuList {
    items: Vec<String>,
    selected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuInput {
    Activated(usize),
    Moved,
    Ignored,
}

impl MenuList {
    pub const ITEM_W: u32 = 320;
    pub const ITEM_H: u32 = 44;
    pub const GAP: u32 = 10;

    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            selected: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn set_label(&mut self, index: usize, label: impl Into<String>) {
        if let Some(item) = self.items.get_mut(index) {
            *item = label.into();
        }
    }

    pub fn item_rects(&self, area: Rect) -> Vec<Rect> {
        let n = self.items.len() as u32;
        let total_h = n * Self::ITEM_H + n.saturating_sub(1) * Self::GAP;
        let column = area.place(Size::new(Self::ITEM_W, total_h), Anchor::Center);
        (0..n)
            .map(|i| {
                Rect::new(
                    column.x,
                    column.y + (i * (Self::ITEM_H + Self::GAP)) as i32,
                    column.w,
                    Self::ITEM_H,
                )
            })
            .collect()
    }

    pub fn handle(&mut self, event: &InputEvent, area: Rect) -> MenuInput {
        if self.items.is_empty() {
            return MenuInput::Ignored;
        }
        match event {
            InputEvent::KeyDown { key } => match key {
                Key::Up | Key::Char('w') => {
                    self.selected = (self.selected + self.items.len() - 1) % self.items.len();
                    MenuInput::Moved
                }
                Key::Down | Key::Char('s') | Key::Tab => {
                    self.selected = (self.selected + 1) % self.items.len();
                    MenuInput::Moved
                }
                Key::Enter | Key::Space => MenuInput::Activated(self.selected),
                _ => MenuInput::Ignored,
            },
            InputEvent::MouseMove { pos } => {
                match self.hit(area, *pos) {
                    Some(i) if i != self.selected => {
                        self.selected = i;
                        MenuInput::Moved
                    }
                    _ => MenuInput::Ignored,
                }
            }
            InputEvent::MouseDown { pos, .. } => match self.hit(area, *pos) {
                Some(i) => {
                    self.selected = i;
                    MenuInput::Activated(i)
                }
                None => MenuInput::Ignored,
            },
            _ => MenuInput::Ignored,
        }
    }

    fn hit(&self, area: Rect, pos: (i32, i32)) -> Option<usize> {
        self.item_rects(area)
            .iter()
            .position(|r| r.contains(pos.0, pos.1))
    }

    pub fn draw(&self, gfx: &mut dyn Renderer2d, area: Rect) {
        for (i, (rect, label)) in self.item_rects(area).iter().zip(&self.items).enumerate() {
            let look = if i == self.selected {
                ButtonLook::Selected
            } else {
                ButtonLook::Normal
            };
            button(gfx, *rect, label, look);
        }
    }
}

/// Square-cell grid fitted and centered inside an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub origin: (i32, i32),
    pub cell: u32,
    pub cols: u32,
    pub rows: u32,
}

impl GridLayout {
    pub fn fit(area: Rect, cols: u32, rows: u32, max_cell: u32) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let cell = (area.w / cols).min(area.h / rows).clamp(1, max_cell.max(1));
        let board = area.place(Size::new(cell * cols, cell * rows), Anchor::Center);
        Self {
            origin: (board.x, board.y),
            cell,
            cols,
            rows,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.origin.0,
            self.origin.1,
            self.cell * self.cols,
            self.cell * self.rows,
        )
    }

    pub fn cell_rect(&self, col: u32, row: u32) -> Rect {
        Rect::new(
            self.origin.0 + (col * self.cell) as i32,
            self.origin.1 + (row * self.cell) as i32,
            self.cell,
            self.cell,
        )
    }

    pub fn cell_at(&self, pos: (i32, i32)) -> Option<(u32, u32)> {
        if !self.bounds().contains(pos.0, pos.1) {
            return None;
        }
        let col = (pos.0 - self.origin.0) as u32 / self.cell;
        let row = (pos.1 - self.origin.1) as u32 / self.cell;
        Some((col, row))
    }
}

/// A one-line status strip at the bottom of the body area.
pub fn footer_hint(gfx: &mut dyn Renderer2d, text: &str) {
    let s = gfx.size();
    let area = Rect::new(0, s.height as i32 - 28, s.width, 24);
    text_centered(gfx, area, text, TextStyle::body(TEXT_SMALL, COLOR_TEXT_DIM));
}

/// Centered result card ("YOU WIN", score lines) drawn over a dimmed frame.
pub fn result_card(gfx: &mut dyn Renderer2d, title: &str, title_color: Color, lines: &[String]) {
    dim(gfx);
    let s = gfx.size();
    let h = 120 + lines.len() as u32 * 28;
    let card = screen_rect(s).place(Size::new(420, h), Anchor::Center);
    panel(gfx, card);
    let title_area = Rect::new(card.x, card.y + 16, card.w, 40);
    text_centered(gfx, title_area, title, TextStyle::title(TEXT_TITLE, title_color));
    for (i, line) in lines.iter().enumerate() {
        let row = Rect::new(card.x, card.y + 70 + i as i32 * 28, card.w, 24);
        text_centered(gfx, row, line, TextStyle::body(TEXT_BODY, COLOR_TEXT));
    }
    let hint = Rect::new(card.x, card.bottom() - 34, card.w, 24);
    text_centered(
        gfx,
        hint,
        "ENTER: AGAIN   ESC: MENU",
        TextStyle::body(TEXT_SMALL, COLOR_TEXT_DIM),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_layout_maps_points_to_cells() {
        let g = GridLayout::fit(Rect::new(0, 0, 300, 300), 10, 10, 24);
        assert_eq!(g.cell, 24);
        assert_eq!(g.origin, (30, 30));
        assert_eq!(g.cell_at((30, 30)), Some((0, 0)));
        assert_eq!(g.cell_at((30 + 24 * 9 + 23, 30 + 24)), Some((9, 1)));
        assert_eq!(g.cell_at((29, 30)), None);
        assert_eq!(g.cell_at((30 + 240, 30)), None);
    }

    #[test]
    fn menu_wraps_and_activates() {
        let area = Rect::from_size(800, 600);
        let mut menu = MenuList::new(["PLAY", "OPTIONS", "BACK"]);
        let up = InputEvent::KeyDown { key: Key::Up };
        assert_eq!(menu.handle(&up, area), MenuInput::Moved);
        assert_eq!(menu.selected(), 2);
        let enter = InputEvent::KeyDown { key: Key::Enter };
        assert_eq!(menu.handle(&enter, area), MenuInput::Activated(2));

        let rects = menu.item_rects(area);
        let (cx, cy) = rects[1].center();
        let click = InputEvent::MouseDown {
            button: engine::input::MouseButton::Left,
            pos: (cx, cy),
        };
        assert_eq!(menu.handle(&click, area), MenuInput::Activated(1));
    }
}
