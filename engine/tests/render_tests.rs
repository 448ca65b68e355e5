use engine::graphics::{CpuRenderer, Renderer2d, TextStyle, measure_text};
use engine::surface::{RgbaBufferSurface, Surface, SurfaceSize};
use engine::ui::Rect;

fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [frame[i], frame[i + 1], frame[i + 2], frame[i + 3]]
}

#[test]
fn blend_rect_mixes_with_background() {
    let mut frame = vec![0u8; 2 * 2 * 4];
    let mut gfx = CpuRenderer::new(&mut frame, SurfaceSize::new(2, 2));
    gfx.clear([0, 0, 0, 255]);
    gfx.blend_rect(Rect::from_size(2, 2), [255, 255, 255, 255], 128);
    let px = pixel(&frame, 2, 1, 1);
    assert!((127..=129).contains(&px[0]), "got {px:?}");
    assert_eq!(px[3], 255);
}

#[test]
fn rounded_rect_leaves_corners_untouched() {
    let mut frame = vec![0u8; 20 * 20 * 4];
    let mut gfx = CpuRenderer::new(&mut frame, SurfaceSize::new(20, 20));
    gfx.fill_rounded_rect(Rect::from_size(20, 20), 8, [10, 200, 10, 255]);
    assert_eq!(pixel(&frame, 20, 0, 0), [0, 0, 0, 0]);
    assert_eq!(pixel(&frame, 20, 10, 10), [10, 200, 10, 255]);
    assert_eq!(pixel(&frame, 20, 10, 0), [10, 200, 10, 255]);
}

#[test]
fn text_draws_inside_its_measured_box() {
    let size = SurfaceSize::new(64, 32);
    let mut frame = vec![0u8; size.rgba_len()];
    let mut gfx = CpuRenderer::new(&mut frame, size);
    let style = TextStyle::body(12, [255, 255, 255, 255]);
    gfx.draw_text(4, 4, "HI", style);
    let (w, h) = measure_text("HI", 12);

    let mut lit_outside = false;
    let mut lit_inside = false;
    for y in 0..size.height {
        for x in 0..size.width {
            let lit = pixel(&frame, size.width, x, y)[0] == 255;
            let inside = x >= 4 && x < 4 + w && y >= 4 && y < 4 + h;
            lit_inside |= lit && inside;
            lit_outside |= lit && !inside;
        }
    }
    assert!(lit_inside);
    assert!(!lit_outside);
}

#[test]
fn thick_line_covers_its_midpoint() {
    let mut frame = vec![0u8; 20 * 20 * 4];
    let mut gfx = CpuRenderer::new(&mut frame, SurfaceSize::new(20, 20));
    gfx.line((2, 10), (18, 10), 4, [1, 1, 1, 255]);
    assert_eq!(pixel(&frame, 20, 10, 10), [1, 1, 1, 255]);
    assert_eq!(pixel(&frame, 20, 10, 2), [0, 0, 0, 0]);
}

#[test]
fn identical_draws_hash_identically() {
    let size = SurfaceSize::new(32, 32);
    let draw = |surface: &mut RgbaBufferSurface| {
        let mut gfx = CpuRenderer::new(surface.frame_mut(), size);
        gfx.begin_frame(size);
        gfx.clear([20, 20, 30, 255]);
        gfx.fill_circle((16, 16), 10, [200, 100, 0, 255]);
        gfx.draw_text(2, 2, "OK", TextStyle::title(12, [255; 4]));
    };
    let mut a = RgbaBufferSurface::new(size);
    let mut b = RgbaBufferSurface::new(size);
    draw(&mut a);
    draw(&mut b);
    draw(&mut b);
    assert_eq!(a.digest(), b.digest());
}

#[test]
fn drawing_into_zero_sized_surface_is_a_no_op() {
    let mut frame: Vec<u8> = Vec::new();
    let mut gfx = CpuRenderer::new(&mut frame, SurfaceSize::new(0, 0));
    gfx.clear([1, 2, 3, 255]);
    gfx.fill_ellipse(Rect::from_size(10, 10), [1, 2, 3, 255]);
    gfx.draw_text(0, 0, "X", TextStyle::body(12, [1, 2, 3, 255]));
    assert!(frame.is_empty());
}
