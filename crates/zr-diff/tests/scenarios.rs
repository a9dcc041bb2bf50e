//! Byte-exact end-to-end scenarios for the diff renderer.

use zr_cell::{Attrs, Framebuffer, Rect, Style};
use zr_diff::{render, DesiredCursor, DiffLimits, Scratch};
use zr_terminal::{ColorMode, CursorShape, PlatformCaps, TerminalState, ValidFields};

fn all_valid_state(style: Style) -> TerminalState {
    let mut s = TerminalState::unknown();
    s.style = style;
    s.valid = ValidFields::all();
    s
}

fn render_once(
    prev: &Framebuffer,
    next: &Framebuffer,
    caps: &PlatformCaps,
    state: &mut TerminalState,
    desired_cursor: Option<DesiredCursor>,
) -> Vec<u8> {
    let mut scratch = Scratch::new();
    let mut out = vec![0u8; 4096];
    let (len, _stats) = render(
        prev,
        next,
        caps,
        state,
        desired_cursor,
        &DiffLimits::default(),
        &mut scratch,
        false,
        &mut out,
    )
    .unwrap();
    out[..len].to_vec()
}

#[test]
fn scenario_1_single_cell_no_state_change_needed() {
    let prev = Framebuffer::init(3, 1).unwrap();
    let mut next = Framebuffer::init(3, 1).unwrap();
    let style = Style::default(); // black-on-black
    next.put_grapheme_clipped(Rect::full(3, 1), 0, 0, "X", 1, style);

    let caps = PlatformCaps::detect();
    let mut state = all_valid_state(style);
    let bytes = render_once(&prev, &next, &caps, &mut state, None);
    assert_eq!(bytes, b"X");
}

#[test]
fn scenario_2_invalid_cursor_pos_forces_absolute_cup() {
    let prev = Framebuffer::init(3, 1).unwrap();
    let mut next = Framebuffer::init(3, 1).unwrap();
    let style = Style::default();
    next.put_grapheme_clipped(Rect::full(3, 1), 0, 0, "X", 1, style);

    let caps = PlatformCaps::detect();
    let mut state = all_valid_state(style);
    state.valid.remove(ValidFields::CURSOR_POS);
    let bytes = render_once(&prev, &next, &caps, &mut state, None);
    assert_eq!(bytes, b"\x1b[1;1HX");
}

#[test]
fn scenario_3_cursor_visibility_toggle_without_movement() {
    let fb = Framebuffer::init(3, 1).unwrap();
    let caps = PlatformCaps::detect();
    let mut state = all_valid_state(Style::default());
    state.cursor_visible = true;
    let desired = DesiredCursor {
        x: 0,
        y: 0,
        visible: false,
        shape: state.cursor_shape,
        blink: state.cursor_blink,
    };
    let bytes = render_once(&fb, &fb, &caps, &mut state, Some(desired));
    assert_eq!(bytes, b"\x1b[?25l");
}

#[test]
fn scenario_4_invalid_screen_forces_baseline() {
    let fb = Framebuffer::init(3, 1).unwrap();
    let caps = PlatformCaps::detect();
    let mut state = all_valid_state(Style::default());
    state.valid.remove(ValidFields::SCREEN);
    let bytes = render_once(&fb, &fb, &caps, &mut state, None);
    assert_eq!(bytes, b"\x1b[r\x1b[0;38;2;0;0;0;48;2;0;0;0m\x1b[2J");
    assert!(!bytes.contains(&b' '));
}

#[test]
fn scenario_5_attribute_clear_forces_absolute_reset() {
    let mut prev = Framebuffer::init(3, 1).unwrap();
    let mut next = Framebuffer::init(3, 1).unwrap();
    let bold_style = Style {
        fg_rgb: 0xAA0000,
        bg_rgb: 0,
        attrs: Attrs::BOLD,
        ..Style::default()
    };
    let plain_style = Style {
        fg_rgb: 0xAA0000,
        bg_rgb: 0,
        attrs: Attrs::empty(),
        ..Style::default()
    };
    prev.put_grapheme_clipped(Rect::full(3, 1), 0, 0, "X", 1, bold_style);
    next.put_grapheme_clipped(Rect::full(3, 1), 0, 0, "X", 1, plain_style);

    let caps = PlatformCaps::detect();
    let mut state = all_valid_state(bold_style);
    let bytes = render_once(&prev, &next, &caps, &mut state, None);
    assert_eq!(bytes, b"\x1b[0;38;2;170;0;0;48;2;0;0;0mX");
}

#[test]
fn scenario_6_256_color_quantization_is_deltaic() {
    let prev = Framebuffer::init(3, 1).unwrap();
    let mut next = Framebuffer::init(3, 1).unwrap();
    let target_style = Style {
        fg_rgb: 0x7D0000,
        bg_rgb: 0x000000,
        ..Style::default()
    };
    next.put_grapheme_clipped(Rect::full(3, 1), 0, 0, "X", 1, target_style);

    let caps = PlatformCaps {
        color_mode: ColorMode::Ansi256,
        ..PlatformCaps::detect()
    };
    // Pen starts away from both the target's fg and bg so both pieces emit.
    let initial_style = Style {
        fg_rgb: 0x123456,
        bg_rgb: 0xFFFFFF,
        ..Style::default()
    };
    let mut state = all_valid_state(initial_style);
    let bytes = render_once(&prev, &next, &caps, &mut state, None);
    assert_eq!(bytes, b"\x1b[38;5;88;48;5;16mX");
}

#[test]
fn scenario_7_hyperlink_open_then_close() {
    let prev = Framebuffer::init(3, 1).unwrap();
    let mut next = Framebuffer::init(3, 1).unwrap();
    let link_ref = next.link_intern("https://example.com", "").unwrap();
    let style = Style {
        link_ref,
        ..Style::default()
    };
    next.put_grapheme_clipped(Rect::full(3, 1), 0, 0, "A", 1, style);

    let caps = PlatformCaps::detect();
    let mut state = all_valid_state(Style::default());
    let bytes = render_once(&prev, &next, &caps, &mut state, None);
    assert_eq!(bytes, b"\x1b]8;;https://example.com\x1b\\A\x1b]8;;\x1b\\");
}
