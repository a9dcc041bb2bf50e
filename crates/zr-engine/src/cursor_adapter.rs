//! The drawlist executor and the diff renderer each pin their own
//! `CursorShape` (distinct crates, identical variant set) — this is the
//! one place that knows both and converts between them.

pub fn to_terminal_shape(shape: zr_drawlist::CursorShape) -> zr_terminal::CursorShape {
    match shape {
        zr_drawlist::CursorShape::Block => zr_terminal::CursorShape::Block,
        zr_drawlist::CursorShape::Underline => zr_terminal::CursorShape::Underline,
        zr_drawlist::CursorShape::Bar => zr_terminal::CursorShape::Bar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_round_trips_by_name() {
        assert_eq!(to_terminal_shape(zr_drawlist::CursorShape::Block), zr_terminal::CursorShape::Block);
        assert_eq!(to_terminal_shape(zr_drawlist::CursorShape::Underline), zr_terminal::CursorShape::Underline);
        assert_eq!(to_terminal_shape(zr_drawlist::CursorShape::Bar), zr_terminal::CursorShape::Bar);
    }
}
