//! A bounded clip stack over a framebuffer. Clipping affects writes only —
//! wide-glyph cursor advancement in the executor is never shortened by it.

use crate::error::{ZrError, ZrResult};
use crate::framebuffer::Framebuffer;
use crate::rect::Rect;
use crate::style::Style;

pub const MAX_CLIP_DEPTH: usize = 64;

pub struct Painter<'a> {
    fb: &'a mut Framebuffer,
    stack: Vec<Rect>,
}

impl<'a> Painter<'a> {
    pub fn new(fb: &'a mut Framebuffer) -> Self {
        let full = fb.full_rect();
        Painter {
            fb,
            stack: vec![full],
        }
    }

    pub fn current_clip(&self) -> Rect {
        *self.stack.last().expect("clip stack always has a base entry")
    }

    pub fn push_clip(&mut self, rect: Rect) -> ZrResult<()> {
        if self.stack.len() >= MAX_CLIP_DEPTH {
            return Err(ZrError::limit("clip stack depth exceeded"));
        }
        let clipped = self.current_clip().intersect(&rect).unwrap_or(Rect::new(0, 0, 0, 0));
        self.stack.push(clipped);
        Ok(())
    }

    pub fn pop_clip(&mut self) -> ZrResult<()> {
        if self.stack.len() <= 1 {
            return Err(ZrError::invalid_argument("clip stack underflow"));
        }
        self.stack.pop();
        Ok(())
    }

    pub fn put_grapheme(&mut self, x: u16, y: u16, cluster: &str, width: u16, style: Style) {
        let clip = self.current_clip();
        self.fb.put_grapheme_clipped(clip, x, y, cluster, width, style);
    }

    pub fn fill_rect(&mut self, rect: Rect, style: Style) {
        let clip = self.current_clip();
        self.fb.fill_rect(clip, rect, style);
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        self.fb
    }

    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer {
        self.fb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_stack_intersects_nested_pushes() {
        let mut fb = Framebuffer::init(10, 10).unwrap();
        let mut painter = Painter::new(&mut fb);
        painter.push_clip(Rect::new(2, 2, 8, 8)).unwrap();
        painter.push_clip(Rect::new(0, 0, 4, 4)).unwrap();
        assert_eq!(painter.current_clip(), Rect::new(2, 2, 4, 4));
        painter.pop_clip().unwrap();
        assert_eq!(painter.current_clip(), Rect::new(2, 2, 8, 8));
    }

    #[test]
    fn pop_below_base_is_rejected() {
        let mut fb = Framebuffer::init(4, 4).unwrap();
        let mut painter = Painter::new(&mut fb);
        assert!(painter.pop_clip().is_err());
    }

    #[test]
    fn exceeding_max_clip_depth_is_rejected() {
        let mut fb = Framebuffer::init(4, 4).unwrap();
        let mut painter = Painter::new(&mut fb);
        for _ in 1..MAX_CLIP_DEPTH {
            painter.push_clip(painter.current_clip()).unwrap();
        }
        assert!(painter.push_clip(painter.current_clip()).is_err());
    }
}
