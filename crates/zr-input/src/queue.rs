//! Bounded queue of parsed `Event`s with last-wins coalescing for
//! high-frequency resize/mouse-move events and a tracked payload-byte
//! budget standing in for the two-ring (fixed record ring + byte ring)
//! design: events already own their variable payloads, so the budget is
//! tracked by summing `Event::payload_len` rather than a shared byte ring.

use crate::event::{Event, MouseKind};
use std::collections::VecDeque;
use zr_cell::{ZrError, ZrResult};

pub struct EventQueue {
    capacity: usize,
    max_payload_bytes: usize,
    events: VecDeque<Event>,
    user_used: usize,
    dropped_due_to_full: u64,
}

impl EventQueue {
    pub fn new(capacity: usize, max_payload_bytes: usize) -> EventQueue {
        EventQueue {
            capacity,
            max_payload_bytes,
            events: VecDeque::with_capacity(capacity),
            user_used: 0,
            dropped_due_to_full: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn user_used(&self) -> usize {
        self.user_used
    }

    pub fn dropped_due_to_full(&self) -> u64 {
        self.dropped_due_to_full
    }

    fn coalesces_with_head(existing: &Event, incoming: &Event) -> bool {
        matches!(
            (existing, incoming),
            (Event::Resize { .. }, Event::Resize { .. })
                | (Event::Mouse { kind: MouseKind::Moved, .. }, Event::Mouse { kind: MouseKind::Moved, .. })
        )
    }

    /// Appends `ev`. RESIZE and MOUSE(Moved) replace any existing queued
    /// event of the same coalescible kind, wherever it sits in the queue
    /// (last-wins); everything else appends. When full and non-coalescible,
    /// the oldest event is dropped to make room and `dropped_due_to_full`
    /// increments.
    pub fn push(&mut self, ev: Event) {
        if let Some(existing) = self.events.iter_mut().find(|e| Self::coalesces_with_head(e, &ev)) {
            self.user_used -= existing.payload_len();
            self.user_used += ev.payload_len();
            *existing = ev;
            return;
        }
        if self.events.len() >= self.capacity {
            if let Some(old) = self.events.pop_front() {
                self.user_used -= old.payload_len();
            }
            self.dropped_due_to_full += 1;
        }
        self.user_used += ev.payload_len();
        self.events.push_back(ev);
    }

    /// Injects an out-of-band tagged byte payload (e.g. from another
    /// thread). May evict the oldest event to stay within the payload
    /// budget; rejects with `Limit` only if the payload alone can never fit.
    pub fn post_user(&mut self, tag: u32, bytes: &[u8]) -> ZrResult<()> {
        if bytes.len() > self.max_payload_bytes {
            return Err(ZrError::limit("user payload exceeds queue payload budget"));
        }
        while self.user_used + bytes.len() > self.max_payload_bytes {
            match self.events.pop_front() {
                Some(old) => self.user_used -= old.payload_len(),
                None => break,
            }
            self.dropped_due_to_full += 1;
        }
        self.push(Event::User { tag, bytes: bytes.to_vec() });
        Ok(())
    }

    /// Injects an assembled paste. Unlike `post_user`, paste never evicts a
    /// live event to make room: if it doesn't fit, it is rejected outright.
    pub fn post_paste(&mut self, text: &str) -> ZrResult<()> {
        if self.user_used + text.len() > self.max_payload_bytes {
            return Err(ZrError::limit("paste payload does not fit without eviction"));
        }
        self.push(Event::Paste(text.to_string()));
        Ok(())
    }

    pub fn peek(&self) -> Option<&Event> {
        self.events.front()
    }

    pub fn pop(&mut self) -> Option<Event> {
        let ev = self.events.pop_front()?;
        self.user_used -= ev.payload_len();
        Some(ev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KeyAction, KeyCode, Mods};

    #[test]
    fn resize_events_coalesce_to_last_wins() {
        let mut q = EventQueue::new(8, 1024);
        q.push(Event::Resize { cols: 80, rows: 24 });
        q.push(Event::Resize { cols: 100, rows: 40 });
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop(), Some(Event::Resize { cols: 100, rows: 40 }));
    }

    #[test]
    fn mouse_move_coalesces_but_clicks_do_not() {
        let mut q = EventQueue::new(8, 1024);
        q.push(Event::Mouse { x: 0, y: 0, kind: MouseKind::Moved, buttons: 0, mods: Mods::empty() });
        q.push(Event::Mouse { x: 1, y: 1, kind: MouseKind::Moved, buttons: 0, mods: Mods::empty() });
        q.push(Event::Mouse { x: 2, y: 2, kind: MouseKind::Down(crate::event::MouseButton::Left), buttons: 0, mods: Mods::empty() });
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn resize_coalesces_with_non_tail_entry() {
        let mut q = EventQueue::new(8, 1024);
        q.push(Event::Resize { cols: 80, rows: 24 });
        q.push(Event::Key { code: KeyCode::Char('a'), mods: Mods::empty(), action: KeyAction::Press });
        q.push(Event::Resize { cols: 100, rows: 40 });
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(Event::Resize { cols: 100, rows: 40 }));
        assert_eq!(q.pop(), Some(Event::Key { code: KeyCode::Char('a'), mods: Mods::empty(), action: KeyAction::Press }));
    }

    #[test]
    fn push_drops_oldest_when_full() {
        let mut q = EventQueue::new(2, 1024);
        q.push(Event::Key { code: KeyCode::Char('a'), mods: Mods::empty(), action: KeyAction::Press });
        q.push(Event::Key { code: KeyCode::Char('b'), mods: Mods::empty(), action: KeyAction::Press });
        q.push(Event::Key { code: KeyCode::Char('c'), mods: Mods::empty(), action: KeyAction::Press });
        assert_eq!(q.len(), 2);
        assert_eq!(q.dropped_due_to_full(), 1);
        assert_eq!(q.pop(), Some(Event::Key { code: KeyCode::Char('b'), mods: Mods::empty(), action: KeyAction::Press }));
    }

    #[test]
    fn paste_rejected_without_eviction_when_over_budget() {
        let mut q = EventQueue::new(8, 4);
        assert!(q.post_paste("hello").is_err());
        assert!(q.is_empty());
    }

    #[test]
    fn post_user_evicts_to_fit_budget() {
        let mut q = EventQueue::new(8, 4);
        q.push(Event::User { tag: 1, bytes: vec![0u8; 4] });
        assert!(q.post_user(2, &[1, 2]).is_ok());
        assert!(q.user_used() <= 4);
    }
}
