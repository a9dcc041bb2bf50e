//! The `Engine`: single-threaded owner of both framebuffers, the shadow
//! terminal state, the arenas, the event queue, and the drawlist resource
//! tables. Drives `submit_drawlist`/`present`/`poll_events` against a
//! caller-supplied `PlatformPort`.

use std::sync::{Arc, Mutex};

use tracing::{debug, trace, warn};
use zr_cell::{Arena, Damage, Framebuffer, Rect, ZrError, ZrResult};
use zr_diff::{DesiredCursor, DiffLimits, Scratch};
use zr_drawlist::{CursorState, ExecContext, Limits as DrawlistLimits, ResourceTables};
use zr_input::batch::BatchWriter;
use zr_input::event::Event;
use zr_input::queue::EventQueue;
use zr_input::Parser;
use zr_terminal::{PlatformCaps, PlatformPort, TerminalProfile, TerminalState};

use crate::config::EngineConfig;
use crate::cursor_adapter::to_terminal_shape;
use crate::exit_hooks::{self, HookGuard};
use crate::metrics::MetricsSnapshot;

/// Row-span damage budget used for the `fb_prev <- fb_next` commit after a
/// successful `present`. Independent of the diff renderer's own damage
/// bookkeeping — this one exists purely to bound the commit's blit count.
const COMMIT_DAMAGE_CAP: usize = 64;

const RESTORE_SEQUENCE: &[u8] = b"\x1b[0m\x1b[?25h";

pub struct Engine<P: PlatformPort> {
    /// Shared with the process-wide exit hook so a best-effort restore can
    /// reach the port from outside normal `Drop` (e.g. an abort handler).
    /// Single-threaded in ordinary operation, so the lock is uncontended
    /// on every call the owner thread makes.
    port: Arc<Mutex<P>>,
    config: EngineConfig,
    profile: TerminalProfile,

    fb_prev: Framebuffer,
    fb_next: Framebuffer,
    term_state: TerminalState,
    cursor_state: CursorState,
    resources: ResourceTables,
    image_staging: Vec<u8>,

    persistent_arena: Arena,
    frame_arena: Arena,
    scratch: Scratch,
    commit_damage: Damage,

    drawlist_limits: DrawlistLimits,
    diff_limits: DiffLimits,

    queue: Mutex<EventQueue>,
    parser: Parser,
    pending_input: Vec<u8>,
    read_buf: Vec<u8>,
    last_tick_ms: u64,

    metrics: MetricsSnapshot,
    _hook_guard: HookGuard,
}

impl<P: PlatformPort + Send + 'static> Engine<P> {
    /// Creates the engine over `port`, bringing the terminal into raw mode
    /// and establishing an `unknown` shadow state so the first `present`
    /// re-establishes everything from scratch.
    pub fn create(mut port: P, config: EngineConfig) -> ZrResult<Engine<P>> {
        config.validate()?;

        let caps = port.get_caps();
        if config.wait_for_output_drain && !caps.supports_output_wait_writable {
            return Err(ZrError::unsupported(
                "wait_for_output_drain requested but the platform port lacks supports_output_wait_writable",
            ));
        }

        port.enter_raw()?;

        let fb_prev = Framebuffer::init(config.cols, config.rows)?;
        let fb_next = Framebuffer::init(config.cols, config.rows)?;
        let persistent_arena = Arena::new(config.arena_initial_bytes, config.arena_max_total_bytes)?;
        let frame_arena = Arena::new(config.frame_arena_initial_bytes, config.frame_arena_max_total_bytes)?;
        let queue = config.new_event_queue();
        let diff_limits = DiffLimits { max_output_bytes: config.max_output_bytes };

        let port = Arc::new(Mutex::new(port));
        let hook_port = port.clone();
        let hook_guard = exit_hooks::register(move || {
            if let Ok(mut p) = hook_port.lock() {
                let _ = p.leave_raw();
                let _ = p.write_output(RESTORE_SEQUENCE);
            }
        });

        Ok(Engine {
            port,
            config,
            profile: TerminalProfile::unknown(),
            fb_prev,
            fb_next,
            term_state: TerminalState::unknown(),
            cursor_state: CursorState::default(),
            resources: ResourceTables::new(),
            image_staging: Vec::new(),
            persistent_arena,
            frame_arena,
            scratch: Scratch::new(),
            commit_damage: Damage::new(COMMIT_DAMAGE_CAP),
            drawlist_limits: config.drawlist_limits(),
            diff_limits,
            queue: Mutex::new(queue),
            parser: Parser::default(),
            pending_input: Vec::new(),
            read_buf: vec![0u8; 4096],
            last_tick_ms: 0,
            metrics: MetricsSnapshot::default(),
            _hook_guard: hook_guard,
        })
    }
}

impl<P: PlatformPort> Engine<P> {
    /// Validates then executes `bytes` into a scratch copy of `fb_next`,
    /// the resource tables, and the drawlist cursor state. Neither is
    /// touched unless both steps succeed (`submit_atomic`).
    pub fn submit_drawlist(&mut self, bytes: &[u8]) -> ZrResult<()> {
        let view = zr_drawlist::validate(bytes, &self.drawlist_limits).map_err(|e| {
            self.metrics.drawlists_rejected += 1;
            debug!(error = %e, "drawlist rejected at validation");
            e
        })?;

        let mut attempt_fb = self.fb_next.clone();
        let mut attempt_resources = self.resources.clone();
        let mut attempt_cursor = self.cursor_state;
        let mut attempt_staging = self.image_staging.clone();

        let mut ctx = ExecContext {
            fb: &mut attempt_fb,
            cursor: &mut attempt_cursor,
            resources: &mut attempt_resources,
            width_policy: self.config.width_policy(),
            limits: self.drawlist_limits,
            dumb_terminal: self.profile.is_dumb,
            pipe_mode: self.profile.is_pipe,
            supports_sextant: self.config.supports_sextant,
            supports_quadrant: self.config.supports_quadrant,
            image_staging: &mut attempt_staging,
            image_staging_cap: self.config.image_staging_bytes,
        };

        if let Err(e) = zr_drawlist::execute(&view, &mut ctx) {
            self.metrics.drawlists_rejected += 1;
            warn!(error = %e, "drawlist rejected at execution, fb_next unchanged");
            return Err(e);
        }

        self.fb_next = attempt_fb;
        self.resources = attempt_resources;
        self.cursor_state = attempt_cursor;
        self.image_staging = attempt_staging;
        self.metrics.drawlists_submitted += 1;
        Ok(())
    }

    /// Diffs `fb_prev` against `fb_next` and flushes the result through
    /// exactly one `write_output` call. On `ERR_LIMIT`, `write_output` is
    /// never called (`no_partial_on_limit`).
    pub fn present(&mut self) -> ZrResult<()> {
        let caps;
        {
            let mut port = self.port.lock().unwrap();
            if self.config.wait_for_output_drain {
                port.wait_output_writable(0)?;
            }
            caps = port.get_caps();
        }

        let mark = self.frame_arena.mark();
        let handle = self.frame_arena.alloc_zeroed(self.config.max_output_bytes, 4)?;
        let desired_cursor = Some(DesiredCursor {
            x: self.cursor_state.x,
            y: self.cursor_state.y,
            visible: self.cursor_state.visible,
            shape: to_terminal_shape(self.cursor_state.shape),
            blink: self.cursor_state.blink,
        });

        let render_result = {
            let out = self.frame_arena.slice_mut(handle);
            zr_diff::render(
                &self.fb_prev,
                &self.fb_next,
                &caps,
                &mut self.term_state,
                desired_cursor,
                &self.diff_limits,
                &mut self.scratch,
                self.config.allow_scroll_opt,
                out,
            )
        };

        let (written, stats) = match render_result {
            Ok(pair) => pair,
            Err(e) => {
                self.frame_arena.rewind(mark);
                self.metrics.frames_rejected_limit += 1;
                warn!(error = %e, "present rejected: diff output exceeds buffer, no write performed");
                return Err(e);
            }
        };

        let body = self.frame_arena.slice(handle)[..written].to_vec();
        self.frame_arena.rewind(mark);

        let flushed = {
            let mut port = self.port.lock().unwrap();
            if caps.supports_sync_update {
                let mut framed = Vec::with_capacity(body.len() + 16);
                framed.extend_from_slice(b"\x1b[?2026h");
                framed.extend_from_slice(&body);
                framed.extend_from_slice(b"\x1b[?2026l");
                port.write_output(&framed)
            } else {
                port.write_output(&body)
            }
        };
        flushed?;

        self.commit_damage();

        self.metrics.frames_presented += 1;
        self.metrics.bytes_written_total += written as u64;
        self.metrics.rows_scanned_total += stats.rows_scanned as u64;
        self.metrics.rows_emitted_total += stats.rows_emitted as u64;
        if stats.scroll_opt_hit != 0 {
            self.metrics.scroll_opt_hits += 1;
        }
        if stats.path_is_sweep {
            self.metrics.sweep_path_frames += 1;
        }
        trace!(written, sweep = stats.path_is_sweep, "frame presented");
        Ok(())
    }

    /// Commits `fb_prev <- fb_next` over only the rows that actually
    /// differ, via `blit_rect` — never a whole-framebuffer clone.
    fn commit_damage(&mut self) {
        let cols = self.fb_next.cols();
        let rows = self.fb_next.rows();
        self.commit_damage.begin_frame(COMMIT_DAMAGE_CAP, cols, rows);
        for y in 0..rows {
            let mut differs = false;
            for x in 0..cols {
                if self.fb_prev.cell_const(x, y) != self.fb_next.cell_const(x, y) {
                    differs = true;
                    break;
                }
            }
            if differs {
                self.commit_damage.add_span(y, 0, cols.saturating_sub(1));
            }
        }
        if self.commit_damage.is_empty() {
            return;
        }
        let rects: Vec<Rect> = if self.commit_damage.is_full_frame() {
            vec![Rect::full(cols, rows)]
        } else {
            self.commit_damage.rects().to_vec()
        };
        for rect in rects {
            self.fb_prev.blit_rect(rect.x0, rect.y0, &self.fb_next, rect);
        }
    }

    /// Drains platform input, synthesizes an overdue `TICK`, and packs
    /// whatever fits into `out_buf` as one event batch. Returns the number
    /// of bytes written (always a well-formed batch, possibly truncated
    /// and possibly empty).
    pub fn poll_events(&mut self, timeout_ms: u64, out_buf: &mut [u8]) -> ZrResult<usize> {
        let readable = self.port.lock().unwrap().wait(timeout_ms)?;
        if readable {
            let n = self.port.lock().unwrap().read_input(&mut self.read_buf)?;
            if n > 0 {
                self.pending_input.extend_from_slice(&self.read_buf[..n]);
                let mut parsed = Vec::new();
                let consumed = self.parser.parse_bytes_prefix(&self.pending_input, &mut parsed);
                self.pending_input.drain(..consumed);

                let mut queue = self.queue.lock().unwrap();
                for ev in parsed {
                    let before = queue.dropped_due_to_full();
                    queue.push(ev);
                    if queue.dropped_due_to_full() != before {
                        self.metrics.events_dropped_due_to_full += 1;
                    }
                }
            }
        }

        let now = self.port.lock().unwrap().now_ms();
        let period_ms = 1000 / self.config.target_fps as u64;
        if now.saturating_sub(self.last_tick_ms) >= period_ms {
            let dt_ms = now.saturating_sub(self.last_tick_ms).min(u32::MAX as u64) as u32;
            self.queue.lock().unwrap().push(Event::Tick { dt_ms });
            self.last_tick_ms = now;
            self.metrics.ticks_synthesized += 1;
        }

        let mut writer = BatchWriter::begin(out_buf)?;
        let mut scratch = Vec::new();
        let time_ms = now.min(u32::MAX as u64) as u32;
        let mut queue = self.queue.lock().unwrap();
        loop {
            let Some(ev) = queue.peek().cloned() else { break };
            if !writer.append_event(&ev, time_ms, &mut scratch) {
                break;
            }
            queue.pop();
        }
        Ok(writer.finish())
    }

    /// Injects a tagged out-of-band payload. Safe to call from another
    /// thread; wakes the owner thread's `wait`/`wait_output_writable`.
    pub fn post_user(&self, tag: u32, bytes: &[u8]) -> ZrResult<()> {
        self.queue.lock().unwrap().post_user(tag, bytes)?;
        self.port.lock().unwrap().wake();
        Ok(())
    }

    /// Injects an assembled paste out-of-band. Never evicts a live event.
    pub fn post_paste(&self, text: &str) -> ZrResult<()> {
        self.queue.lock().unwrap().post_paste(text)?;
        self.port.lock().unwrap().wake();
        Ok(())
    }

    /// Prefix-copies up to `out.len()` bytes of the current metrics
    /// snapshot. Never writes past `out.len()`.
    pub fn get_metrics(&self, out: &mut [u8]) -> usize {
        self.metrics.copy_prefix_into(out)
    }

    pub fn get_caps(&self) -> PlatformCaps {
        self.port.lock().unwrap().get_caps()
    }

    pub fn get_terminal_profile(&self) -> TerminalProfile {
        self.profile.clone()
    }

    /// Re-reads the port's size and resizes both framebuffers. No-partial-
    /// effects: a failure on either framebuffer leaves both untouched
    /// (`Framebuffer::resize` builds its replacement grid fully before
    /// discarding the old one).
    pub fn resize(&mut self, cols: u16, rows: u16) -> ZrResult<()> {
        self.fb_prev.resize(cols, rows)?;
        self.fb_next.resize(cols, rows)?;
        self.term_state.invalidate_all();
        self.scratch.invalidate();
        Ok(())
    }
}

impl<P: PlatformPort> Drop for Engine<P> {
    /// Best-effort restore on ordinary destruction: leave raw mode, reset
    /// SGR, show the cursor. The process-wide hook registered at `create`
    /// covers the abort/signal path this can't.
    fn drop(&mut self) {
        if let Ok(mut port) = self.port.lock() {
            let _ = port.leave_raw();
            let _ = port.write_output(RESTORE_SEQUENCE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct FakePort {
        caps: PlatformCaps,
        written: Arc<StdMutex<Vec<Vec<u8>>>>,
        input: Arc<StdMutex<Vec<u8>>>,
        now: Arc<StdMutex<u64>>,
    }

    impl FakePort {
        fn new() -> FakePort {
            FakePort {
                caps: PlatformCaps::conservative(),
                written: Arc::new(StdMutex::new(Vec::new())),
                input: Arc::new(StdMutex::new(Vec::new())),
                now: Arc::new(StdMutex::new(0)),
            }
        }
    }

    impl PlatformPort for FakePort {
        fn enter_raw(&mut self) -> ZrResult<()> {
            Ok(())
        }
        fn leave_raw(&mut self) -> ZrResult<()> {
            Ok(())
        }
        fn get_size(&self) -> ZrResult<(u16, u16)> {
            Ok((10, 4))
        }
        fn get_caps(&self) -> PlatformCaps {
            self.caps
        }
        fn read_input(&mut self, buf: &mut [u8]) -> ZrResult<usize> {
            let mut pending = self.input.lock().unwrap();
            let n = pending.len().min(buf.len());
            buf[..n].copy_from_slice(&pending[..n]);
            pending.drain(..n);
            Ok(n)
        }
        fn write_output(&mut self, buf: &[u8]) -> ZrResult<()> {
            self.written.lock().unwrap().push(buf.to_vec());
            Ok(())
        }
        fn wait(&mut self, _timeout_ms: u64) -> ZrResult<bool> {
            Ok(!self.input.lock().unwrap().is_empty())
        }
        fn wait_output_writable(&mut self, _timeout_ms: u64) -> ZrResult<bool> {
            Ok(true)
        }
        fn wake(&self) {}
        fn now_ms(&self) -> u64 {
            *self.now.lock().unwrap()
        }
    }

    fn test_config() -> EngineConfig {
        EngineConfig { cols: 10, rows: 4, ..Default::default() }
    }

    #[test]
    fn present_emits_exactly_one_write_output_call() {
        let port = FakePort::new();
        let written = port.written.clone();
        let mut engine = Engine::create(port, test_config()).unwrap();
        engine.present().unwrap();
        assert_eq!(written.lock().unwrap().len(), 1);
    }

    #[test]
    fn no_partial_on_limit_never_calls_write_output() {
        let port = FakePort::new();
        let written = port.written.clone();
        let mut config = test_config();
        config.max_output_bytes = 1; // first present always exceeds this
        let mut engine = Engine::create(port, config).unwrap();
        let err = engine.present().unwrap_err();
        assert!(matches!(err, ZrError::Limit(_)));
        assert_eq!(written.lock().unwrap().len(), 0);
    }

    #[test]
    fn submit_atomic_rolls_back_fb_next_on_rejected_drawlist() {
        let port = FakePort::new();
        let mut engine = Engine::create(port, test_config()).unwrap();
        let before = engine.fb_next.clone();
        let bad_bytes = vec![0u8; 8]; // too short to even parse a header
        assert!(engine.submit_drawlist(&bad_bytes).is_err());
        for y in 0..before.rows() {
            for x in 0..before.cols() {
                assert_eq!(before.cell_const(x, y), engine.fb_next.cell_const(x, y));
            }
        }
    }

    #[test]
    fn get_metrics_respects_caller_buffer_size() {
        let port = FakePort::new();
        let engine = Engine::create(port, test_config()).unwrap();
        let mut small = [0u8; 4];
        let n = engine.get_metrics(&mut small);
        assert_eq!(n, 4);
    }

    #[test]
    fn poll_events_synthesizes_tick_when_overdue() {
        let port = FakePort::new();
        let now = port.now.clone();
        let mut config = test_config();
        config.target_fps = 1000; // period 1ms, so any now() > 0 is overdue
        let mut engine = Engine::create(port, config).unwrap();
        *now.lock().unwrap() = 50;
        let mut out = [0u8; 512];
        let written = engine.poll_events(0, &mut out).unwrap();
        assert!(written > 24);
        assert_eq!(engine.metrics.ticks_synthesized, 1);
    }
}
