//! The `PlatformPort` capability boundary (spec §6): raw-mode control,
//! byte I/O, sizing, and timing. This crate only specifies the trait;
//! a real implementation (terminfo/ioctl/epoll plumbing) is out of scope
//! for this core and is left to an embedder.

use crate::caps::PlatformCaps;
use zr_cell::ZrResult;

pub trait PlatformPort {
    fn enter_raw(&mut self) -> ZrResult<()>;
    fn leave_raw(&mut self) -> ZrResult<()>;

    fn get_size(&self) -> ZrResult<(u16, u16)>;
    fn get_caps(&self) -> PlatformCaps;

    /// Reads available input bytes into `buf`, returns the count read.
    /// Non-blocking: callers use `wait` to block for readability first.
    fn read_input(&mut self, buf: &mut [u8]) -> ZrResult<usize>;

    /// Writes the entire contents of `buf` or fails; never a partial
    /// write from the caller's point of view.
    fn write_output(&mut self, buf: &[u8]) -> ZrResult<()>;

    /// Blocks up to `timeout_ms` for input readability. `0` is a
    /// non-blocking poll. Returns `true` if input became available.
    fn wait(&mut self, timeout_ms: u64) -> ZrResult<bool>;

    /// Blocks up to `timeout_ms` for output writability, when
    /// `supports_output_wait_writable` is set.
    fn wait_output_writable(&mut self, timeout_ms: u64) -> ZrResult<bool>;

    /// Interrupts a concurrent `wait`/`wait_output_writable` call, e.g.
    /// after a cross-thread `post_user`/`post_paste` injection.
    fn wake(&self);

    fn now_ms(&self) -> u64;
}
