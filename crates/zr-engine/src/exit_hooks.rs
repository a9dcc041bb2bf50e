//! Process-wide registry of best-effort terminal-restore hooks. Each live
//! `Engine` registers one at construction and deregisters it on drop, so
//! an embedder's abort/panic/signal handler can call `run_all` and have it
//! do nothing once the last engine is gone.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type Hook = Box<dyn Fn() + Send>;

fn registry() -> &'static Mutex<HashMap<u64, Hook>> {
    static REGISTRY: OnceLock<Mutex<HashMap<u64, Hook>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Deregisters its hook on drop. An `Engine` holds one for its lifetime.
pub struct HookGuard(u64);

pub fn register(hook: impl Fn() + Send + 'static) -> HookGuard {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    registry().lock().unwrap().insert(id, Box::new(hook));
    HookGuard(id)
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        registry().lock().unwrap().remove(&self.0);
    }
}

/// Runs every currently registered hook, in registration order. Intended
/// to be wired into an embedder's `abort`/panic/signal handler; this crate
/// installs no handler of its own.
pub fn run_all() {
    let guard = registry().lock().unwrap();
    let mut ids: Vec<u64> = guard.keys().copied().collect();
    ids.sort_unstable();
    for id in ids {
        if let Some(hook) = guard.get(&id) {
            hook();
        }
    }
}

#[cfg(test)]
pub(crate) fn registered_count() -> usize {
    registry().lock().unwrap().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[test]
    fn hook_runs_until_guard_drops() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran2 = ran.clone();
        let before = registered_count();
        let guard = register(move || ran2.store(true, Ordering::SeqCst));
        assert_eq!(registered_count(), before + 1);
        run_all();
        assert!(ran.load(Ordering::SeqCst));
        drop(guard);
        assert_eq!(registered_count(), before);
    }
}
