use std::sync::Mutex;

/// Flag passed by the login item so the window stays hidden at boot.
pub const HIDDEN_FLAG: &str = "--hidden";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Initializing,
    Running,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDisposition {
    /// Keep the process alive and just hide the window.
    Hide,
    /// Let the window close; the app is going away.
    Allow,
}

/// Process-wide lifecycle: the current phase plus the gate that keeps window
/// creation single-flight.
pub struct Lifecycle {
    phase: Mutex<Phase>,
    window_gate: Mutex<()>,
    started_hidden: bool,
}

impl Lifecycle {
    pub fn new(started_hidden: bool) -> Self {
        Self {
            phase: Mutex::new(Phase::Starting),
            window_gate: Mutex::new(()),
            started_hidden,
        }
    }

    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Self {
        Self::new(args.into_iter().any(|arg| arg == HIDDEN_FLAG))
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn started_hidden(&self) -> bool {
        self.started_hidden
    }

    fn transition(&self, from: Phase, to: Phase) -> bool {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        if *phase != from {
            tracing::warn!(current = ?*phase, ?from, ?to, "ignoring lifecycle transition");
            return false;
        }
        tracing::debug!(?from, ?to, "lifecycle transition");
        *phase = to;
        true
    }

    pub fn begin_initializing(&self) -> bool {
        self.transition(Phase::Starting, Phase::Initializing)
    }

    pub fn mark_running(&self) -> bool {
        self.transition(Phase::Initializing, Phase::Running)
    }

    /// Enter `Quitting` from any phase. Returns `false` if already quitting.
    pub fn request_quit(&self) -> bool {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        if *phase == Phase::Quitting {
            return false;
        }
        tracing::info!(from = ?*phase, "quit requested");
        *phase = Phase::Quitting;
        true
    }

    pub fn is_quitting(&self) -> bool {
        self.phase() == Phase::Quitting
    }

    pub fn close_disposition(&self) -> CloseDisposition {
        if self.is_quitting() {
            CloseDisposition::Allow
        } else {
            CloseDisposition::Hide
        }
    }

    /// Return the existing window or create one. Concurrent callers are
    /// serialized so `create` runs at most once while a window exists.
    /// The flag is `true` when the window was created by this call.
    pub fn show_or_create<W, E>(
        &self,
        find: impl FnOnce() -> Option<W>,
        create: impl FnOnce() -> Result<W, E>,
    ) -> Result<(W, bool), E> {
        let _gate = self.window_gate.lock().unwrap_or_else(|e| e.into_inner());
        match find() {
            Some(window) => Ok((window, false)),
            None => create().map(|window| (window, true)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn walks_through_the_phases_in_order() {
        let lifecycle = Lifecycle::new(false);
        assert_eq!(lifecycle.phase(), Phase::Starting);
        assert!(!lifecycle.mark_running());

        assert!(lifecycle.begin_initializing());
        assert!(lifecycle.mark_running());
        assert_eq!(lifecycle.phase(), Phase::Running);

        assert!(lifecycle.request_quit());
        assert!(!lifecycle.request_quit());
        assert_eq!(lifecycle.phase(), Phase::Quitting);
        assert!(!lifecycle.begin_initializing());
    }

    #[test]
    fn close_hides_until_quit_is_requested() {
        let lifecycle = Lifecycle::new(false);
        lifecycle.begin_initializing();
        lifecycle.mark_running();
        assert_eq!(lifecycle.close_disposition(), CloseDisposition::Hide);

        lifecycle.request_quit();
        assert_eq!(lifecycle.close_disposition(), CloseDisposition::Allow);
    }

    #[test]
    fn init_failure_can_quit_directly() {
        let lifecycle = Lifecycle::new(false);
        lifecycle.begin_initializing();
        assert!(lifecycle.request_quit());
        assert!(lifecycle.is_quitting());
    }

    #[test]
    fn hidden_flag_is_detected_from_args() {
        let args = vec!["jotter".to_string(), HIDDEN_FLAG.to_string()];
        assert!(Lifecycle::from_args(args).started_hidden());
        assert!(!Lifecycle::from_args(vec!["jotter".to_string()]).started_hidden());
    }

    #[test]
    fn racing_show_requests_create_exactly_one_window() {
        let lifecycle = Arc::new(Lifecycle::new(false));
        let windows = Arc::new(std::sync::Mutex::new(None::<usize>));
        let created = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let lifecycle = Arc::clone(&lifecycle);
                let windows = Arc::clone(&windows);
                let created = Arc::clone(&created);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    lifecycle
                        .show_or_create(
                            || *windows.lock().expect("registry"),
                            || {
                                // Window construction is slow enough to overlap.
                                thread::sleep(Duration::from_millis(50));
                                let id = created.fetch_add(1, Ordering::SeqCst);
                                *windows.lock().expect("registry") = Some(id);
                                Ok::<_, ()>(id)
                            },
                        )
                        .expect("show")
                })
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .collect();

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(results.iter().filter(|(_, fresh)| *fresh).count(), 1);
        assert!(results.iter().all(|(id, _)| *id == 0));
    }
}
