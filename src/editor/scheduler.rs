//! Timing for the editor: an edit debounce and a periodic autosave, both run
//! on one worker thread so every draft write and save happens in order.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub const EDIT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Work the scheduler asks its owner to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Persist the latest input as a draft and refresh the preview.
    Flush,
    /// Write unsaved changes to the daily file.
    Save,
}

enum WorkerMessage {
    Edited,
    SaveNow(Option<Sender<()>>),
    Shutdown,
}

pub struct EditorScheduler {
    sender: Mutex<Option<Sender<WorkerMessage>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl EditorScheduler {
    pub fn start<F>(debounce: Duration, autosave: Duration, on_intent: F) -> io::Result<Self>
    where
        F: FnMut(Intent) + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("jotter-editor".to_string())
            .spawn(move || worker_loop(receiver, debounce, autosave, on_intent))?;

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    fn send(&self, message: WorkerMessage) -> bool {
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        match sender.as_ref() {
            Some(sender) => sender.send(message).is_ok(),
            None => false,
        }
    }

    pub fn notify_edit(&self) {
        self.send(WorkerMessage::Edited);
    }

    /// Queue a save. Requests that pile up while one is running are merged.
    pub fn request_save(&self) {
        self.send(WorkerMessage::SaveNow(None));
    }

    /// Queue a save and block until it has been attempted or `timeout` passes.
    pub fn save_and_wait(&self, timeout: Duration) -> bool {
        let (done_tx, done_rx) = mpsc::channel();
        if !self.send(WorkerMessage::SaveNow(Some(done_tx))) {
            return false;
        }
        done_rx.recv_timeout(timeout).is_ok()
    }

    /// Flushes a pending edit, then stops and joins the worker. Idempotent.
    pub fn shutdown(&self) {
        self.send(WorkerMessage::Shutdown);
        self.sender.lock().unwrap_or_else(|e| e.into_inner()).take();

        let worker = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                tracing::error!("editor worker panicked");
            }
        }
    }
}

impl Drop for EditorScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop<F>(
    receiver: Receiver<WorkerMessage>,
    debounce: Duration,
    autosave: Duration,
    mut on_intent: F,
) where
    F: FnMut(Intent),
{
    let mut debounce_deadline: Option<Instant> = None;
    let mut next_autosave = Instant::now() + autosave;

    loop {
        let wake_at = debounce_deadline.map_or(next_autosave, |d| d.min(next_autosave));
        let timeout = wake_at.saturating_duration_since(Instant::now());

        match receiver.recv_timeout(timeout) {
            Ok(first) => {
                let mut save_requested = false;
                let mut replies = Vec::new();
                let mut shutting_down = false;

                for message in std::iter::once(first).chain(receiver.try_iter()) {
                    match message {
                        WorkerMessage::Edited => {
                            debounce_deadline = Some(Instant::now() + debounce);
                        }
                        WorkerMessage::SaveNow(reply) => {
                            save_requested = true;
                            replies.extend(reply);
                        }
                        WorkerMessage::Shutdown => shutting_down = true,
                    }
                }

                if save_requested {
                    debounce_deadline = None;
                    on_intent(Intent::Flush);
                    on_intent(Intent::Save);
                    for reply in replies {
                        let _ = reply.send(());
                    }
                }

                if shutting_down {
                    if debounce_deadline.take().is_some() {
                        on_intent(Intent::Flush);
                    }
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                if debounce_deadline.take().is_some() {
                    on_intent(Intent::Flush);
                }
                break;
            }
        }

        let now = Instant::now();
        if debounce_deadline.is_some_and(|deadline| now >= deadline) {
            debounce_deadline = None;
            on_intent(Intent::Flush);
        }
        if now >= next_autosave {
            next_autosave = now + autosave;
            on_intent(Intent::Flush);
            on_intent(Intent::Save);
        }
    }

    tracing::debug!("editor worker stopped");
}
