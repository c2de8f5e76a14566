use std::fs;
use std::path::{Path, PathBuf};
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::error::LockError;

pub const LOCK_FILE_NAME: &str = "app.lock";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// No previous lock file.
    Fresh,
    /// The recorded process is gone (crash or kill); lock replaced.
    ReplacedStale(u32),
    /// The recorded process is alive but the OS lock went to us, so the PID
    /// was reused by an unrelated program.
    TookOverLive(u32),
}

/// PID file backing up the OS single-instance lock. Removed on release or drop.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    pid: u32,
    released: bool,
}

impl InstanceLock {
    pub fn acquire(path: &Path) -> Result<(Self, LockOutcome), LockError> {
        Self::acquire_with(path, std::process::id(), is_process_alive)
    }

    fn acquire_with(
        path: &Path,
        pid: u32,
        is_alive: impl Fn(u32) -> bool,
    ) -> Result<(Self, LockOutcome), LockError> {
        let outcome = match read_pid(path) {
            None if path.exists() => {
                tracing::info!(path = %path.display(), "unreadable lock file, replacing");
                LockOutcome::ReplacedStale(0)
            }
            None => LockOutcome::Fresh,
            Some(old) if old == pid => LockOutcome::Fresh,
            Some(old) if is_alive(old) => {
                tracing::warn!(pid = old, "lock file names a live process, taking over");
                LockOutcome::TookOverLive(old)
            }
            Some(old) => {
                tracing::info!(pid = old, "stale lock file found, creating new one");
                LockOutcome::ReplacedStale(old)
            }
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| LockError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, pid.to_string()).map_err(|source| LockError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok((
            Self {
                path: path.to_path_buf(),
                pid,
                released: false,
            },
            outcome,
        ))
    }

    /// Remove the lock file if it still belongs to this process.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if read_pid(&self.path) != Some(self.pid) {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "lock file removed"),
            Err(e) => tracing::error!(path = %self.path.display(), error = %e, "failed to remove lock file"),
        }
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        self.release();
    }
}

fn read_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

pub fn is_process_alive(pid: u32) -> bool {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);
    system.process(Pid::from_u32(pid)).is_some()
}
