//! Optional serialization of read-modify-write cycles.
//!
//! In `Relaxed` mode two overlapping mutations of the same collection can
//! both load the same snapshot, and the later save wins. `Serialized` mode
//! queues them behind a mutex for the life of this process. Other processes
//! writing the same file are not covered.

use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum WriteMode {
    /// Unlocked load, mutate, save. Concurrent writers may lose updates.
    #[default]
    Relaxed,
    /// One mutation at a time per collection.
    Serialized,
}

pub struct WriteGate {
    lock: Option<Mutex<()>>,
}

impl WriteGate {
    pub fn new(mode: WriteMode) -> Self {
        let lock = match mode {
            WriteMode::Relaxed => None,
            WriteMode::Serialized => Some(Mutex::new(())),
        };
        Self { lock }
    }

    pub fn mode(&self) -> WriteMode {
        if self.lock.is_some() {
            WriteMode::Serialized
        } else {
            WriteMode::Relaxed
        }
    }

    /// Hold the returned guard across load and save.
    pub fn enter(&self) -> Option<MutexGuard<'_, ()>> {
        self.lock
            .as_ref()
            .map(|m| m.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
