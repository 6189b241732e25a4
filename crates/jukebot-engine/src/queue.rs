// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded FIFO admission queue for plays.

use std::collections::VecDeque;
use std::sync::Mutex;

use jukebot_core::JukebotError;
use tokio::sync::Notify;

use crate::play::Play;

/// Capacity-bounded FIFO. Admission never blocks: a full queue rejects
/// with `QueueFull` and leaves state untouched.
pub(crate) struct SongQueue {
    inner: Mutex<VecDeque<Play>>,
    notify: Notify,
    capacity: usize,
}

impl SongQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            notify: Notify::new(),
            capacity,
        }
    }

    /// Admits a play in insertion order, waking the sender.
    pub fn push(&self, play: Play) -> Result<(), JukebotError> {
        {
            let mut queue = self.inner.lock().expect("queue lock poisoned");
            if queue.len() >= self.capacity {
                return Err(JukebotError::QueueFull);
            }
            queue.push_back(play);
        }
        self.notify.notify_one();
        Ok(())
    }

    /// Removes and returns the oldest play, if any.
    pub fn pop(&self) -> Option<Play> {
        self.inner.lock().expect("queue lock poisoned").pop_front()
    }

    /// Resolves after the next `push`.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    /// Titles of queued plays in admission order.
    pub fn titles(&self) -> Vec<String> {
        self.inner
            .lock()
            .expect("queue lock poisoned")
            .iter()
            .map(|p| p.metadata.title.clone())
            .collect()
    }

    /// Removes every queued play, returning them for end-callback
    /// delivery.
    pub fn drain(&self) -> Vec<Play> {
        self.inner
            .lock()
            .expect("queue lock poisoned")
            .drain(..)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("queue lock poisoned").len()
    }
}
