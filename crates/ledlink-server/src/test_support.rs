//! Shared test doubles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::connection::{ClientSink, SendError};

/// In-memory sink that records every frame it accepts.
///
/// Clones share state, so a test can keep one handle while the controller
/// owns the other.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    inbox: Arc<Mutex<Vec<String>>>,
    open: Arc<AtomicBool>,
    full: Arc<AtomicBool>,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self {
            inbox: Arc::new(Mutex::new(Vec::new())),
            open: Arc::new(AtomicBool::new(true)),
            full: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl RecordingSink {
    pub fn received(&self) -> Vec<String> {
        self.inbox.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.inbox.lock().unwrap().clear();
    }

    /// Simulate the peer vanishing without a close event.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn set_full(&self, full: bool) {
        self.full.store(full, Ordering::SeqCst);
    }
}

impl ClientSink for RecordingSink {
    fn try_send_text(&mut self, text: &str) -> Result<(), SendError> {
        if !self.is_open() {
            return Err(SendError::Closed);
        }
        if self.full.load(Ordering::SeqCst) {
            return Err(SendError::Full);
        }
        self.inbox.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}
