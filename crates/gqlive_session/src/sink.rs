//! The live document model.
//!
//! A single accumulating buffer that the executor appends to through one
//! mutation entry point. Subscriptions prepend (newest first), everything
//! else appends (oldest first). Every mutation fires the change observers
//! and re-renders synchronously before returning.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use gqlive_core::OperationKind;

use crate::capabilities::Renderer;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// The accumulating result buffer plus its notification fan-out.
pub struct ResultSink {
    document: String,
    buffer: Mutex<String>,
    renderer: Arc<dyn Renderer>,
    changed: broadcast::Sender<String>,
}

impl ResultSink {
    /// `document` identifies the originating source; it is the only
    /// payload change notifications carry.
    pub fn new(document: impl Into<String>, renderer: Arc<dyn Renderer>) -> Self {
        let (changed, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            document: document.into(),
            buffer: Mutex::new(String::new()),
            renderer,
            changed,
        }
    }

    /// The identity of the document this sink belongs to.
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Appends one execution result increment.
    ///
    /// The buffer only ever grows within a session; increments are joined
    /// by a single newline.
    pub fn append_increment(&self, text: &str, kind: OperationKind) {
        let snapshot = {
            let mut buffer = match self.buffer.lock() {
                Ok(buffer) => buffer,
                Err(poisoned) => poisoned.into_inner(),
            };
            if buffer.is_empty() {
                buffer.push_str(text);
            } else if kind.is_subscription() {
                // Newest first for push streams.
                let mut next = String::with_capacity(text.len() + 1 + buffer.len());
                next.push_str(text);
                next.push('\n');
                next.push_str(&buffer);
                *buffer = next;
            } else {
                buffer.push('\n');
                buffer.push_str(text);
            }
            buffer.clone()
        };

        let _ = self.changed.send(self.document.clone());
        self.renderer.render(&snapshot);
    }

    /// The current buffer contents. Never blocks on in-flight work.
    pub fn snapshot(&self) -> String {
        match self.buffer.lock() {
            Ok(buffer) => buffer.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Subscribes to change notifications; each event carries the
    /// document identity and nothing else.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<String> {
        self.changed.subscribe()
    }
}
