//! Event queue between the chat runtime and the UI.
//!
//! Single-threaded (WASM) and shared through `Rc<RefCell<..>>`. The runtime
//! pushes, the UI drains once per frame. Streaming deltas of the same kind
//! that arrive between two frames are merged into one event, so a fast
//! stream does not grow the queue by one entry per token.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use pec_types::event::ChatEvent;

#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<VecDeque<ChatEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: ChatEvent) {
        let mut queue = self.inner.borrow_mut();
        match (queue.back_mut(), event) {
            (Some(ChatEvent::ContentDelta { text: acc }), ChatEvent::ContentDelta { text }) => {
                acc.push_str(&text);
            }
            (Some(ChatEvent::ReasoningDelta { text: acc }), ChatEvent::ReasoningDelta { text }) => {
                acc.push_str(&text);
            }
            (_, event) => queue.push_back(event),
        }
    }

    /// Publish several events in order.
    pub fn emit_all(&self, events: impl IntoIterator<Item = ChatEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    /// Take everything queued since the last frame.
    pub fn drain(&self) -> Vec<ChatEvent> {
        self.inner.borrow_mut().drain(..).collect()
    }

    /// Used to request a repaint while a turn is streaming.
    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_pending()
    }
}
