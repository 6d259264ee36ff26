// ABOUTME: Local port counter for port-forwards.
// ABOUTME: Atomic, so concurrent previews never pick the same local port.

use std::sync::atomic::{AtomicU32, Ordering};

/// Hands out local forward ports from `base` upward, wrapping within `span`.
#[derive(Debug)]
pub struct LocalPortCounter {
    base: u16,
    span: u16,
    next: AtomicU32,
}

impl LocalPortCounter {
    pub fn new(base: u16, span: u16) -> Self {
        Self {
            base,
            span: span.max(1),
            next: AtomicU32::new(0),
        }
    }

    pub fn next_port(&self) -> u16 {
        let offset = self.next.fetch_add(1, Ordering::Relaxed) % u32::from(self.span);
        // offset < span <= u16::MAX
        self.base.saturating_add(offset as u16)
    }
}
