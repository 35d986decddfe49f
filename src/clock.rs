//! Monotonic millisecond clock supplied by the host.
//!
//! The core never reads wall-clock time itself (spec section 5: no
//! suspension points, no ambient singletons). Every entry point that needs
//! "now" takes a [`Clock`] snapshot as an explicit argument, the same way the
//! teacher's Solana programs take `Clock::get()?.unix_timestamp` once per
//! instruction and thread it through.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Clock {
    pub now_ms: u64,
}

impl Clock {
    pub fn at(now_ms: u64) -> Self {
        Clock { now_ms }
    }

    pub fn advance(&mut self, delta_ms: u64) {
        self.now_ms = self.now_ms.saturating_add(delta_ms);
    }
}
