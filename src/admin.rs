//! AdminCap (spec section 3): an unforgeable capability required by every
//! privileged mutation. Modeled the way the teacher reserves a single
//! `State` admin account and every parameter-setting instruction requires
//! its signer to match -- here there is no signer model, so the capability
//! itself is the proof: only code holding an `AdminCap` value can call a
//! gated setter, and the type has no public constructor outside `new`.

#[derive(Debug)]
pub struct AdminCap {
    _private: (),
}

impl AdminCap {
    /// Minted exactly once by whatever bootstraps the protocol (the host's
    /// genesis/initialize flow). The core never mints a second one itself;
    /// if the host wants shared governance it hands out clones of the same
    /// proof rather than asking this type to multiplex authority.
    pub fn new() -> Self {
        AdminCap { _private: () }
    }
}

impl Default for AdminCap {
    fn default() -> Self {
        Self::new()
    }
}
