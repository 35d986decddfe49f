//! Unxversal core: the shared risk and market engine reused by every
//! product in the suite (spot DEX, isolated lending, USDC-collateralized
//! synthetics, options, futures, gas futures, perpetuals and the
//! cross-protocol liquidator).
//!
//! This crate is host-agnostic: it owns no wallet, no transaction
//! executor and no storage substrate. Every entry point takes an explicit
//! [`clock::Clock`] reading and, for privileged mutations, an
//! [`admin::AdminCap`] proof; the host supplies both and drives balance
//! transfers through its own primitive. See `DESIGN.md` for the grounding
//! ledger against the teacher codebase this crate imitates.

pub mod admin;
pub mod clock;
pub mod error;
pub mod events;
pub mod fixed_math;
pub mod oracle;

pub mod fees;
pub mod staking;

pub mod orderbook;

pub mod lending;
pub mod synth;

pub mod liquidation;

pub mod derivatives;

pub use admin::AdminCap;
pub use clock::Clock;
pub use error::{CoreResult, ErrorCode};
