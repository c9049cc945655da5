//! Anonymous phone-verified stance voting.
//!
//! The protocol core lives in the platform-neutral modules below and is
//! exercised by host-side tests; the Cloudflare Worker HTTP surface is gated
//! on wasm32 and re-exported from `worker_wasm`.

// Collaborator traits are consumed generically within this workspace only.
#![allow(async_fn_in_trait)]

pub mod ballot;
pub mod candidate;
pub mod captcha;
pub mod config;
pub mod device_slots;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod phone;
pub mod ratelimit;
pub mod screen;
pub mod suppress;
pub mod token;
pub mod util;
pub mod verify;

#[cfg(target_arch = "wasm32")]
mod worker_wasm;

#[cfg(target_arch = "wasm32")]
pub use worker_wasm::*;
