//! Core pipeline for the board-to-Telegram image forwarding bot.
//!
//! This crate is intentionally framework-agnostic. The board API, the
//! Telegram transport and the Postgres store live behind ports (traits)
//! implemented in adapter crates.

pub mod catalog;
pub mod config;
pub mod discovery;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod filter;
pub mod ledger;
pub mod logging;
pub mod ports;
pub mod refresh;
pub mod registry;

#[cfg(test)]
pub(crate) mod testutil;

pub use errors::{Error, Result};
