#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! vendod - digital-goods fulfillment server
//!
//! Wires the fulfillment pipeline into an HTTP surface: an order
//! webhook endpoint, a one-time download endpoint, and a health check.
//! All policy lives in the library crates; this crate only maps
//! outcomes to status codes.

pub mod handlers;
pub mod server;

pub use server::{router, AppState};
