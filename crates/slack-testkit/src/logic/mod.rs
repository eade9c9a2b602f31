//! Core harness logic
//!
//! Request classification, block matching, log polling, and the HTTP
//! client that delivers synthesized traffic to the application under test.

pub mod blocks;
pub mod classify;
pub mod client;
pub mod poll;
