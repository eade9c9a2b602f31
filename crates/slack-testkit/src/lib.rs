//! Slack Test Kit
//!
//! A test harness that impersonates the Slack HTTP API so a Slack app can
//! be exercised end to end: real HTTP on both legs, no live workspace.
//!
//! This crate provides:
//! - A mock Slack Web API server that records `views.publish`, `views.open`
//!   and `chat.postMessage` calls (`server` module)
//! - User simulation: opening the app home, mentioning the app, running
//!   shortcuts and clicking buttons (`harness` module)
//! - Screen-oriented assertions over what the app rendered (`get_by_text`,
//!   `has_view_publish`)
//! - Fixture builders for channels, teams, views and blocks (`fixtures`
//!   module)
//!
//! ## Integration
//!
//! Point the app under test at the harness instead of `slack.com`: the mock
//! listens on `http://127.0.0.1:{port}` and serves the Web API under the
//! `/slack/api` prefix, answering every call with the generic
//! `{"ok": true}` envelope unless an intercept overrides it. Point the
//! harness at the app via `event_url` and `interaction_url`; simulated
//! activity is delivered there in Slack's wire shapes (JSON event
//! envelopes, form-encoded interaction payloads).
//!
//! Assertions poll briefly before failing, so an app that responds to an
//! event asynchronously does not need explicit synchronization in the test.

pub mod error;
pub mod fixtures;
mod harness;
mod logic;
mod server;
pub mod types;

pub use error::{HarnessError, LogKind, ScreenKind};
pub use harness::{AppIdentity, DEFAULT_BOT_ID, DEFAULT_PORT, HarnessConfig, SlackHarness};
pub use server::{MOCK_MARKER_HEADER, MOCK_MARKER_VALUE};
pub use types::{Actor, ElementKind};
