//! Landing page and newsletter backend for the academy site.
//!
//! The binary in `main.rs` loads [`config::Config`] and hands it to
//! [`server::serve`]; everything else lives here so integration tests can
//! drive the router directly.
pub mod captcha;
pub mod catalog;
pub mod config;
pub mod feed;
pub mod mailer;
pub mod render;
pub mod server;
pub mod signup;
pub mod storage;
