//! HTTP plumbing shared by network drivers.

pub mod http;

pub use http::{HttpConfig, HttpReply, HttpTransport};
