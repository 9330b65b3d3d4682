//! Network-boundary interceptor with per-origin caching strategies.
//!
//! The proxy has its own lifecycle (install → activate → intercept) and
//! shares nothing with the sync engine except the response cache. It
//! implements [`Transport`](crate::net::Transport), so it can be stacked in
//! front of the live HTTP transport without the engine knowing.

mod intercept;

pub use intercept::{InstallError, InterceptProxy, ProxyState};
