//! Bootstrap resolution of upstream hostnames and sequential dial fallback
//! over the resolved candidates.

pub mod dialer;
pub mod resolve;
pub mod resolver;
pub mod upstream_url;

pub use dialer::{DialHandler, Dialer, NetDialer, Network, UpstreamConn};
pub use resolve::{resolve_dial, sort_by_preference};
pub use resolver::{ForwardingResolver, StaticResolver, SystemResolver};
pub use upstream_url::{UpstreamScheme, UpstreamUrl};
