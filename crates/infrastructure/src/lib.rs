//! dnsieve infrastructure: rule list engine, ipset integration, bootstrap
//! resolution with dial fallback, and plain DNS forwarding.

pub mod dns;
pub mod filtering;
pub mod ipset;
