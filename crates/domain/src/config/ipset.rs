use serde::{Deserialize, Serialize};

/// ipset integration (Linux only).
///
/// Each entry uses the syntax `DOMAIN[,DOMAIN...]/IPSET_NAME[,IPSET_NAME...]`.
/// Blank lines and comments are rejected during validation. The named sets
/// must already exist.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IpsetConfig {
    #[serde(default)]
    pub list: Vec<String>,
}
