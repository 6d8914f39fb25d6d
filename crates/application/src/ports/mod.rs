pub mod bootstrap_resolver;
pub mod dhcp;
pub mod filter_engine;
pub mod ipset_manager;
pub mod source_fetcher;
pub mod upstream;

pub use bootstrap_resolver::BootstrapResolver;
pub use dhcp::{DhcpReader, EmptyDhcp, StaticLeases};
pub use filter_engine::FilterEnginePort;
pub use ipset_manager::IpsetManager;
pub use source_fetcher::SourceFetcher;
pub use upstream::Upstream;
