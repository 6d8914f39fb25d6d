pub mod http_fetcher;
pub mod rule_list;

pub use http_fetcher::HttpFetcher;
pub use rule_list::RuleListEngine;
