pub mod dns_server_mock;
pub mod fakes;
pub mod http_server_mock;

#[allow(unused_imports)]
pub use dns_server_mock::MockDnsServer;
#[allow(unused_imports)]
pub use fakes::*;
#[allow(unused_imports)]
pub use http_server_mock::MockHttpServer;
