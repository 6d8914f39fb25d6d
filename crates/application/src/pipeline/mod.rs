//! Per-request processing.
//!
//! A request runs through a fixed sequence of stages:
//!
//! - **client info**: DHCP name of the client
//! - **question filter**: rule list lookup before resolution
//! - **upstream**: forwarding
//! - **answer filter**: rule list lookup of CNAME targets and addresses
//! - **post-processors**: side effects such as ipset injection
//!
//! Each stage returns a [`ResultCode`]; the first non-`Success` code ends the
//! request.

pub mod context;
pub mod request_pipeline;
pub mod result_code;
pub mod stage;
pub mod stages;

pub use context::DnsContext;
pub use request_pipeline::{PipelineBuilder, RequestPipeline};
pub use result_code::ResultCode;
pub use stage::Stage;
