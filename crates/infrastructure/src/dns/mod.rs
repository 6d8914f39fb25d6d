pub mod bootstrap;
pub mod forwarding;
