pub mod client;
pub mod pricing;
