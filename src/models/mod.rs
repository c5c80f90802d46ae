pub mod cluster;
pub mod config;
pub mod label;

pub use cluster::*;
pub use config::*;
pub use label::*;
