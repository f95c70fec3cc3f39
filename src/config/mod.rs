//! # Configuration
//!
//! - `generator`: what to generate and where ([`GeneratorConfig`])
//! - `selector`: namespace label selectors
//! - `server`: metrics and health server settings
//! - `logging`: tracing subscriber settings
//! - `duration`: interval string parsing

pub mod duration;
pub mod generator;
pub mod logging;
pub mod selector;
pub mod server;

pub use duration::parse_duration;
pub use generator::GeneratorConfig;
pub use logging::LogConfig;
pub use selector::NamespaceSelector;
pub use server::ServerConfig;
