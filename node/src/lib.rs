//! Mirror governance node: configuration, logging, storage wiring, the
//! deadline resolver and the integrity service client.

pub mod config;
pub mod error;
pub mod integrity_client;
pub mod logging;
pub mod node;
pub mod resolver;
pub mod shutdown;

pub use config::MirrorConfig;
pub use error::NodeError;
pub use integrity_client::HttpIntegrityScorer;
pub use logging::{init_logging, LogFormat};
pub use node::MirrorNode;
pub use resolver::DeadlineResolver;
pub use shutdown::ShutdownController;
