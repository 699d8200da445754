pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod source;

pub use config::*;
pub use error::*;
pub use metrics::*;
pub use pipeline::*;
pub use source::*;
