pub mod config;
pub mod error;
pub mod sample;

pub use config::*;
pub use error::*;
pub use sample::*;
