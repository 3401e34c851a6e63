pub mod api;
pub mod config;
pub mod error;
pub mod run;
pub mod tool;
mod tracing;

pub use api::*;
pub use config::*;
pub use error::*;
pub use run::*;
pub use tool::*;
pub use tracing::init_tracing;
