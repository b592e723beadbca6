pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::DocentConfig;
pub use error::{DocentError, Result};
pub use events::LogUpdate;
pub use types::*;
