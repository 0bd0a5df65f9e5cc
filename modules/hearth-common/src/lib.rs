pub mod config;
pub mod dates;
pub mod error;
pub mod types;

pub use config::{load_config, Config, FileConfig, LogFormat};
pub use dates::parse_event_date;
pub use error::{HearthError, HearthResult};
pub use types::*;
