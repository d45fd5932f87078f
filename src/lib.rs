pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::ReqwestTransport;
pub use core::{AverageDeckService, SummaryService};
pub use domain::model::{AverageDeckResponse, DeckResult};
pub use utils::error::{Result, ScoutError};
