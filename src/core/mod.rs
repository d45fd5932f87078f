pub mod average_deck;
pub mod bracket;
pub mod cache;
pub mod card_walker;
pub mod color_identity;
pub mod commander_split;
pub mod discovery;
pub mod fetcher;
pub mod hydration;
pub mod name_resolver;
pub mod payload;
pub mod sections;
pub mod site;
pub mod summary;
pub mod tag_walker;

pub use crate::domain::model::{Bracket, CommanderIdentity, DeckResult};
pub use crate::domain::ports::{CardEnricher, ConfigProvider, HttpTransport};
pub use crate::utils::error::Result;
pub use average_deck::AverageDeckService;
pub use summary::SummaryService;
