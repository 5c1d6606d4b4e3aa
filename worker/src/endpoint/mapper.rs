use crate::types::{ConfiguredCatalog, Message};

/// A pure message/catalog transform applied between source and destination.
///
/// The worker assumes no side effects: mapping the same input twice must
/// yield the same output.
pub trait Mapper: Clone + Send + Sync + 'static {
    /// Maps the configured catalog into the form the destination receives.
    fn map_catalog(&self, catalog: ConfiguredCatalog) -> ConfiguredCatalog;

    /// Maps a single message before it is handed to the destination.
    fn map_message(&self, message: Message) -> Message;
}
