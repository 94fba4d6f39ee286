//! Session state for a connected client: router, fetcher and conversation context.

pub mod context;
pub mod fetcher;
pub mod manager;

pub use context::{ConversationContext, MergeReason};
pub use fetcher::DirectoryFetcher;
pub use manager::{AnalysisOutcome, RoutingSessionManager};
