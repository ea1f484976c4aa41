mod feed_service;
mod relationship_service;
mod token_verifier;

pub use feed_service::*;
pub use relationship_service::*;
pub use token_verifier::*;
