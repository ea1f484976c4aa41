mod conversation_materializer;
mod feed_service_impl;
mod friendship_ledger;
mod pair_lock;
mod relationship_service_impl;
mod token_verifier_fake;
mod token_verifier_jwt;

pub use conversation_materializer::*;
pub use feed_service_impl::*;
pub use friendship_ledger::*;
pub use pair_lock::*;
pub use relationship_service_impl::*;
pub use token_verifier_fake::*;
pub use token_verifier_jwt::*;

#[cfg(test)]
pub(crate) mod test_support;
