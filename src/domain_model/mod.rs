mod conversation;
mod friend;
mod ledger;
mod post;
mod unit;
mod user;

pub use conversation::*;
pub use friend::*;
pub use ledger::*;
pub use post::*;
pub use unit::*;
pub use user::*;
