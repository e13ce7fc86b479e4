#![forbid(unsafe_code)]

mod entry;
mod store;
mod sweeper;
mod token;

pub use store::MessageStore;
pub use token::Token;
