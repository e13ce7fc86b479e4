#![forbid(unsafe_code)]

mod command;
mod frame;
mod parse;

pub use command::{Command, token_from_reference};
pub use frame::Frame;
pub use parse::Parse;
