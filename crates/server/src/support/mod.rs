#![forbid(unsafe_code)]

mod clock;
mod cookies;
mod tokens;

pub(crate) use clock::*;
pub(crate) use cookies::*;
pub(crate) use tokens::*;
