#[macro_use]
extern crate serde;

mod arith;
mod ballot;
mod config;
mod decryption;
mod election;
mod encryption;
mod error;
mod group;
mod keygen;
mod registry;
mod secret_share;
mod serde_decimal;
mod store;
mod tally;

pub use arith::*;
pub use ballot::*;
pub use config::*;
pub use decryption::*;
pub use election::*;
pub use encryption::*;
pub use error::*;
pub use group::*;
pub use keygen::*;
pub use registry::*;
pub use secret_share::*;
pub use serde_decimal::*;
pub use store::*;
pub use tally::*;
