#[macro_use]
extern crate serde;

mod ballot;
mod cipher;
mod config;
mod error;
mod keypair;
mod machine;
mod signature;
mod store;
mod voter;

pub use ballot::*;
pub use cipher::*;
pub use config::*;
pub use error::*;
pub use keypair::*;
pub use machine::*;
pub use signature::*;
pub use store::*;
pub use voter::*;
