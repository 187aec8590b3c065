pub mod erc8004;
pub mod wallet;

pub use erc8004::{build_registration, ClientOptions, Erc8004Client};
