//! Client SDK for the ERC-8004 identity, reputation and validation registries.

pub mod client;
pub mod config;
pub mod contracts;
pub mod error;
pub mod models;
pub mod services;

pub use client::{ClientOptions, Erc8004Client};
pub use error::{Erc8004Error, Result};
pub use services::chains::{get_chain, supported_chains};
