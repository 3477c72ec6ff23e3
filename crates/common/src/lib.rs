pub mod alchemy;
pub mod config;
pub mod fixture;
pub mod observability;
pub mod provider;
pub mod script;
pub mod types;
