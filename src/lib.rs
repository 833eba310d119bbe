pub mod catalog;
pub mod cli;
pub mod config;
pub mod design;
pub mod engine;
pub mod error;
pub mod export;
pub mod ledger;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod session;
pub mod types;
