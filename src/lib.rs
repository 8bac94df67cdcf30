pub mod config;
pub mod deployment;
pub mod events;
pub mod logging;
pub mod processor;
pub mod repository;
pub mod rpc;
pub mod scanner;
pub mod state;
