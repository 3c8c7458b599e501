pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod plot;
pub mod report;
pub mod results;
