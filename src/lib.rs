pub mod config;
pub mod corpus;
pub mod error;
pub mod logging;
pub mod page;
pub mod quiz;
