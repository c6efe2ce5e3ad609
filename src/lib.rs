pub mod catalog;
pub mod config;
pub mod decode;
pub mod domain;
pub mod error;
pub mod eurostat;
pub mod jsonstat;
pub mod output;
pub mod period;
pub mod pipeline;
pub mod schedule;
pub mod server;
pub mod sink;
pub mod table;
