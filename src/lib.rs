pub mod catalog;
pub mod config;
pub mod http;
pub mod session;
pub mod tally;
pub mod telemetry;
pub mod trivia;
pub mod util;
