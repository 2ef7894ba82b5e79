pub mod calendar;
pub mod cli;
pub mod date;
pub mod error;
pub mod holiday;
pub mod oauth;
pub mod server;
pub mod session;
pub mod tags;

pub use error::Error;
