//! Store-first access to League of Legends data from the Riot Games API.
//!
//! [`manager::DataManager`] is the entry point: it serves players, matches and
//! ranks from SQLite and only goes to Riot, through a shared rate limiter, on
//! a miss.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod manager;
pub mod outcome;
pub mod poller;
pub mod riot;
pub mod transform;
mod validate;

pub use error::AppError;
pub use manager::{BatchReport, DataManager};
pub use outcome::Outcome;
