#[macro_use]
extern crate log;

pub mod config;
pub mod context;
pub mod database;
pub mod discord;
pub mod error;
pub mod leaderboard;
pub mod logging;
pub mod stats;
pub mod util;

#[cfg(test)]
mod testing;
