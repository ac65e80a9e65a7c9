//! Prepares least-squares inputs for Massey-style team ratings.
//!
//! Schedules fetched per team are collapsed into unique games, every team is
//! given a dense column index, and the games are laid out as a sparse
//! coefficient matrix with a matching constants vector.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use error::{PrepError, PrepResult};
