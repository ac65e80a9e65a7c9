use thiserror::Error;

use crate::models::TeamId;

/// Errors raised while turning schedules into a linear system.
///
/// An empty game collection is never an error; every stage yields a valid
/// empty result for it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrepError {
    /// A schedule entry is missing (or carries an unusable) field needed for
    /// its canonical key or its matrix rows.
    #[error("Malformed game in schedule of team {team}: {field} {reason}")]
    MalformedGame {
        team: TeamId,
        field: &'static str,
        reason: String,
    },

    /// A game references a team the supplied `TeamMap` has never seen.
    #[error("Unknown team {team}: team map was built from a different game collection")]
    UnknownTeam { team: TeamId },

    #[error("Invalid sparse matrix layout: {0}")]
    InvalidMatrix(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PrepError {
    pub fn malformed(team: &TeamId, field: &'static str, reason: impl Into<String>) -> Self {
        PrepError::MalformedGame {
            team: team.clone(),
            field,
            reason: reason.into(),
        }
    }
}

pub type PrepResult<T> = std::result::Result<T, PrepError>;
