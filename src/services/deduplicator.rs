use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{PrepError, PrepResult};
use crate::models::{Game, GameKey, Location, TeamSchedule};

/// What to do with a schedule row that cannot become a `Game`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MalformedPolicy {
    /// Fail the whole run on the first malformed row.
    #[default]
    Abort,
    /// Drop the row, log it and keep going.
    Skip,
}

impl FromStr for MalformedPolicy {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(MalformedPolicy::Abort),
            "skip" => Ok(MalformedPolicy::Skip),
            other => Err(PrepError::Config(format!(
                "unknown malformed-record policy '{}', expected 'abort' or 'skip'",
                other
            ))),
        }
    }
}

/// Games keyed by their canonical key; iteration follows key order.
#[derive(Debug, Clone, Default)]
pub struct UniqueGames {
    games: BTreeMap<GameKey, Game>,
    /// Schedule rows (or games) offered to the deduplicator.
    pub seen: usize,
    /// Malformed rows dropped under `MalformedPolicy::Skip`.
    pub skipped: usize,
    /// Rows that collapsed onto an already stored key.
    pub collapsed: usize,
}

impl UniqueGames {
    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn get(&self, key: &GameKey) -> Option<&Game> {
        self.games.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &GameKey> {
        self.games.keys()
    }

    /// Games in canonical key order.
    pub fn games(&self) -> impl Iterator<Item = &Game> {
        self.games.values()
    }

    pub fn into_games(self) -> Vec<Game> {
        self.games.into_values().collect()
    }

    fn insert(&mut self, game: Game) {
        self.seen += 1;
        let key = game.key();
        match self.games.get_mut(&key) {
            None => {
                self.games.insert(key, game);
            }
            Some(stored) => {
                self.collapsed += 1;
                if stored.home_away_score() != game.home_away_score() {
                    // Either a same-day rematch or the two schedules disagree.
                    let (stored_home, stored_away) = stored.home_away_score();
                    let (home, away) = game.home_away_score();
                    tracing::warn!(
                        "Key {} reported with different scores ({}-{} vs {}-{})",
                        key,
                        stored_home,
                        stored_away,
                        home,
                        away
                    );
                }
                // The home side's view is canonical; otherwise the later row wins.
                if game.location == Location::Home || stored.location == Location::Away {
                    *stored = game;
                }
            }
        }
    }
}

/// Collapses the home-side and away-side schedule views of a game into one
/// record. On a shared key the home-side view is kept; between two views from
/// the same side the last one wins.
pub struct GameDeduplicator {
    policy: MalformedPolicy,
}

impl GameDeduplicator {
    pub fn new(policy: MalformedPolicy) -> Self {
        Self { policy }
    }

    pub fn deduplicate(&self, schedules: Vec<TeamSchedule>) -> PrepResult<UniqueGames> {
        let mut unique = UniqueGames::default();

        for schedule in schedules {
            for entry in schedule.entries {
                match Game::from_entry(&schedule.team, entry) {
                    Ok(game) => unique.insert(game),
                    Err(e) if self.policy == MalformedPolicy::Skip => {
                        tracing::warn!("Skipping schedule entry: {}", e);
                        unique.skipped += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        tracing::debug!(
            "Deduplicated {} entries into {} games ({} collapsed, {} skipped)",
            unique.seen + unique.skipped,
            unique.len(),
            unique.collapsed,
            unique.skipped
        );
        Ok(unique)
    }
}

/// Same collapse over games that are already validated.
pub fn deduplicate_games<I>(games: I) -> UniqueGames
where
    I: IntoIterator<Item = Game>,
{
    let mut unique = UniqueGames::default();
    for game in games {
        unique.insert(game);
    }
    unique
}
