use std::collections::HashMap;

use crate::error::{PrepError, PrepResult};
use crate::models::{Game, Team, TeamId};

/// Dense, first-seen index of every team in a game collection.
///
/// Indices run `0..len()` without gaps and never change once the map is
/// built. Column `i` of a linear system belongs to `team(i)`.
#[derive(Debug, Clone, Default)]
pub struct TeamMap {
    ids_to_indices: HashMap<TeamId, usize>,
    teams: Vec<Team>,
}

impl TeamMap {
    /// Index every `team` then `opponent` in the order the games are given.
    pub fn from_games<'a, I>(games: I) -> Self
    where
        I: IntoIterator<Item = &'a Game>,
    {
        let mut indexer = TeamIndexer::new();
        for game in games {
            indexer.index_game(game);
        }
        indexer.finish()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn index_of(&self, id: &TeamId) -> Option<usize> {
        self.ids_to_indices.get(id).copied()
    }

    /// Like `index_of`, but a missing team is a caller error.
    pub fn require_index(&self, id: &TeamId) -> PrepResult<usize> {
        self.index_of(id)
            .ok_or_else(|| PrepError::UnknownTeam { team: id.clone() })
    }

    pub fn team(&self, index: usize) -> Option<&Team> {
        self.teams.get(index)
    }

    /// `(index, team)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Team)> {
        self.teams.iter().enumerate()
    }
}

/// Builds a `TeamMap`; `index_or_register` is the only place indices are
/// handed out.
#[derive(Debug, Default)]
pub struct TeamIndexer {
    map: TeamMap,
}

impl TeamIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing index for `team`, or the next free one if it is new.
    pub fn index_or_register(&mut self, team: &Team) -> usize {
        if let Some(index) = self.map.index_of(&team.id) {
            return index;
        }

        let index = self.map.teams.len();
        self.map.ids_to_indices.insert(team.id.clone(), index);
        self.map.teams.push(team.clone());
        tracing::trace!("Registered team {} at index {}", team.id, index);
        index
    }

    pub fn index_game(&mut self, game: &Game) {
        self.index_or_register(&game.team);
        self.index_or_register(&game.opponent);
    }

    pub fn finish(self) -> TeamMap {
        self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameResult, Location};
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::HashSet;

    fn game(team: &str, opponent: &str, day: i64) -> Game {
        Game {
            team: Team::new(team),
            opponent: Team::new(opponent),
            date: Utc.with_ymd_and_hms(2019, 9, 1, 0, 0, 0).unwrap() + Duration::days(day),
            location: Location::Home,
            result: GameResult {
                points_for: 1.0,
                points_against: 0.0,
            },
        }
    }

    #[test]
    fn test_first_seen_order() {
        let games = vec![game("A", "B", 0), game("C", "A", 1), game("B", "D", 2)];
        let map = TeamMap::from_games(&games);

        assert_eq!(map.len(), 4);
        for (id, expected) in [("A", 0), ("B", 1), ("C", 2), ("D", 3)] {
            assert_eq!(map.index_of(&TeamId::from(id)), Some(expected));
            assert_eq!(map.team(expected).unwrap().id.as_str(), id);
        }
    }

    #[test]
    fn test_indices_are_contiguous() {
        let games: Vec<Game> = (0..30)
            .map(|i| game(&format!("T{}", i % 7), &format!("T{}", (i * 3 + 1) % 11), i))
            .filter(|g| g.team.id != g.opponent.id)
            .collect();
        let map = TeamMap::from_games(&games);

        let indices: HashSet<usize> = games
            .iter()
            .flat_map(|g| [&g.team.id, &g.opponent.id])
            .map(|id| map.index_of(id).unwrap())
            .collect();
        assert_eq!(indices.len(), map.len());
        assert_eq!(indices, (0..map.len()).collect::<HashSet<_>>());
        assert_eq!(map.iter().count(), map.len());
        for (i, team) in map.iter() {
            assert_eq!(map.index_of(&team.id), Some(i));
        }
    }

    #[test]
    fn test_index_or_register_is_stable() {
        let mut indexer = TeamIndexer::new();
        let a = Team::new("A").with_detail("name", "Alpha");

        assert_eq!(indexer.index_or_register(&a), 0);
        assert_eq!(indexer.index_or_register(&Team::new("B")), 1);
        assert_eq!(indexer.index_or_register(&Team::new("A")), 0);

        let map = indexer.finish();
        assert_eq!(map.len(), 2);
        // The first sighting's record is the one kept.
        assert_eq!(map.team(0).unwrap().name(), Some("Alpha"));
    }

    #[test]
    fn test_require_index_unknown_team() {
        let map = TeamMap::from_games(&[game("A", "B", 0)]);

        assert_eq!(map.require_index(&TeamId::from("B")), Ok(1));
        assert_eq!(
            map.require_index(&TeamId::from("Z")),
            Err(PrepError::UnknownTeam {
                team: TeamId::from("Z")
            })
        );
    }

    #[test]
    fn test_empty_collection() {
        let map = TeamMap::from_games(&Vec::<Game>::new());
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert!(map.team(0).is_none());
    }
}
