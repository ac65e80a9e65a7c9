use crate::error::PrepResult;
use crate::models::TeamSchedule;
use crate::services::{GameDeduplicator, LinearSystem, LinearSystemBuilder, MalformedPolicy, ModelVariant, TeamMap};

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PreparedSystem {
    pub system: LinearSystem,
    pub games: usize,
    pub entries_seen: usize,
    pub entries_skipped: usize,
    pub duplicates_collapsed: usize,
}

/// Raw schedules → unique games (key order) → team map → linear system.
///
/// Any error aborts the whole run; no partial system is returned.
pub fn prepare(
    schedules: Vec<TeamSchedule>,
    variant: ModelVariant,
    policy: MalformedPolicy,
) -> PrepResult<PreparedSystem> {
    let unique = GameDeduplicator::new(policy).deduplicate(schedules)?;
    let (entries_seen, entries_skipped, duplicates_collapsed) =
        (unique.seen, unique.skipped, unique.collapsed);

    let games = unique.into_games();
    let team_map = TeamMap::from_games(&games);
    tracing::info!("Indexed {} teams across {} unique games", team_map.len(), games.len());

    let system = LinearSystemBuilder::build(variant, &games, team_map)?;
    tracing::info!(
        "Built {} system with {} rows and {} columns",
        variant,
        system.rows(),
        system.cols()
    );

    Ok(PreparedSystem {
        system,
        games: games.len(),
        entries_seen,
        entries_skipped,
        duplicates_collapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrepError;
    use crate::models::{ScheduleEntry, Team, TeamId};
    use serde_json::json;

    fn row(opponent: &str, date: &str, location: &str, pf: u32, pa: u32) -> ScheduleEntry {
        serde_json::from_value(json!({
            "opponent": {"id": opponent},
            "date": date,
            "location": {"type": location},
            "result": {"pointsFor": pf, "pointsAgainst": pa}
        }))
        .unwrap()
    }

    fn two_team_season() -> Vec<TeamSchedule> {
        vec![
            TeamSchedule {
                team: Team::new("A"),
                entries: vec![row("B", "2019-09-07", "home", 10, 7)],
            },
            TeamSchedule {
                team: Team::new("B"),
                entries: vec![row("A", "2019-09-07", "away", 7, 10)],
            },
        ]
    }

    fn entries(system: &LinearSystem) -> Vec<(usize, usize, f64)> {
        let mut t: Vec<_> = system.triplets().collect();
        t.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        t
    }

    #[test]
    fn test_two_team_overall() {
        let prepared = prepare(two_team_season(), ModelVariant::Overall, MalformedPolicy::Abort).unwrap();
        let system = &prepared.system;

        assert_eq!(prepared.games, 1);
        assert_eq!(prepared.duplicates_collapsed, 1);
        assert_eq!(system.team_map.index_of(&TeamId::from("A")), Some(0));
        assert_eq!(system.team_map.index_of(&TeamId::from("B")), Some(1));
        assert_eq!(entries(system), vec![(0, 0, 1.0), (0, 1, -1.0)]);
        assert_eq!(system.constants.as_slice(), &[3.0]);
    }

    #[test]
    fn test_two_team_offensive_defensive() {
        let prepared = prepare(
            two_team_season(),
            ModelVariant::OffensiveDefensive,
            MalformedPolicy::Abort,
        )
        .unwrap();
        let system = &prepared.system;

        assert_eq!((system.rows(), system.cols()), (2, 4));
        assert_eq!(
            entries(system),
            vec![(0, 0, 1.0), (0, 3, -1.0), (1, 1, 1.0), (1, 2, -1.0)]
        );
        assert_eq!(system.constants.as_slice(), &[10.0, 7.0]);
    }

    #[test]
    fn test_reversed_fetch_order_gives_same_system() {
        let mut reversed = two_team_season();
        reversed.reverse();

        let a = prepare(two_team_season(), ModelVariant::Overall, MalformedPolicy::Abort).unwrap();
        let b = prepare(reversed, ModelVariant::Overall, MalformedPolicy::Abort).unwrap();

        assert_eq!(entries(&a.system), entries(&b.system));
        assert_eq!(a.system.constants, b.system.constants);
    }

    #[test]
    fn test_malformed_row_aborts_run() {
        let mut season = two_team_season();
        season[1].entries.push(ScheduleEntry::default());

        let err = prepare(season, ModelVariant::Overall, MalformedPolicy::Abort).unwrap_err();
        assert!(matches!(err, PrepError::MalformedGame { .. }));
    }

    #[test]
    fn test_empty_run() {
        let prepared = prepare(Vec::new(), ModelVariant::OffensiveDefensive, MalformedPolicy::Abort).unwrap();

        assert!(prepared.system.team_map.is_empty());
        assert_eq!(prepared.system.rows(), 0);
        assert_eq!(prepared.system.cols(), 0);
        assert_eq!(prepared.system.constants.len(), 0);
    }
}
