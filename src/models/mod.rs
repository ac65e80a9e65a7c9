use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{PrepError, PrepResult};

/// Opaque, source-stable team identifier.
///
/// The data source is free to send ids as JSON strings or integers; both are
/// normalized to their string form so `7` and `"7"` name the same team.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    pub fn new(id: impl Into<String>) -> Self {
        TeamId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeamId {
    fn from(id: &str) -> Self {
        TeamId::new(id)
    }
}

impl<'de> Deserialize<'de> for TeamId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(TeamId(s)),
            Value::Number(n) => Ok(TeamId(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "team id must be a string or a number, got {}",
                other
            ))),
        }
    }
}

/// A competing entity. Only `id` carries meaning here; every other field of
/// the wire record is kept verbatim in `details`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Team {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: TeamId::new(id),
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Display name if the source provided one.
    pub fn name(&self) -> Option<&str> {
        self.details.get("name").and_then(Value::as_str)
    }
}

impl PartialEq for Team {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Team {}

impl Hash for Team {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// ── data source wire shapes ─────────────────────────────────────────────────

/// `GET /teams`
#[derive(Debug, Deserialize)]
pub struct TeamsResponse {
    pub teams: Vec<Team>,
}

/// `GET /teams/{team_id}/schedule`
#[derive(Debug, Deserialize)]
pub struct ScheduleResponse {
    pub schedule: Vec<ScheduleEntry>,
}

/// One row of a team's schedule exactly as the data source sent it.
///
/// Fields are kept as raw JSON so that a single bad row never fails decoding
/// of the whole schedule; `Game::from_entry` decides whether the row is
/// usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub opponent: Option<Value>,
    pub date: Option<Value>,
    pub location: Option<Value>,
    pub result: Option<Value>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// A team's own schedule, tagged with the team it was fetched for.
#[derive(Debug, Clone)]
pub struct TeamSchedule {
    pub team: Team,
    pub entries: Vec<ScheduleEntry>,
}

// ── validated records ───────────────────────────────────────────────────────

/// Where `Game::team` played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Home,
    Away,
}

impl Location {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "home" => Some(Location::Home),
            "away" => Some(Location::Away),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    /// Score of `Game::team`.
    pub points_for: f64,
    /// Score of `Game::opponent`.
    pub points_against: f64,
}

impl GameResult {
    pub fn differential(&self) -> f64 {
        self.points_for - self.points_against
    }
}

/// One completed matchup seen from `team`'s side.
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub team: Team,
    pub opponent: Team,
    pub date: DateTime<Utc>,
    pub location: Location,
    pub result: GameResult,
}

impl Game {
    /// Validate a raw schedule row and attach the team whose schedule it came
    /// from.
    pub fn from_entry(team: &Team, entry: ScheduleEntry) -> PrepResult<Game> {
        let opponent = parse_opponent(&team.id, entry.opponent)?;
        if opponent.id == team.id {
            return Err(PrepError::malformed(
                &team.id,
                "opponent",
                "references the scheduling team itself",
            ));
        }

        let date = match entry.date {
            Some(Value::String(raw)) => parse_game_date(&raw).ok_or_else(|| {
                PrepError::malformed(&team.id, "date", format!("'{}' is not a recognised date", raw))
            })?,
            Some(other) => {
                return Err(PrepError::malformed(
                    &team.id,
                    "date",
                    format!("must be a string, got {}", other),
                ))
            }
            None => return Err(PrepError::malformed(&team.id, "date", "is missing")),
        };

        let location = parse_location(&team.id, entry.location)?;

        let result = match entry.result {
            Some(Value::Object(result)) => result,
            Some(other) => {
                return Err(PrepError::malformed(
                    &team.id,
                    "result",
                    format!("must be an object, got {}", other),
                ))
            }
            None => return Err(PrepError::malformed(&team.id, "result", "is missing")),
        };
        let points_for = parse_points(&team.id, "result.pointsFor", result.get("pointsFor"))?;
        let points_against =
            parse_points(&team.id, "result.pointsAgainst", result.get("pointsAgainst"))?;

        Ok(Game {
            team: team.clone(),
            opponent,
            date,
            location,
            result: GameResult {
                points_for,
                points_against,
            },
        })
    }

    pub fn home_team(&self) -> &Team {
        match self.location {
            Location::Home => &self.team,
            Location::Away => &self.opponent,
        }
    }

    pub fn away_team(&self) -> &Team {
        match self.location {
            Location::Home => &self.opponent,
            Location::Away => &self.team,
        }
    }

    /// Both participants' schedules produce the same key for one physical game.
    pub fn key(&self) -> GameKey {
        GameKey {
            away: self.away_team().id.clone(),
            home: self.home_team().id.clone(),
            date: self.date,
        }
    }

    /// `(home score, away score)` regardless of which side reported the game.
    pub fn home_away_score(&self) -> (f64, f64) {
        match self.location {
            Location::Home => (self.result.points_for, self.result.points_against),
            Location::Away => (self.result.points_against, self.result.points_for),
        }
    }
}

/// Canonical identity of a physical game: `(away, home, date)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameKey {
    pub away: TeamId,
    pub home: TeamId,
    pub date: DateTime<Utc>,
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.away,
            self.home,
            self.date.format("%Y-%m-%dT%H:%M:%SZ")
        )
    }
}

/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS` timestamps and
/// plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_game_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(raw) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(d.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}

fn parse_opponent(team: &TeamId, raw: Option<Value>) -> PrepResult<Team> {
    let raw = match raw {
        Some(raw @ Value::Object(_)) => raw,
        Some(other) => {
            return Err(PrepError::malformed(
                team,
                "opponent",
                format!("must be an object, got {}", other),
            ))
        }
        None => return Err(PrepError::malformed(team, "opponent", "is missing")),
    };
    if raw.get("id").map_or(true, Value::is_null) {
        return Err(PrepError::malformed(team, "opponent.id", "is missing"));
    }
    serde_json::from_value(raw).map_err(|e| PrepError::malformed(team, "opponent.id", e.to_string()))
}

fn parse_location(team: &TeamId, raw: Option<Value>) -> PrepResult<Location> {
    let kind = match raw.as_ref().and_then(|l| l.get("type")) {
        Some(Value::String(kind)) => kind,
        Some(Value::Null) | None => {
            return Err(PrepError::malformed(team, "location.type", "is missing"))
        }
        Some(other) => {
            return Err(PrepError::malformed(
                team,
                "location.type",
                format!("must be a string, got {}", other),
            ))
        }
    };
    Location::parse(kind).ok_or_else(|| {
        PrepError::malformed(
            team,
            "location.type",
            format!("'{}' is neither home nor away", kind),
        )
    })
}

fn parse_points(team: &TeamId, field: &'static str, raw: Option<&Value>) -> PrepResult<f64> {
    let raw = raw
        .filter(|v| !v.is_null())
        .ok_or_else(|| PrepError::malformed(team, field, "is missing"))?;
    let points = raw
        .as_f64()
        .ok_or_else(|| PrepError::malformed(team, field, format!("must be a number, got {}", raw)))?;
    if !points.is_finite() || points < 0.0 {
        return Err(PrepError::malformed(
            team,
            field,
            format!("must be a non-negative score, got {}", points),
        ));
    }
    Ok(points)
}
