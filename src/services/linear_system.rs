//! Sparse least-squares systems for team ratings.
//!
//! Both models are assembled as coordinate triplets `(row, col, value)`.
//! Each game contributes a fixed number of entries, so the triplet vectors
//! are sized up front and the matrix is never materialized densely.

use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::fmt;

use crate::error::{PrepError, PrepResult};
use crate::models::Game;
use crate::services::TeamMap;

/// Every row is `+1` at one column and `-1` at another.
const NONZEROS_PER_ROW: usize = 2;

/// Which rating model the system encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ModelVariant {
    /// One rating per team fitted to point differential.
    #[default]
    Overall,
    /// Separate offensive and defensive ratings fitted to raw scores.
    #[value(name = "off-def")]
    OffensiveDefensive,
}

impl ModelVariant {
    /// Column count for `teams` distinct teams.
    pub fn columns(&self, teams: usize) -> usize {
        match self {
            ModelVariant::Overall => teams,
            ModelVariant::OffensiveDefensive => 2 * teams,
        }
    }

    pub fn rows_per_game(&self) -> usize {
        match self {
            ModelVariant::Overall => 1,
            ModelVariant::OffensiveDefensive => 2,
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelVariant::Overall => write!(f, "overall"),
            ModelVariant::OffensiveDefensive => write!(f, "off-def"),
        }
    }
}

impl std::str::FromStr for ModelVariant {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overall" => Ok(ModelVariant::Overall),
            "off-def" | "offdef" | "offensive-defensive" => Ok(ModelVariant::OffensiveDefensive),
            other => Err(PrepError::Config(format!(
                "unknown rating model '{}', expected 'overall' or 'off-def'",
                other
            ))),
        }
    }
}

/// One scoring observation: `offense` (team index) put up `points` against
/// `defense` (team index).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringSample {
    pub offense: usize,
    pub defense: usize,
    pub points: f64,
}

/// Two samples per game, in game order: the team's scoring, then the
/// opponent's.
pub fn scoring_samples(games: &[Game], team_map: &TeamMap) -> PrepResult<Vec<ScoringSample>> {
    let mut samples = Vec::with_capacity(2 * games.len());
    for game in games {
        let team = team_map.require_index(&game.team.id)?;
        let opponent = team_map.require_index(&game.opponent.id)?;
        samples.push(ScoringSample {
            offense: team,
            defense: opponent,
            points: game.result.points_for,
        });
        samples.push(ScoringSample {
            offense: opponent,
            defense: team,
            points: game.result.points_against,
        });
    }
    Ok(samples)
}

/// `A x ≈ b` ready for a least-squares solver, plus the team map needed to
/// read the solution back.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    pub variant: ModelVariant,
    pub matrix: CooMatrix<f64>,
    pub constants: DVector<f64>,
    pub team_map: TeamMap,
}

impl LinearSystem {
    pub fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn cols(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    /// Non-zero entries in insertion order.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.matrix.triplet_iter().map(|(i, j, v)| (i, j, *v))
    }

    /// Compressed rows for solvers that want CSR input.
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        CsrMatrix::from(&self.matrix)
    }

    /// Team owning solution coefficient `column`. Off/def columns `n..2n`
    /// map back to the same teams as `0..n`.
    pub fn column_team(&self, column: usize) -> Option<&crate::models::Team> {
        let n = self.team_map.len();
        match self.variant {
            ModelVariant::Overall => self.team_map.team(column),
            ModelVariant::OffensiveDefensive if column < n => self.team_map.team(column),
            ModelVariant::OffensiveDefensive => self.team_map.team(column.checked_sub(n)?),
        }
    }

    pub fn into_parts(self) -> (CooMatrix<f64>, DVector<f64>, TeamMap) {
        (self.matrix, self.constants, self.team_map)
    }
}

pub struct LinearSystemBuilder;

impl LinearSystemBuilder {
    pub fn build(variant: ModelVariant, games: &[Game], team_map: TeamMap) -> PrepResult<LinearSystem> {
        match variant {
            ModelVariant::Overall => Self::overall(games, team_map),
            ModelVariant::OffensiveDefensive => Self::offensive_defensive(games, team_map),
        }
    }

    /// Row `g`: `+1` at the team, `-1` at the opponent, constant is the
    /// team's point differential.
    pub fn overall(games: &[Game], team_map: TeamMap) -> PrepResult<LinearSystem> {
        let row_count = ModelVariant::Overall.rows_per_game() * games.len();
        let mut rows = Vec::with_capacity(NONZEROS_PER_ROW * row_count);
        let mut cols = Vec::with_capacity(NONZEROS_PER_ROW * row_count);
        let mut values = Vec::with_capacity(NONZEROS_PER_ROW * row_count);
        let mut constants = Vec::with_capacity(row_count);

        for (g, game) in games.iter().enumerate() {
            let team = team_map.require_index(&game.team.id)?;
            let opponent = team_map.require_index(&game.opponent.id)?;

            rows.extend([g, g]);
            cols.extend([team, opponent]);
            values.extend([1.0, -1.0]);
            constants.push(game.result.differential());
        }

        Self::assemble(ModelVariant::Overall, rows, cols, values, constants, team_map)
    }

    /// Two rows per game over `2n` columns. Offense lives in `0..n`, defense
    /// in `n..2n`; each row is `+1` at the scorer's offense and `-1` at the
    /// conceding side's defense with the points scored as its constant.
    pub fn offensive_defensive(games: &[Game], team_map: TeamMap) -> PrepResult<LinearSystem> {
        let n = team_map.len();
        let samples = scoring_samples(games, &team_map)?;

        let row_count = ModelVariant::OffensiveDefensive.rows_per_game() * games.len();
        let mut rows = Vec::with_capacity(NONZEROS_PER_ROW * row_count);
        let mut cols = Vec::with_capacity(NONZEROS_PER_ROW * row_count);
        let mut values = Vec::with_capacity(NONZEROS_PER_ROW * row_count);
        let mut constants = Vec::with_capacity(row_count);

        for (r, sample) in samples.iter().enumerate() {
            rows.extend([r, r]);
            cols.extend([sample.offense, n + sample.defense]);
            values.extend([1.0, -1.0]);
            constants.push(sample.points);
        }

        Self::assemble(
            ModelVariant::OffensiveDefensive,
            rows,
            cols,
            values,
            constants,
            team_map,
        )
    }

    fn assemble(
        variant: ModelVariant,
        rows: Vec<usize>,
        cols: Vec<usize>,
        values: Vec<f64>,
        constants: Vec<f64>,
        team_map: TeamMap,
    ) -> PrepResult<LinearSystem> {
        let nrows = constants.len();
        let ncols = variant.columns(team_map.len());

        let matrix = CooMatrix::try_from_triplets(nrows, ncols, rows, cols, values)
            .map_err(|e| PrepError::InvalidMatrix(e.to_string()))?;

        tracing::debug!(
            "Built {} system: {}x{} with {} non-zeros",
            variant,
            nrows,
            ncols,
            matrix.nnz()
        );

        Ok(LinearSystem {
            variant,
            matrix,
            constants: DVector::from_vec(constants),
            team_map,
        })
    }
}
