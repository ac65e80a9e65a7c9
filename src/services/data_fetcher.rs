use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::models::{ScheduleResponse, Team, TeamSchedule, TeamsResponse};

const TEAMS_PATH: &str = "/teams";

/// Client for the results data source (`/teams`, `/teams/{id}/schedule`).
pub struct DataFetcher {
    client: Client,
    host: String,
}

impl DataFetcher {
    pub fn new(host: &str) -> Self {
        Self {
            client: Client::new(),
            host: host.trim_end_matches('/').to_string(),
        }
    }

    pub fn teams_url(&self) -> String {
        format!("{}{}", self.host, TEAMS_PATH)
    }

    pub fn schedule_url(&self, team: &Team) -> String {
        format!("{}{}/{}/schedule", self.host, TEAMS_PATH, team.id)
    }

    pub async fn list_teams(&self) -> Result<Vec<Team>> {
        let url = self.teams_url();
        tracing::info!("Fetching teams from {}...", url);

        let data: TeamsResponse = self.get_json(&url).await?;
        tracing::info!("Data source lists {} teams", data.teams.len());
        Ok(data.teams)
    }

    /// A team's schedule, tagged with the team so every row can be turned
    /// into a `Game` later.
    pub async fn team_schedule(&self, team: &Team) -> Result<TeamSchedule> {
        let url = self.schedule_url(team);
        let data: ScheduleResponse = self
            .get_json(&url)
            .await
            .with_context(|| format!("schedule for team {}", team.id))?;

        tracing::debug!("Team {}: {} schedule entries", team.id, data.schedule.len());
        Ok(TeamSchedule {
            team: team.clone(),
            entries: data.schedule,
        })
    }

    /// Every listed team's schedule, one request per team.
    pub async fn fetch_all_schedules(&self) -> Result<Vec<TeamSchedule>> {
        let teams = self.list_teams().await?;
        let mut schedules = Vec::with_capacity(teams.len());

        for (i, team) in teams.iter().enumerate() {
            tracing::debug!("Schedule {}/{} ({})", i + 1, teams.len(), team.id);
            schedules.push(self.team_schedule(team).await?);
        }

        let entries: usize = schedules.iter().map(|s| s.entries.len()).sum();
        tracing::info!("Fetched {} schedule entries for {} teams", entries, schedules.len());
        Ok(schedules)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Data source error {} for {}: {}", status, url, body));
        }

        Ok(response.json().await?)
    }
}
