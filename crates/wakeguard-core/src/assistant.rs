//! Wake Up Assistant client.
//!
//! Talks to an external text-generation service. The assistant gets a
//! read-only textual snapshot of alarms and stats for context and has no
//! way to mutate state. Every failure mode degrades to one static
//! apology message; the service being down never touches alarm behavior.

use indoc::formatdoc;
use serde::{Deserialize, Serialize};

use crate::alarm::Alarm;
use crate::error::AssistantError;
use crate::stats::UserStats;
use crate::storage::AssistantConfig;

/// Shown whenever the service cannot produce an answer.
pub const FALLBACK_MESSAGE: &str =
    "Sorry, I'm having trouble connecting right now. Your alarms will still ring on time.";

/// Read-only context handed to the service with every request.
pub fn context_snapshot(alarms: &[Alarm], stats: &UserStats) -> String {
    let alarm_block = if alarms.is_empty() {
        "The user currently has NO alarms set.".to_string()
    } else {
        alarms
            .iter()
            .enumerate()
            .map(|(i, a)| {
                format!(
                    "{}. [{}] {} {} - Label: \"{}\", Task: {:?} ({:?}), Recurrence: {}",
                    i + 1,
                    if a.active { "ACTIVE" } else { "INACTIVE" },
                    a.time,
                    a.period,
                    a.label,
                    a.task,
                    a.difficulty,
                    a.recurrence_text(),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    formatdoc! {"
        USER ALARM DATA:
        {alarm_block}

        USER STATS:
        - Current Streak: {current} days
        - Best Streak: {best} days
        - Total Successful Wakes: {total}",
        current = stats.current_streak,
        best = stats.best_streak,
        total = stats.total_wakes,
    }
}

fn system_instruction(alarms: &[Alarm], stats: &UserStats) -> String {
    let snapshot = context_snapshot(alarms, stats);
    formatdoc! {"
        You are the Wake Up Assistant for a task-based alarm enforcer.
        You have read-only access to the user's current alarm settings and
        statistics to provide personalized help; you cannot change them.

        {snapshot}

        YOUR PERSONALITY:
        - Firm but encouraging. You want the user to succeed and beat laziness.
        - Knowledgeable about sleep hygiene and the app's strict protocols.
        - Concise and mobile-friendly.

        YOUR CAPABILITIES:
        - Summarize the user's alarms accurately using the provided data.
        - Use their streak and total wake count to push them forward.
        - Explain how the Math, Shake, Memory, Sequence and QR tasks work.
        - Offer advice on sleep and on preparing for upcoming alarms."
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    reply: String,
}

/// HTTP client for the text-generation endpoint.
pub struct AssistantClient {
    endpoint: String,
    model: String,
    http: reqwest::Client,
}

impl AssistantClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            http: reqwest::Client::new(),
        }
    }

    /// `None` when no endpoint is configured; callers answer with
    /// [`FALLBACK_MESSAGE`] in that case.
    pub fn from_config(config: &AssistantConfig) -> Option<Self> {
        config
            .endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .map(|endpoint| Self::new(endpoint, config.model.clone()))
    }

    /// Ask one question. Never fails: every error collapses to the static
    /// fallback message after a logged warning.
    pub async fn ask(&self, alarms: &[Alarm], stats: &UserStats, message: &str) -> String {
        match self.request(alarms, stats, message).await {
            Ok(reply) => reply,
            Err(err) => {
                log::warn!("assistant request failed: {err}");
                FALLBACK_MESSAGE.to_string()
            }
        }
    }

    async fn request(
        &self,
        alarms: &[Alarm],
        stats: &UserStats,
        message: &str,
    ) -> Result<String, AssistantError> {
        let system = system_instruction(alarms, stats);
        let request = GenerateRequest {
            model: &self.model,
            system: &system,
            message,
        };
        let response = self.http.post(&self.endpoint).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(AssistantError::BadStatus(response.status().as_u16()));
        }
        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::BadResponse(e.to_string()))?;
        Ok(body.reply)
    }
}
