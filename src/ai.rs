//! Productivity summary produced by an external text-generation service.
//!
//! [`summarize`] never fails: a missing key, a transport error or an empty
//! answer each map to a fixed message.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::config::AiSettings;
use crate::error::Result;
use crate::models::{DailyTask, ProjectTask};

pub const MISSING_KEY_MESSAGE: &str =
    "API Key is missing. Please ensure your Gemini API Key is set in the environment.";
pub const FAILURE_MESSAGE: &str = "Failed to generate AI insights. Please try again later.";
pub const EMPTY_MESSAGE: &str = "No insights generated.";

/// Turns a prompt into text.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct ProjectDigest<'a> {
    project: &'a str,
    status: &'static str,
}

#[derive(Serialize)]
struct DailyDigest<'a> {
    name: &'a str,
    duration: &'a str,
    status: &'static str,
}

/// Builds the prompt from a reduced projection of both collections.
pub fn build_prompt(project_tasks: &[ProjectTask], daily_tasks: &[DailyTask]) -> String {
    let projects: Vec<ProjectDigest> = project_tasks
        .iter()
        .map(|t| ProjectDigest {
            project: &t.project_name,
            status: t.status.as_str(),
        })
        .collect();
    let daily: Vec<DailyDigest> = daily_tasks
        .iter()
        .map(|t| DailyDigest {
            name: &t.task_name,
            duration: &t.duration,
            status: t.status.as_str(),
        })
        .collect();
    // Serializing plain string structs cannot fail.
    let projects = serde_json::to_string(&projects).unwrap_or_default();
    let daily = serde_json::to_string(&daily).unwrap_or_default();

    format!(
        "Analyze the following Task Management data and provide a concise executive summary \
         and 3 actionable tips to improve productivity.\n\n\
         Project Tasks Overview:\n{projects}\n\n\
         Daily Tasks Overview:\n{daily}\n\n\
         Return the response in Markdown format. Keep it professional and motivating."
    )
}

/// Asks `generator` for a Markdown summary, falling back to fixed text.
pub fn summarize(
    generator: Option<&dyn TextGenerator>,
    project_tasks: &[ProjectTask],
    daily_tasks: &[DailyTask],
) -> String {
    let Some(generator) = generator else {
        return MISSING_KEY_MESSAGE.to_string();
    };
    let prompt = build_prompt(project_tasks, daily_tasks);
    match generator.generate(&prompt) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => EMPTY_MESSAGE.to_string(),
        Err(e) => {
            warn!(error = %e, "AI analysis failed");
            FAILURE_MESSAGE.to_string()
        }
    }
}

/// Summary using the Gemini client described by `settings`.
pub fn summarize_with_settings(
    settings: &AiSettings,
    project_tasks: &[ProjectTask],
    daily_tasks: &[DailyTask],
) -> String {
    if settings.api_key.is_none() {
        return MISSING_KEY_MESSAGE.to_string();
    }
    match GeminiClient::new(settings) {
        Ok(client) => summarize(Some(&client), project_tasks, daily_tasks),
        Err(e) => {
            warn!(error = %e, "could not build AI client");
            FAILURE_MESSAGE.to_string()
        }
    }
}

/// Client for the `generateContent` REST endpoint.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize, Default)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

impl GeminiClient {
    pub fn new(settings: &AiSettings) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key: settings.api_key.clone().unwrap_or_default(),
            model: settings.model.clone(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
        })
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });
        info!(model = %self.model, "requesting AI summary");
        let response: GenerateResponse = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(response.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::DailyStatus;

    struct Canned(Option<&'static str>);

    impl TextGenerator for Canned {
        fn generate(&self, _prompt: &str) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| Error::invalid("response", "service unavailable"))
        }
    }

    #[test]
    fn prompt_carries_only_the_projection() {
        let mut p = ProjectTask::new("Launch", "secret task name");
        p.notes = Some("private".into());
        let mut d = DailyTask::new("Review");
        d.duration = "1h".into();
        d.status = DailyStatus::Remaining;

        let prompt = build_prompt(&[p], &[d]);
        assert!(prompt.contains(r#"{"project":"Launch","status":"Pending"}"#));
        assert!(prompt.contains(r#"{"name":"Review","duration":"1h","status":"Remaining"}"#));
        assert!(!prompt.contains("secret task name"));
        assert!(!prompt.contains("private"));
    }

    #[test]
    fn fallbacks_cover_every_failure() {
        assert_eq!(summarize(None, &[], &[]), MISSING_KEY_MESSAGE);
        assert_eq!(summarize(Some(&Canned(None)), &[], &[]), FAILURE_MESSAGE);
        assert_eq!(summarize(Some(&Canned(Some("  "))), &[], &[]), EMPTY_MESSAGE);
        assert_eq!(summarize(Some(&Canned(Some("## Great"))), &[], &[]), "## Great");
    }

    #[test]
    fn missing_key_skips_the_network() {
        let settings = AiSettings::default();
        assert_eq!(summarize_with_settings(&settings, &[], &[]), MISSING_KEY_MESSAGE);
    }

    #[test]
    fn response_text_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"a"},{"text":"b"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), "ab");
        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.text(), "");
    }
}
