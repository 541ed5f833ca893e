// aegi-llm/src/gdelt.rs
// ============================================================================
// Module: GDELT HTTP Provider
// Description: Fetches and parses raw GDELT event records over HTTP.
// Purpose: Give the GDELT monitor (aegi-orchestrator, §4.14) a bounded,
//          fail-closed source of structured events to run its anomaly
//          detectors over, without embedding reqwest there.
// Dependencies: reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! GDELT's event feed is fetched as a JSON array of flat records (the same
//! field names GDELT's own export schema uses: `GLOBALEVENTID`, `SQLDATE`,
//! `EventRootCode`, `GoldsteinScale`, `AvgTone`, `ActionGeo_CountryCode`,
//! `Actor1Name`, `Actor2Name`). Records that fail to parse are dropped
//! rather than failing the whole poll, since the monitor's scheduler (§4.14)
//! must never throw through its loop; a dropped-record count is returned
//! alongside the parsed events so the caller can log it.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Configuration for the GDELT HTTP provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GdeltProviderConfig {
    /// Endpoint URL returning the most recent event batch as a JSON array.
    pub feed_url: String,
    /// Endpoint URL returning the raw GDELT Events table as CSV, polled
    /// alongside `feed_url` by the scheduler's secondary tick. `None`
    /// disables the secondary poll entirely.
    pub events_feed_url: Option<String>,
    /// Request timeout.
    pub timeout_ms: u64,
    /// Maximum events accepted from a single poll; the feed is truncated
    /// (not failed) when it returns more.
    pub max_events: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for GdeltProviderConfig {
    fn default() -> Self {
        Self {
            feed_url: "https://api.gdeltproject.org/api/v2/events/events".to_string(),
            events_feed_url: None,
            timeout_ms: 10_000,
            max_events: 1_000,
            user_agent: "aegi-core/0.1".to_string(),
        }
    }
}

/// GDELT provider errors.
#[derive(Debug, Error)]
pub enum GdeltError {
    /// The HTTP client could not be built.
    #[error("gdelt client build failed: {0}")]
    ClientBuild(String),
    /// The request failed or timed out.
    #[error("gdelt request failed: {0}")]
    Transport(String),
    /// The feed response was not a JSON array of records.
    #[error("gdelt feed response was not a JSON array")]
    MalformedFeed,
}

/// A single parsed GDELT event, ready for the monitor's anomaly detectors.
#[derive(Debug, Clone, PartialEq)]
pub struct GdeltEvent {
    /// GDELT's global event identifier.
    pub global_event_id: String,
    /// CAMEO root event code (e.g. `"19"` for conflict-class events).
    pub cameo_root_code: String,
    /// Goldstein scale, in `[-10, 10]`.
    pub goldstein_scale: f64,
    /// Average tone of source coverage.
    pub avg_tone: f64,
    /// ISO-ish country code of the event's primary location, when known.
    pub country_code: Option<String>,
    /// Named actors participating in the event.
    pub actors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawGdeltEvent {
    #[serde(rename = "GLOBALEVENTID")]
    global_event_id: serde_json::Value,
    #[serde(rename = "EventRootCode")]
    event_root_code: String,
    #[serde(rename = "GoldsteinScale")]
    goldstein_scale: f64,
    #[serde(rename = "AvgTone")]
    avg_tone: f64,
    #[serde(rename = "ActionGeo_CountryCode")]
    action_geo_country_code: Option<String>,
    #[serde(rename = "Actor1Name")]
    actor1_name: Option<String>,
    #[serde(rename = "Actor2Name")]
    actor2_name: Option<String>,
}

impl From<RawGdeltEvent> for GdeltEvent {
    fn from(raw: RawGdeltEvent) -> Self {
        let actors = [raw.actor1_name, raw.actor2_name].into_iter().flatten().collect();
        Self {
            global_event_id: raw.global_event_id.to_string(),
            cameo_root_code: raw.event_root_code,
            goldstein_scale: raw.goldstein_scale,
            avg_tone: raw.avg_tone,
            country_code: raw.action_geo_country_code,
            actors,
        }
    }
}

/// Outcome of a single poll: successfully parsed events plus a count of
/// records that were dropped for failing to parse.
#[derive(Debug, Clone, PartialEq)]
pub struct GdeltPollResult {
    /// Parsed events, truncated to `max_events`.
    pub events: Vec<GdeltEvent>,
    /// Count of raw records that could not be parsed into a [`GdeltEvent`].
    pub dropped: usize,
}

/// HTTP-backed GDELT event feed provider.
pub struct GdeltHttpProvider {
    config: GdeltProviderConfig,
    client: reqwest::Client,
}

impl GdeltHttpProvider {
    /// Creates a new GDELT HTTP provider.
    ///
    /// # Errors
    ///
    /// Returns [`GdeltError::ClientBuild`] when the HTTP client cannot be
    /// constructed.
    pub fn new(config: GdeltProviderConfig) -> Result<Self, GdeltError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| GdeltError::ClientBuild(err.to_string()))?;
        Ok(Self { config, client })
    }

    /// Polls the configured feed once, parsing and truncating the response.
    ///
    /// # Errors
    ///
    /// Returns [`GdeltError`] when the request fails, times out, or the
    /// response is not a JSON array. Individual unparsable records are
    /// dropped rather than failing the whole poll.
    pub async fn poll(&self) -> Result<GdeltPollResult, GdeltError> {
        let timeout = Duration::from_millis(self.config.timeout_ms);
        let call = self.client.get(&self.config.feed_url).send();
        let response = tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| GdeltError::Transport("request timed out".to_string()))?
            .map_err(|err| GdeltError::Transport(err.to_string()))?;

        let raw: Vec<serde_json::Value> =
            response.json().await.map_err(|_| GdeltError::MalformedFeed)?;

        let mut events = Vec::new();
        let mut dropped = 0usize;
        for record in raw {
            match serde_json::from_value::<RawGdeltEvent>(record) {
                Ok(raw_event) => events.push(GdeltEvent::from(raw_event)),
                Err(_) => dropped += 1,
            }
        }
        events.truncate(self.config.max_events);
        Ok(GdeltPollResult { events, dropped })
    }

    /// Polls the raw GDELT Events table (tab-delimited, 58 columns) at
    /// `events_feed_url`, run alongside [`GdeltHttpProvider::poll`] by the
    /// scheduler's secondary tick. Returns an empty result, not an error,
    /// when no `events_feed_url` is configured.
    ///
    /// # Errors
    ///
    /// Returns [`GdeltError`] when `events_feed_url` is configured but the
    /// request fails or times out. Individual unparsable rows are dropped
    /// rather than failing the whole poll.
    pub async fn poll_events(&self) -> Result<GdeltPollResult, GdeltError> {
        let Some(events_feed_url) = self.config.events_feed_url.as_ref() else {
            return Ok(GdeltPollResult { events: Vec::new(), dropped: 0 });
        };

        let timeout = Duration::from_millis(self.config.timeout_ms);
        let call = self.client.get(events_feed_url).send();
        let response = tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| GdeltError::Transport("request timed out".to_string()))?
            .map_err(|err| GdeltError::Transport(err.to_string()))?;
        let body = response.text().await.map_err(|err| GdeltError::Transport(err.to_string()))?;

        let mut events = Vec::new();
        let mut dropped = 0usize;
        for line in body.lines().filter(|line| !line.trim().is_empty()) {
            match parse_events_table_row(line) {
                Some(event) => events.push(event),
                None => dropped += 1,
            }
        }
        events.truncate(self.config.max_events);
        Ok(GdeltPollResult { events, dropped })
    }
}

/// Parses one tab-delimited row of the GDELT Events table (columns per
/// GDELT 2.0's export schema: `GLOBALEVENTID`=0, `Actor1Name`=6,
/// `Actor1CountryCode`=7, `Actor2Name`=16, `EventRootCode`=28,
/// `GoldsteinScale`=30, `AvgTone`=33). Unlike [`RawGdeltEvent`]'s JSON
/// field names this is positional, since the Events table carries no
/// header row.
fn parse_events_table_row(line: &str) -> Option<GdeltEvent> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 34 {
        return None;
    }
    let global_event_id = (*fields.first()?).to_string();
    let cameo_root_code = (*fields.get(28)?).to_string();
    let goldstein_scale: f64 = fields.get(30)?.parse().ok()?;
    let avg_tone: f64 = fields.get(33)?.parse().ok()?;
    if global_event_id.is_empty() || cameo_root_code.is_empty() {
        return None;
    }
    let country_code = fields.get(7).map(|field| (*field).to_string()).filter(|field| !field.is_empty());
    let actors = [fields.get(6), fields.get(16)]
        .into_iter()
        .flatten()
        .map(|field| (*field).to_string())
        .filter(|field| !field.is_empty())
        .collect();
    Some(GdeltEvent { global_event_id, cameo_root_code, goldstein_scale, avg_tone, country_code, actors })
}

/// CAMEO root codes GDELT classifies as conflict-class (quad class 4),
/// used by the high-conflict anomaly detector regardless of tone (§4.14).
#[must_use]
pub fn high_conflict_cameo_roots() -> BTreeSet<&'static str> {
    ["18", "19", "20"].into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_event_maps_actors_from_either_side() {
        let raw = RawGdeltEvent {
            global_event_id: serde_json::Value::Number(42.into()),
            event_root_code: "19".to_string(),
            goldstein_scale: -8.5,
            avg_tone: -3.2,
            action_geo_country_code: Some("UA".to_string()),
            actor1_name: Some("GOVERNMENT".to_string()),
            actor2_name: None,
        };
        let event: GdeltEvent = raw.into();
        assert_eq!(event.actors, vec!["GOVERNMENT".to_string()]);
        assert_eq!(event.global_event_id, "42");
    }

    #[test]
    fn high_conflict_roots_include_assault_and_fight() {
        let roots = high_conflict_cameo_roots();
        assert!(roots.contains("19"));
        assert!(roots.contains("20"));
    }

    fn events_table_row(overrides: &[(usize, &str)]) -> String {
        let mut fields = vec![String::new(); 58];
        for (index, value) in overrides {
            fields[*index] = (*value).to_string();
        }
        fields.join("\t")
    }

    #[test]
    fn parses_a_well_formed_events_table_row() {
        let row = events_table_row(&[
            (0, "123456789"),
            (6, "UNITED STATES"),
            (7, "US"),
            (16, "IRAN"),
            (28, "02"),
            (30, "3.0"),
            (33, "-1.5"),
        ]);
        let event = parse_events_table_row(&row).expect("well-formed row parses");
        assert_eq!(event.global_event_id, "123456789");
        assert_eq!(event.cameo_root_code, "02");
        assert_eq!(event.goldstein_scale, 3.0);
        assert_eq!(event.avg_tone, -1.5);
        assert_eq!(event.country_code.as_deref(), Some("US"));
        assert_eq!(event.actors, vec!["UNITED STATES".to_string(), "IRAN".to_string()]);
    }

    #[test]
    fn drops_a_row_missing_a_global_event_id() {
        let row = events_table_row(&[(28, "02"), (30, "3.0"), (33, "-1.5")]);
        assert!(parse_events_table_row(&row).is_none());
    }

    #[test]
    fn drops_a_row_with_too_few_columns() {
        assert!(parse_events_table_row("1\t2\t3").is_none());
    }
}
