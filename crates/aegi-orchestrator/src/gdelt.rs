// aegi-orchestrator/src/gdelt.rs
// ============================================================================
// Module: GDELT Monitor
// Description: Anomaly detection over polled GDELT events (§4.14).
// Purpose: Turn a raw batch of aegi_llm::gdelt events into a small set of
//          flagged anomalies and bus notifications, without the monitor
//          itself knowing how or how often it gets called — that is
//          scheduler's job.
// Dependencies: aegi-core, aegi-bus, aegi-llm
// ============================================================================

//! ## Overview
//! [`GdeltMonitor::scan`] runs three independent detectors over one poll's
//! events and returns every anomaly found, already stamped with the bus
//! event it emitted. A country's historical average event count, needed by
//! the surge detector, is tracked internally and updated by every scan —
//! the monitor is the only place that needs to remember it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use aegi_core::model::AegiEvent;
use aegi_core::model::EventSeverity;
use aegi_bus::EventBus;
use aegi_llm::gdelt::GdeltEvent;
use aegi_llm::gdelt::high_conflict_cameo_roots;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Tunables for the three anomaly detectors.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GdeltMonitorConfig {
    /// Absolute Goldstein scale magnitude at or above which an event from a
    /// conflict-class CAMEO root is flagged, regardless of tone.
    pub extreme_goldstein_threshold: f64,
    /// Multiple of a country's historical average daily event count that
    /// constitutes a surge.
    pub surge_multiplier: f64,
    /// Minimum number of prior scans before a country's historical average
    /// is considered established enough to trigger the surge detector.
    pub surge_min_history: usize,
}

impl Default for GdeltMonitorConfig {
    fn default() -> Self {
        Self { extreme_goldstein_threshold: 8.0, surge_multiplier: 2.0, surge_min_history: 3 }
    }
}

// ============================================================================
// SECTION: Anomalies
// ============================================================================

/// Which detector flagged an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Conflict-class CAMEO root with an extreme Goldstein magnitude.
    ExtremeGoldstein,
    /// A country's event count in this scan exceeds its historical average
    /// by at least `surge_multiplier`.
    CountrySurge,
    /// High-conflict-class CAMEO root, flagged regardless of tone.
    HighConflict,
}

/// One flagged event, with the reason it was flagged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GdeltAnomaly {
    pub kind: AnomalyKind,
    pub global_event_id: String,
    pub cameo_root_code: String,
    pub goldstein_scale: f64,
    pub country_code: Option<String>,
}

// ============================================================================
// SECTION: Monitor
// ============================================================================

/// Conflict-class CAMEO roots eligible for the extreme-Goldstein detector
/// (quad class 3/4: verbal and material conflict).
fn extreme_goldstein_eligible_roots() -> std::collections::BTreeSet<&'static str> {
    ["14", "15", "16", "17", "18", "19", "20"].into_iter().collect()
}

/// Runs the three anomaly detectors over polled GDELT events, tracking each
/// country's historical average event count across scans.
pub struct GdeltMonitor {
    config: GdeltMonitorConfig,
    bus: Arc<EventBus>,
    country_history: Mutex<BTreeMap<String, CountryHistory>>,
}

struct CountryHistory {
    scans: usize,
    average_count: f64,
}

impl GdeltMonitor {
    /// Creates a monitor that emits `gdelt.anomaly_detected` on `bus`.
    #[must_use]
    pub fn new(config: GdeltMonitorConfig, bus: Arc<EventBus>) -> Self {
        Self { config, bus, country_history: Mutex::new(BTreeMap::new()) }
    }

    /// Scans one poll's events, returning every flagged anomaly. Updates
    /// each country's historical average for the next scan's surge check
    /// before comparing this scan's counts against it, so the first scan to
    /// see a country never reports a spurious initial surge.
    pub fn scan(&self, events: &[GdeltEvent]) -> Vec<GdeltAnomaly> {
        let mut anomalies = Vec::new();
        let high_conflict = high_conflict_cameo_roots();
        let extreme_eligible = extreme_goldstein_eligible_roots();

        let mut counts_by_country: BTreeMap<String, usize> = BTreeMap::new();
        for event in events {
            if let Some(country) = &event.country_code {
                *counts_by_country.entry(country.clone()).or_insert(0) += 1;
            }

            if extreme_eligible.contains(event.cameo_root_code.as_str())
                && event.goldstein_scale.abs() >= self.config.extreme_goldstein_threshold
            {
                anomalies.push(self.flag(AnomalyKind::ExtremeGoldstein, event));
            }

            if high_conflict.contains(event.cameo_root_code.as_str()) {
                anomalies.push(self.flag(AnomalyKind::HighConflict, event));
            }
        }

        anomalies.extend(self.surge_anomalies(events, &counts_by_country));
        self.update_history(&counts_by_country);
        anomalies
    }

    fn surge_anomalies(
        &self,
        events: &[GdeltEvent],
        counts_by_country: &BTreeMap<String, usize>,
    ) -> Vec<GdeltAnomaly> {
        let history = self.lock_history();
        let mut anomalies = Vec::new();
        for (country, &count) in counts_by_country {
            let Some(past) = history.get(country) else { continue };
            if past.scans < self.config.surge_min_history || past.average_count <= 0.0 {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let surged = (count as f64) >= past.average_count * self.config.surge_multiplier;
            if !surged {
                continue;
            }
            if let Some(event) = events.iter().find(|event| event.country_code.as_deref() == Some(country.as_str())) {
                anomalies.push(self.flag(AnomalyKind::CountrySurge, event));
            }
        }
        anomalies
    }

    fn update_history(&self, counts_by_country: &BTreeMap<String, usize>) {
        let mut history = self.lock_history();
        for (country, &count) in counts_by_country {
            let entry = history.entry(country.clone()).or_insert(CountryHistory { scans: 0, average_count: 0.0 });
            #[allow(clippy::cast_precision_loss)]
            let count_f = count as f64;
            #[allow(clippy::cast_precision_loss)]
            let scans_f = entry.scans as f64;
            entry.average_count = ((entry.average_count * scans_f) + count_f) / (scans_f + 1.0);
            entry.scans += 1;
        }
    }

    fn flag(&self, kind: AnomalyKind, event: &GdeltEvent) -> GdeltAnomaly {
        let anomaly = GdeltAnomaly {
            kind,
            global_event_id: event.global_event_id.clone(),
            cameo_root_code: event.cameo_root_code.clone(),
            goldstein_scale: event.goldstein_scale,
            country_code: event.country_code.clone(),
        };
        self.bus.emit(AegiEvent::new(
            "gdelt.anomaly_detected",
            None,
            EventSeverity::Critical,
            serde_json::json!({
                "anomaly_type": kind,
                "event_uid": anomaly.global_event_id,
            }),
            aegi_core::time::Timestamp::new(time::OffsetDateTime::now_utc()),
        ));
        anomaly
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, CountryHistory>> {
        self.country_history.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use aegi_core::runtime::NoopAuditSink;

    fn event(root: &str, goldstein: f64, country: Option<&str>) -> GdeltEvent {
        GdeltEvent {
            global_event_id: format!("evt-{root}-{goldstein}"),
            cameo_root_code: root.to_string(),
            goldstein_scale: goldstein,
            avg_tone: 0.0,
            country_code: country.map(str::to_string),
            actors: Vec::new(),
        }
    }

    fn monitor() -> GdeltMonitor {
        GdeltMonitor::new(GdeltMonitorConfig::default(), Arc::new(EventBus::new(Arc::new(NoopAuditSink))))
    }

    #[test]
    fn flags_extreme_goldstein_on_conflict_class_root() {
        let anomalies = monitor().scan(&[event("19", -9.0, Some("UA"))]);
        assert!(anomalies.iter().any(|a| a.kind == AnomalyKind::ExtremeGoldstein));
    }

    #[test]
    fn does_not_flag_extreme_goldstein_below_threshold() {
        let anomalies = monitor().scan(&[event("19", -3.0, Some("UA"))]);
        assert!(!anomalies.iter().any(|a| a.kind == AnomalyKind::ExtremeGoldstein));
    }

    #[test]
    fn flags_high_conflict_root_regardless_of_tone() {
        let anomalies = monitor().scan(&[event("20", 1.0, Some("SY"))]);
        assert!(anomalies.iter().any(|a| a.kind == AnomalyKind::HighConflict));
    }

    #[test]
    fn does_not_flag_surge_before_history_is_established() {
        let monitor = monitor();
        let anomalies = monitor.scan(&[event("01", 0.0, Some("FR"))]);
        assert!(!anomalies.iter().any(|a| a.kind == AnomalyKind::CountrySurge));
    }

    #[test]
    fn flags_surge_once_history_establishes_a_baseline() {
        let monitor = monitor();
        for _ in 0..3 {
            monitor.scan(&[event("01", 0.0, Some("FR"))]);
        }
        let burst: Vec<GdeltEvent> = (0..4)
            .map(|i| {
                let mut e = event("01", 0.0, Some("FR"));
                e.global_event_id = format!("{}-{i}", e.global_event_id);
                e
            })
            .collect();
        let anomalies = monitor.scan(&burst);
        assert!(anomalies.iter().any(|a| a.kind == AnomalyKind::CountrySurge));
    }
}
