//! Keyword-driven countdown suggestions for task texts.
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::constants::{DEFAULT_KEYWORD_TIMES, DEFAULT_TASK_SECONDS, MIN_TASK_SECONDS, TIME_SETTINGS_KEY_FRAGMENT};
use crate::kv::KvStore;

/// User-editable timer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSettings {
    /// Upper bound, in seconds, of the random fallback duration.
    pub default_task_time: u32,
    /// Keyword to duration in seconds.
    pub keyword_times: BTreeMap<String, u32>,
    pub enable_auto_time: bool,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            default_task_time: DEFAULT_TASK_SECONDS,
            keyword_times: DEFAULT_KEYWORD_TIMES
                .iter()
                .map(|(keyword, secs)| ((*keyword).to_string(), *secs))
                .collect(),
            enable_auto_time: true,
        }
    }
}

/// Suggested countdown for a task and why it was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSuggestion {
    /// Seconds.
    pub time: u32,
    pub reason: String,
    pub matched_keywords: Vec<String>,
}

impl TimeSettings {
    /// Every configured keyword that occurs in `text`, in key order.
    #[must_use]
    pub fn matching_keywords(&self, text: &str) -> Vec<(&str, u32)> {
        self.keyword_times
            .iter()
            .filter(|(keyword, _)| !keyword.is_empty() && text.contains(keyword.as_str()))
            .map(|(keyword, secs)| (keyword.as_str(), *secs))
            .collect()
    }

    /// Suggest a countdown for `text`.
    ///
    /// With auto timing on, the longest duration among all matching keywords
    /// wins. Otherwise, or when nothing matches, a random whole number of
    /// seconds between the minimum and `default_task_time` is returned.
    pub fn suggest<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> TimeSuggestion {
        if !self.enable_auto_time {
            return TimeSuggestion {
                time: self.random_default(rng),
                reason: "Auto timing is off, using a random default".to_string(),
                matched_keywords: Vec::new(),
            };
        }

        let matches = self.matching_keywords(text);
        let Some(&(best_keyword, best_secs)) = matches
            .iter()
            .fold(None, |best: Option<&(&str, u32)>, candidate| match best {
                Some(current) if current.1 >= candidate.1 => Some(current),
                _ => Some(candidate),
            })
        else {
            return TimeSuggestion {
                time: self.random_default(rng),
                reason: "No keyword matched, using a random default".to_string(),
                matched_keywords: Vec::new(),
            };
        };

        let reason = if matches.len() == 1 {
            format!("Matched keyword \"{best_keyword}\"")
        } else {
            format!(
                "Matched {} keywords, using the longest (\"{best_keyword}\")",
                matches.len()
            )
        };
        TimeSuggestion {
            time: best_secs,
            reason,
            matched_keywords: matches.iter().map(|(k, _)| (*k).to_string()).collect(),
        }
    }

    fn random_default<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let low = MIN_TASK_SECONDS.min(self.default_task_time);
        let high = MIN_TASK_SECONDS.max(self.default_task_time);
        rng.gen_range(low..=high)
    }

    /// Parse stored settings on top of the built-in defaults.
    ///
    /// Each missing field keeps its default. A stored keyword table replaces
    /// the built-in one whole, so keywords the user removed stay removed.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a JSON object.
    pub fn merged_with_defaults(json: &str) -> Result<Self, serde_json::Error> {
        let stored: StoredTimeSettings = serde_json::from_str(json)?;
        let mut settings = Self::default();
        if let Some(secs) = stored.default_task_time {
            settings.default_task_time = secs;
        }
        if let Some(enabled) = stored.enable_auto_time {
            settings.enable_auto_time = enabled;
        }
        if let Some(keywords) = stored.keyword_times {
            settings.keyword_times = keywords
                .into_iter()
                .filter_map(|(keyword, value)| {
                    match value.as_u64().and_then(|secs| u32::try_from(secs).ok()) {
                        Some(secs) => Some((keyword, secs)),
                        None => {
                            log::warn!("ignoring non-numeric time for keyword {keyword}");
                            None
                        }
                    }
                })
                .collect();
        }
        Ok(settings)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoredTimeSettings {
    default_task_time: Option<u32>,
    keyword_times: Option<BTreeMap<String, Value>>,
    enable_auto_time: Option<bool>,
}

/// Persists [`TimeSettings`] as one JSON record.
#[derive(Debug, Clone)]
pub struct TimeSettingsStore<K> {
    store: K,
    key: String,
}

impl<K: KvStore> TimeSettingsStore<K> {
    pub fn new(store: K, namespace: &str) -> Self {
        Self {
            store,
            key: format!("{namespace}-{TIME_SETTINGS_KEY_FRAGMENT}"),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored settings merged with defaults; defaults on any failure.
    #[must_use]
    pub fn load(&self) -> TimeSettings {
        match self.store.get(&self.key) {
            Ok(Some(json)) => TimeSettings::merged_with_defaults(&json).unwrap_or_else(|err| {
                log::warn!("discarding unreadable time settings: {err}");
                TimeSettings::default()
            }),
            Ok(None) => TimeSettings::default(),
            Err(err) => {
                log::warn!("failed to read time settings: {err}");
                TimeSettings::default()
            }
        }
    }

    /// Best-effort write; returns whether the record was stored.
    pub fn save(&self, settings: &TimeSettings) -> bool {
        let json = match serde_json::to_string(settings) {
            Ok(json) => json,
            Err(err) => {
                log::warn!("failed to serialize time settings: {err}");
                return false;
            }
        };
        match self.store.set(&self.key, &json) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("failed to write time settings: {err}");
                false
            }
        }
    }

    /// Drop the stored record so defaults apply again.
    pub fn reset(&self) {
        if let Err(err) = self.store.remove(&self.key) {
            log::warn!("failed to reset time settings: {err}");
        }
    }
}
