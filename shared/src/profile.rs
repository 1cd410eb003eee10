use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::format::{kd_ratio, win_rate};

/// Player payload returned by the gametools stats endpoint.
///
/// Only the fields the key display needs are modelled. The payload is treated as
/// untrusted: absent or malformed lists read as empty and absent or malformed
/// counters read as zero, so a partial response still aggregates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_name: Option<String>,
    #[serde(default)]
    pub errors: Option<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub classes: Vec<ClassStats>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub gamemodes: Vec<GameModeStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassStats {
    #[serde(default, deserialize_with = "lenient_count")]
    pub kills: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub deaths: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameModeStats {
    #[serde(default, deserialize_with = "lenient_count")]
    pub wins: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub losses: u64,
}

/// Totals derived from one profile, ready to format onto a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatSummary {
    pub player_name: String,
    pub kills: u64,
    pub deaths: u64,
    pub kd: String,
    pub wins: u64,
    pub losses: u64,
    pub win_rate: String,
}

impl PlayerProfile {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Whether the provider attached an error report. Empty strings, `false`,
    /// zero and `null` do not count.
    pub fn has_errors(&self) -> bool {
        match &self.errors {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(_) => true,
        }
    }

    pub fn resolved_name(&self) -> Option<&str> {
        self.user_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Aggregate class and game-mode breakdowns into display totals.
    /// Returns `None` when the provider could not resolve the player.
    pub fn summarize(&self) -> Option<StatSummary> {
        if self.has_errors() {
            return None;
        }
        let player_name = self.resolved_name()?.to_string();

        let (kills, deaths) = self.classes.iter().fold((0u64, 0u64), |(k, d), class| {
            (k.saturating_add(class.kills), d.saturating_add(class.deaths))
        });
        let (wins, losses) = self.gamemodes.iter().fold((0u64, 0u64), |(w, l), mode| {
            (w.saturating_add(mode.wins), l.saturating_add(mode.losses))
        });

        Some(StatSummary {
            player_name,
            kills,
            deaths,
            kd: kd_ratio(kills, deaths),
            wins,
            losses,
            win_rate: win_rate(wins, losses),
        })
    }
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(count_from_value(&Value::deserialize(deserializer)?))
}

fn count_from_value(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(float_to_count))
            .unwrap_or(0),
        Value::String(s) => {
            // Formatted values may carry thousands separators.
            let cleaned: String = s.chars().filter(|c| !matches!(c, ',' | ' ' | '_')).collect();
            cleaned
                .parse::<u64>()
                .ok()
                .or_else(|| cleaned.parse::<f64>().ok().map(float_to_count))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn float_to_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.trunc() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::PlayerProfile;

    fn parse(json: &str) -> PlayerProfile {
        PlayerProfile::from_slice(json.as_bytes()).expect("profile should parse")
    }

    #[test]
    fn sums_classes_and_gamemodes() {
        let profile = parse(
            r#"{
                "userName": "Foo",
                "classes": [
                    {"className": "Assault", "kills": 100, "deaths": 40},
                    {"className": "Recon", "kills": 50, "deaths": 35}
                ],
                "gamemodes": [
                    {"gamemodeName": "Conquest", "wins": 20, "losses": 50},
                    {"gamemodeName": "Breakthrough", "wins": 10, "losses": 20}
                ]
            }"#,
        );

        let summary = profile.summarize().expect("player should resolve");
        assert_eq!(summary.player_name, "Foo");
        assert_eq!(summary.kills, 150);
        assert_eq!(summary.deaths, 75);
        assert_eq!(summary.kd, "2.00");
        assert_eq!(summary.wins, 30);
        assert_eq!(summary.losses, 70);
        assert_eq!(summary.win_rate, "30.0");
    }

    #[test]
    fn missing_fields_count_as_zero() {
        let profile = parse(
            r#"{
                "userName": "Foo",
                "classes": [{"kills": 12}, {"deaths": null}, null, {}],
                "gamemodes": [{"wins": 3}]
            }"#,
        );

        let summary = profile.summarize().expect("player should resolve");
        assert_eq!(summary.kills, 12);
        assert_eq!(summary.deaths, 0);
        assert_eq!(summary.kd, "0.00");
        assert_eq!(summary.wins, 3);
        assert_eq!(summary.losses, 0);
        assert_eq!(summary.win_rate, "100.0");
    }

    #[test]
    fn non_array_breakdowns_read_as_empty() {
        let profile = parse(r#"{"userName": "Foo", "classes": {"oops": 1}, "gamemodes": "none"}"#);

        let summary = profile.summarize().expect("player should resolve");
        assert_eq!(summary.kills, 0);
        assert_eq!(summary.wins, 0);
        assert_eq!(summary.kd, "0.00");
        assert_eq!(summary.win_rate, "0.0");
    }

    #[test]
    fn formatted_counts_are_accepted() {
        let profile = parse(
            r#"{
                "userName": "Foo",
                "classes": [{"kills": "1,204", "deaths": 602.0}],
                "gamemodes": [{"wins": "7", "losses": "bogus"}]
            }"#,
        );

        let summary = profile.summarize().expect("player should resolve");
        assert_eq!(summary.kills, 1204);
        assert_eq!(summary.deaths, 602);
        assert_eq!(summary.kd, "2.00");
        assert_eq!(summary.wins, 7);
        assert_eq!(summary.losses, 0);
    }

    #[test]
    fn errors_mark_player_unresolved() {
        let profile = parse(r#"{"userName": "Foo", "errors": ["player not found"]}"#);
        assert!(profile.has_errors());
        assert!(profile.summarize().is_none());
    }

    #[test]
    fn falsy_errors_are_ignored() {
        assert!(!parse(r#"{"userName": "Foo", "errors": null}"#).has_errors());
        assert!(!parse(r#"{"userName": "Foo", "errors": ""}"#).has_errors());
        assert!(!parse(r#"{"userName": "Foo", "errors": false}"#).has_errors());
    }

    #[test]
    fn blank_or_missing_user_name_is_unresolved() {
        assert!(parse(r#"{"classes": []}"#).summarize().is_none());
        assert!(parse(r#"{"userName": "   "}"#).summarize().is_none());
        assert!(parse(r#"{"userName": null}"#).summarize().is_none());
    }
}
