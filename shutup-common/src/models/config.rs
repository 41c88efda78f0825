// File: shutup-common/src/models/config.rs

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::Error;

/// Largest accepted `default_duration`, one day.
pub const MAX_DEFAULT_DURATION_SECS: i64 = 86_400;

/// Configuration surface of the shutup plugin as handed over by the host.
///
/// The struct is immutable after [`ShutupConfig::validated`]; out-of-range values are
/// corrected there with a warning instead of failing the load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutupConfig {
    #[serde(default = "default_shutup_commands", deserialize_with = "string_or_list")]
    pub shutup_commands: Vec<String>,
    #[serde(default = "default_unshutup_commands", deserialize_with = "string_or_list")]
    pub unshutup_commands: Vec<String>,

    /// Seconds a bare shutup trigger mutes for.
    #[serde(default = "default_duration")]
    pub default_duration: i64,

    /// Placeholders: `{duration}`, `{expiry_time}`.
    #[serde(default = "default_shutup_reply")]
    pub shutup_reply: String,
    /// Placeholders: `{duration}`, `{expiry_time}`.
    #[serde(default = "default_unshutup_reply")]
    pub unshutup_reply: String,

    #[serde(default)]
    pub quiet_hours_enabled: bool,
    /// Multi-line `HH:MM-HH:MM`, `#` comments allowed.
    #[serde(default)]
    pub quiet_hours: String,

    #[serde(default)]
    pub require_prefix: bool,
    #[serde(default = "default_wake_prefixes", deserialize_with = "string_or_list")]
    pub wake_prefixes: Vec<String>,

    #[serde(default)]
    pub group_card_enabled: bool,
    /// Placeholders: `{remaining}`, `{original_card}`, `{original_nickname}`, `{original_name}`.
    #[serde(default = "default_group_card_template")]
    pub group_card_template: String,
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,

    /// Dispatch ordering hint for the host; never read by the gating logic itself.
    #[serde(default = "default_priority")]
    pub priority: i32,
}

fn default_shutup_commands() -> Vec<String> {
    vec!["闭嘴".to_string(), "stop".to_string()]
}

fn default_unshutup_commands() -> Vec<String> {
    vec!["说话".to_string(), "停止闭嘴".to_string()]
}

pub fn default_duration() -> i64 {
    600
}

pub fn default_shutup_reply() -> String {
    "好的，我闭嘴了~".to_string()
}

pub fn default_unshutup_reply() -> String {
    "好的，我恢复说话了~".to_string()
}

fn default_wake_prefixes() -> Vec<String> {
    vec!["/".to_string()]
}

pub fn default_group_card_template() -> String {
    "{original_card}[闭嘴中 {remaining}min]".to_string()
}

fn default_update_interval_secs() -> u64 {
    60
}

fn default_priority() -> i32 {
    10000
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

/// Accepts either a JSON list or a single string split on whitespace and commas.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => split_command_list(&s),
        StringOrList::Many(v) => v,
    })
}

pub fn split_command_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Default for ShutupConfig {
    fn default() -> Self {
        Self {
            shutup_commands: default_shutup_commands(),
            unshutup_commands: default_unshutup_commands(),
            default_duration: default_duration(),
            shutup_reply: default_shutup_reply(),
            unshutup_reply: default_unshutup_reply(),
            quiet_hours_enabled: false,
            quiet_hours: String::new(),
            require_prefix: false,
            wake_prefixes: default_wake_prefixes(),
            group_card_enabled: false,
            group_card_template: default_group_card_template(),
            update_interval_secs: default_update_interval_secs(),
            priority: default_priority(),
        }
    }
}

impl ShutupConfig {
    /// Parses a JSON document. Only syntactically broken JSON is an error; a field with the
    /// wrong type is coerced where possible, else dropped back to its default.
    pub fn from_json_str(raw: &str) -> Result<Self, Error> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| Error::Config(format!("Invalid shutup config: {}", e)))?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: Value) -> Result<Self, Error> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            Value::Null => Map::new(),
            other => {
                warn!("shutup config is not an object ({}), using defaults", other);
                Map::new()
            }
        };
        coerce_fields(&mut fields);

        let cfg: ShutupConfig = serde_json::from_value(Value::Object(fields))
            .map_err(|e| Error::Config(format!("Invalid shutup config: {}", e)))?;
        Ok(cfg.validated())
    }

    /// Reads a JSON config file. A missing, unreadable or malformed file yields the
    /// defaults with a warning.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Self::default().validated();
        }
        let loaded = std::fs::read_to_string(path)
            .map_err(Error::from)
            .and_then(|raw| Self::from_json_str(&raw));
        match loaded {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Could not load config from {}: {}; using defaults", path.display(), e);
                Self::default().validated()
            }
        }
    }

    /// Replaces invalid values with safe defaults, warning for each correction.
    pub fn validated(mut self) -> Self {
        if !(0..=MAX_DEFAULT_DURATION_SECS).contains(&self.default_duration) {
            warn!(
                "default_duration={} outside [0, {}], falling back to {}",
                self.default_duration,
                MAX_DEFAULT_DURATION_SECS,
                default_duration()
            );
            self.default_duration = default_duration();
        }

        if self.update_interval_secs == 0 {
            warn!(
                "update_interval_secs=0 is not allowed, falling back to {}",
                default_update_interval_secs()
            );
            self.update_interval_secs = default_update_interval_secs();
        }

        for list in [
            &mut self.shutup_commands,
            &mut self.unshutup_commands,
            &mut self.wake_prefixes,
        ] {
            list.retain(|s| !s.trim().is_empty());
        }

        if self.require_prefix && self.wake_prefixes.is_empty() {
            warn!("require_prefix is set but no wake prefixes are configured; only at-mentions will pass");
        }

        info!(
            "shutup config: shutup={:?} unshutup={:?} default_duration={}s quiet_hours_enabled={} require_prefix={} group_card_enabled={}",
            self.shutup_commands,
            self.unshutup_commands,
            self.default_duration,
            self.quiet_hours_enabled,
            self.require_prefix,
            self.group_card_enabled
        );

        self
    }

    pub fn default_duration_secs(&self) -> u64 {
        self.default_duration.clamp(0, MAX_DEFAULT_DURATION_SECS) as u64
    }
}

#[derive(Clone, Copy)]
enum FieldKind {
    I64,
    I32,
    U64,
    Bool,
    Text,
    List,
}

const FIELD_KINDS: &[(&str, FieldKind)] = &[
    ("shutup_commands", FieldKind::List),
    ("unshutup_commands", FieldKind::List),
    ("default_duration", FieldKind::I64),
    ("shutup_reply", FieldKind::Text),
    ("unshutup_reply", FieldKind::Text),
    ("quiet_hours_enabled", FieldKind::Bool),
    ("quiet_hours", FieldKind::Text),
    ("require_prefix", FieldKind::Bool),
    ("wake_prefixes", FieldKind::List),
    ("group_card_enabled", FieldKind::Bool),
    ("group_card_template", FieldKind::Text),
    ("update_interval_secs", FieldKind::U64),
    ("priority", FieldKind::I32),
];

/// Brings every known field to the type the struct expects. Values that cannot be
/// converted are removed so the serde default applies.
fn coerce_fields(fields: &mut Map<String, Value>) {
    for (key, kind) in FIELD_KINDS {
        let Some(raw) = fields.get(*key) else {
            continue;
        };
        match coerce(raw, *kind) {
            Some(value) => {
                fields.insert(key.to_string(), value);
            }
            None => {
                warn!("Config field '{}' has unusable value {}, using default", key, raw);
                fields.remove(*key);
            }
        }
    }
}

/// Numbers given as floats or numeric strings are truncated toward zero.
fn as_whole_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then(|| n.trunc())
}

fn coerce(value: &Value, kind: FieldKind) -> Option<Value> {
    if value.is_null() {
        return None;
    }
    match kind {
        FieldKind::I64 => match value {
            Value::Number(n) if n.is_i64() => Some(value.clone()),
            _ => as_whole_number(value).map(|n| Value::from(n as i64)),
        },
        FieldKind::I32 => as_whole_number(value)
            .filter(|n| (i32::MIN as f64..=i32::MAX as f64).contains(n))
            .map(|n| Value::from(n as i32)),
        FieldKind::U64 => match value {
            Value::Number(n) if n.is_u64() => Some(value.clone()),
            _ => as_whole_number(value)
                .filter(|n| *n >= 0.0)
                .map(|n| Value::from(n as u64)),
        },
        FieldKind::Bool => match value {
            Value::Bool(_) => Some(value.clone()),
            Value::Number(n) => n.as_f64().map(|n| Value::Bool(n != 0.0)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(Value::Bool(true)),
                "false" | "0" | "no" | "off" | "" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
        FieldKind::Text => match value {
            Value::String(_) => Some(value.clone()),
            Value::Number(_) | Value::Bool(_) => Some(Value::String(value.to_string())),
            _ => None,
        },
        FieldKind::List => match value {
            Value::String(_) => Some(value.clone()),
            Value::Array(items) => Some(Value::Array(
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(_) => Some(item.clone()),
                        Value::Number(_) => Some(Value::String(item.to_string())),
                        _ => None,
                    })
                    .collect(),
            )),
            _ => None,
        },
    }
}
