use std::sync::LazyLock;

use regex::Regex;

use shutup_common::models::ShutupConfig;

/// Optional `<digits><unit>?` right after a trigger; whitespace in between is allowed.
static DURATION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([0-9]+)([smhd])?").expect("duration pattern is valid"));

/// Longest mute an inline duration can request, one year. Anything longer is capped.
pub const MAX_MUTE_DURATION_SECS: u64 = 365 * 86_400;

/// A recognised control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Shutup {
        trigger: String,
        /// `None` when no duration suffix was given.
        duration: Option<u64>,
    },
    Unshutup {
        trigger: String,
    },
}

/// Prefix-matches message text against the configured trigger lists.
#[derive(Debug, Clone)]
pub struct CommandMatcher {
    shutup: Vec<String>,
    unshutup: Vec<String>,
}

impl CommandMatcher {
    pub fn new(shutup: Vec<String>, unshutup: Vec<String>) -> Self {
        Self { shutup, unshutup }
    }

    pub fn from_config(config: &ShutupConfig) -> Self {
        Self::new(config.shutup_commands.clone(), config.unshutup_commands.clone())
    }

    /// Shutup triggers are tried before unshutup triggers; inside each list the first
    /// trigger in declaration order that prefixes the trimmed text wins.
    pub fn classify(&self, text: &str) -> Option<ControlCommand> {
        let text = text.trim();

        if let Some(trigger) = self.shutup.iter().find(|t| text.starts_with(t.as_str())) {
            let duration = parse_duration_suffix(&text[trigger.len()..]);
            return Some(ControlCommand::Shutup {
                trigger: trigger.clone(),
                duration,
            });
        }

        self.unshutup
            .iter()
            .find(|t| text.starts_with(t.as_str()))
            .map(|trigger| ControlCommand::Unshutup {
                trigger: trigger.clone(),
            })
    }
}

pub fn unit_seconds(unit: Option<&str>) -> u64 {
    match unit {
        Some("m") => 60,
        Some("h") => 3600,
        Some("d") => 86_400,
        // "s", no unit, and anything unrecognised
        _ => 1,
    }
}

/// Reads the duration in seconds from the text following a trigger.
/// Returns `None` when the text does not start with digits.
pub fn parse_duration_suffix(rest: &str) -> Option<u64> {
    let caps = DURATION_SUFFIX.captures(rest)?;
    let value = caps
        .get(1)
        .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))?;
    let unit = caps.get(2).map(|m| m.as_str());
    Some(value.saturating_mul(unit_seconds(unit)))
}
