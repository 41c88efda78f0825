use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use shutup_common::models::config::{default_shutup_reply, default_unshutup_reply};
use shutup_common::models::{ConversationId, GateDecision, MessageSegment, ShutupConfig};
use shutup_common::traits::MessageEvent;

use crate::schedule::TimeRangeSet;
use crate::services::command_parser::{CommandMatcher, ControlCommand, MAX_MUTE_DURATION_SECS};
use crate::services::template::render_or;
use crate::store::{SilenceStore, SilenceView};
use crate::tasks::presence_annotator::PresenceAnnotator;
use crate::utils::time::{format_local, to_epoch_f64};

/// Per-message admit/suppress decision combining manual mute, quiet hours and the
/// wake-prefix gate.
///
/// Manual mutes are the only stored state; quiet hours are global and recomputed for
/// every message. Either one suppresses.
pub struct GatingEngine {
    config: ShutupConfig,
    matcher: CommandMatcher,
    /// `None` when quiet hours are disabled.
    quiet_hours: Option<TimeRangeSet>,
    store: Arc<SilenceStore>,
    annotator: Option<Arc<PresenceAnnotator>>,
}

impl GatingEngine {
    pub fn new(config: ShutupConfig, store: Arc<SilenceStore>) -> Self {
        let quiet_hours = if config.quiet_hours_enabled {
            let set = TimeRangeSet::parse(&config.quiet_hours);
            info!(
                "Quiet hours enabled: {}",
                set.windows().iter().map(|w| w.to_string()).collect::<Vec<_>>().join(", ")
            );
            Some(set)
        } else {
            None
        };

        Self {
            matcher: CommandMatcher::from_config(&config),
            config,
            quiet_hours,
            store,
            annotator: None,
        }
    }

    pub fn with_annotator(mut self, annotator: Arc<PresenceAnnotator>) -> Self {
        self.annotator = Some(annotator);
        self
    }

    pub fn config(&self) -> &ShutupConfig {
        &self.config
    }

    /// Read-only view of the mute records; all mutation goes through [`GatingEngine::decide`].
    pub fn store(&self) -> SilenceView<'_> {
        self.store.view()
    }

    pub async fn decide(&self, event: &dyn MessageEvent) -> GateDecision {
        self.decide_at(event, Local::now()).await
    }

    /// The checks run in a fixed order: control command (behind the prefix gate),
    /// quiet hours, then the stored mute.
    pub async fn decide_at(&self, event: &dyn MessageEvent, now: DateTime<Local>) -> GateDecision {
        let text = event.message_str().trim();
        let conversation = event.conversation_id();
        let now_epoch = to_epoch_f64(&now);
        debug!("Evaluating '{}' from {}", text, conversation);

        if let Some(command) = self.classify(text) {
            if self.config.require_prefix && !self.passes_prefix_gate(event) {
                debug!("Control command from {} without wake prefix or mention, passing through", conversation);
                return GateDecision::Admit;
            }
            return match command {
                ControlCommand::Shutup { duration, .. } => {
                    let mut duration = duration.unwrap_or_else(|| self.config.default_duration_secs());
                    if duration > MAX_MUTE_DURATION_SECS {
                        warn!(
                            "Requested mute of {}s in {} exceeds {}s, capping",
                            duration, conversation, MAX_MUTE_DURATION_SECS
                        );
                        duration = MAX_MUTE_DURATION_SECS;
                    }
                    self.mute(event, conversation, duration, now_epoch).await
                }
                ControlCommand::Unshutup { .. } => self.unmute(conversation, now_epoch).await,
            };
        }

        if self.in_quiet_hours(&now) {
            debug!("Quiet hours active, suppressing message from {}", conversation);
            return GateDecision::Suppress;
        }

        if let Some(expiry) = self.store.get(conversation).await {
            if now_epoch < expiry {
                debug!("Message from {} suppressed until {}", conversation, expiry);
                return GateDecision::Suppress;
            }
            if self.store.clear_if_lapsed(conversation, now_epoch).await {
                info!("Silence for {} lapsed, cleared", conversation);
            }
        }

        debug!("No silence control for '{}', passing through", text);
        GateDecision::Admit
    }

    pub fn in_quiet_hours(&self, now: &DateTime<Local>) -> bool {
        self.quiet_hours
            .as_ref()
            .is_some_and(|set| set.is_active(now))
    }

    /// Tries the raw text first, then the text with a leading wake prefix removed.
    fn classify(&self, text: &str) -> Option<ControlCommand> {
        self.matcher
            .classify(text)
            .or_else(|| self.strip_wake_prefix(text).and_then(|rest| self.matcher.classify(rest)))
    }

    fn strip_wake_prefix<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.config
            .wake_prefixes
            .iter()
            .find_map(|p| text.strip_prefix(p.as_str()))
            .map(str::trim_start)
    }

    fn starts_with_wake_prefix(&self, text: &str) -> bool {
        let text = text.trim_start();
        self.config
            .wake_prefixes
            .iter()
            .any(|p| text.starts_with(p.as_str()))
    }

    /// A message passes when it mentions the bot, or when its leading text (raw first
    /// plain segment, or the normalized text) starts with a wake prefix.
    fn passes_prefix_gate(&self, event: &dyn MessageEvent) -> bool {
        let self_id = event.self_id();
        let segments = event.segments();

        let mentioned = segments
            .iter()
            .any(|s| matches!(s, MessageSegment::At { target } if target == self_id));
        if mentioned {
            return true;
        }

        let leading_plain = segments.iter().find_map(|s| match s {
            MessageSegment::Plain { text } if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        });

        leading_plain.is_some_and(|t| self.starts_with_wake_prefix(t))
            || self.starts_with_wake_prefix(event.message_str())
    }

    async fn mute(
        &self,
        event: &dyn MessageEvent,
        conversation: &ConversationId,
        duration: u64,
        now: f64,
    ) -> GateDecision {
        let expiry = now + duration as f64;
        self.store.set(conversation, expiry).await;
        info!("Activating silence for {}: {}s, until {}", conversation, duration, expiry);

        if let Some(annotator) = &self.annotator {
            match event.display_decoration() {
                Some(target) => annotator.on_muted(conversation, target, expiry, now).await,
                None => debug!("No display capability for {}, skipping decoration", conversation),
            }
        }

        let values = [
            ("duration", duration.to_string()),
            ("expiry_time", format_local(expiry)),
        ];
        GateDecision::Reply(render_or(&self.config.shutup_reply, &values, &default_shutup_reply()))
    }

    async fn unmute(&self, conversation: &ConversationId, now: f64) -> GateDecision {
        let previous = self.store.clear(conversation).await;

        // Time since the mute started, assuming it was created with the default duration.
        // Off by (custom - default) for mutes created with an explicit duration.
        let elapsed = previous
            .map(|old| (now - (old - self.config.default_duration_secs() as f64)).max(0.0))
            .unwrap_or(0.0) as u64;
        info!("Removing silence for {} after {}s", conversation, elapsed);

        if let Some(annotator) = &self.annotator {
            annotator.on_unmuted(conversation);
        }

        let values = [
            ("duration", elapsed.to_string()),
            ("expiry_time", format_local(now)),
        ];
        GateDecision::Reply(render_or(&self.config.unshutup_reply, &values, &default_unshutup_reply()))
    }
}
