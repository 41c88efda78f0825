// File: shutup-common/src/models/decision.rs

/// Outcome of evaluating one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Leave the message alone; the host's normal handling proceeds.
    Admit,
    /// Skip the automated response and stop further handlers. No text is sent.
    Suppress,
    /// A control command was handled: send this text back and stop further handlers.
    Reply(String),
}

impl GateDecision {
    pub fn is_admit(&self) -> bool {
        matches!(self, GateDecision::Admit)
    }

    /// Whether the host must stop passing this message to other handlers.
    pub fn stops_event(&self) -> bool {
        !self.is_admit()
    }
}
