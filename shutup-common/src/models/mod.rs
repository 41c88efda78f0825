// File: shutup-common/src/models/mod.rs
pub mod config;
pub mod conversation;
pub mod decision;
pub mod message;
pub mod presence;

pub use config::ShutupConfig;
pub use conversation::ConversationId;
pub use decision::GateDecision;
pub use message::MessageSegment;
pub use presence::DisplayLabel;
