// src/lib.rs

pub mod plugin;
pub mod schedule;
pub mod services;
pub mod store;
pub mod tasks;
pub mod utils;

pub use plugin::{HandlerRegistration, ShutupPlugin};
pub use schedule::{TimeRangeSet, TimeWindow};
pub use services::gating_engine::GatingEngine;
pub use shutup_common::error::Error;
pub use store::{SilenceStore, SilenceView};
pub use tasks::presence_annotator::PresenceAnnotator;
