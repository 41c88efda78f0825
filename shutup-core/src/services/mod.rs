pub mod command_parser;
pub mod event_handler;
pub mod event_registry;
pub mod gating_engine;
pub mod shutup_handler;
pub mod template;

pub use event_handler::{EventHandler, EventHandlerInfo};
pub use event_registry::EventHandlerRegistry;
pub use gating_engine::GatingEngine;
pub use shutup_handler::ShutupHandler;
