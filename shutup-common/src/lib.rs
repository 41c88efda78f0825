// shutup-common/src/lib.rs

pub mod error;
pub mod event;
pub mod models;
pub mod traits;

pub use error::Error;
pub use event::InboundMessage;
