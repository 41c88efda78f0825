pub mod display_traits;
pub mod message_traits;

pub use display_traits::DisplayDecoration;
pub use message_traits::MessageEvent;
