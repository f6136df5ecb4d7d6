mod locale_store;
mod lora_poller;
mod message_reducer;
mod paginator;
mod thread_session;

pub use locale_store::*;
pub use lora_poller::*;
pub use message_reducer::*;
pub use paginator::*;
pub use thread_session::*;
