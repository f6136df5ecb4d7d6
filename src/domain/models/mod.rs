mod activity;
mod connection;
mod error;
mod fragment;
mod image;
mod locale;
mod message;
mod page;
mod persona;
mod schedule;
mod sns;
mod thread;

pub use activity::*;
pub use connection::*;
pub use error::*;
pub use fragment::*;
pub use image::*;
pub use locale::*;
pub use message::*;
pub use page::*;
pub use persona::*;
pub use schedule::*;
pub use sns::*;
pub use thread::*;
