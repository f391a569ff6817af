pub mod subscription;
pub mod callback;
pub mod command;
pub mod forward;
pub mod text;

pub use callback::callback_handler;
pub use command::command_handler;
pub use forward::{chat_shared_handler, contact_handler, forwarded_handler};
pub use text::text_handler;
