pub mod domain;
pub mod dto;
pub mod error;
pub mod message;
pub mod time;

pub use domain::*;
pub use dto::*;
pub use error::CoreError;
pub use message::{sos_alert_body, test_message_body, DEFAULT_DISPLAY_NAME};
