pub mod api;
pub mod hub;
pub mod service;
pub mod state;

pub use api::{router, ApiError};
pub use hub::LocationHub;
pub use state::AppState;
