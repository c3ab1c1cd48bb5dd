pub mod delivery;
pub mod event;
pub mod ids;
pub mod location;
pub mod phone;
pub mod status;
pub mod user;

pub use delivery::{DeliveryOutcome, DeliveryReport, DeliveryResult, MessageId};
pub use event::{ContactRef, EmergencyEvent};
pub use ids::{SosId, UserId};
pub use location::{map_link, Coordinates, LiveLocation, MAP_LINK_PLACEHOLDER};
pub use phone::{dial_string, is_valid_country_code, normalize_phone, DEFAULT_COUNTRY_CODE};
pub use status::SosStatus;
pub use user::User;
