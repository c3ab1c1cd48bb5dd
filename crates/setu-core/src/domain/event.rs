use crate::domain::ids::SosId;
use crate::domain::location::Coordinates;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRef {
    pub display_name: String,
    pub raw_phone: String,
}

/// A single SOS trigger. Handed to the dispatcher by reference and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyEvent {
    pub id: SosId,
    pub requester_id: String,
    pub coordinates: Option<Coordinates>,
    pub contacts: Vec<ContactRef>,
    pub created_at: i64,
}
