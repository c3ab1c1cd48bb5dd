use crate::domain::{
    ContactRef, Coordinates, DeliveryOutcome, DeliveryReport, DeliveryResult, EmergencyEvent,
    SosId, SosStatus,
};
use crate::error::CoreError;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosRequestDto {
    pub user_id: Option<String>,
    pub contacts: Option<Vec<ContactDto>>,
    pub location: Option<LocationDto>,
}

/// Clients disagree on the phone key; the first non-blank of `phone`,
/// `number` and `mobile` wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactDto {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "phone_text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "phone_text")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "phone_text")]
    pub mobile: Option<String>,
}

impl ContactDto {
    pub fn phone_number(&self) -> Option<&str> {
        [&self.phone, &self.number, &self.mobile]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|value| !value.trim().is_empty())
    }
}

/// Phone values arrive as strings or bare JSON numbers. Anything else is
/// treated as absent so the contact still gets a (failed) delivery result.
#[derive(Deserialize)]
#[serde(untagged)]
enum PhoneText {
    Text(String),
    Integer(u64),
    Float(f64),
    Other(IgnoredAny),
}

fn phone_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<PhoneText>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        PhoneText::Text(text) => Some(text),
        PhoneText::Integer(number) => Some(number.to_string()),
        PhoneText::Float(number) if number.is_finite() => Some(number.to_string()),
        PhoneText::Float(_) | PhoneText::Other(_) => None,
    }))
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LocationDto {
    #[serde(alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(alias = "longitude")]
    pub lng: Option<f64>,
}

impl LocationDto {
    /// Both halves present and in range; anything else means "no usable fix".
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng),
            _ => None,
        }
    }
}

impl SosRequestDto {
    pub fn into_event(self, id: SosId, created_at: i64) -> Result<EmergencyEvent, CoreError> {
        let requester_id = self
            .user_id
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(CoreError::MissingUserId)?;
        let location = self.location.ok_or(CoreError::MissingLocation)?;

        let contacts = self
            .contacts
            .unwrap_or_default()
            .into_iter()
            .map(|contact| ContactRef {
                raw_phone: contact.phone_number().unwrap_or_default().to_string(),
                display_name: contact.name.unwrap_or_default().trim().to_string(),
            })
            .collect();

        Ok(EmergencyEvent {
            id,
            requester_id,
            coordinates: location.coordinates(),
            contacts,
            created_at,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Sent,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDto {
    pub to: String,
    pub status: NotificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&DeliveryResult> for NotificationDto {
    fn from(result: &DeliveryResult) -> Self {
        match &result.outcome {
            DeliveryOutcome::Sent { message_id } => Self {
                to: result.to.clone(),
                status: NotificationStatus::Sent,
                sid: Some(message_id.to_string()),
                error: None,
            },
            DeliveryOutcome::Failed { reason } => Self {
                to: result.to.clone(),
                status: NotificationStatus::Error,
                sid: None,
                error: Some(reason.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosRecordDto {
    pub id: SosId,
    pub user_id: String,
    pub location: Option<Coordinates>,
    pub contacts: Vec<ContactRef>,
    pub status: SosStatus,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosResponseDto {
    pub sos: SosRecordDto,
    pub notifications: Vec<NotificationDto>,
    pub map_link: String,
}

impl SosResponseDto {
    pub fn new(sos: SosRecordDto, report: &DeliveryReport) -> Self {
        Self {
            sos,
            notifications: report.results.iter().map(NotificationDto::from).collect(),
            map_link: report.map_link.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NotificationDto, NotificationStatus, SosRequestDto};
    use crate::domain::{DeliveryResult, MessageId, SosId};
    use crate::error::CoreError;

    fn parse(raw: &str) -> SosRequestDto {
        serde_json::from_str(raw).expect("parse request")
    }

    #[test]
    fn request_accepts_long_coordinate_names_and_phone_aliases() {
        let dto = parse(
            r#"{"userId":"u1","contacts":[{"name":"Alice","mobile":"9876543210"}],
                "location":{"latitude":19.076,"longitude":72.8777}}"#,
        );
        let event = dto.into_event(SosId::new(), 10).expect("event");
        assert_eq!(event.requester_id, "u1");
        assert_eq!(event.contacts[0].raw_phone, "9876543210");
        let coords = event.coordinates.expect("coords");
        assert_eq!(coords.lat, 19.076);
        assert_eq!(coords.lng, 72.8777);
    }

    #[test]
    fn blank_or_null_phone_falls_through_to_other_keys() {
        let dto = parse(
            r#"{"userId":"u1","contacts":[
                {"name":"A","phone":null,"mobile":"9876543210"},
                {"name":"B","phone":"","number":"9123456789"},
                {"name":"C","phone":"  ","number":null,"mobile":"+14155550100"},
                {"name":"D","phone":"9000000001","number":"9000000002"}
            ],"location":{}}"#,
        );
        let event = dto.into_event(SosId::new(), 0).expect("event");
        let phones: Vec<_> = event
            .contacts
            .iter()
            .map(|contact| contact.raw_phone.as_str())
            .collect();
        assert_eq!(
            phones,
            vec!["9876543210", "9123456789", "+14155550100", "9000000001"]
        );
    }

    #[test]
    fn numeric_phone_is_read_as_digits() {
        let dto = parse(
            r#"{"userId":"u1","contacts":[
                {"name":"A","phone":9876543210},
                {"name":"B","mobile":919876543210.0}
            ],"location":{}}"#,
        );
        let event = dto.into_event(SosId::new(), 0).expect("event");
        assert_eq!(event.contacts[0].raw_phone, "9876543210");
        assert_eq!(event.contacts[1].raw_phone, "919876543210");
    }

    #[test]
    fn unusable_phone_keeps_the_contact() {
        let dto = parse(
            r#"{"userId":"u1","contacts":[
                {"name":"A","phone":{"cc":"+91"}},
                {"name":"B"}
            ],"location":{}}"#,
        );
        let event = dto.into_event(SosId::new(), 0).expect("event");
        assert_eq!(event.contacts.len(), 2);
        assert!(event.contacts.iter().all(|contact| contact.raw_phone.is_empty()));
    }

    #[test]
    fn request_requires_user_and_location() {
        let missing_user = parse(r#"{"location":{"lat":1.0,"lng":2.0}}"#);
        assert_eq!(
            missing_user.into_event(SosId::new(), 0).unwrap_err(),
            CoreError::MissingUserId
        );
        let blank_user = parse(r#"{"userId":"  ","location":{"lat":1.0,"lng":2.0}}"#);
        assert_eq!(
            blank_user.into_event(SosId::new(), 0).unwrap_err(),
            CoreError::MissingUserId
        );
        let missing_location = parse(r#"{"userId":"u1"}"#);
        assert_eq!(
            missing_location.into_event(SosId::new(), 0).unwrap_err(),
            CoreError::MissingLocation
        );
    }

    #[test]
    fn request_with_empty_location_has_no_coordinates() {
        let dto = parse(r#"{"userId":"u1","contacts":null,"location":{}}"#);
        let event = dto.into_event(SosId::new(), 0).expect("event");
        assert!(event.coordinates.is_none());
        assert!(event.contacts.is_empty());
    }

    #[test]
    fn notification_dto_serializes_sid_or_error() {
        let sent = NotificationDto::from(&DeliveryResult::sent("+1", MessageId("SM1".into())));
        assert_eq!(sent.status, NotificationStatus::Sent);
        let value = serde_json::to_value(&sent).expect("json");
        assert_eq!(value["status"], "sent");
        assert_eq!(value["sid"], "SM1");
        assert!(value.get("error").is_none());

        let failed = NotificationDto::from(&DeliveryResult::failed("+2", "bad number"));
        let value = serde_json::to_value(&failed).expect("json");
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "bad number");
        assert!(value.get("sid").is_none());
    }
}
