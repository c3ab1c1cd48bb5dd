use crate::api::ApiError;
use crate::state::AppState;
use setu_core::domain::{map_link, DeliveryReport, SosId, SosStatus, User, UserId};
use setu_core::dto::{SosRecordDto, SosRequestDto, SosResponseDto};
use setu_core::message::{sos_alert_body, DEFAULT_DISPLAY_NAME};
use setu_core::time::now_utc;
use setu_store::repo::SosRecord;
use setu_store::Store;
use std::str::FromStr;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct SosOutcome {
    pub record: SosRecord,
    pub report: DeliveryReport,
}

impl SosOutcome {
    pub fn to_response(&self) -> SosResponseDto {
        SosResponseDto::new(SosRecordDto::from(&self.record), &self.report)
    }
}

/// Persist an SOS, fan the alert out and record what happened.
///
/// Only validation and the initial write can fail; individual delivery
/// failures end up in the report.
pub async fn trigger_sos(state: &AppState, request: SosRequestDto) -> Result<SosOutcome, ApiError> {
    let event = request.into_event(SosId::new(), now_utc())?;

    let (record, requester) = {
        let store = state.lock_store()?;
        let record = store.sos().create(&event)?;
        let requester = lookup_requester(&store, &event.requester_id);
        (record, requester)
    };
    info!(
        sos_id = %event.id,
        contacts = event.contacts.len(),
        has_location = event.coordinates.is_some(),
        "sos created"
    );

    let display_name = requester
        .as_ref()
        .map(|user| user.username.as_str())
        .unwrap_or(DEFAULT_DISPLAY_NAME);
    let fallback_phone = requester.as_ref().and_then(|user| user.phone.as_deref());

    let report = state
        .dispatcher
        .dispatch(&event, fallback_phone, |event| {
            sos_alert_body(display_name, &map_link(event.coordinates))
        })
        .await;

    let now = now_utc();
    let status = match persist_report(state, event.id, &report, now) {
        Ok(status) => status,
        Err(err) => {
            error!(sos_id = %event.id, error = %err, "failed to record sos notifications");
            SosStatus::from_report(&report)
        }
    };

    Ok(SosOutcome {
        record: SosRecord {
            status,
            updated_at: now,
            ..record
        },
        report,
    })
}

fn persist_report(
    state: &AppState,
    id: SosId,
    report: &DeliveryReport,
    now: i64,
) -> Result<SosStatus, ApiError> {
    let store = state.lock_store()?;
    Ok(store.sos().record_report(id, report, now)?)
}

/// Missing or unreadable profiles mean "no fallback", never an error.
fn lookup_requester(store: &Store, requester_id: &str) -> Option<User> {
    let Ok(id) = UserId::from_str(requester_id) else {
        debug!(requester_id, "requester is not a registered user id");
        return None;
    };
    match store.users().get(id) {
        Ok(user) => user,
        Err(err) => {
            warn!(requester_id, error = %err, "requester lookup failed");
            None
        }
    }
}
