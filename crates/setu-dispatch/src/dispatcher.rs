//! SOS fan-out.
//!
//! One event becomes one delivery attempt per recipient. All attempts run
//! concurrently and the dispatcher waits for every one of them; a failure or
//! a panic in one attempt is recorded against that recipient only.

use crate::error::DispatchError;
use crate::transport::SmsTransport;
use futures::future::{join_all, FutureExt};
use setu_core::domain::{map_link, normalize_phone, DeliveryReport, DeliveryResult, EmergencyEvent};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const TRANSPORT_PANICKED: &str = "transport panicked";

pub struct Dispatcher {
    transport: Arc<dyn SmsTransport>,
    default_country_code: String,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn SmsTransport>, default_country_code: impl Into<String>) -> Self {
        Self {
            transport,
            default_country_code: default_country_code.into(),
        }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Send the alert for `event` and collect one result per recipient.
    ///
    /// Recipients are the event's contacts, or the requester's own
    /// `fallback_phone` when the contact list is empty. With neither, the
    /// report comes back with no results. `results[i]` belongs to contact `i`.
    pub async fn dispatch<F>(
        &self,
        event: &EmergencyEvent,
        fallback_phone: Option<&str>,
        build_message: F,
    ) -> DeliveryReport
    where
        F: FnOnce(&EmergencyEvent) -> String,
    {
        let map_link = map_link(event.coordinates);
        let body = build_message(event);

        let recipients = self.recipients(event, fallback_phone);
        if recipients.is_empty() {
            warn!(sos_id = %event.id, "no contacts and no fallback phone, nothing sent");
        }

        let attempts = recipients
            .into_iter()
            .map(|to| self.attempt(to, body.as_str()));
        let results = join_all(attempts).await;

        let report = DeliveryReport { results, map_link };
        info!(
            sos_id = %event.id,
            transport = self.transport.name(),
            attempted = report.results.len(),
            sent = report.sent_count(),
            failed = report.failed_count(),
            "sos dispatch settled"
        );
        report
    }

    fn recipients(&self, event: &EmergencyEvent, fallback_phone: Option<&str>) -> Vec<String> {
        if !event.contacts.is_empty() {
            return event
                .contacts
                .iter()
                .map(|contact| normalize_phone(&contact.raw_phone, &self.default_country_code))
                .collect();
        }

        match fallback_phone.map(str::trim).filter(|phone| !phone.is_empty()) {
            Some(phone) => {
                info!(sos_id = %event.id, "no contacts provided, notifying requester's own phone");
                vec![normalize_phone(phone, &self.default_country_code)]
            }
            None => Vec::new(),
        }
    }

    async fn attempt(&self, to: String, body: &str) -> DeliveryResult {
        if to.trim().is_empty() {
            return DeliveryResult::failed(to, DispatchError::MissingPhone.to_string());
        }

        debug!(to = %to, "sending sos sms");
        let outcome = AssertUnwindSafe(self.transport.send(&to, body))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(message_id)) => {
                debug!(to = %to, message_id = %message_id, "sos sms accepted");
                DeliveryResult::sent(to, message_id)
            }
            Ok(Err(err)) => {
                warn!(to = %to, error = %err, "sos sms failed");
                DeliveryResult::failed(to, err.to_string())
            }
            Err(_) => {
                error!(to = %to, "sms transport panicked");
                DeliveryResult::failed(to, TRANSPORT_PANICKED)
            }
        }
    }
}
