use crate::error::{DispatchError, Result};
use async_trait::async_trait;
use setu_config::{AppConfig, SmsBackend};
use setu_core::domain::MessageId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// One outbound-message primitive. Implementations report failure through
/// `Err`; the dispatcher turns that into a per-recipient result.
#[async_trait]
pub trait SmsTransport: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, to: &str, body: &str) -> Result<MessageId>;
}

/// Writes messages to the log instead of a provider.
#[derive(Debug, Default)]
pub struct LogTransport {
    sent: AtomicU64,
}

impl LogTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SmsTransport for LogTransport {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, to: &str, body: &str) -> Result<MessageId> {
        if to.trim().is_empty() {
            return Err(DispatchError::MissingPhone);
        }
        let seq = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        info!(to, body_len = body.len(), seq, "sms (log backend)");
        debug!(body, "sms body");
        Ok(MessageId(format!("LOG-{seq}")))
    }
}

pub fn build_transport(config: &AppConfig) -> Result<Arc<dyn SmsTransport>> {
    match config.sms.backend {
        SmsBackend::Log => Ok(Arc::new(LogTransport::new())),
        SmsBackend::Twilio => twilio_transport(config),
    }
}

#[cfg(feature = "twilio")]
fn twilio_transport(config: &AppConfig) -> Result<Arc<dyn SmsTransport>> {
    let twilio = config
        .twilio
        .as_ref()
        .ok_or_else(|| DispatchError::Config("missing [twilio] section".to_string()))?;
    Ok(Arc::new(crate::twilio::TwilioTransport::from_config(twilio)?))
}

#[cfg(not(feature = "twilio"))]
fn twilio_transport(_config: &AppConfig) -> Result<Arc<dyn SmsTransport>> {
    Err(DispatchError::Unavailable(
        "built without the twilio feature".to_string(),
    ))
}
