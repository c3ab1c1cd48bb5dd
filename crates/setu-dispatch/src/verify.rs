use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use setu_config::AppConfig;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationStarted {
    pub status: String,
    pub service_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationChecked {
    pub verified: bool,
    pub status: String,
}

/// One-time-code ownership check for a phone number.
#[async_trait]
pub trait PhoneVerifier: Send + Sync {
    async fn send_code(&self, phone: &str) -> Result<VerificationStarted>;
    async fn check_code(
        &self,
        phone: &str,
        code: &str,
        service_id: &str,
    ) -> Result<VerificationChecked>;
}

/// `None` when verification is switched off in config.
pub fn build_verifier(config: &AppConfig) -> Result<Option<Arc<dyn PhoneVerifier>>> {
    if !config.verify.enabled {
        return Ok(None);
    }
    twilio_verifier(config).map(Some)
}

#[cfg(feature = "twilio")]
fn twilio_verifier(config: &AppConfig) -> Result<Arc<dyn PhoneVerifier>> {
    let twilio = config.twilio.as_ref().ok_or_else(|| {
        crate::error::DispatchError::Config("missing [twilio] section".to_string())
    })?;
    Ok(Arc::new(crate::twilio::TwilioVerifier::from_config(twilio)?))
}

#[cfg(not(feature = "twilio"))]
fn twilio_verifier(_config: &AppConfig) -> Result<Arc<dyn PhoneVerifier>> {
    Err(crate::error::DispatchError::Unavailable(
        "built without the twilio feature".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::build_verifier;
    use setu_config::AppConfig;

    #[test]
    fn verification_disabled_by_default() {
        let verifier = build_verifier(&AppConfig::default()).expect("build");
        assert!(verifier.is_none());
    }
}
