//! Twilio Programmable Messaging and Verify v2 over async reqwest.

use crate::error::{DispatchError, Result};
use crate::transport::SmsTransport;
use crate::verify::{PhoneVerifier, VerificationChecked, VerificationStarted};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use setu_config::TwilioConfig;
use setu_core::domain::{dial_string, MessageId};
use std::env;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

const USER_AGENT: &str = "setu";
const CONNECT_TIMEOUT_SECONDS: u64 = 10;
const ERROR_SNIPPET_LEN: usize = 200;

#[derive(Clone)]
struct Credentials {
    account_sid: String,
    auth_token: String,
}

impl Credentials {
    fn from_config(config: &TwilioConfig) -> Result<Self> {
        let token_env = config.auth_token_env.as_str();
        let auth_token = env::var(token_env)
            .map_err(|_| DispatchError::Config(format!("missing env var {token_env}")))?;
        let auth_token = auth_token.trim();
        if auth_token.is_empty() {
            return Err(DispatchError::Config(format!("env var {token_env} is empty")));
        }
        Ok(Self {
            account_sid: config.account_sid.clone(),
            auth_token: auth_token.to_string(),
        })
    }
}

fn http_client(timeout_seconds: u64) -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_seconds))
        .connect_timeout(Duration::from_secs(
            CONNECT_TIMEOUT_SECONDS.min(timeout_seconds),
        ))
        .build()?;
    Ok(client)
}

pub struct TwilioTransport {
    client: Client,
    credentials: Credentials,
    from: String,
    messages_url: String,
}

impl TwilioTransport {
    pub fn from_config(config: &TwilioConfig) -> Result<Self> {
        let credentials = Credentials::from_config(config)?;
        let messages_url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            config.api_base, credentials.account_sid
        );
        Ok(Self {
            client: http_client(config.timeout_seconds)?,
            credentials,
            from: config.from.clone(),
            messages_url,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
    status: Option<String>,
}

#[async_trait]
impl SmsTransport for TwilioTransport {
    fn name(&self) -> &'static str {
        "twilio"
    }

    async fn send(&self, to: &str, body: &str) -> Result<MessageId> {
        if to.trim().is_empty() {
            return Err(DispatchError::MissingPhone);
        }
        debug!(to, from = %self.from, body_len = body.len(), "twilio sms attempt");

        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth(
                &self.credentials.account_sid,
                Some(&self.credentials.auth_token),
            )
            .form(&[("To", to), ("From", self.from.as_str()), ("Body", body)])
            .send()
            .await?;
        let message: MessageResource = read_resource(response).await?;

        info!(
            to,
            sid = %message.sid,
            status = message.status.as_deref().unwrap_or("unknown"),
            "twilio sms accepted"
        );
        Ok(MessageId(message.sid))
    }
}

pub struct TwilioVerifier {
    client: Client,
    credentials: Credentials,
    services_url: String,
    friendly_name: String,
    service_sid: Mutex<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct ServiceResource {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ServiceList {
    #[serde(default)]
    services: Vec<ServiceResource>,
}

#[derive(Debug, Deserialize)]
struct VerificationResource {
    status: String,
}

impl TwilioVerifier {
    pub fn from_config(config: &TwilioConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_seconds)?,
            credentials: Credentials::from_config(config)?,
            services_url: format!("{}/v2/Services", config.verify_api_base),
            friendly_name: config.verify_friendly_name.clone(),
            service_sid: Mutex::new(None),
        })
    }

    fn cached_service(&self) -> Option<String> {
        self.service_sid
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().cloned())
    }

    fn remember_service(&self, sid: &str) {
        if let Ok(mut guard) = self.service_sid.lock() {
            *guard = Some(sid.to_string());
        }
    }

    /// Reuse the account's first Verify service, creating one on first use.
    async fn ensure_service(&self) -> Result<String> {
        if let Some(sid) = self.cached_service() {
            return Ok(sid);
        }

        let response = self
            .client
            .get(&self.services_url)
            .basic_auth(
                &self.credentials.account_sid,
                Some(&self.credentials.auth_token),
            )
            .query(&[("PageSize", "1")])
            .send()
            .await?;
        let list: ServiceList = read_resource(response).await?;

        let sid = match list.services.into_iter().next() {
            Some(service) => service.sid,
            None => {
                info!(name = %self.friendly_name, "creating twilio verify service");
                let response = self
                    .client
                    .post(&self.services_url)
                    .basic_auth(
                        &self.credentials.account_sid,
                        Some(&self.credentials.auth_token),
                    )
                    .form(&[("FriendlyName", self.friendly_name.as_str())])
                    .send()
                    .await?;
                let service: ServiceResource = read_resource(response).await?;
                service.sid
            }
        };
        self.remember_service(&sid);
        Ok(sid)
    }
}

#[async_trait]
impl PhoneVerifier for TwilioVerifier {
    async fn send_code(&self, phone: &str) -> Result<VerificationStarted> {
        let to = dial_string(phone).ok_or_else(|| DispatchError::InvalidPhone(phone.to_string()))?;
        let service_id = self.ensure_service().await?;

        let response = self
            .client
            .post(format!("{}/{}/Verifications", self.services_url, service_id))
            .basic_auth(
                &self.credentials.account_sid,
                Some(&self.credentials.auth_token),
            )
            .form(&[("To", to.as_str()), ("Channel", "sms")])
            .send()
            .await?;
        let verification: VerificationResource = read_resource(response).await?;
        debug!(to = %to, status = %verification.status, "verification started");

        Ok(VerificationStarted {
            status: verification.status,
            service_id,
        })
    }

    async fn check_code(
        &self,
        phone: &str,
        code: &str,
        service_id: &str,
    ) -> Result<VerificationChecked> {
        let to = dial_string(phone).ok_or_else(|| DispatchError::InvalidPhone(phone.to_string()))?;

        let response = self
            .client
            .post(format!(
                "{}/{}/VerificationCheck",
                self.services_url,
                service_id.trim()
            ))
            .basic_auth(
                &self.credentials.account_sid,
                Some(&self.credentials.auth_token),
            )
            .form(&[("To", to.as_str()), ("Code", code.trim())])
            .send()
            .await?;
        let check: VerificationResource = read_resource(response).await?;

        Ok(VerificationChecked {
            verified: check.status == "approved",
            status: check.status,
        })
    }
}

async fn read_resource<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    parse_resource(status, &body)
}

#[derive(Debug, Deserialize)]
struct ErrorResource {
    code: Option<i64>,
    message: Option<String>,
}

fn parse_resource<T: DeserializeOwned>(status: u16, body: &str) -> Result<T> {
    if !(200..300).contains(&status) {
        return Err(provider_error(status, body));
    }
    serde_json::from_str(body).map_err(|err| DispatchError::Parse(err.to_string()))
}

fn provider_error(status: u16, body: &str) -> DispatchError {
    match serde_json::from_str::<ErrorResource>(body) {
        Ok(ErrorResource {
            code,
            message: Some(message),
        }) => DispatchError::Provider {
            status,
            code,
            message,
        },
        _ => {
            let snippet: String = body.trim().chars().take(ERROR_SNIPPET_LEN).collect();
            DispatchError::Provider {
                status,
                code: None,
                message: if snippet.is_empty() {
                    "empty response".to_string()
                } else {
                    snippet
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_resource, MessageResource, ServiceList, TwilioTransport};
    use crate::error::DispatchError;
    use setu_config::TwilioConfig;

    fn config(token_env: &str) -> TwilioConfig {
        TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token_env: token_env.to_string(),
            from: "+15005550006".to_string(),
            api_base: "https://api.twilio.com".to_string(),
            verify_api_base: "https://verify.twilio.com".to_string(),
            verify_friendly_name: "test".to_string(),
            timeout_seconds: 5,
        }
    }

    #[test]
    fn parse_message_resource() {
        let message: MessageResource =
            parse_resource(201, r#"{"sid":"SM123","status":"queued","to":"+919876543210"}"#)
                .expect("parse");
        assert_eq!(message.sid, "SM123");
        assert_eq!(message.status.as_deref(), Some("queued"));
    }

    #[test]
    fn parse_error_resource_keeps_provider_message() {
        let err = parse_resource::<MessageResource>(
            400,
            r#"{"code":21211,"message":"The 'To' number +91123 is not a valid phone number.","status":400}"#,
        )
        .unwrap_err();
        match err {
            DispatchError::Provider {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, Some(21211));
                assert!(message.contains("not a valid phone number"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_error_without_json_body() {
        let err = parse_resource::<MessageResource>(503, "").unwrap_err();
        assert!(err.to_string().contains("empty response"));
    }

    #[test]
    fn parse_service_list_tolerates_missing_array() {
        let list: ServiceList = parse_resource(200, r#"{"meta":{}}"#).expect("parse");
        assert!(list.services.is_empty());
    }

    #[test]
    fn transport_requires_token_env() {
        std::env::remove_var("SETU_TEST_TWILIO_TOKEN_MISSING");
        match TwilioTransport::from_config(&config("SETU_TEST_TWILIO_TOKEN_MISSING")) {
            Ok(_) => panic!("expected error"),
            Err(err) => assert!(err.to_string().contains("missing env var")),
        }

        std::env::set_var("SETU_TEST_TWILIO_TOKEN_EMPTY", "  ");
        match TwilioTransport::from_config(&config("SETU_TEST_TWILIO_TOKEN_EMPTY")) {
            Ok(_) => panic!("expected error"),
            Err(err) => assert!(err.to_string().contains("is empty")),
        }
        std::env::remove_var("SETU_TEST_TWILIO_TOKEN_EMPTY");
    }

    #[test]
    fn transport_builds_messages_url() {
        std::env::set_var("SETU_TEST_TWILIO_TOKEN_OK", "secret");
        let transport =
            TwilioTransport::from_config(&config("SETU_TEST_TWILIO_TOKEN_OK")).expect("transport");
        assert_eq!(
            transport.messages_url,
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
        std::env::remove_var("SETU_TEST_TWILIO_TOKEN_OK");
    }
}
