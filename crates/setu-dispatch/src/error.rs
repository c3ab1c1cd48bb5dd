use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("phone number is required")]
    MissingPhone,
    #[error("invalid phone number: {0}")]
    InvalidPhone(String),
    #[error("sms provider rejected the request ({status}): {message}")]
    Provider {
        status: u16,
        code: Option<i64>,
        message: String,
    },
    #[error("unexpected provider response: {0}")]
    Parse(String),
    #[error("transport misconfigured: {0}")]
    Config(String),
    #[error("transport unavailable: {0}")]
    Unavailable(String),
    #[cfg(feature = "twilio")]
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
