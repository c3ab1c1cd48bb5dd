pub mod dispatcher;
pub mod error;
pub mod transport;
#[cfg(feature = "twilio")]
pub mod twilio;
pub mod verify;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, Result};
pub use transport::{build_transport, LogTransport, SmsTransport};
pub use verify::{build_verifier, PhoneVerifier, VerificationChecked, VerificationStarted};
