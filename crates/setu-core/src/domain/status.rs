use crate::domain::delivery::DeliveryReport;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SosStatus {
    Pending,
    Dispatched,
    Undelivered,
    NoRecipients,
}

impl SosStatus {
    pub fn from_report(report: &DeliveryReport) -> Self {
        if report.is_empty() {
            SosStatus::NoRecipients
        } else if report.sent_count() > 0 {
            SosStatus::Dispatched
        } else {
            SosStatus::Undelivered
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SosStatus::Pending => "pending",
            SosStatus::Dispatched => "dispatched",
            SosStatus::Undelivered => "undelivered",
            SosStatus::NoRecipients => "no_recipients",
        }
    }
}

impl fmt::Display for SosStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SosStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SosStatus::Pending),
            "dispatched" => Ok(SosStatus::Dispatched),
            "undelivered" => Ok(SosStatus::Undelivered),
            "no_recipients" => Ok(SosStatus::NoRecipients),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SosStatus;
    use crate::domain::{DeliveryReport, DeliveryResult, MessageId};

    fn report(results: Vec<DeliveryResult>) -> DeliveryReport {
        DeliveryReport {
            results,
            map_link: "Location not provided".to_string(),
        }
    }

    #[test]
    fn status_from_report() {
        assert_eq!(
            SosStatus::from_report(&report(Vec::new())),
            SosStatus::NoRecipients
        );
        assert_eq!(
            SosStatus::from_report(&report(vec![DeliveryResult::failed("+1", "boom")])),
            SosStatus::Undelivered
        );
        assert_eq!(
            SosStatus::from_report(&report(vec![
                DeliveryResult::failed("+1", "boom"),
                DeliveryResult::sent("+2", MessageId("SM2".to_string())),
            ])),
            SosStatus::Dispatched
        );
    }

    #[test]
    fn status_parses_its_own_labels() {
        for status in [
            SosStatus::Pending,
            SosStatus::Dispatched,
            SosStatus::Undelivered,
            SosStatus::NoRecipients,
        ] {
            assert_eq!(status.as_str().parse::<SosStatus>(), Ok(status));
        }
        assert!("sent".parse::<SosStatus>().is_err());
    }
}
