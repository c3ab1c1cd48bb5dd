use crate::error::{Result, StoreError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use setu_core::domain::{
    ContactRef, Coordinates, DeliveryOutcome, DeliveryReport, DeliveryResult, EmergencyEvent,
    MessageId, SosId, SosStatus,
};
use setu_core::dto::SosRecordDto;
use std::str::FromStr;

pub const MAX_LIST_LIMIT: i64 = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct SosRecord {
    pub id: SosId,
    pub requester_id: String,
    pub coordinates: Option<Coordinates>,
    pub contacts: Vec<ContactRef>,
    pub status: SosStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&SosRecord> for SosRecordDto {
    fn from(record: &SosRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.requester_id.clone(),
            location: record.coordinates,
            contacts: record.contacts.clone(),
            status: record.status,
            created_at: record.created_at,
        }
    }
}

pub struct SosRepo<'a> {
    conn: &'a Connection,
}

impl<'a> SosRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Persist a freshly triggered event together with its contact list.
    pub fn create(&self, event: &EmergencyEvent) -> Result<SosRecord> {
        let tx = self.conn.unchecked_transaction()?;
        let (lat, lng) = split_coordinates(event.coordinates);
        tx.execute(
            "INSERT INTO sos_events (id, requester_id, lat, lng, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6);",
            params![
                event.id.to_string(),
                event.requester_id,
                lat,
                lng,
                SosStatus::Pending.as_str(),
                event.created_at,
            ],
        )?;
        for (position, contact) in event.contacts.iter().enumerate() {
            tx.execute(
                "INSERT INTO sos_contacts (sos_id, position, display_name, raw_phone)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    event.id.to_string(),
                    position as i64,
                    contact.display_name,
                    contact.raw_phone,
                ],
            )?;
        }
        tx.commit()?;

        Ok(SosRecord {
            id: event.id,
            requester_id: event.requester_id.clone(),
            coordinates: event.coordinates,
            contacts: event.contacts.clone(),
            status: SosStatus::Pending,
            created_at: event.created_at,
            updated_at: event.created_at,
        })
    }

    pub fn get(&self, id: SosId) -> Result<Option<SosRecord>> {
        let header = self
            .conn
            .query_row(
                "SELECT id, requester_id, lat, lng, status, created_at, updated_at
                 FROM sos_events WHERE id = ?1;",
                [id.to_string()],
                header_from_row,
            )
            .optional()?;
        header.map(|header| self.hydrate(header)).transpose()
    }

    /// Newest first. `limit` is clamped to `1..=MAX_LIST_LIMIT`.
    pub fn list(&self, requester_id: Option<&str>, limit: i64) -> Result<Vec<SosRecord>> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        let mut stmt = self.conn.prepare(
            "SELECT id, requester_id, lat, lng, status, created_at, updated_at
             FROM sos_events
             WHERE (?1 IS NULL OR requester_id = ?1)
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2;",
        )?;
        let mut rows = stmt.query(params![requester_id, limit])?;
        let mut headers = Vec::new();
        while let Some(row) = rows.next()? {
            headers.push(header_from_row(row)?);
        }
        headers
            .into_iter()
            .map(|header| self.hydrate(header))
            .collect()
    }

    pub fn latest_for_requester(&self, requester_id: &str) -> Result<Option<SosRecord>> {
        Ok(self.list(Some(requester_id), 1)?.into_iter().next())
    }

    pub fn update_location(&self, id: SosId, coordinates: Coordinates, now_utc: i64) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE sos_events SET lat = ?1, lng = ?2, updated_at = ?3 WHERE id = ?4;",
            params![coordinates.lat, coordinates.lng, now_utc, id.to_string()],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Store the per-recipient outcomes of a dispatch and derive the event status.
    pub fn record_report(
        &self,
        id: SosId,
        report: &DeliveryReport,
        now_utc: i64,
    ) -> Result<SosStatus> {
        let status = SosStatus::from_report(report);
        let tx = self.conn.unchecked_transaction()?;
        let updated = tx.execute(
            "UPDATE sos_events SET status = ?1, updated_at = ?2 WHERE id = ?3;",
            params![status.as_str(), now_utc, id.to_string()],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        tx.execute(
            "DELETE FROM sos_notifications WHERE sos_id = ?1;",
            [id.to_string()],
        )?;
        for (position, result) in report.results.iter().enumerate() {
            let (label, message_id, error) = match &result.outcome {
                DeliveryOutcome::Sent { message_id } => ("sent", Some(message_id.as_str()), None),
                DeliveryOutcome::Failed { reason } => ("error", None, Some(reason.as_str())),
            };
            tx.execute(
                "INSERT INTO sos_notifications (sos_id, position, to_address, status, message_id, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    id.to_string(),
                    position as i64,
                    result.to,
                    label,
                    message_id,
                    error
                ],
            )?;
        }
        tx.commit()?;
        Ok(status)
    }

    pub fn notifications_for(&self, id: SosId) -> Result<Vec<DeliveryResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT to_address, status, message_id, error
             FROM sos_notifications
             WHERE sos_id = ?1
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            let to: String = row.get(0)?;
            let status: String = row.get(1)?;
            let message_id: Option<String> = row.get(2)?;
            let error: Option<String> = row.get(3)?;
            let result = match (status.as_str(), message_id) {
                ("sent", Some(message_id)) => DeliveryResult::sent(to, MessageId(message_id)),
                _ => DeliveryResult::failed(to, error.unwrap_or_default()),
            };
            results.push(result);
        }
        Ok(results)
    }

    fn contacts_for(&self, id: &str) -> Result<Vec<ContactRef>> {
        let mut stmt = self.conn.prepare(
            "SELECT display_name, raw_phone
             FROM sos_contacts
             WHERE sos_id = ?1
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([id])?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(ContactRef {
                display_name: row.get(0)?,
                raw_phone: row.get(1)?,
            });
        }
        Ok(contacts)
    }

    fn hydrate(&self, header: SosHeader) -> Result<SosRecord> {
        let id = SosId::from_str(&header.id).map_err(|_| StoreError::InvalidId(header.id.clone()))?;
        let status = SosStatus::from_str(&header.status)?;
        let contacts = self.contacts_for(&header.id)?;
        Ok(SosRecord {
            id,
            requester_id: header.requester_id,
            coordinates: join_coordinates(header.lat, header.lng),
            contacts,
            status,
            created_at: header.created_at,
            updated_at: header.updated_at,
        })
    }
}

struct SosHeader {
    id: String,
    requester_id: String,
    lat: Option<f64>,
    lng: Option<f64>,
    status: String,
    created_at: i64,
    updated_at: i64,
}

fn header_from_row(row: &Row<'_>) -> rusqlite::Result<SosHeader> {
    Ok(SosHeader {
        id: row.get(0)?,
        requester_id: row.get(1)?,
        lat: row.get(2)?,
        lng: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn split_coordinates(coordinates: Option<Coordinates>) -> (Option<f64>, Option<f64>) {
    match coordinates {
        Some(Coordinates { lat, lng }) => (Some(lat), Some(lng)),
        None => (None, None),
    }
}

fn join_coordinates(lat: Option<f64>, lng: Option<f64>) -> Option<Coordinates> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
        _ => None,
    }
}
