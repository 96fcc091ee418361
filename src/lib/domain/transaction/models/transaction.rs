use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::auth::models::user::UserId;
use crate::domain::device::models::device::{DeviceId, DeviceStatus};
use crate::domain::pagination::SortField;

/// Represents always valid device transaction identifier.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(Uuid);

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0} is not a valid transaction id")]
pub struct TransactionIdError(String);
impl TransactionId {
    pub fn new(raw_id: &str) -> Result<Self, TransactionIdError> {
        match Uuid::try_parse(raw_id) {
            Ok(uuid) if !uuid.is_nil() => Ok(TransactionId(uuid)),
            _ => Err(TransactionIdError(raw_id.to_string())),
        }
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn into_inner(self) -> Uuid {
        self.0
    }
}

/// Lifecycle of one booking.
///
/// ```text
/// (create) -> BOOKING_HOLD <-> OPEN <-> SUBMISSION_HOLD -> CLOSED
/// ```
///
/// Moves between the non-closed states are caller driven and unrestricted. `CLOSED` is final.
#[derive(Display, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    #[display("BOOKING_HOLD")]
    BookingHold,
    #[display("OPEN")]
    Open,
    #[display("SUBMISSION_HOLD")]
    SubmissionHold,
    #[display("CLOSED")]
    Closed,
}

#[derive(Clone, Debug, Error, PartialEq)]
#[error("{0} is not a valid transaction status")]
pub struct TransactionStatusInvalidError(String);

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::BookingHold => "BOOKING_HOLD",
            TransactionStatus::Open => "OPEN",
            TransactionStatus::SubmissionHold => "SUBMISSION_HOLD",
            TransactionStatus::Closed => "CLOSED",
        }
    }

    /// Status the booked device must carry while its transaction is in this state.
    pub fn device_status(&self) -> DeviceStatus {
        match self {
            TransactionStatus::BookingHold => DeviceStatus::BookingPending,
            TransactionStatus::Open => DeviceStatus::Booked,
            TransactionStatus::SubmissionHold => DeviceStatus::SubmissionPending,
            TransactionStatus::Closed => DeviceStatus::Available,
        }
    }

    pub fn is_active(&self) -> bool {
        *self != TransactionStatus::Closed
    }
}

impl FromStr for TransactionStatus {
    type Err = TransactionStatusInvalidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BOOKING_HOLD" => Ok(TransactionStatus::BookingHold),
            "OPEN" => Ok(TransactionStatus::Open),
            "SUBMISSION_HOLD" => Ok(TransactionStatus::SubmissionHold),
            "CLOSED" => Ok(TransactionStatus::Closed),
            _ => Err(TransactionStatusInvalidError(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
#[error("{0} is not a valid ISO 8601 date")]
pub struct DueDateInvalidError(String);

/// Parses an RFC 3339 timestamp, or a bare `YYYY-MM-DD` date taken as midnight UTC.
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, DueDateInvalidError> {
    let raw = raw.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| DueDateInvalidError(raw.to_string()))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceTransaction {
    id: TransactionId,
    device_id: DeviceId,
    user_id: UserId,
    issued_on: DateTime<Utc>,
    due_date: DateTime<Utc>,
    submitted_on: Option<DateTime<Utc>>,
    status: TransactionStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DeviceTransaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TransactionId,
        device_id: DeviceId,
        user_id: UserId,
        issued_on: DateTime<Utc>,
        due_date: DateTime<Utc>,
        submitted_on: Option<DateTime<Utc>>,
        status: TransactionStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            device_id,
            user_id,
            issued_on,
            due_date,
            submitted_on,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn issued_on(&self) -> &DateTime<Utc> {
        &self.issued_on
    }

    pub fn due_date(&self) -> &DateTime<Utc> {
        &self.due_date
    }

    pub fn submitted_on(&self) -> Option<&DateTime<Utc>> {
        self.submitted_on.as_ref()
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    pub fn updated_at(&self) -> &DateTime<Utc> {
        &self.updated_at
    }

    /// Checks `update` against the stored state and returns the transaction as it will be
    /// persisted. Closing stamps `submitted_on` with `now`.
    pub fn apply(
        &self,
        update: &UpdateDeviceTransactionRequest,
        now: DateTime<Utc>,
    ) -> Result<Self, TransactionRuleError> {
        let mut next = self.clone();

        match update {
            UpdateDeviceTransactionRequest::DueDate(due_date) => {
                if *due_date <= self.due_date {
                    return Err(TransactionRuleError::DueDateNotExtended {
                        current: self.due_date,
                    });
                }
                next.due_date = *due_date;
            }
            UpdateDeviceTransactionRequest::Status(status) => {
                if !self.status.is_active() {
                    return Err(TransactionRuleError::AlreadyClosed { id: self.id });
                }
                next.status = *status;
                if *status == TransactionStatus::Closed {
                    next.submitted_on = Some(now);
                }
            }
        }

        next.updated_at = now;
        Ok(next)
    }

    /// Only closed transactions may be removed.
    pub fn ensure_deletable(&self) -> Result<(), TransactionRuleError> {
        if self.status.is_active() {
            Err(TransactionRuleError::NotClosed { id: self.id })
        } else {
            Ok(())
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum TransactionRuleError {
    #[error("due date can only be extended beyond {current}")]
    DueDateNotExtended { current: DateTime<Utc> },
    #[error("transaction {id} is already closed")]
    AlreadyClosed { id: TransactionId },
    #[error("transaction {id} is not yet closed")]
    NotClosed { id: TransactionId },
}

/// Data required by the domain to open a [DeviceTransaction].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateDeviceTransactionRequest {
    device_id: DeviceId,
    user_id: UserId,
    due_date: DateTime<Utc>,
}

impl CreateDeviceTransactionRequest {
    pub fn new(device_id: DeviceId, user_id: UserId, due_date: DateTime<Utc>) -> Self {
        Self {
            device_id,
            user_id,
            due_date,
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn due_date(&self) -> &DateTime<Utc> {
        &self.due_date
    }
}

/// A single change to a [DeviceTransaction]: either the due date moves or the status does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateDeviceTransactionRequest {
    DueDate(DateTime<Utc>),
    Status(TransactionStatus),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum UpdateFieldsError {
    #[error("dueDate and status cannot be updated together")]
    Both,
    #[error("either dueDate or status must be provided")]
    Neither,
}

impl UpdateDeviceTransactionRequest {
    pub fn new(
        due_date: Option<DateTime<Utc>>,
        status: Option<TransactionStatus>,
    ) -> Result<Self, UpdateFieldsError> {
        match (due_date, status) {
            (Some(due_date), None) => Ok(Self::DueDate(due_date)),
            (None, Some(status)) => Ok(Self::Status(status)),
            (Some(_), Some(_)) => Err(UpdateFieldsError::Both),
            (None, None) => Err(UpdateFieldsError::Neither),
        }
    }

    pub fn status(&self) -> Option<TransactionStatus> {
        match self {
            Self::Status(status) => Some(*status),
            Self::DueDate(_) => None,
        }
    }
}

/// Listing criteria for transactions. `statuses` match with OR, the other criteria with AND.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    device_id: Option<DeviceId>,
    user_id: Option<UserId>,
    statuses: Vec<TransactionStatus>,
}

impl TransactionFilter {
    pub fn new(
        device_id: Option<DeviceId>,
        user_id: Option<UserId>,
        statuses: Vec<TransactionStatus>,
    ) -> Self {
        Self {
            device_id,
            user_id,
            statuses,
        }
    }

    pub fn device_id(&self) -> Option<&DeviceId> {
        self.device_id.as_ref()
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn statuses(&self) -> &[TransactionStatus] {
        &self.statuses
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionSortField {
    IssuedOn,
    DueDate,
    SubmittedOn,
    Status,
    CreatedAt,
    UpdatedAt,
}

impl SortField for TransactionSortField {
    const DEFAULT: Self = TransactionSortField::CreatedAt;

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "issuedOn" => Some(TransactionSortField::IssuedOn),
            "dueDate" => Some(TransactionSortField::DueDate),
            "submittedOn" => Some(TransactionSortField::SubmittedOn),
            "status" => Some(TransactionSortField::Status),
            "createdAt" => Some(TransactionSortField::CreatedAt),
            "updatedAt" => Some(TransactionSortField::UpdatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum CreateDeviceTransactionError {
    #[error("device with id {id} not found")]
    DeviceNotFound { id: DeviceId },
    #[error("device {id} already booked")]
    DeviceAlreadyBooked { id: DeviceId },
    #[error("due date must be in the future")]
    DueDateNotInFuture,
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum GetDeviceTransactionError {
    #[error("device transaction with id {id} not found")]
    NotFound { id: TransactionId },
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct GetDeviceTransactionsError(#[from] anyhow::Error);

#[derive(Debug, Error)]
pub enum UpdateDeviceTransactionError {
    #[error("device transaction with id {id} not found")]
    NotFound { id: TransactionId },
    #[error(transparent)]
    Rule(#[from] TransactionRuleError),
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum DeleteDeviceTransactionError {
    #[error("device transaction with id {id} not found")]
    NotFound { id: TransactionId },
    #[error(transparent)]
    Rule(#[from] TransactionRuleError),
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}
