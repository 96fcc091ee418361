use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::pagination::SortField;

/// Represents always valid device identifier.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(Uuid);

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0} is not a valid device id")]
pub struct DeviceIdError(String);
impl DeviceId {
    pub fn new(raw_id: &str) -> Result<Self, DeviceIdError> {
        match Uuid::try_parse(raw_id) {
            Ok(uuid) => {
                if uuid.is_nil() {
                    Err(DeviceIdError(raw_id.to_string()))
                } else {
                    Ok(DeviceId(uuid))
                }
            }
            Err(_) => Err(DeviceIdError(raw_id.to_string())),
        }
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn into_inner(self) -> Uuid {
        self.0
    }
}

fn is_alphanumeric(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_alphabetic_with_spaces(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_alphabetic() || c == ' ')
}

/// Represents always valid model name: letters, digits and inner spaces.
#[derive(Display, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelName(String);

#[derive(Clone, Debug, Error, PartialEq)]
#[error("model name should contain only letters, digits and spaces")]
pub struct ModelNameInvalidError;
impl ModelName {
    pub fn new(raw_name: &str) -> Result<Self, ModelNameInvalidError> {
        let trimmed = raw_name.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ') {
            Err(ModelNameInvalidError)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

/// Represents always valid serial number.
#[derive(Display, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SerialNumber(String);

#[derive(Clone, Debug, Error, PartialEq)]
#[error("serial number should be alphanumeric")]
pub struct SerialNumberInvalidError;
impl SerialNumber {
    pub fn new(raw_serial: &str) -> Result<Self, SerialNumberInvalidError> {
        let trimmed = raw_serial.trim();
        if trimmed.is_empty() || !is_alphanumeric(trimmed) {
            Err(SerialNumberInvalidError)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

/// Represents always valid hardware UUID as printed on the device. Not the record identity.
#[derive(Display, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeviceUuid(String);

#[derive(Clone, Debug, Error, PartialEq)]
#[error("UUID should be alphanumeric")]
pub struct DeviceUuidInvalidError;
impl DeviceUuid {
    pub fn new(raw_uuid: &str) -> Result<Self, DeviceUuidInvalidError> {
        let trimmed = raw_uuid.trim();
        if trimmed.is_empty() || !is_alphanumeric(trimmed) {
            Err(DeviceUuidInvalidError)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

/// Represents always valid device variant.
#[derive(Display, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Variant(String);

#[derive(Clone, Debug, Error, PartialEq)]
#[error("variant should be alphanumeric")]
pub struct VariantInvalidError;
impl Variant {
    pub fn new(raw_variant: &str) -> Result<Self, VariantInvalidError> {
        let trimmed = raw_variant.trim();
        if trimmed.is_empty() || !is_alphanumeric(trimmed) {
            Err(VariantInvalidError)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

/// Represents always valid device category.
#[derive(Display, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Category(String);

#[derive(Clone, Debug, Error, PartialEq)]
#[error("category should contain only letters")]
pub struct CategoryInvalidError;
impl Category {
    pub fn new(raw_category: &str) -> Result<Self, CategoryInvalidError> {
        let trimmed = raw_category.trim();
        if trimmed.is_empty() || !is_alphabetic_with_spaces(trimmed) {
            Err(CategoryInvalidError)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

/// Represents always valid manufacturer name.
#[derive(Display, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Manufacturer(String);

#[derive(Clone, Debug, Error, PartialEq)]
#[error("manufacturer name should contain only letters")]
pub struct ManufacturerInvalidError;
impl Manufacturer {
    pub fn new(raw_manufacturer: &str) -> Result<Self, ManufacturerInvalidError> {
        let trimmed = raw_manufacturer.trim();
        if trimmed.is_empty() || !is_alphabetic_with_spaces(trimmed) {
            Err(ManufacturerInvalidError)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

/// Represents always valid absolute http(s) picture URL.
#[derive(Display, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PictureUrl(String);

#[derive(Clone, Debug, Error, PartialEq)]
#[error("{0} is not a valid picture URL")]
pub struct PictureUrlInvalidError(String);
impl PictureUrl {
    pub fn new(raw_url: &str) -> Result<Self, PictureUrlInvalidError> {
        let trimmed = raw_url.trim();
        let rest = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .ok_or_else(|| PictureUrlInvalidError(raw_url.to_string()))?;

        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let host_is_valid = !host.is_empty()
            && host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'));

        if !host_is_valid || trimmed.chars().any(char::is_whitespace) {
            Err(PictureUrlInvalidError(raw_url.to_string()))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

/// Availability of a device. Only the booking flow is expected to move a device out of
/// [DeviceStatus::Available].
#[derive(Display, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceStatus {
    #[display("AVAILABLE")]
    Available,
    #[display("BOOKING_PENDING")]
    BookingPending,
    #[display("BOOKED")]
    Booked,
    #[display("SUBMISSION_PENDING")]
    SubmissionPending,
}

#[derive(Clone, Debug, Error, PartialEq)]
#[error("{0} is not a valid device status")]
pub struct DeviceStatusInvalidError(String);

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Available => "AVAILABLE",
            DeviceStatus::BookingPending => "BOOKING_PENDING",
            DeviceStatus::Booked => "BOOKED",
            DeviceStatus::SubmissionPending => "SUBMISSION_PENDING",
        }
    }

    /// The two-state view older clients know as `isIssued`.
    pub fn is_issued(&self) -> bool {
        *self != DeviceStatus::Available
    }
}

impl FromStr for DeviceStatus {
    type Err = DeviceStatusInvalidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(DeviceStatus::Available),
            "BOOKING_PENDING" => Ok(DeviceStatus::BookingPending),
            "BOOKED" => Ok(DeviceStatus::Booked),
            "SUBMISSION_PENDING" => Ok(DeviceStatus::SubmissionPending),
            _ => Err(DeviceStatusInvalidError(s.to_string())),
        }
    }
}

/// Descriptive attributes of a device, everything except identity, status and timestamps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceDetails {
    model_name: ModelName,
    serial_number: SerialNumber,
    uuid: DeviceUuid,
    variant: Variant,
    category: Category,
    manufacturer: Manufacturer,
    picture: Option<PictureUrl>,
}

impl DeviceDetails {
    pub fn new(
        model_name: ModelName,
        serial_number: SerialNumber,
        uuid: DeviceUuid,
        variant: Variant,
        category: Category,
        manufacturer: Manufacturer,
        picture: Option<PictureUrl>,
    ) -> Self {
        Self {
            model_name,
            serial_number,
            uuid,
            variant,
            category,
            manufacturer,
            picture,
        }
    }

    pub fn model_name(&self) -> &ModelName {
        &self.model_name
    }

    pub fn serial_number(&self) -> &SerialNumber {
        &self.serial_number
    }

    pub fn uuid(&self) -> &DeviceUuid {
        &self.uuid
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn manufacturer(&self) -> &Manufacturer {
        &self.manufacturer
    }

    pub fn picture(&self) -> Option<&PictureUrl> {
        self.picture.as_ref()
    }

    /// Returns a copy with every field present in `req` overwritten.
    pub fn merged(&self, req: &UpdateDeviceRequest) -> Self {
        Self {
            model_name: req.model_name.clone().unwrap_or_else(|| self.model_name.clone()),
            serial_number: req
                .serial_number
                .clone()
                .unwrap_or_else(|| self.serial_number.clone()),
            uuid: req.uuid.clone().unwrap_or_else(|| self.uuid.clone()),
            variant: req.variant.clone().unwrap_or_else(|| self.variant.clone()),
            category: req.category.clone().unwrap_or_else(|| self.category.clone()),
            manufacturer: req
                .manufacturer
                .clone()
                .unwrap_or_else(|| self.manufacturer.clone()),
            picture: match &req.picture {
                Some(picture) => picture.clone(),
                None => self.picture.clone(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
    id: DeviceId,
    details: DeviceDetails,
    status: DeviceStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Device {
    pub fn new(
        id: DeviceId,
        details: DeviceDetails,
        status: DeviceStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            details,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    pub fn details(&self) -> &DeviceDetails {
        &self.details
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    pub fn updated_at(&self) -> &DateTime<Utc> {
        &self.updated_at
    }
}

/// Data required by the domain to create a [Device]. New devices always start
/// [DeviceStatus::Available].
#[derive(Clone, Debug, PartialEq, Eq, From)]
pub struct CreateDeviceRequest {
    details: DeviceDetails,
}

impl CreateDeviceRequest {
    pub fn new(details: DeviceDetails) -> Self {
        Self { details }
    }

    pub fn details(&self) -> &DeviceDetails {
        &self.details
    }
}

/// Partial update of a [Device]. Absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateDeviceRequest {
    model_name: Option<ModelName>,
    serial_number: Option<SerialNumber>,
    uuid: Option<DeviceUuid>,
    variant: Option<Variant>,
    category: Option<Category>,
    manufacturer: Option<Manufacturer>,
    /// `Some(None)` removes the picture.
    picture: Option<Option<PictureUrl>>,
    status: Option<DeviceStatus>,
}

impl UpdateDeviceRequest {
    pub fn with_model_name(mut self, model_name: ModelName) -> Self {
        self.model_name = Some(model_name);
        self
    }

    pub fn with_serial_number(mut self, serial_number: SerialNumber) -> Self {
        self.serial_number = Some(serial_number);
        self
    }

    pub fn with_uuid(mut self, uuid: DeviceUuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = Some(variant);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: Manufacturer) -> Self {
        self.manufacturer = Some(manufacturer);
        self
    }

    pub fn with_picture(mut self, picture: PictureUrl) -> Self {
        self.picture = Some(Some(picture));
        self
    }

    pub fn without_picture(mut self) -> Self {
        self.picture = Some(None);
        self
    }

    pub fn with_status(mut self, status: DeviceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn serial_number(&self) -> Option<&SerialNumber> {
        self.serial_number.as_ref()
    }

    pub fn uuid(&self) -> Option<&DeviceUuid> {
        self.uuid.as_ref()
    }

    pub fn status(&self) -> Option<DeviceStatus> {
        self.status
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Listing criteria for devices. All present criteria must match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    model_name: Option<String>,
    status: Option<DeviceStatus>,
    issued: Option<bool>,
}

impl DeviceFilter {
    pub fn new(model_name: Option<String>, status: Option<DeviceStatus>, issued: Option<bool>) -> Self {
        Self {
            model_name: model_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            status,
            issued,
        }
    }

    /// Case-insensitive substring of the model name.
    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    pub fn status(&self) -> Option<DeviceStatus> {
        self.status
    }

    pub fn issued(&self) -> Option<bool> {
        self.issued
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceSortField {
    ModelName,
    SerialNumber,
    Uuid,
    Variant,
    Category,
    Manufacturer,
    Status,
    CreatedAt,
    UpdatedAt,
}

impl SortField for DeviceSortField {
    const DEFAULT: Self = DeviceSortField::CreatedAt;

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "modelName" | "modalName" => Some(DeviceSortField::ModelName),
            "srNo" => Some(DeviceSortField::SerialNumber),
            "uuid" => Some(DeviceSortField::Uuid),
            "variant" => Some(DeviceSortField::Variant),
            "category" => Some(DeviceSortField::Category),
            "manufacturer" => Some(DeviceSortField::Manufacturer),
            "status" => Some(DeviceSortField::Status),
            "createdAt" => Some(DeviceSortField::CreatedAt),
            "updatedAt" => Some(DeviceSortField::UpdatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum CreateDeviceError {
    #[error("serial number {serial_number} already taken")]
    DuplicateSerialNumber { serial_number: SerialNumber },
    #[error("UUID {uuid} already taken")]
    DuplicateUuid { uuid: DeviceUuid },
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum GetDeviceError {
    #[error("device with id {id} not found")]
    NotFound { id: DeviceId },
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct GetDevicesError(#[from] anyhow::Error);

#[derive(Debug, Error)]
pub enum UpdateDeviceError {
    #[error("device with id {id} not found")]
    NotFound { id: DeviceId },
    #[error("serial number {serial_number} already taken")]
    DuplicateSerialNumber { serial_number: SerialNumber },
    #[error("UUID {uuid} already taken")]
    DuplicateUuid { uuid: DeviceUuid },
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum DeleteDeviceError {
    #[error("device with id {id} not found")]
    NotFound { id: DeviceId },
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}


#[cfg(test)]
mod device_details_tests {
    use super::*;

    fn details() -> DeviceDetails {
        DeviceDetails::new(
            ModelName::new("iPhone 15").unwrap(),
            SerialNumber::new("SN001").unwrap(),
            DeviceUuid::new("UUID001").unwrap(),
            Variant::new("128GB").unwrap(),
            Category::new("Mobile").unwrap(),
            Manufacturer::new("Apple").unwrap(),
            None,
        )
    }

    #[test]
    fn test_values_are_trimmed() {
        let result = SerialNumber::new("  SN001 ");
        let expected = Ok(SerialNumber("SN001".to_string()));

        assert_eq!(result, expected);
    }

    #[test]
    fn test_serial_number_must_be_alphanumeric() {
        assert_eq!(SerialNumber::new("SN-001"), Err(SerialNumberInvalidError));
        assert_eq!(SerialNumber::new("   "), Err(SerialNumberInvalidError));
        assert_eq!(DeviceUuid::new("a b"), Err(DeviceUuidInvalidError));
        assert_eq!(Variant::new("64/128"), Err(VariantInvalidError));
    }

    #[test]
    fn test_category_and_manufacturer_allow_spaces_only() {
        assert!(Category::new("Smart Watch").is_ok());
        assert_eq!(Category::new("Tablet2"), Err(CategoryInvalidError));
        assert!(Manufacturer::new("Google LLC").is_ok());
        assert_eq!(Manufacturer::new("H&M"), Err(ManufacturerInvalidError));
    }

    #[test]
    fn test_model_name_allows_digits_and_spaces() {
        assert!(ModelName::new("Galaxy S23 Ultra").is_ok());
        assert_eq!(ModelName::new("Pixel_8"), Err(ModelNameInvalidError));
    }

    #[test]
    fn test_picture_url() {
        assert!(PictureUrl::new("https://cdn.example.com/devices/1.png").is_ok());
        assert!(PictureUrl::new("http://localhost:8080/a.png").is_ok());
        assert!(PictureUrl::new("ftp://example.com/a.png").is_err());
        assert!(PictureUrl::new("https:///a.png").is_err());
        assert!(PictureUrl::new("https://exa mple.com").is_err());
    }

    #[test]
    fn test_status_round_trips_through_its_name() {
        for status in [
            DeviceStatus::Available,
            DeviceStatus::BookingPending,
            DeviceStatus::Booked,
            DeviceStatus::SubmissionPending,
        ] {
            assert_eq!(status.as_str().parse::<DeviceStatus>(), Ok(status));
            assert_eq!(status.to_string(), status.as_str());
        }
        assert!("ISSUED".parse::<DeviceStatus>().is_err());
    }

    #[test]
    fn test_only_available_is_not_issued() {
        assert!(!DeviceStatus::Available.is_issued());
        assert!(DeviceStatus::BookingPending.is_issued());
        assert!(DeviceStatus::Booked.is_issued());
        assert!(DeviceStatus::SubmissionPending.is_issued());
    }

    #[test]
    fn test_merged_overwrites_present_fields_only() {
        let original = details();
        let req = UpdateDeviceRequest::default()
            .with_serial_number(SerialNumber::new("SN999").unwrap())
            .with_picture(PictureUrl::new("https://example.com/p.png").unwrap());

        let merged = original.merged(&req);

        assert_eq!(merged.serial_number(), &SerialNumber::new("SN999").unwrap());
        assert_eq!(merged.uuid(), original.uuid());
        assert_eq!(merged.model_name(), original.model_name());
        assert_eq!(
            merged.picture(),
            Some(&PictureUrl::new("https://example.com/p.png").unwrap())
        );
    }

    #[test]
    fn test_merged_removes_picture() {
        let original = details().merged(
            &UpdateDeviceRequest::default()
                .with_picture(PictureUrl::new("https://example.com/p.png").unwrap()),
        );
        assert!(original.picture().is_some());

        let merged = original.merged(&UpdateDeviceRequest::default().without_picture());

        assert_eq!(merged.picture(), None);
        assert_eq!(merged.serial_number(), original.serial_number());
        assert!(!UpdateDeviceRequest::default().without_picture().is_empty());
    }

    #[test]
    fn test_empty_update() {
        assert!(UpdateDeviceRequest::default().is_empty());
        assert!(
            !UpdateDeviceRequest::default()
                .with_status(DeviceStatus::Booked)
                .is_empty()
        );
    }
}
