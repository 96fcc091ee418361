use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, SqliteConnection};

use crate::domain::device::models::device::{
    Category, CreateDeviceError, CreateDeviceRequest, DeleteDeviceError, Device, DeviceDetails,
    DeviceFilter, DeviceId, DeviceSortField, DeviceStatus, DeviceUuid, GetDeviceError,
    GetDevicesError, Manufacturer, ModelName, PictureUrl, SerialNumber, UpdateDeviceError,
    UpdateDeviceRequest, Variant,
};
use crate::domain::device::ports::DeviceRepository;
use crate::domain::pagination::{Page, PageRequest};
use crate::outbound::sqlite::{Sqlite, push_page, unique_constraint_violation};

#[derive(Debug, FromRow)]
struct DeviceRow {
    id: String,
    model_name: String,
    sr_no: String,
    uuid: String,
    variant: String,
    category: String,
    manufacturer: String,
    picture: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DeviceRow> for Device {
    type Error = anyhow::Error;

    fn try_from(row: DeviceRow) -> Result<Self, Self::Error> {
        let details = DeviceDetails::new(
            ModelName::new(&row.model_name)?,
            SerialNumber::new(&row.sr_no)?,
            DeviceUuid::new(&row.uuid)?,
            Variant::new(&row.variant)?,
            Category::new(&row.category)?,
            Manufacturer::new(&row.manufacturer)?,
            row.picture.as_deref().map(PictureUrl::new).transpose()?,
        );

        Ok(Device::new(
            DeviceId::new(&row.id)?,
            details,
            row.status.parse::<DeviceStatus>()?,
            row.created_at,
            row.updated_at,
        ))
    }
}

const SELECT_DEVICES: &str = "SELECT id, model_name, sr_no, uuid, variant, category, \
     manufacturer, picture, status, created_at, updated_at FROM devices";

#[derive(Clone, Copy)]
enum UniqueColumn {
    SerialNumber,
    Uuid,
}

impl UniqueColumn {
    /// Which column a unique violation reported by SQLite refers to.
    fn from_violation(message: &str) -> Option<Self> {
        if message.contains("devices.sr_no") {
            Some(UniqueColumn::SerialNumber)
        } else if message.contains("devices.uuid") {
            Some(UniqueColumn::Uuid)
        } else {
            None
        }
    }
}

fn sort_column(field: DeviceSortField) -> &'static str {
    match field {
        DeviceSortField::ModelName => "model_name",
        DeviceSortField::SerialNumber => "sr_no",
        DeviceSortField::Uuid => "uuid",
        DeviceSortField::Variant => "variant",
        DeviceSortField::Category => "category",
        DeviceSortField::Manufacturer => "manufacturer",
        DeviceSortField::Status => "status",
        DeviceSortField::CreatedAt => "created_at",
        DeviceSortField::UpdatedAt => "updated_at",
    }
}

fn push_filter(query_builder: &mut QueryBuilder<'_, sqlx::Sqlite>, filter: &DeviceFilter) {
    query_builder.push(" WHERE 1 = 1");

    // Case-insensitive substring match with the needle taken literally.
    if let Some(model_name) = filter.model_name() {
        query_builder
            .push(" AND instr(lower(model_name), lower(")
            .push_bind(model_name.to_string())
            .push(")) > 0");
    }
    if let Some(status) = filter.status() {
        query_builder.push(" AND status = ").push_bind(status.as_str());
    }
    match filter.issued() {
        Some(true) => {
            query_builder.push(" AND status != 'AVAILABLE'");
        }
        Some(false) => {
            query_builder.push(" AND status = 'AVAILABLE'");
        }
        None => {}
    }
}

impl Sqlite {
    async fn find_device(
        conn: &mut SqliteConnection,
        id: &DeviceId,
    ) -> Result<Option<Device>, anyhow::Error> {
        let row = QueryBuilder::<sqlx::Sqlite>::new(SELECT_DEVICES)
            .push(" WHERE id = ")
            .push_bind(id.to_string())
            .build_query_as::<DeviceRow>()
            .fetch_optional(conn)
            .await
            .with_context(|| format!("failed to fetch device {}", id))?;

        row.map(Device::try_from).transpose()
    }

    /// Whether a device other than `except` already holds `value` in `column`.
    async fn is_taken(
        conn: &mut SqliteConnection,
        column: UniqueColumn,
        value: &str,
        except: &DeviceId,
    ) -> Result<bool, anyhow::Error> {
        let query = match column {
            UniqueColumn::SerialNumber => {
                "SELECT EXISTS(SELECT 1 FROM devices WHERE sr_no = ? AND id != ?)"
            }
            UniqueColumn::Uuid => "SELECT EXISTS(SELECT 1 FROM devices WHERE uuid = ? AND id != ?)",
        };

        let exists = sqlx::query_scalar::<_, i64>(query)
            .bind(value)
            .bind(except.to_string())
            .fetch_one(conn)
            .await
            .context("failed to check device uniqueness")?;

        Ok(exists != 0)
    }
}

impl DeviceRepository for Sqlite {
    async fn create_device(&self, req: &CreateDeviceRequest) -> Result<Device, CreateDeviceError> {
        let id = DeviceId::generate();
        let now = Utc::now();
        let details = req.details();

        sqlx::query(
            "INSERT INTO devices (id, model_name, sr_no, uuid, variant, category, manufacturer, \
             picture, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(details.model_name().to_string())
        .bind(details.serial_number().to_string())
        .bind(details.uuid().to_string())
        .bind(details.variant().to_string())
        .bind(details.category().to_string())
        .bind(details.manufacturer().to_string())
        .bind(details.picture().map(ToString::to_string))
        .bind(DeviceStatus::Available.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            match unique_constraint_violation(&e).and_then(|m| UniqueColumn::from_violation(&m)) {
                Some(UniqueColumn::SerialNumber) => CreateDeviceError::DuplicateSerialNumber {
                    serial_number: details.serial_number().clone(),
                },
                Some(UniqueColumn::Uuid) => CreateDeviceError::DuplicateUuid {
                    uuid: details.uuid().clone(),
                },
                None => anyhow!(e)
                    .context(format!(
                        "failed to save device with serial number {}",
                        details.serial_number()
                    ))
                    .into(),
            }
        })?;

        Ok(Device::new(
            id,
            details.clone(),
            DeviceStatus::Available,
            now,
            now,
        ))
    }

    async fn get_devices(
        &self,
        filter: &DeviceFilter,
        page: &PageRequest<DeviceSortField>,
    ) -> Result<Page<Device>, GetDevicesError> {
        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM devices");
        push_filter(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .context("failed to count devices")?;

        let mut query = QueryBuilder::new(SELECT_DEVICES);
        push_filter(&mut query, filter);
        push_page(&mut query, page, sort_column);
        let rows = query
            .build_query_as::<DeviceRow>()
            .fetch_all(&self.pool)
            .await
            .context("failed to list devices")?;

        let devices = rows
            .into_iter()
            .map(Device::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(devices, page, u64::try_from(total).unwrap_or_default()))
    }

    async fn get_device_by_id(&self, id: &DeviceId) -> Result<Device, GetDeviceError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("failed to acquire SQLite connection")?;

        Self::find_device(&mut conn, id)
            .await?
            .ok_or(GetDeviceError::NotFound { id: *id })
    }

    async fn update_device_by_id(
        &self,
        id: &DeviceId,
        req: &UpdateDeviceRequest,
    ) -> Result<Device, UpdateDeviceError> {
        let mut tx = self.begin_write().await?;

        let current = Self::find_device(&mut tx, id)
            .await?
            .ok_or(UpdateDeviceError::NotFound { id: *id })?;

        if let Some(serial_number) = req.serial_number() {
            let taken =
                Self::is_taken(&mut tx, UniqueColumn::SerialNumber, &serial_number.to_string(), id)
                    .await?;
            if taken {
                return Err(UpdateDeviceError::DuplicateSerialNumber {
                    serial_number: serial_number.clone(),
                });
            }
        }
        if let Some(uuid) = req.uuid() {
            if Self::is_taken(&mut tx, UniqueColumn::Uuid, &uuid.to_string(), id).await? {
                return Err(UpdateDeviceError::DuplicateUuid { uuid: uuid.clone() });
            }
        }

        let details = current.details().merged(req);
        let status = req.status().unwrap_or(current.status());
        let now = Utc::now();

        sqlx::query(
            "UPDATE devices SET model_name = ?, sr_no = ?, uuid = ?, variant = ?, category = ?, \
             manufacturer = ?, picture = ?, status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(details.model_name().to_string())
        .bind(details.serial_number().to_string())
        .bind(details.uuid().to_string())
        .bind(details.variant().to_string())
        .bind(details.category().to_string())
        .bind(details.manufacturer().to_string())
        .bind(details.picture().map(ToString::to_string))
        .bind(status.as_str())
        .bind(now)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            match unique_constraint_violation(&e).and_then(|m| UniqueColumn::from_violation(&m)) {
                Some(UniqueColumn::SerialNumber) => UpdateDeviceError::DuplicateSerialNumber {
                    serial_number: details.serial_number().clone(),
                },
                Some(UniqueColumn::Uuid) => UpdateDeviceError::DuplicateUuid {
                    uuid: details.uuid().clone(),
                },
                None => anyhow!(e)
                    .context(format!("failed to update device {}", id))
                    .into(),
            }
        })?;

        tx.commit()
            .await
            .context("failed to commit SQLite transaction")?;

        Ok(Device::new(*id, details, status, *current.created_at(), now))
    }

    async fn delete_device_by_id(&self, id: &DeviceId) -> Result<(), DeleteDeviceError> {
        let result = sqlx::query("DELETE FROM devices WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete device {}", id))?;

        if result.rows_affected() == 0 {
            return Err(DeleteDeviceError::NotFound { id: *id });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(serial: &str, uuid: &str, model: &str) -> DeviceDetails {
        DeviceDetails::new(
            ModelName::new(model).unwrap(),
            SerialNumber::new(serial).unwrap(),
            DeviceUuid::new(uuid).unwrap(),
            Variant::new("256GB").unwrap(),
            Category::new("Tablet").unwrap(),
            Manufacturer::new("Apple").unwrap(),
            Some(PictureUrl::new("https://cdn.example.com/ipad.png").unwrap()),
        )
    }

    async fn create(sqlite: &Sqlite, serial: &str, uuid: &str, model: &str) -> Device {
        sqlite
            .create_device(&CreateDeviceRequest::new(details(serial, uuid, model)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let sqlite = Sqlite::in_memory().await.unwrap();

        let created = create(&sqlite, "SN1", "U1", "iPad Air").await;
        let fetched = sqlite.get_device_by_id(created.id()).await.unwrap();

        assert_eq!(created.status(), DeviceStatus::Available);
        assert_eq!(fetched.id(), created.id());
        assert_eq!(fetched.details(), created.details());
        assert_eq!(fetched.status(), DeviceStatus::Available);
    }

    #[tokio::test]
    async fn test_duplicate_serial_number_or_uuid() {
        let sqlite = Sqlite::in_memory().await.unwrap();
        create(&sqlite, "SN1", "U1", "iPad").await;

        let same_serial = sqlite
            .create_device(&CreateDeviceRequest::new(details("SN1", "U2", "iPad")))
            .await;
        assert!(matches!(
            same_serial,
            Err(CreateDeviceError::DuplicateSerialNumber { .. })
        ));

        let same_uuid = sqlite
            .create_device(&CreateDeviceRequest::new(details("SN2", "U1", "iPad")))
            .await;
        assert!(matches!(
            same_uuid,
            Err(CreateDeviceError::DuplicateUuid { .. })
        ));

        let all = sqlite
            .get_devices(&DeviceFilter::default(), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(all.total_results(), 1);
    }

    #[tokio::test]
    async fn test_update_rejects_values_of_other_devices() {
        let sqlite = Sqlite::in_memory().await.unwrap();
        let first = create(&sqlite, "SN1", "U1", "iPad").await;
        create(&sqlite, "SN2", "U2", "iPad").await;

        let steal_serial = UpdateDeviceRequest::default()
            .with_serial_number(SerialNumber::new("SN2").unwrap());
        assert!(matches!(
            sqlite.update_device_by_id(first.id(), &steal_serial).await,
            Err(UpdateDeviceError::DuplicateSerialNumber { .. })
        ));

        let steal_uuid = UpdateDeviceRequest::default().with_uuid(DeviceUuid::new("U2").unwrap());
        assert!(matches!(
            sqlite.update_device_by_id(first.id(), &steal_uuid).await,
            Err(UpdateDeviceError::DuplicateUuid { .. })
        ));

        let unchanged = sqlite.get_device_by_id(first.id()).await.unwrap();
        assert_eq!(unchanged.details().serial_number().to_string(), "SN1");
    }

    #[tokio::test]
    async fn test_update_may_keep_own_values() {
        let sqlite = Sqlite::in_memory().await.unwrap();
        let device = create(&sqlite, "SN1", "U1", "iPad").await;

        let req = UpdateDeviceRequest::default()
            .with_serial_number(SerialNumber::new("SN1").unwrap())
            .with_model_name(ModelName::new("iPad Pro").unwrap());
        let updated = sqlite.update_device_by_id(device.id(), &req).await.unwrap();

        assert_eq!(updated.details().model_name().to_string(), "iPad Pro");
        assert_eq!(updated.created_at(), device.created_at());
        assert_eq!(
            sqlite.get_device_by_id(device.id()).await.unwrap().details(),
            updated.details()
        );
    }

    #[tokio::test]
    async fn test_missing_device() {
        let sqlite = Sqlite::in_memory().await.unwrap();
        let id = DeviceId::generate();

        assert!(matches!(
            sqlite.get_device_by_id(&id).await,
            Err(GetDeviceError::NotFound { .. })
        ));
        assert!(matches!(
            sqlite
                .update_device_by_id(&id, &UpdateDeviceRequest::default())
                .await,
            Err(UpdateDeviceError::NotFound { .. })
        ));
        assert!(matches!(
            sqlite.delete_device_by_id(&id).await,
            Err(DeleteDeviceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_ignores_status() {
        let sqlite = Sqlite::in_memory().await.unwrap();
        let device = create(&sqlite, "SN1", "U1", "iPad").await;
        sqlite
            .update_device_by_id(
                device.id(),
                &UpdateDeviceRequest::default().with_status(DeviceStatus::Booked),
            )
            .await
            .unwrap();

        sqlite.delete_device_by_id(device.id()).await.unwrap();

        assert!(sqlite.get_device_by_id(device.id()).await.is_err());
    }

    #[tokio::test]
    async fn test_filter_sort_and_paginate() {
        let sqlite = Sqlite::in_memory().await.unwrap();
        let galaxy = create(&sqlite, "SN1", "U1", "Galaxy Tab").await;
        create(&sqlite, "SN2", "U2", "iPad Mini").await;
        create(&sqlite, "SN3", "U3", "iPad Air").await;
        sqlite
            .update_device_by_id(
                galaxy.id(),
                &UpdateDeviceRequest::default().with_status(DeviceStatus::Booked),
            )
            .await
            .unwrap();

        let ipads = DeviceFilter::new(Some("ipad".to_string()), None, None);
        let by_name = PageRequest::new(Some("modelName:desc"), Some(1), Some(2)).unwrap();
        let page = sqlite.get_devices(&ipads, &by_name).await.unwrap();
        assert_eq!(page.total_results(), 2);
        assert_eq!(page.total_pages(), 2);
        assert_eq!(page.page(), 2);
        assert_eq!(page.results().len(), 1);
        assert_eq!(page.results()[0].details().model_name().to_string(), "iPad Air");

        let issued = DeviceFilter::new(None, None, Some(true));
        let page = sqlite
            .get_devices(&issued, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_results(), 1);
        assert_eq!(page.results()[0].id(), galaxy.id());

        let available = DeviceFilter::new(None, Some(DeviceStatus::Available), None);
        let page = sqlite
            .get_devices(&available, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_results(), 2);
    }

    #[tokio::test]
    async fn test_model_name_filter_is_literal() {
        let sqlite = Sqlite::in_memory().await.unwrap();
        create(&sqlite, "SN1", "U1", "iPad Air").await;
        create(&sqlite, "SN2", "U2", "Pixel 8").await;

        for (needle, expected) in [("_", 0), ("%", 0), ("i_ad", 0), ("ad a", 1), ("PIXEL", 1)] {
            let filter = DeviceFilter::new(Some(needle.to_string()), None, None);
            let page = sqlite
                .get_devices(&filter, &PageRequest::default())
                .await
                .unwrap();
            assert_eq!(page.total_results(), expected, "modelName {}", needle);
        }
    }
}
