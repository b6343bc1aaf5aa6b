//! Persistence for phone records over a single `mobile_phones` table.
//!
//! [`PhoneStore`] is a cloneable handle around a SQLite pool. Uniqueness of
//! `serial_number` and `imei` is enforced by the table constraints, so a
//! race between two inserts of the same identity is decided atomically by
//! the engine at commit time. Writes run under a configurable timeout.

use std::time::Duration;

use phoneapi_contracts::{FieldValue, NewPhone, PhoneField, PhoneRecord};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};

const PHONE_COLUMNS: &str = "id, serial_number, imei, model, brand, network_technologies, \
     number_of_cameras, number_of_cores, weight, battery_capacity, cost";

#[derive(Debug)]
pub enum StoreError {
    Timeout,
    DuplicateSerialNumber,
    DuplicateImei,
    /// A unique constraint fired that named neither known column.
    DuplicateIdentity,
    NotFound,
    Sqlx(sqlx::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Timeout => write!(f, "store operation timed out"),
            StoreError::DuplicateSerialNumber => write!(f, "duplicate serial number"),
            StoreError::DuplicateImei => write!(f, "duplicate IMEI"),
            StoreError::DuplicateIdentity => write!(f, "duplicate identity field"),
            StoreError::NotFound => write!(f, "phone record not found"),
            StoreError::Sqlx(err) => write!(f, "store sql error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        StoreError::Sqlx(value)
    }
}

#[derive(Clone)]
pub struct PhoneStore {
    pool: SqlitePool,
    write_timeout: Duration,
}

impl PhoneStore {
    pub async fn connect(
        db_url: &str,
        max_connections: u32,
        write_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = tokio::time::timeout(
            Duration::from_secs(2),
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect(db_url),
        )
        .await
        .map_err(|_| StoreError::Timeout)??;

        Ok(Self {
            pool,
            write_timeout,
        })
    }

    pub async fn connect_and_migrate(
        db_url: &str,
        max_connections: u32,
        write_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let store = Self::connect(db_url, max_connections, write_timeout).await?;
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        tokio::time::timeout(Duration::from_secs(10), migrate(&self.pool))
            .await
            .map_err(|_| StoreError::Timeout)??;
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Inserts a validated record and returns it with the assigned id.
    pub async fn insert(&self, phone: &NewPhone) -> Result<PhoneRecord, StoreError> {
        let id = tokio::time::timeout(
            self.write_timeout,
            sqlx::query_scalar::<_, i64>(
                "INSERT INTO mobile_phones (serial_number, imei, model, brand, network_technologies, number_of_cameras, number_of_cores, weight, battery_capacity, cost) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
            )
            .bind(&phone.serial_number)
            .bind(&phone.imei)
            .bind(&phone.model)
            .bind(&phone.brand)
            .bind(&phone.network_technologies)
            .bind(phone.number_of_cameras)
            .bind(phone.number_of_cores)
            .bind(phone.weight)
            .bind(phone.battery_capacity)
            .bind(phone.cost)
            .fetch_one(&self.pool),
        )
        .await
        .map_err(|_| StoreError::Timeout)?
        .map_err(map_unique_violation)?;

        Ok(phone.clone().into_record(id))
    }

    pub async fn list_all(&self) -> Result<Vec<PhoneRecord>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {} FROM mobile_phones", PHONE_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        collect_records(rows)
    }

    pub async fn find_by_serial(&self, serial_number: &str) -> Result<PhoneRecord, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM mobile_phones WHERE serial_number = $1",
            PHONE_COLUMNS
        ))
        .bind(serial_number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row_to_record(&row)?),
            None => Err(StoreError::NotFound),
        }
    }

    /// Filters by one column with a deterministic ordering over
    /// (`brand`, `model`, `cost`, `id`). Every column matches by equality
    /// except `network_technologies`, which matches by substring
    /// containment against the canonical delimited string. A filter value
    /// that is a substring of a different technology's name will match
    /// rows carrying that technology too.
    pub async fn filter_by_field(
        &self,
        field: PhoneField,
        value: &FieldValue,
    ) -> Result<Vec<PhoneRecord>, StoreError> {
        let predicate = if field == PhoneField::NetworkTechnologies {
            "network_technologies LIKE $1".to_string()
        } else {
            format!("{} = $1", field.column())
        };
        let sql = format!(
            "SELECT {} FROM mobile_phones WHERE {} ORDER BY brand, model, cost, id",
            PHONE_COLUMNS, predicate
        );

        let rows = match value {
            FieldValue::Text(text) => {
                let bound = if field == PhoneField::NetworkTechnologies {
                    format!("%{}%", text)
                } else {
                    text.clone()
                };
                sqlx::query(&sql).bind(bound).fetch_all(&self.pool).await?
            }
            FieldValue::Int(int) => sqlx::query(&sql).bind(*int).fetch_all(&self.pool).await?,
            FieldValue::Real(real) => sqlx::query(&sql).bind(*real).fetch_all(&self.pool).await?,
        };

        collect_records(rows)
    }

    /// Persists the mutable columns of an already-staged record in one
    /// statement.
    pub async fn update(&self, record: &PhoneRecord) -> Result<(), StoreError> {
        let result = tokio::time::timeout(
            self.write_timeout,
            sqlx::query(
                "UPDATE mobile_phones SET network_technologies = $1, number_of_cameras = $2, number_of_cores = $3, weight = $4, battery_capacity = $5, cost = $6 WHERE serial_number = $7",
            )
            .bind(&record.network_technologies)
            .bind(record.number_of_cameras)
            .bind(record.number_of_cores)
            .bind(record.weight)
            .bind(record.battery_capacity)
            .bind(record.cost)
            .bind(&record.serial_number)
            .execute(&self.pool),
        )
        .await
        .map_err(|_| StoreError::Timeout)??;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub async fn delete(&self, serial_number: &str) -> Result<(), StoreError> {
        let result = tokio::time::timeout(
            self.write_timeout,
            sqlx::query("DELETE FROM mobile_phones WHERE serial_number = $1")
                .bind(serial_number)
                .execute(&self.pool),
        )
        .await
        .map_err(|_| StoreError::Timeout)??;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn map_unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.is_unique_violation()
    {
        let message = db_err.message();
        if message.contains("mobile_phones.serial_number") {
            return StoreError::DuplicateSerialNumber;
        }
        if message.contains("mobile_phones.imei") {
            return StoreError::DuplicateImei;
        }
        return StoreError::DuplicateIdentity;
    }
    StoreError::Sqlx(err)
}

fn collect_records(rows: Vec<SqliteRow>) -> Result<Vec<PhoneRecord>, StoreError> {
    let records = rows
        .iter()
        .map(row_to_record)
        .collect::<Result<Vec<_>, sqlx::Error>>()?;
    Ok(records)
}

fn row_to_record(row: &SqliteRow) -> Result<PhoneRecord, sqlx::Error> {
    Ok(PhoneRecord {
        id: row.try_get("id")?,
        serial_number: row.try_get("serial_number")?,
        imei: row.try_get("imei")?,
        model: row.try_get("model")?,
        brand: row.try_get("brand")?,
        network_technologies: row.try_get("network_technologies")?,
        number_of_cameras: row.try_get("number_of_cameras")?,
        number_of_cores: row.try_get("number_of_cores")?,
        weight: row.try_get("weight")?,
        battery_capacity: row.try_get("battery_capacity")?,
        cost: row.try_get("cost")?,
    })
}
