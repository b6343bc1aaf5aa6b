//! Static table of the `mobile_phones` columns.
//!
//! Update and filter requests name fields at runtime; this enum is the
//! closed set they are checked against, together with the per-field
//! coercion from raw path segments to typed values.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneField {
    Id,
    SerialNumber,
    Imei,
    Model,
    Brand,
    NetworkTechnologies,
    NumberOfCameras,
    NumberOfCores,
    Weight,
    BatteryCapacity,
    Cost,
}

impl PhoneField {
    pub const ALL: [PhoneField; 11] = [
        PhoneField::Id,
        PhoneField::SerialNumber,
        PhoneField::Imei,
        PhoneField::Model,
        PhoneField::Brand,
        PhoneField::NetworkTechnologies,
        PhoneField::NumberOfCameras,
        PhoneField::NumberOfCores,
        PhoneField::Weight,
        PhoneField::BatteryCapacity,
        PhoneField::Cost,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(PhoneField::Id),
            "serial_number" => Some(PhoneField::SerialNumber),
            "imei" => Some(PhoneField::Imei),
            "model" => Some(PhoneField::Model),
            "brand" => Some(PhoneField::Brand),
            "network_technologies" => Some(PhoneField::NetworkTechnologies),
            "number_of_cameras" => Some(PhoneField::NumberOfCameras),
            "number_of_cores" => Some(PhoneField::NumberOfCores),
            "weight" => Some(PhoneField::Weight),
            "battery_capacity" => Some(PhoneField::BatteryCapacity),
            "cost" => Some(PhoneField::Cost),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            PhoneField::Id => "id",
            PhoneField::SerialNumber => "serial_number",
            PhoneField::Imei => "imei",
            PhoneField::Model => "model",
            PhoneField::Brand => "brand",
            PhoneField::NetworkTechnologies => "network_technologies",
            PhoneField::NumberOfCameras => "number_of_cameras",
            PhoneField::NumberOfCores => "number_of_cores",
            PhoneField::Weight => "weight",
            PhoneField::BatteryCapacity => "battery_capacity",
            PhoneField::Cost => "cost",
        }
    }

    /// Write-once fields. `serial_number`, `imei`, `model` and `brand` are
    /// fixed at creation; `id` is assigned by the store and never
    /// client-writable.
    pub fn is_immutable(self) -> bool {
        matches!(
            self,
            PhoneField::Id
                | PhoneField::SerialNumber
                | PhoneField::Imei
                | PhoneField::Model
                | PhoneField::Brand
        )
    }

    pub fn expected_type(self) -> &'static str {
        match self {
            PhoneField::Id
            | PhoneField::NumberOfCameras
            | PhoneField::NumberOfCores
            | PhoneField::Weight
            | PhoneField::BatteryCapacity => "an integer",
            PhoneField::Cost => "a number",
            PhoneField::NetworkTechnologies => "a list of strings",
            PhoneField::SerialNumber
            | PhoneField::Imei
            | PhoneField::Model
            | PhoneField::Brand => "a string",
        }
    }

    /// Coerces a raw path segment (filter queries) to this field's typed
    /// value. Shares the type table with the update path.
    pub fn coerce_path(self, raw: &str) -> Result<FieldValue, CoercionError> {
        match self {
            PhoneField::Id
            | PhoneField::NumberOfCameras
            | PhoneField::NumberOfCores
            | PhoneField::Weight
            | PhoneField::BatteryCapacity => raw
                .parse::<i64>()
                .map(FieldValue::Int)
                .map_err(|_| self.coercion_error()),
            PhoneField::Cost => raw
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(FieldValue::Real)
                .ok_or_else(|| self.coercion_error()),
            PhoneField::SerialNumber
            | PhoneField::Imei
            | PhoneField::Model
            | PhoneField::Brand
            | PhoneField::NetworkTechnologies => Ok(FieldValue::Text(raw.to_string())),
        }
    }

    pub(crate) fn coercion_error(self) -> CoercionError {
        CoercionError {
            field: self.column(),
            expected: self.expected_type(),
        }
    }
}

/// A typed column value, produced by the coercion table and consumed by
/// the store's filter query.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Real(f64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionError {
    pub field: &'static str,
    pub expected: &'static str,
}

impl std::fmt::Display for CoercionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid type for field {}. Expected {}.",
            self.field, self.expected
        )
    }
}

impl std::error::Error for CoercionError {}
