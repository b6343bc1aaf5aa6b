//! Domain contracts for the phone inventory service.
//!
//! A record is only ever constructed through [`NewPhone::from_json`], which
//! runs every field validator in a fixed order, and only ever mutated
//! through [`PhoneRecord::apply_field`], which coerces and re-validates the
//! staged value. Both paths are pure; persistence lives in the store crate.

use serde_json::{Map, Value};

pub mod fields;
pub mod validate;

pub use fields::{CoercionError, FieldValue, PhoneField};
pub use validate::{
    ALLOWED_NETWORK_TECHNOLOGIES, ValidationError, validate_battery_capacity, validate_brand,
    validate_cost, validate_imei, validate_model, validate_network_technologies,
    validate_number_of_cameras, validate_number_of_cores, validate_serial_number, validate_weight,
};

use validate::{
    MSG_BATTERY_CAPACITY, MSG_BRAND, MSG_COST, MSG_IMEI, MSG_MODEL,
    MSG_NETWORK_TECHNOLOGIES_EMPTY, MSG_NUMBER_OF_CAMERAS, MSG_NUMBER_OF_CORES,
    MSG_SERIAL_NUMBER, MSG_WEIGHT, network_vocabulary_message,
};

/// A fully validated record that has not been persisted yet. The
/// `network_technologies` field holds the canonical comma-joined string.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPhone {
    pub serial_number: String,
    pub imei: String,
    pub model: String,
    pub brand: String,
    pub network_technologies: String,
    pub number_of_cameras: i64,
    pub number_of_cores: i64,
    pub weight: i64,
    pub battery_capacity: i64,
    pub cost: f64,
}

/// A persisted record, identical to [`NewPhone`] plus the store-assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct PhoneRecord {
    pub id: i64,
    pub serial_number: String,
    pub imei: String,
    pub model: String,
    pub brand: String,
    pub network_technologies: String,
    pub number_of_cameras: i64,
    pub number_of_cores: i64,
    pub weight: i64,
    pub battery_capacity: i64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateError {
    MissingField(&'static str),
    Validation(ValidationError),
}

impl std::fmt::Display for CreateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateError::MissingField(field) => {
                write!(f, "Missing required field: '{}'", field)
            }
            CreateError::Validation(err) => write!(f, "{}", err.message),
        }
    }
}

impl std::error::Error for CreateError {}

impl From<ValidationError> for CreateError {
    fn from(value: ValidationError) -> Self {
        CreateError::Validation(value)
    }
}

/// Why a single staged field of an update was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Immutable(&'static str),
    Coercion(CoercionError),
    Validation(ValidationError),
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldError::Immutable(field) => {
                write!(f, "Updating '{}' is not allowed.", field)
            }
            FieldError::Coercion(err) => write!(f, "{}", err),
            FieldError::Validation(err) => write!(f, "{}", err.message),
        }
    }
}

impl std::error::Error for FieldError {}

impl From<ValidationError> for FieldError {
    fn from(value: ValidationError) -> Self {
        FieldError::Validation(value)
    }
}

impl NewPhone {
    /// Builds a record from a raw JSON object, visiting the ten fields in
    /// the documented order and short-circuiting on the first failure. An
    /// absent key reports `MissingField`; a key of the wrong JSON shape
    /// reports that field's constraint message.
    pub fn from_json(body: &Map<String, Value>) -> Result<Self, CreateError> {
        let serial_number =
            validate_serial_number(string_input(body, PhoneField::SerialNumber, MSG_SERIAL_NUMBER)?)?;
        let imei = validate_imei(string_input(body, PhoneField::Imei, MSG_IMEI)?)?;
        let model = validate_model(string_input(body, PhoneField::Model, MSG_MODEL)?)?;
        let brand = validate_brand(string_input(body, PhoneField::Brand, MSG_BRAND)?)?;
        let network_technologies =
            validate_network_technologies(&list_input(body, PhoneField::NetworkTechnologies)?)?;
        let number_of_cameras = validate_number_of_cameras(int_input(
            body,
            PhoneField::NumberOfCameras,
            MSG_NUMBER_OF_CAMERAS,
        )?)?;
        let number_of_cores =
            validate_number_of_cores(int_input(body, PhoneField::NumberOfCores, MSG_NUMBER_OF_CORES)?)?;
        let weight = validate_weight(int_input(body, PhoneField::Weight, MSG_WEIGHT)?)?;
        let battery_capacity = validate_battery_capacity(int_input(
            body,
            PhoneField::BatteryCapacity,
            MSG_BATTERY_CAPACITY,
        )?)?;
        let cost = validate_cost(real_input(body, PhoneField::Cost, MSG_COST)?)?;

        Ok(Self {
            serial_number,
            imei,
            model,
            brand,
            network_technologies,
            number_of_cameras,
            number_of_cores,
            weight,
            battery_capacity,
            cost,
        })
    }

    pub fn into_record(self, id: i64) -> PhoneRecord {
        PhoneRecord {
            id,
            serial_number: self.serial_number,
            imei: self.imei,
            model: self.model,
            brand: self.brand,
            network_technologies: self.network_technologies,
            number_of_cameras: self.number_of_cameras,
            number_of_cores: self.number_of_cores,
            weight: self.weight,
            battery_capacity: self.battery_capacity,
            cost: self.cost,
        }
    }
}

impl PhoneRecord {
    /// Reconstructs the technology list from the canonical string, in the
    /// order supplied at creation.
    pub fn network_technology_list(&self) -> Vec<String> {
        self.network_technologies
            .split(',')
            .map(str::to_string)
            .collect()
    }

    /// Stages one field of a partial update onto this in-memory copy.
    /// Immutable fields are rejected outright; mutable fields are coerced
    /// through the shared type table and then re-validated, so an update
    /// can never persist a value creation would have refused.
    pub fn apply_field(&mut self, field: PhoneField, value: &Value) -> Result<(), FieldError> {
        match field {
            PhoneField::Id
            | PhoneField::SerialNumber
            | PhoneField::Imei
            | PhoneField::Model
            | PhoneField::Brand => Err(FieldError::Immutable(field.column())),
            PhoneField::NetworkTechnologies => {
                let technologies = coerce_list(field, value)?;
                self.network_technologies = validate_network_technologies(&technologies)?;
                Ok(())
            }
            PhoneField::NumberOfCameras => {
                self.number_of_cameras = validate_number_of_cameras(coerce_int(field, value)?)?;
                Ok(())
            }
            PhoneField::NumberOfCores => {
                self.number_of_cores = validate_number_of_cores(coerce_int(field, value)?)?;
                Ok(())
            }
            PhoneField::Weight => {
                self.weight = validate_weight(coerce_int(field, value)?)?;
                Ok(())
            }
            PhoneField::BatteryCapacity => {
                self.battery_capacity = validate_battery_capacity(coerce_int(field, value)?)?;
                Ok(())
            }
            PhoneField::Cost => {
                self.cost = validate_cost(coerce_real(field, value)?)?;
                Ok(())
            }
        }
    }
}

fn required<'a>(body: &'a Map<String, Value>, field: PhoneField) -> Result<&'a Value, CreateError> {
    body.get(field.column())
        .ok_or(CreateError::MissingField(field.column()))
}

fn string_input<'a>(
    body: &'a Map<String, Value>,
    field: PhoneField,
    message: &'static str,
) -> Result<&'a str, CreateError> {
    required(body, field)?
        .as_str()
        .ok_or_else(|| ValidationError::new(field.column(), message).into())
}

fn int_input(
    body: &Map<String, Value>,
    field: PhoneField,
    message: &'static str,
) -> Result<i64, CreateError> {
    required(body, field)?
        .as_i64()
        .ok_or_else(|| ValidationError::new(field.column(), message).into())
}

fn real_input(
    body: &Map<String, Value>,
    field: PhoneField,
    message: &'static str,
) -> Result<f64, CreateError> {
    required(body, field)?
        .as_f64()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ValidationError::new(field.column(), message).into())
}

fn list_input(body: &Map<String, Value>, field: PhoneField) -> Result<Vec<String>, CreateError> {
    let items = required(body, field)?.as_array().ok_or_else(|| {
        CreateError::from(ValidationError::new(
            field.column(),
            MSG_NETWORK_TECHNOLOGIES_EMPTY,
        ))
    })?;

    // A non-string element cannot be in the vocabulary, so it reports the
    // same message membership failures do.
    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                CreateError::from(ValidationError::new(
                    field.column(),
                    network_vocabulary_message(),
                ))
            })
        })
        .collect()
}

fn coerce_int(field: PhoneField, value: &Value) -> Result<i64, FieldError> {
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(raw) => raw.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| FieldError::Coercion(field.coercion_error()))
}

fn coerce_real(field: PhoneField, value: &Value) -> Result<f64, FieldError> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|parsed| parsed.is_finite())
        .ok_or_else(|| FieldError::Coercion(field.coercion_error()))
}

fn coerce_list(field: PhoneField, value: &Value) -> Result<Vec<String>, FieldError> {
    let items = value
        .as_array()
        .ok_or_else(|| FieldError::Coercion(field.coercion_error()))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| FieldError::Coercion(field.coercion_error()))
        })
        .collect()
}
