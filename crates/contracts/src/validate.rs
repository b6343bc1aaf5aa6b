//! Per-field validators for phone records.
//!
//! Each validator is a pure function from a raw value to its canonical form.
//! None of them touch the store; construction and update paths both go
//! through here so an invalid value never reaches a persisted row.

pub const ALLOWED_NETWORK_TECHNOLOGIES: [&str; 6] = ["GSM", "HSPA", "LTE", "3G", "4G", "5G"];

pub(crate) const MSG_SERIAL_NUMBER: &str =
    "Serial number must be exactly 11 alphanumeric characters.";
pub(crate) const MSG_IMEI: &str = "IMEI must be exactly 15 digits.";
pub(crate) const MSG_MODEL: &str = "Model must be alphanumeric and at least 2 characters long.";
pub(crate) const MSG_BRAND: &str =
    "Brand must contain only letters and be at least 2 characters long.";
pub(crate) const MSG_NETWORK_TECHNOLOGIES_EMPTY: &str =
    "Network technologies must be provided as a non-empty list.";
pub(crate) const MSG_NUMBER_OF_CAMERAS: &str =
    "Number of cameras must be an integer between 1 and 3.";
pub(crate) const MSG_NUMBER_OF_CORES: &str =
    "Number of cores must be an integer greater than or equal to 1.";
pub(crate) const MSG_WEIGHT: &str = "Weight must be a positive integer (in grams).";
pub(crate) const MSG_BATTERY_CAPACITY: &str =
    "Battery capacity must be a positive integer (in mAh).";
pub(crate) const MSG_COST: &str = "Cost must be a positive number (in euros).";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_serial_number(serial_number: &str) -> Result<String, ValidationError> {
    let ok = serial_number.len() == 11
        && serial_number.bytes().all(|b| b.is_ascii_alphanumeric());
    if !ok {
        return Err(ValidationError::new("serial_number", MSG_SERIAL_NUMBER));
    }
    Ok(serial_number.to_string())
}

pub fn validate_imei(imei: &str) -> Result<String, ValidationError> {
    let ok = imei.len() == 15 && imei.bytes().all(|b| b.is_ascii_digit());
    if !ok {
        return Err(ValidationError::new("imei", MSG_IMEI));
    }
    Ok(imei.to_string())
}

pub fn validate_model(model: &str) -> Result<String, ValidationError> {
    let ok = model.len() >= 2 && model.bytes().all(|b| b.is_ascii_alphanumeric());
    if !ok {
        return Err(ValidationError::new("model", MSG_MODEL));
    }
    Ok(model.to_string())
}

pub fn validate_brand(brand: &str) -> Result<String, ValidationError> {
    let ok = brand.len() >= 2 && brand.bytes().all(|b| b.is_ascii_alphabetic());
    if !ok {
        return Err(ValidationError::new("brand", MSG_BRAND));
    }
    Ok(brand.to_string())
}

/// Validates the technology list and joins it into the canonical
/// comma-delimited storage form. Input order is preserved and duplicates
/// are not rejected.
pub fn validate_network_technologies(
    technologies: &[String],
) -> Result<String, ValidationError> {
    if technologies.is_empty() {
        return Err(ValidationError::new(
            "network_technologies",
            MSG_NETWORK_TECHNOLOGIES_EMPTY,
        ));
    }
    let known = |tech: &str| ALLOWED_NETWORK_TECHNOLOGIES.contains(&tech);
    if !technologies.iter().all(|tech| known(tech)) {
        return Err(ValidationError::new(
            "network_technologies",
            network_vocabulary_message(),
        ));
    }
    Ok(technologies.join(","))
}

pub(crate) fn network_vocabulary_message() -> String {
    format!(
        "Network technologies must be among: {}.",
        ALLOWED_NETWORK_TECHNOLOGIES.join(", ")
    )
}

pub fn validate_number_of_cameras(number_of_cameras: i64) -> Result<i64, ValidationError> {
    if !(1..=3).contains(&number_of_cameras) {
        return Err(ValidationError::new(
            "number_of_cameras",
            MSG_NUMBER_OF_CAMERAS,
        ));
    }
    Ok(number_of_cameras)
}

pub fn validate_number_of_cores(number_of_cores: i64) -> Result<i64, ValidationError> {
    if number_of_cores < 1 {
        return Err(ValidationError::new("number_of_cores", MSG_NUMBER_OF_CORES));
    }
    Ok(number_of_cores)
}

pub fn validate_weight(weight: i64) -> Result<i64, ValidationError> {
    if weight <= 0 {
        return Err(ValidationError::new("weight", MSG_WEIGHT));
    }
    Ok(weight)
}

pub fn validate_battery_capacity(battery_capacity: i64) -> Result<i64, ValidationError> {
    if battery_capacity <= 0 {
        return Err(ValidationError::new("battery_capacity", MSG_BATTERY_CAPACITY));
    }
    Ok(battery_capacity)
}

pub fn validate_cost(cost: f64) -> Result<f64, ValidationError> {
    if !cost.is_finite() || cost <= 0.0 {
        return Err(ValidationError::new("cost", MSG_COST));
    }
    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_number_requires_exactly_eleven_alphanumerics() {
        assert!(validate_serial_number("ABC12345678").is_ok());
        assert!(validate_serial_number("ABC1234567").is_err());
        assert!(validate_serial_number("ABC123456789").is_err());
        assert!(validate_serial_number("ABC12345-78").is_err());
    }

    #[test]
    fn imei_requires_exactly_fifteen_digits() {
        assert!(validate_imei("123456789012345").is_ok());
        assert!(validate_imei("12345678901234").is_err());
        assert!(validate_imei("1234567890123456").is_err());
        assert!(validate_imei("12345678901234a").is_err());
    }

    #[test]
    fn model_and_brand_length_and_charset() {
        assert!(validate_model("S21").is_ok());
        assert!(validate_model("X").is_err());
        assert!(validate_model("S 21").is_err());

        assert!(validate_brand("Samsung").is_ok());
        assert!(validate_brand("S").is_err());
        assert!(validate_brand("Brand7").is_err());
    }

    #[test]
    fn network_technologies_join_preserves_order_and_duplicates() {
        let joined = validate_network_technologies(&[
            "5G".to_string(),
            "GSM".to_string(),
            "5G".to_string(),
        ])
        .expect("known technologies should validate");
        assert_eq!(joined, "5G,GSM,5G");
    }

    #[test]
    fn network_technologies_reject_empty_and_unknown() {
        let empty = validate_network_technologies(&[]).unwrap_err();
        assert_eq!(empty.message, MSG_NETWORK_TECHNOLOGIES_EMPTY);

        let unknown =
            validate_network_technologies(&["LTE".to_string(), "WIMAX".to_string()]).unwrap_err();
        assert!(unknown.message.contains("must be among"));
    }

    #[test]
    fn camera_count_boundaries() {
        assert!(validate_number_of_cameras(0).is_err());
        assert!(validate_number_of_cameras(1).is_ok());
        assert!(validate_number_of_cameras(2).is_ok());
        assert!(validate_number_of_cameras(3).is_ok());
        assert!(validate_number_of_cameras(4).is_err());
    }

    #[test]
    fn positive_integer_fields() {
        assert!(validate_number_of_cores(0).is_err());
        assert!(validate_number_of_cores(1).is_ok());
        assert!(validate_weight(0).is_err());
        assert!(validate_weight(180).is_ok());
        assert!(validate_battery_capacity(-1).is_err());
        assert!(validate_battery_capacity(4000).is_ok());
    }

    #[test]
    fn cost_must_be_positive_and_finite() {
        assert!(validate_cost(0.0).is_err());
        assert!(validate_cost(-10.0).is_err());
        assert!(validate_cost(f64::NAN).is_err());
        assert!(validate_cost(f64::INFINITY).is_err());
        assert!(validate_cost(0.01).is_ok());
        assert!(validate_cost(499.99).is_ok());
    }
}
