use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use phoneapi_contracts::{CreateError, FieldError, NewPhone, PhoneField, PhoneRecord};
use phoneapi_store::{PhoneStore, StoreError};
use serde::Serialize;
use tracing::Instrument;

use crate::config::{ServerConfig, StartupError};

#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    store: PhoneStore,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub async fn router(config: ServerConfig) -> Result<Router, StartupError> {
    let store = PhoneStore::connect_and_migrate(
        &config.db_url,
        config.store_max_connections,
        Duration::from_millis(config.store_write_timeout_ms),
    )
    .await
    .map_err(|err| StartupError {
        code: "ERR_DB_UNAVAILABLE",
        message: format!("failed to initialize phone store: {}", err),
    })?;

    let state = AppState { config, store };

    Ok(Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/add_phone", post(add_phone))
        .route("/phones", get(list_phones))
        .route("/phone/", get(list_phones))
        .route("/phone/{serial_number}", get(get_phone))
        .route("/update_phone/{serial_number}", put(update_phone))
        .route("/delete_phone/{serial_number}", delete(delete_phone))
        .route("/phones/{field}/{value}", get(filter_phones))
        .with_state(state))
}

async fn index() -> &'static str {
    "Welcome to the Phone API!"
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct ReadyzResponse {
    status: &'static str,
    checks: BTreeMap<&'static str, bool>,
}

async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let mut checks = BTreeMap::new();
    checks.insert("store", state.store.ping().await.is_ok());

    let all_ready = checks.values().all(|ok| *ok);
    let status = if all_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadyzResponse {
            status: if all_ready { "ready" } else { "not_ready" },
            checks,
        }),
    )
}

async fn metrics() -> impl IntoResponse {
    match crate::metrics::render() {
        Ok((body, content_type)) => {
            let mut headers = HeaderMap::new();
            if let Ok(value) = HeaderValue::from_str(content_type.as_str()) {
                headers.insert(header::CONTENT_TYPE, value);
            }
            (headers, body).into_response()
        }
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

#[derive(Debug, Serialize)]
struct PhoneResponse {
    id: i64,
    serial_number: String,
    imei: String,
    model: String,
    brand: String,
    network_technologies: Vec<String>,
    number_of_cameras: i64,
    number_of_cores: i64,
    weight: i64,
    battery_capacity: i64,
    cost: f64,
}

impl From<&PhoneRecord> for PhoneResponse {
    fn from(record: &PhoneRecord) -> Self {
        Self {
            id: record.id,
            serial_number: record.serial_number.clone(),
            imei: record.imei.clone(),
            model: record.model.clone(),
            brand: record.brand.clone(),
            network_technologies: record.network_technology_list(),
            number_of_cameras: record.number_of_cameras,
            number_of_cores: record.number_of_cores,
            weight: record.weight,
            battery_capacity: record.battery_capacity,
            cost: record.cost,
        }
    }
}

async fn add_phone(
    State(state): State<AppState>,
    req: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<PhoneResponse>), ApiError> {
    let started = Instant::now();
    let span = tracing::info_span!(
        "phone.create",
        serial_number = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
        outcome = tracing::field::Empty,
    );

    let result = async {
        let Json(body) = req.map_err(|_| invalid_json_response())?;
        let Some(body) = body.as_object() else {
            return Err(invalid_json_response());
        };

        let phone = NewPhone::from_json(body).map_err(create_error_response)?;
        tracing::Span::current().record("serial_number", phone.serial_number.as_str());

        let record = state
            .store
            .insert(&phone)
            .await
            .map_err(|err| store_failure_response("create", err))?;

        let latency_ms = started.elapsed().as_millis() as u64;
        tracing::Span::current().record("latency_ms", latency_ms);
        tracing::Span::current().record("outcome", "ok");

        Ok((StatusCode::CREATED, Json(PhoneResponse::from(&record))))
    }
    .instrument(span)
    .await;

    let status = match &result {
        Ok((status, _)) => *status,
        Err((status, _)) => *status,
    };
    crate::metrics::observe_http_request("/add_phone", "POST", status.as_u16(), started.elapsed());
    crate::metrics::observe_record_write("create", outcome_label(result.is_ok()));
    result
}

async fn list_phones(
    State(state): State<AppState>,
) -> Result<Json<Vec<PhoneResponse>>, ApiError> {
    let started = Instant::now();
    let result = state
        .store
        .list_all()
        .await
        .map(|records| Json(records.iter().map(PhoneResponse::from).collect::<Vec<_>>()))
        .map_err(|err| store_failure_response("list", err));

    crate::metrics::observe_http_request(
        "/phones",
        "GET",
        response_status(&result, StatusCode::OK).as_u16(),
        started.elapsed(),
    );
    result
}

async fn get_phone(
    State(state): State<AppState>,
    Path(serial_number): Path<String>,
) -> Result<Json<PhoneResponse>, ApiError> {
    let started = Instant::now();
    let result = match state.store.find_by_serial(&serial_number).await {
        Ok(record) => Ok(Json(PhoneResponse::from(&record))),
        Err(StoreError::NotFound) => Err(not_found_response(&serial_number)),
        Err(err) => Err(store_failure_response("fetch", err)),
    };

    crate::metrics::observe_http_request(
        "/phone/{serial_number}",
        "GET",
        response_status(&result, StatusCode::OK).as_u16(),
        started.elapsed(),
    );
    result
}

async fn update_phone(
    State(state): State<AppState>,
    Path(serial_number): Path<String>,
    req: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<PhoneResponse>, ApiError> {
    let started = Instant::now();
    let span = tracing::info_span!(
        "phone.update",
        serial_number = %serial_number,
        latency_ms = tracing::field::Empty,
        outcome = tracing::field::Empty,
    );

    let result = async {
        let Json(body) = req.map_err(|_| invalid_json_response())?;
        let Some(fields) = body.as_object() else {
            return Err(invalid_json_response());
        };

        let mut staged = match state.store.find_by_serial(&serial_number).await {
            Ok(record) => record,
            Err(StoreError::NotFound) => return Err(not_found_response(&serial_number)),
            Err(err) => return Err(store_failure_response("update", err)),
        };

        // Fields are staged in payload order; the first rejected field
        // aborts the whole update before anything reaches the store.
        for (name, value) in fields {
            let Some(field) = PhoneField::from_name(name) else {
                return Err(json_error(
                    StatusCode::BAD_REQUEST,
                    "ERR_INVALID_FIELD",
                    format!("Invalid field: {}", name),
                ));
            };
            staged
                .apply_field(field, value)
                .map_err(field_error_response)?;
        }

        match state.store.update(&staged).await {
            Ok(()) => {}
            Err(StoreError::NotFound) => return Err(not_found_response(&serial_number)),
            Err(err) => return Err(store_failure_response("update", err)),
        }

        let latency_ms = started.elapsed().as_millis() as u64;
        tracing::Span::current().record("latency_ms", latency_ms);
        tracing::Span::current().record("outcome", "ok");

        Ok(Json(PhoneResponse::from(&staged)))
    }
    .instrument(span)
    .await;

    crate::metrics::observe_http_request(
        "/update_phone/{serial_number}",
        "PUT",
        response_status(&result, StatusCode::OK).as_u16(),
        started.elapsed(),
    );
    crate::metrics::observe_record_write("update", outcome_label(result.is_ok()));
    result
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    message: &'static str,
}

async fn delete_phone(
    State(state): State<AppState>,
    Path(serial_number): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let started = Instant::now();
    let span = tracing::info_span!(
        "phone.delete",
        serial_number = %serial_number,
        outcome = tracing::field::Empty,
    );

    let result = async {
        match state.store.delete(&serial_number).await {
            Ok(()) => {
                tracing::Span::current().record("outcome", "ok");
                Ok(Json(DeleteResponse {
                    message: "Phone deleted successfully",
                }))
            }
            Err(StoreError::NotFound) => Err(not_found_response(&serial_number)),
            Err(err) => Err(store_failure_response("delete", err)),
        }
    }
    .instrument(span)
    .await;

    crate::metrics::observe_http_request(
        "/delete_phone/{serial_number}",
        "DELETE",
        response_status(&result, StatusCode::OK).as_u16(),
        started.elapsed(),
    );
    crate::metrics::observe_record_write("delete", outcome_label(result.is_ok()));
    result
}

async fn filter_phones(
    State(state): State<AppState>,
    Path((field_name, raw_value)): Path<(String, String)>,
) -> Result<Json<Vec<PhoneResponse>>, ApiError> {
    let started = Instant::now();
    let result = async {
        let Some(field) = PhoneField::from_name(&field_name) else {
            return Err(json_error(
                StatusCode::BAD_REQUEST,
                "ERR_INVALID_FIELD",
                "Invalid field",
            ));
        };

        let value = field.coerce_path(&raw_value).map_err(|err| {
            json_error(StatusCode::BAD_REQUEST, "ERR_INVALID_TYPE", err.to_string())
        })?;

        let records = state
            .store
            .filter_by_field(field, &value)
            .await
            .map_err(|err| store_failure_response("filter", err))?;

        Ok(Json(
            records.iter().map(PhoneResponse::from).collect::<Vec<_>>(),
        ))
    }
    .await;

    crate::metrics::observe_http_request(
        "/phones/{field}/{value}",
        "GET",
        response_status(&result, StatusCode::OK).as_u16(),
        started.elapsed(),
    );
    result
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

fn json_error(
    status: StatusCode,
    code: impl Into<String>,
    message: impl Into<String>,
) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            code: code.into(),
            message: message.into(),
        }),
    )
}

fn invalid_json_response() -> ApiError {
    json_error(
        StatusCode::BAD_REQUEST,
        "ERR_INVALID_PARAMS",
        "invalid JSON body",
    )
}

fn create_error_response(err: CreateError) -> ApiError {
    let code = match &err {
        CreateError::MissingField(_) => "ERR_MISSING_FIELD",
        CreateError::Validation(_) => "ERR_VALIDATION",
    };
    json_error(StatusCode::BAD_REQUEST, code, err.to_string())
}

fn field_error_response(err: FieldError) -> ApiError {
    let code = match &err {
        FieldError::Immutable(_) => "ERR_IMMUTABLE_FIELD",
        FieldError::Coercion(_) => "ERR_INVALID_TYPE",
        FieldError::Validation(_) => "ERR_VALIDATION",
    };
    json_error(StatusCode::BAD_REQUEST, code, err.to_string())
}

fn not_found_response(serial_number: &str) -> ApiError {
    json_error(
        StatusCode::NOT_FOUND,
        "ERR_NOT_FOUND",
        format!("No phone found with serial number '{}'.", serial_number),
    )
}

fn store_failure_response(context: &'static str, err: StoreError) -> ApiError {
    match err {
        StoreError::DuplicateSerialNumber => json_error(
            StatusCode::BAD_REQUEST,
            "ERR_DUPLICATE_SERIAL_NUMBER",
            "A phone with this serial number already exists.",
        ),
        StoreError::DuplicateImei => json_error(
            StatusCode::BAD_REQUEST,
            "ERR_DUPLICATE_IMEI",
            "A phone with this IMEI already exists.",
        ),
        StoreError::DuplicateIdentity => json_error(
            StatusCode::BAD_REQUEST,
            "ERR_DUPLICATE_IDENTITY",
            "A phone with these identity fields already exists.",
        ),
        StoreError::NotFound => json_error(
            StatusCode::NOT_FOUND,
            "ERR_NOT_FOUND",
            "Phone record not found.",
        ),
        StoreError::Timeout | StoreError::Sqlx(_) => {
            tracing::error!(error = %err, context, "phone store failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "ERR_STORE_UNAVAILABLE",
                "Unexpected storage failure.",
            )
        }
    }
}

fn response_status<T>(result: &Result<T, ApiError>, ok: StatusCode) -> StatusCode {
    match result {
        Ok(_) => ok,
        Err((status, _)) => *status,
    }
}

fn outcome_label(ok: bool) -> &'static str {
    if ok { "success" } else { "error" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> PhoneRecord {
        PhoneRecord {
            id: 1,
            serial_number: "ABC12345678".to_string(),
            imei: "123456789012345".to_string(),
            model: "S21".to_string(),
            brand: "Samsung".to_string(),
            network_technologies: "5G,LTE".to_string(),
            number_of_cameras: 3,
            number_of_cores: 8,
            weight: 169,
            battery_capacity: 4000,
            cost: 799.99,
        }
    }

    #[test]
    fn phone_response_reconstructs_the_technology_list() {
        let response = PhoneResponse::from(&sample_record());
        assert_eq!(
            response.network_technologies,
            vec!["5G".to_string(), "LTE".to_string()]
        );
        assert_eq!(response.id, 1);
    }

    #[test]
    fn duplicate_identity_errors_map_to_400_with_field_specific_messages() {
        let (status, Json(body)) =
            store_failure_response("create", StoreError::DuplicateSerialNumber);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.message.contains("serial number"));

        let (status, Json(body)) = store_failure_response("create", StoreError::DuplicateImei);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.message.contains("IMEI"));

        let (status, Json(body)) = store_failure_response("create", StoreError::DuplicateIdentity);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.message.contains("already exists"));
    }

    #[test]
    fn unexpected_store_failures_map_to_500() {
        let (status, Json(body)) = store_failure_response("list", StoreError::Timeout);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "ERR_STORE_UNAVAILABLE");
    }

    #[test]
    fn missing_records_map_to_404_naming_the_serial() {
        let (status, Json(body)) = not_found_response("ABC12345678");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.message.contains("ABC12345678"));
    }

    #[test]
    fn field_rejections_keep_the_documented_messages() {
        let (status, Json(body)) =
            field_error_response(FieldError::Immutable(PhoneField::Brand.column()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Updating 'brand' is not allowed.");

        let (status, Json(body)) =
            create_error_response(CreateError::MissingField(PhoneField::Imei.column()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Missing required field: 'imei'");
    }
}
