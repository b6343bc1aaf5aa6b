use std::time::Duration;

use phoneapi_contracts::{FieldValue, NewPhone, PhoneField};
use phoneapi_store::{PhoneStore, StoreError};

async fn memory_store() -> PhoneStore {
    PhoneStore::connect_and_migrate("sqlite::memory:", 1, Duration::from_millis(2000))
        .await
        .expect("in-memory store should connect and migrate")
}

fn sample_phone(serial_number: &str, imei: &str) -> NewPhone {
    NewPhone {
        serial_number: serial_number.to_string(),
        imei: imei.to_string(),
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

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn insert_assigns_ids_and_round_trips() {
    let store = memory_store().await;

    let first = store
        .insert(&sample_phone("ABC12345678", "123456789012345"))
        .await
        .expect("first insert should succeed");
    assert_eq!(first.id, 1);

    let second = store
        .insert(&sample_phone("XYZ12345678", "543210987654321"))
        .await
        .expect("second insert should succeed");
    assert_eq!(second.id, 2);

    let fetched = store
        .find_by_serial("ABC12345678")
        .await
        .expect("inserted record should be fetchable");
    assert_eq!(fetched, first);

    let all = store.list_all().await.expect("list should succeed");
    assert_eq!(all.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn duplicate_identity_fields_map_to_specific_errors() {
    let store = memory_store().await;

    store
        .insert(&sample_phone("ABC12345678", "123456789012345"))
        .await
        .expect("first insert should succeed");

    let same_serial = store
        .insert(&sample_phone("ABC12345678", "999999999999999"))
        .await
        .unwrap_err();
    assert!(matches!(same_serial, StoreError::DuplicateSerialNumber));

    let same_imei = store
        .insert(&sample_phone("DEF12345678", "123456789012345"))
        .await
        .unwrap_err();
    assert!(matches!(same_imei, StoreError::DuplicateImei));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn update_and_delete_report_missing_records() {
    let store = memory_store().await;

    let record = store
        .insert(&sample_phone("ABC12345678", "123456789012345"))
        .await
        .expect("insert should succeed");

    let mut updated = record.clone();
    updated.cost = 450.0;
    updated.network_technologies = "GSM".to_string();
    store
        .update(&updated)
        .await
        .expect("update of an existing record should succeed");

    let fetched = store
        .find_by_serial("ABC12345678")
        .await
        .expect("updated record should be fetchable");
    assert_eq!(fetched.cost, 450.0);
    assert_eq!(fetched.network_technologies, "GSM");

    let mut missing = record.clone();
    missing.serial_number = "NOPE0000000".to_string();
    assert!(matches!(
        store.update(&missing).await.unwrap_err(),
        StoreError::NotFound
    ));

    store
        .delete("ABC12345678")
        .await
        .expect("delete of an existing record should succeed");
    assert!(matches!(
        store.delete("ABC12345678").await.unwrap_err(),
        StoreError::NotFound
    ));
    assert!(matches!(
        store.find_by_serial("ABC12345678").await.unwrap_err(),
        StoreError::NotFound
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn filter_orders_by_brand_model_cost() {
    let store = memory_store().await;

    let mut cheap_nokia = sample_phone("AAA11111111", "111111111111111");
    cheap_nokia.brand = "Nokia".to_string();
    cheap_nokia.model = "G22".to_string();
    cheap_nokia.cost = 199.0;
    cheap_nokia.number_of_cameras = 2;

    let mut pricey_nokia = sample_phone("BBB11111111", "222222222222222");
    pricey_nokia.brand = "Nokia".to_string();
    pricey_nokia.model = "G22".to_string();
    pricey_nokia.cost = 249.0;
    pricey_nokia.number_of_cameras = 2;

    let mut apple = sample_phone("CCC11111111", "333333333333333");
    apple.brand = "Apple".to_string();
    apple.model = "15".to_string();
    apple.cost = 999.0;
    apple.number_of_cameras = 2;

    // Insert out of order to prove the ordering comes from the query.
    store.insert(&pricey_nokia).await.expect("insert should succeed");
    store.insert(&apple).await.expect("insert should succeed");
    store.insert(&cheap_nokia).await.expect("insert should succeed");

    let filtered = store
        .filter_by_field(PhoneField::NumberOfCameras, &FieldValue::Int(2))
        .await
        .expect("filter should succeed");

    let serials = filtered
        .iter()
        .map(|record| record.serial_number.as_str())
        .collect::<Vec<_>>();
    assert_eq!(serials, vec!["CCC11111111", "AAA11111111", "BBB11111111"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn filter_network_technologies_uses_substring_containment() {
    let store = memory_store().await;

    let mut gsm_lte = sample_phone("AAA11111111", "111111111111111");
    gsm_lte.network_technologies = "GSM,LTE".to_string();

    let mut five_g_lte = sample_phone("BBB11111111", "222222222222222");
    five_g_lte.network_technologies = "5G,LTE".to_string();

    store.insert(&gsm_lte).await.expect("insert should succeed");
    store.insert(&five_g_lte).await.expect("insert should succeed");

    let lte = store
        .filter_by_field(
            PhoneField::NetworkTechnologies,
            &FieldValue::Text("LTE".to_string()),
        )
        .await
        .expect("filter should succeed");
    assert_eq!(lte.len(), 2);

    let gsm = store
        .filter_by_field(
            PhoneField::NetworkTechnologies,
            &FieldValue::Text("GSM".to_string()),
        )
        .await
        .expect("filter should succeed");
    assert_eq!(gsm.len(), 1);
    assert_eq!(gsm[0].serial_number, "AAA11111111");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn migrations_are_idempotent() {
    let store = memory_store().await;
    store
        .migrate()
        .await
        .expect("re-running migrations should be a no-op");
    store.ping().await.expect("ping should succeed");
    store.close().await;
}
