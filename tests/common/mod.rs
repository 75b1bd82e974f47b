// Test utility module for remisiones-migrate integration tests
#![allow(dead_code)]

use remisiones_migrate::config::MigrationConfig;
use remisiones_migrate::store::{Document, Fields, MemoryStore};
use remisiones_migrate::RetryConfig;
use serde_json::{json, Value};
use std::path::Path;

pub const COLLECTION: &str = "remisiones";

pub fn fields(value: Value) -> Fields {
    value
        .as_object()
        .cloned()
        .expect("fixture must be a JSON object")
}

pub fn document(id: &str, value: Value) -> Document {
    Document::new(id, fields(value))
}

/// The canonical legacy remisión used across the suite.
pub fn x1() -> Document {
    document(
        "X1",
        json!({
            "servicio1": "Mantenimiento",
            "servicio2": "",
            "tecnico1": "Juan Pérez",
            "estado": "Pendiente"
        }),
    )
}

/// `count` legacy remisiones with ids `R0000..`, in id order.
pub fn legacy_documents(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| {
            document(
                &format!("R{i:04}"),
                json!({
                    "servicio1": format!("Servicio {i}"),
                    "tecnico1": "Ana",
                    "estado": "Abierta",
                    "movil": format!("M-{}", i % 7)
                }),
            )
        })
        .collect()
}

pub fn memory_store(documents: impl IntoIterator<Item = Document>) -> MemoryStore {
    MemoryStore::with_collection(COLLECTION, documents)
}

/// Default configuration with instant, fail-fast commits.
pub fn test_config() -> MigrationConfig {
    let mut config = MigrationConfig::default();
    config.retry = RetryConfig::disabled();
    config
}

/// Write a collection file into a file-store project directory.
pub fn write_collection(project_root: &Path, collection: &str, documents: &[Document]) {
    let image: serde_json::Map<String, Value> = documents
        .iter()
        .map(|doc| (doc.id.clone(), Value::Object(doc.fields.clone())))
        .collect();
    std::fs::create_dir_all(project_root).unwrap();
    std::fs::write(
        project_root.join(format!("{collection}.json")),
        serde_json::to_string_pretty(&Value::Object(image)).unwrap(),
    )
    .unwrap();
}

pub fn read_collection(project_root: &Path, collection: &str) -> serde_json::Map<String, Value> {
    let contents =
        std::fs::read_to_string(project_root.join(format!("{collection}.json"))).unwrap();
    serde_json::from_str(&contents).unwrap()
}
