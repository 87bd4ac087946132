//! Startup foreign-key validation against a real SQLite database

mod common;

use common::*;
use tabula_catalog::{
    ColumnDescriptor, ForeignKeyDescriptor, PrimaryKeyDescriptor, TableCatalog, TableDescriptor,
    TableGroup,
};
use tabula_services::{ForeignKeyValidator, ServiceError};

fn catalog_with_lookup(fk: ForeignKeyDescriptor) -> TableCatalog {
    TableCatalog::new(vec![TableGroup::new("g").with_table(
        TableDescriptor::new("orders", PrimaryKeyDescriptor::new("id"))
            .with_column(ColumnDescriptor::new("ref_id").foreign_key(fk)),
    )])
    .expect("valid catalog")
}

#[tokio::test]
async fn bijective_lookup_validates() {
    let db = employees_db().await;
    let validated = ForeignKeyValidator::validate(hr_catalog(), &*db)
        .await
        .expect("employees lookup is unique");
    assert_eq!(validated.tables().count(), 1);
}

#[tokio::test]
async fn duplicate_display_values_fail_validation() {
    let db = employees_db().await;
    db.execute_batch("INSERT INTO employees (id, full_name) VALUES (6, 'J. Doe');")
        .await
        .expect("insert duplicate");

    let err = ForeignKeyValidator::validate(hr_catalog(), &*db)
        .await
        .expect_err("duplicate display value");
    match err {
        ServiceError::SchemaIntegrity(message) => {
            assert!(message.contains("employees.manager_id"), "{}", message);
            assert!(message.contains("full_name"), "{}", message);
        }
        other => panic!("expected SchemaIntegrity, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_referenced_table_is_unique() {
    let db = sqlite_with("CREATE TABLE regions (id INTEGER PRIMARY KEY, label TEXT);").await;
    let catalog = catalog_with_lookup(ForeignKeyDescriptor::new("regions", "id", "label"));
    assert!(ForeignKeyValidator::validate(catalog, &*db).await.is_ok());
}

#[tokio::test]
async fn null_display_value_breaks_uniqueness() {
    let db = sqlite_with(
        "CREATE TABLE regions (id INTEGER PRIMARY KEY, label TEXT);
         INSERT INTO regions VALUES (1, 'North'), (2, NULL);",
    )
    .await;
    let catalog = catalog_with_lookup(ForeignKeyDescriptor::new("regions", "id", "label"));
    let err = ForeignKeyValidator::validate(catalog, &*db)
        .await
        .expect_err("NULL label");
    assert!(matches!(err, ServiceError::SchemaIntegrity(_)));
}

#[tokio::test]
async fn repeated_keys_break_uniqueness() {
    let db = sqlite_with(
        "CREATE TABLE regions (code TEXT, label TEXT);
         INSERT INTO regions VALUES ('N', 'North'), ('N', 'Nord');",
    )
    .await;
    let catalog = catalog_with_lookup(ForeignKeyDescriptor::new("regions", "code", "label"));
    assert!(matches!(
        ForeignKeyValidator::validate(catalog, &*db).await,
        Err(ServiceError::SchemaIntegrity(_))
    ));
}

#[tokio::test]
async fn missing_referenced_table_is_reported() {
    let db = employees_db().await;
    let catalog = catalog_with_lookup(ForeignKeyDescriptor::new("regions", "id", "label"));
    match ForeignKeyValidator::validate(catalog, &*db).await {
        Err(ServiceError::TableNotFound(table)) => assert_eq!(table, "regions"),
        other => panic!("expected TableNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_display_column_is_a_schema_reference_error() {
    let db = employees_db().await;
    let catalog = catalog_with_lookup(ForeignKeyDescriptor::new("employees", "id", "nickname"));
    match ForeignKeyValidator::validate(catalog, &*db).await {
        Err(ServiceError::SchemaReference { table, column }) => {
            assert_eq!(table, "employees");
            assert_eq!(column, "nickname");
        }
        other => panic!("expected SchemaReference, got {:?}", other),
    }
}
