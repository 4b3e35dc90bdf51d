#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::process::Command;
use tempfile::tempdir;

const CUSTOMER: &str = "0b9e4c7a-1111-4000-8000-00000000c0de";

fn run(db_path: &std::path::Path, args: &[&str]) -> String {
    let output = Command::new(cargo_bin!("orderflow"))
        .env_remove("ORDERFLOW_ADMIN_USERNAME")
        .env_remove("ORDERFLOW_ADMIN_PASSWORD_HASH")
        .arg("--db-path")
        .arg(db_path)
        .args(args)
        .output()
        .expect("Failed to execute command");
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: load the catalog and place an order
    let placed = run(
        &db_path,
        &[
            "--catalog",
            "tests/fixtures/catalog.csv",
            "place",
            "--customer",
            CUSTOMER,
            "--cart",
            "tests/fixtures/cart.csv",
            "--address",
            "12 MG Road",
            "--pincode",
            "560001",
            "--date",
            "2099-01-01",
            "--slot",
            "6:00 PM - 8:00 PM",
        ],
    );
    let order_id = placed
        .lines()
        .nth(1)
        .and_then(|row| row.split(',').next())
        .unwrap()
        .to_string();

    // 2. Second run: catalog and order survive without reloading
    let products = run(&db_path, &["products"]);
    assert!(products.contains("Chocolate Truffle"));

    let submitted = run(
        &db_path,
        &["submit-payment", "--customer", CUSTOMER, "--order", &order_id],
    );
    assert!(submitted.contains("payment_verification_pending"));
    assert!(submitted.contains(",PRG"));

    // 3. Third run: loyalty balance carried over
    let loyalty = run(&db_path, &["loyalty", "--customer", CUSTOMER]);
    assert!(loyalty.contains(&format!("{CUSTOMER},195,Bronze,305,19.5")));

    let orders = run(&db_path, &["orders", "--customer", CUSTOMER]);
    assert_eq!(orders.lines().count(), 2);
}
