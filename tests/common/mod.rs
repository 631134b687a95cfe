//! Helpers for integration tests.
#![allow(dead_code)]

use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use pushkind_common::db::{DbPool, establish_connection_pool};
use scent_store::domain::order::Customer;
use scent_store::domain::product::{NewProduct, ProductCategory};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!(); // assumes migrations/ exists

/// Temporary database used in integration tests.
pub struct TestDb {
    filename: String,
    pool: DbPool,
}

impl TestDb {
    pub fn new(filename: &str) -> Self {
        std::fs::remove_file(filename).ok(); // Clean up old DB

        let pool =
            establish_connection_pool(filename).expect("Failed to establish SQLite connection.");
        let mut conn = pool
            .get()
            .expect("Failed to get SQLite connection from pool.");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Migrations failed");
        TestDb {
            filename: filename.to_string(),
            pool,
        }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        std::fs::remove_file(&self.filename).ok();
        std::fs::remove_file(format!("{}-shm", &self.filename)).ok();
        std::fs::remove_file(format!("{}-wal", &self.filename)).ok();
    }
}

pub fn new_product(name: &str, price_cents: i64) -> NewProduct {
    NewProduct::new(name, ProductCategory::EauDeParfum, price_cents)
        .with_images(vec![format!("https://cdn.example/{name}.jpg")])
        .with_stock(5)
}

pub fn customer(first_name: &str, last_name: &str) -> Customer {
    Customer {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        address: "12 Mall Road".to_string(),
        apartment: None,
        city: "Lahore".to_string(),
        phone: "03001234567".to_string(),
        email: None,
        save_info: false,
    }
}
