//! Products: a second entity stored through the same CRUD engine as users.
//!
//! Products have no HTTP surface; the repository is used directly.

use std::sync::Arc;

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::persistence::{
    ConnectionProvider, CrudRepository, EntityMapping, PersistenceResult,
};

pub const DEFAULT_PRODUCTS_TABLE: &str = "products";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: description.into(),
            price,
            category: category.into(),
        }
    }
}

/// Product storage with catalogue finders.
#[derive(Debug)]
pub struct ProductRepository {
    engine: CrudRepository<Product, i64>,
}

impl ProductRepository {
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> PersistenceResult<Self> {
        Self::with_table(provider, DEFAULT_PRODUCTS_TABLE)
    }

    pub fn with_table(
        provider: Arc<dyn ConnectionProvider>,
        table: impl Into<String>,
    ) -> PersistenceResult<Self> {
        Ok(Self {
            engine: CrudRepository::new(table, provider, product_mapping())?,
        })
    }

    pub fn ensure_schema(&self) -> PersistenceResult<()> {
        self.engine.execute_schema(&format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             id INTEGER PRIMARY KEY AUTOINCREMENT, \
             name TEXT NOT NULL, \
             description TEXT NOT NULL, \
             price REAL NOT NULL, \
             category TEXT NOT NULL)",
            self.engine.table()
        ))
    }

    pub fn find_all(&self) -> PersistenceResult<Vec<Product>> {
        self.engine.find_all()
    }

    pub fn find_by_id(&self, id: i64) -> PersistenceResult<Option<Product>> {
        self.engine.find_by_id(&id)
    }

    pub fn save(&self, product: Product) -> PersistenceResult<Product> {
        self.engine.save(product)
    }

    pub fn delete_by_id(&self, id: i64) -> PersistenceResult<bool> {
        self.engine.delete_by_id(&id)
    }

    pub fn find_by_category(&self, category: &str) -> PersistenceResult<Vec<Product>> {
        self.engine.find_by_custom_query("category = ?", &[&category])
    }

    /// Products priced within `[min, max]`, inclusive.
    pub fn find_by_price_range(&self, min: f64, max: f64) -> PersistenceResult<Vec<Product>> {
        self.engine
            .find_by_custom_query("price BETWEEN ? AND ?", &[&min, &max])
    }

    pub fn find_by_name(&self, name: &str) -> PersistenceResult<Option<Product>> {
        self.engine.find_one_by_custom_query("name = ?", &[&name])
    }
}

fn product_mapping() -> EntityMapping<Product, i64> {
    EntityMapping {
        row_to_entity: |row| {
            Ok(Product {
                id: row.get("id")?,
                name: row.get("name")?,
                description: row.get("description")?,
                price: row.get("price")?,
                category: row.get("category")?,
            })
        },
        insert_statement: |table| {
            format!(
                "INSERT INTO {} (name, description, price, category) VALUES (?, ?, ?, ?)",
                table
            )
        },
        update_statement: |table| {
            format!(
                "UPDATE {} SET name = ?, description = ?, price = ?, category = ? WHERE id = ?",
                table
            )
        },
        bind_insert_params: |p| {
            vec![
                Value::Text(p.name.clone()),
                Value::Text(p.description.clone()),
                Value::Real(p.price),
                Value::Text(p.category.clone()),
            ]
        },
        bind_update_params: |p| {
            vec![
                Value::Text(p.name.clone()),
                Value::Text(p.description.clone()),
                Value::Real(p.price),
                Value::Text(p.category.clone()),
                Value::Integer(p.id),
            ]
        },
        is_transient: |p| p.id == 0,
        bind_id_param: |id| Value::Integer(*id),
        extract_generated_id: |raw| raw,
        with_assigned_id: |p, id| Product { id, ..p },
    }
}
