//! Generic CRUD engine.
//!
//! # Responsibilities
//! - Run find-all, find-by-id, save, delete and custom queries for any entity
//! - Decide insert versus update from the entity's transient state
//! - Assign generated identifiers after insert
//!
//! # Design Decisions
//! - One connection per call, released on every exit path when it drops
//! - All values travel as bound parameters; only the validated table name
//!   and caller-authored WHERE fragments are spliced into SQL text
//! - Failures are never retried here

use std::sync::Arc;

use rusqlite::{params, params_from_iter, Connection, ToSql};

use crate::persistence::error::{PersistenceError, PersistenceResult};
use crate::persistence::mapping::EntityMapping;
use crate::persistence::provider::ConnectionProvider;

/// CRUD operations over one table, driven by an [`EntityMapping`].
pub struct CrudRepository<T, ID> {
    table: String,
    provider: Arc<dyn ConnectionProvider>,
    mapping: EntityMapping<T, ID>,
}

impl<T, ID> CrudRepository<T, ID> {
    /// Create an engine for `table`.
    ///
    /// Fails with `InvalidTableName` unless the name is a plain identifier.
    pub fn new(
        table: impl Into<String>,
        provider: Arc<dyn ConnectionProvider>,
        mapping: EntityMapping<T, ID>,
    ) -> PersistenceResult<Self> {
        let table = table.into();
        if !is_identifier(&table) {
            return Err(PersistenceError::InvalidTableName(table));
        }
        Ok(Self {
            table,
            provider,
            mapping,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Every row of the table, in storage order.
    pub fn find_all(&self) -> PersistenceResult<Vec<T>> {
        let sql = format!("SELECT * FROM {}", self.table);
        let conn = self.connection()?;
        self.query(&conn, "find_all", &sql, &[])
    }

    /// The row whose `id` equals `id`, if any.
    pub fn find_by_id(&self, id: &ID) -> PersistenceResult<Option<T>> {
        let sql = format!("SELECT * FROM {} WHERE id = ?", self.table);
        let id_value = (self.mapping.bind_id_param)(id);
        let conn = self.connection()?;
        let rows = self.query(&conn, "find_by_id", &sql, &[&id_value])?;
        Ok(rows.into_iter().next())
    }

    /// Insert a transient entity or update a persistent one.
    ///
    /// Inserts return the entity with its generated identifier. Updates
    /// return the entity unchanged, or `NotFoundForUpdate` when no row
    /// carries its identifier.
    pub fn save(&self, entity: T) -> PersistenceResult<T> {
        let conn = self.connection()?;
        if (self.mapping.is_transient)(&entity) {
            self.insert(&conn, entity)
        } else {
            self.update(&conn, entity)
        }
    }

    /// Delete the row with `id`. Returns whether a row was removed.
    pub fn delete_by_id(&self, id: &ID) -> PersistenceResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.table);
        let id_value = (self.mapping.bind_id_param)(id);
        let conn = self.connection()?;
        let affected = conn
            .execute(&sql, params![id_value])
            .map_err(|e| self.fail("delete_by_id", e))?;
        tracing::debug!(table = %self.table, affected, "Delete executed");
        Ok(affected > 0)
    }

    /// Rows matching a caller-supplied WHERE fragment.
    ///
    /// The fragment is spliced verbatim; every value must go through
    /// `params` as a `?` placeholder.
    pub fn find_by_custom_query(
        &self,
        where_clause: &str,
        params: &[&dyn ToSql],
    ) -> PersistenceResult<Vec<T>> {
        let sql = format!("SELECT * FROM {} WHERE {}", self.table, where_clause);
        let conn = self.connection()?;
        self.query(&conn, "find_by_custom_query", &sql, params)
    }

    /// First row matching a caller-supplied WHERE fragment.
    pub fn find_one_by_custom_query(
        &self,
        where_clause: &str,
        params: &[&dyn ToSql],
    ) -> PersistenceResult<Option<T>> {
        Ok(self
            .find_by_custom_query(where_clause, params)?
            .into_iter()
            .next())
    }

    /// Run DDL (e.g. `CREATE TABLE IF NOT EXISTS`) against the database.
    pub fn execute_schema(&self, ddl: &str) -> PersistenceResult<()> {
        let conn = self.connection()?;
        conn.execute_batch(ddl)
            .map_err(|e| self.fail("execute_schema", e))?;
        tracing::info!(table = %self.table, "Schema ensured");
        Ok(())
    }

    fn connection(&self) -> PersistenceResult<Connection> {
        self.provider.acquire().map_err(|e| {
            tracing::error!(table = %self.table, error = %e, "Failed to acquire connection");
            e
        })
    }

    fn query(
        &self,
        conn: &Connection,
        operation: &'static str,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> PersistenceResult<Vec<T>> {
        let mut stmt = conn.prepare(sql).map_err(|e| self.fail(operation, e))?;
        let rows = stmt
            .query_map(params, |row| (self.mapping.row_to_entity)(row))
            .map_err(|e| self.fail(operation, e))?;

        let mut entities = Vec::new();
        for row in rows {
            entities.push(row.map_err(|e| self.fail(operation, e))?);
        }
        tracing::debug!(table = %self.table, operation, rows = entities.len(), "Query executed");
        Ok(entities)
    }

    fn insert(&self, conn: &Connection, entity: T) -> PersistenceResult<T> {
        let sql = (self.mapping.insert_statement)(&self.table);
        let values = (self.mapping.bind_insert_params)(&entity);
        let affected = conn
            .execute(&sql, params_from_iter(values))
            .map_err(|e| self.fail("insert", e))?;
        if affected == 0 {
            return Err(PersistenceError::NoRowsInserted {
                table: self.table.clone(),
            });
        }

        let generated = conn.last_insert_rowid();
        if generated <= 0 {
            return Err(PersistenceError::MissingGeneratedId {
                table: self.table.clone(),
            });
        }
        tracing::debug!(table = %self.table, id = generated, "Entity inserted");
        let id = (self.mapping.extract_generated_id)(generated);
        Ok((self.mapping.with_assigned_id)(entity, id))
    }

    fn update(&self, conn: &Connection, entity: T) -> PersistenceResult<T> {
        let sql = (self.mapping.update_statement)(&self.table);
        let values = (self.mapping.bind_update_params)(&entity);
        let affected = conn
            .execute(&sql, params_from_iter(values))
            .map_err(|e| self.fail("update", e))?;
        if affected == 0 {
            tracing::debug!(table = %self.table, "Update matched no row");
            return Err(PersistenceError::NotFoundForUpdate {
                table: self.table.clone(),
            });
        }
        Ok(entity)
    }

    fn fail(&self, operation: &'static str, source: rusqlite::Error) -> PersistenceError {
        tracing::error!(table = %self.table, operation, error = %source, "Statement failed");
        PersistenceError::statement(operation, &self.table, source)
    }
}

impl<T, ID> std::fmt::Debug for CrudRepository<T, ID> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrudRepository")
            .field("table", &self.table)
            .field("mapping", &self.mapping)
            .finish()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
