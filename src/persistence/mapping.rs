//! Entity mapping contract.
//!
//! An `EntityMapping` tells the generic engine everything it needs to know
//! about one entity kind: how rows become entities, which statements insert
//! and update it, how parameters are bound, and how identifiers behave.

use rusqlite::types::Value;
use rusqlite::Row;

/// Per-entity callbacks consumed by [`CrudRepository`](super::CrudRepository).
///
/// Statement builders receive the table name and must emit placeholders in
/// the same order the matching `bind_*` callback produces values. The update
/// statement's last placeholder is the identifier.
pub struct EntityMapping<T, ID> {
    /// Build an entity from the current row of a `SELECT *`.
    pub row_to_entity: fn(&Row<'_>) -> rusqlite::Result<T>,
    /// INSERT statement for the table.
    pub insert_statement: fn(&str) -> String,
    /// UPDATE statement for the table, keyed by `id`.
    pub update_statement: fn(&str) -> String,
    /// Values for the insert placeholders.
    pub bind_insert_params: fn(&T) -> Vec<Value>,
    /// Values for the update placeholders, identifier last.
    pub bind_update_params: fn(&T) -> Vec<Value>,
    /// True when the entity has not been stored yet.
    pub is_transient: fn(&T) -> bool,
    /// Value for an identifier placeholder.
    pub bind_id_param: fn(&ID) -> Value,
    /// Convert the driver's generated key into an identifier.
    pub extract_generated_id: fn(i64) -> ID,
    /// Return the entity with its identifier assigned.
    pub with_assigned_id: fn(T, ID) -> T,
}

impl<T, ID> Clone for EntityMapping<T, ID> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, ID> Copy for EntityMapping<T, ID> {}

impl<T, ID> std::fmt::Debug for EntityMapping<T, ID> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMapping")
            .field("entity", &std::any::type_name::<T>())
            .field("id", &std::any::type_name::<ID>())
            .finish()
    }
}
