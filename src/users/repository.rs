//! User persistence: the port the controller depends on and its SQLite adapter.

use std::sync::Arc;

use rusqlite::types::Value;

use crate::persistence::{
    ConnectionProvider, CrudRepository, EntityMapping, PersistenceResult,
};
use crate::users::model::User;

/// Default table for users.
pub const DEFAULT_USERS_TABLE: &str = "users";

/// Storage operations the user endpoints need.
pub trait UserRepository: Send + Sync {
    fn find_all(&self) -> PersistenceResult<Vec<User>>;
    fn find_by_id(&self, id: i64) -> PersistenceResult<Option<User>>;
    fn save(&self, user: User) -> PersistenceResult<User>;
    fn delete_by_id(&self, id: i64) -> PersistenceResult<bool>;
    fn find_by_email(&self, email: &str) -> PersistenceResult<Option<User>>;
    fn find_by_name_containing(&self, fragment: &str) -> PersistenceResult<Vec<User>>;
}

/// `UserRepository` backed by the generic CRUD engine.
#[derive(Debug)]
pub struct SqliteUserRepository {
    engine: CrudRepository<User, i64>,
}

impl SqliteUserRepository {
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> PersistenceResult<Self> {
        Self::with_table(provider, DEFAULT_USERS_TABLE)
    }

    /// Repository over a custom table name.
    pub fn with_table(
        provider: Arc<dyn ConnectionProvider>,
        table: impl Into<String>,
    ) -> PersistenceResult<Self> {
        Ok(Self {
            engine: CrudRepository::new(table, provider, user_mapping())?,
        })
    }

    pub fn table(&self) -> &str {
        self.engine.table()
    }

    /// Create the table if it does not exist yet.
    pub fn ensure_schema(&self) -> PersistenceResult<()> {
        self.engine.execute_schema(&create_table_sql(self.engine.table()))
    }
}

impl UserRepository for SqliteUserRepository {
    fn find_all(&self) -> PersistenceResult<Vec<User>> {
        self.engine.find_all()
    }

    fn find_by_id(&self, id: i64) -> PersistenceResult<Option<User>> {
        self.engine.find_by_id(&id)
    }

    fn save(&self, user: User) -> PersistenceResult<User> {
        self.engine.save(user)
    }

    fn delete_by_id(&self, id: i64) -> PersistenceResult<bool> {
        self.engine.delete_by_id(&id)
    }

    fn find_by_email(&self, email: &str) -> PersistenceResult<Option<User>> {
        self.engine.find_one_by_custom_query("email = ?", &[&email])
    }

    fn find_by_name_containing(&self, fragment: &str) -> PersistenceResult<Vec<User>> {
        let pattern = format!("%{}%", escape_like(fragment));
        self.engine
            .find_by_custom_query("name LIKE ? ESCAPE '\\' ORDER BY id", &[&pattern])
    }
}

/// DDL for a users table named `table`.
pub fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\
         id INTEGER PRIMARY KEY AUTOINCREMENT, \
         name TEXT NOT NULL, \
         email TEXT NOT NULL)",
        table
    )
}

fn user_mapping() -> EntityMapping<User, i64> {
    EntityMapping {
        row_to_entity: |row| {
            Ok(User {
                id: row.get("id")?,
                name: row.get("name")?,
                email: row.get("email")?,
            })
        },
        insert_statement: |table| format!("INSERT INTO {} (name, email) VALUES (?, ?)", table),
        update_statement: |table| format!("UPDATE {} SET name = ?, email = ? WHERE id = ?", table),
        bind_insert_params: |user| vec![Value::Text(user.name.clone()), Value::Text(user.email.clone())],
        bind_update_params: |user| {
            vec![
                Value::Text(user.name.clone()),
                Value::Text(user.email.clone()),
                Value::Integer(user.id),
            ]
        },
        is_transient: User::is_transient,
        bind_id_param: |id| Value::Integer(*id),
        extract_generated_id: |raw| raw,
        with_assigned_id: User::with_id,
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{PersistenceError, SqliteConnectionProvider};
    use tempfile::TempDir;

    fn setup(table: &str) -> (TempDir, SqliteUserRepository) {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SqliteConnectionProvider::new(dir.path().join("users.db")));
        let repo = SqliteUserRepository::with_table(provider, table).unwrap();
        repo.ensure_schema().unwrap();
        (dir, repo)
    }

    #[test]
    fn test_save_and_find() {
        let (_dir, repo) = setup(DEFAULT_USERS_TABLE);
        let ann = repo.save(User::new("Ann", "a@x.com")).unwrap();
        assert!(ann.id > 0);
        assert_eq!(repo.find_by_id(ann.id).unwrap(), Some(ann.clone()));
        assert_eq!(repo.find_all().unwrap(), vec![ann]);
    }

    #[test]
    fn test_find_by_email() {
        let (_dir, repo) = setup(DEFAULT_USERS_TABLE);
        repo.save(User::new("Ann", "a@x.com")).unwrap();
        let bo = repo.save(User::new("Bo", "b@x.com")).unwrap();
        assert_eq!(repo.find_by_email("b@x.com").unwrap(), Some(bo));
        assert_eq!(repo.find_by_email("nobody@x.com").unwrap(), None);
    }

    #[test]
    fn test_find_by_name_containing_escapes_wildcards() {
        let (_dir, repo) = setup(DEFAULT_USERS_TABLE);
        repo.save(User::new("Annabel", "a@x.com")).unwrap();
        repo.save(User::new("Joanna", "j@x.com")).unwrap();
        repo.save(User::new("100% Bob", "b@x.com")).unwrap();

        let names: Vec<String> = repo
            .find_by_name_containing("nna")
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["Annabel", "Joanna"]);

        let percent = repo.find_by_name_containing("%").unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].name, "100% Bob");
    }

    #[test]
    fn test_custom_table_name() {
        let (_dir, repo) = setup("members");
        assert_eq!(repo.table(), "members");
        repo.save(User::new("Cy", "c@x.com")).unwrap();
        assert_eq!(repo.find_all().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_table_name() {
        let provider = Arc::new(SqliteConnectionProvider::new(":memory:"));
        let err = SqliteUserRepository::with_table(provider, "users; --").unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidTableName(_)));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like(r"a_b%c\d"), r"a\_b\%c\\d");
    }
}
