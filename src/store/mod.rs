//! Persistence for students, courses, and the links between them.

mod sql;

pub use sql::{PgStore, SqliteStore};

use crate::config::AppConfig;
use crate::error::{AppError, ConfigError};
use crate::model::{Course, CoursePatch, ListFilter, NewCourse, NewStudent, Student, StudentPatch};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::ConnectOptions;
use std::str::FromStr;
use std::sync::Arc;

/// Record store behind the HTTP layer. Lists are ordered by id; the
/// `students` of a course are ordered by when each link was made.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn ping(&self) -> Result<(), AppError>;

    async fn list_courses(&self, filter: &ListFilter) -> Result<Vec<Course>, AppError>;
    async fn get_course(&self, id: i64) -> Result<Option<Course>, AppError>;
    /// Fails with a validation error naming any student id that does not exist.
    async fn create_course(&self, input: NewCourse) -> Result<Course, AppError>;
    /// `Ok(None)` when the course does not exist.
    async fn update_course(&self, id: i64, patch: CoursePatch) -> Result<Option<Course>, AppError>;
    /// Removes the course and its links; students are kept. `false` if nothing was deleted.
    async fn delete_course(&self, id: i64) -> Result<bool, AppError>;
    /// Links students to a course without touching existing links.
    async fn add_course_students(&self, course_id: i64, student_ids: &[i64]) -> Result<Option<Course>, AppError>;

    async fn list_students(&self, filter: &ListFilter) -> Result<Vec<Student>, AppError>;
    async fn get_student(&self, id: i64) -> Result<Option<Student>, AppError>;
    async fn create_student(&self, input: NewStudent) -> Result<Student, AppError>;
    async fn update_student(&self, id: i64, patch: StudentPatch) -> Result<Option<Student>, AppError>;
    /// Removes the student and its links; courses are kept.
    async fn delete_student(&self, id: i64) -> Result<bool, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    pub fn from_url(database_url: &str) -> Result<Self, ConfigError> {
        let scheme = database_url.split(':').next().unwrap_or_default();
        match scheme {
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(ConfigError::UnsupportedDatabase(other.to_string())),
        }
    }
}

/// Opens the store named by `DATABASE_URL` and brings its schema up to date.
pub async fn connect(config: &AppConfig) -> Result<Arc<dyn Store>, AppError> {
    let url = config.database_url.as_str();
    let store: Arc<dyn Store> = match Backend::from_url(url)? {
        Backend::Postgres => Arc::new(PgStore::connect(url, config.max_connections).await?),
        Backend::Sqlite => Arc::new(SqliteStore::connect(url, config.max_connections).await?),
    };
    Ok(store)
}

/// Creates the PostgreSQL database named in `database_url` if it does not exist.
/// A URL without a database name connects to the server default; nothing is created.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let Some((admin, db_name)) = database_to_create(database_url)? else {
        return Ok(());
    };
    let mut conn: PgConnection = admin.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Admin connection options (same server, `postgres` database) and the target
/// database name, or `None` when there is nothing to create.
fn database_to_create(database_url: &str) -> Result<Option<(PgConnectOptions, String)>, ConfigError> {
    let opts = PgConnectOptions::from_str(database_url).map_err(|e| invalid_database_url(&e))?;
    let db_name = match opts.get_database() {
        Some(name) if !name.is_empty() && name != "postgres" => name.to_string(),
        _ => return Ok(None),
    };
    Ok(Some((opts.database("postgres"), db_name)))
}

/// The URL may carry a password, so only the parse error is reported.
pub(crate) fn invalid_database_url(err: &sqlx::Error) -> ConfigError {
    ConfigError::Invalid {
        name: "DATABASE_URL",
        value: err.to_string(),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
