//! SQL-backed stores. The same statements run on PostgreSQL and SQLite; only
//! the pool type and the migration set differ.

use crate::error::{AppError, FieldErrors};
use crate::model::{Course, CoursePatch, ListFilter, NewCourse, NewStudent, Student, StudentPatch};
use crate::store::Store;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

/// Bind parameters per statement when a query carries a caller-sized id list.
const ID_CHUNK: usize = 1000;

#[derive(FromRow)]
struct CourseRow {
    id: i64,
    name: String,
}

#[derive(FromRow)]
struct StudentRow {
    id: i64,
    name: String,
    birth_date: Option<NaiveDate>,
}

#[derive(FromRow)]
struct LinkRow {
    course_id: i64,
    student_id: i64,
}

/// Groups link rows by course (or by student), keeping row order.
fn group_links(rows: Vec<LinkRow>, by_course: bool) -> HashMap<i64, Vec<i64>> {
    let mut out: HashMap<i64, Vec<i64>> = HashMap::new();
    for row in rows {
        let (owner, member) = if by_course {
            (row.course_id, row.student_id)
        } else {
            (row.student_id, row.course_id)
        };
        out.entry(owner).or_default().push(member);
    }
    out
}

macro_rules! sql_store {
    ($(#[$meta:meta])* $name:ident, $db:ty, $conn:ty) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name {
            pool: sqlx::Pool<$db>,
        }

        impl $name {
            pub fn new(pool: sqlx::Pool<$db>) -> Self {
                Self { pool }
            }

            pub fn pool(&self) -> &sqlx::Pool<$db> {
                &self.pool
            }

            fn push_filter(qb: &mut QueryBuilder<'_, $db>, alias: &str, filter: &ListFilter) {
                if let Some(id) = filter.id {
                    qb.push(format!(" AND {}.id = ", alias)).push_bind(id);
                }
                if let Some(name) = &filter.name {
                    qb.push(format!(" AND {}.name = ", alias)).push_bind(name.clone());
                }
            }

            async fn fetch_courses(conn: &mut $conn, filter: &ListFilter) -> Result<Vec<Course>, AppError> {
                let mut qb = QueryBuilder::<$db>::new("SELECT c.id AS id, c.name AS name FROM courses c WHERE 1 = 1");
                Self::push_filter(&mut qb, "c", filter);
                qb.push(" ORDER BY c.id");
                tracing::debug!(sql = %qb.sql(), ?filter, "query");
                let rows: Vec<CourseRow> = qb.build_query_as().fetch_all(&mut *conn).await?;

                let mut qb = QueryBuilder::<$db>::new(
                    "SELECT l.course_id AS course_id, l.student_id AS student_id \
                     FROM course_students l JOIN courses c ON c.id = l.course_id WHERE 1 = 1",
                );
                Self::push_filter(&mut qb, "c", filter);
                qb.push(" ORDER BY l.id");
                let links: Vec<LinkRow> = qb.build_query_as().fetch_all(&mut *conn).await?;
                let mut links = group_links(links, true);

                Ok(rows
                    .into_iter()
                    .map(|r| Course {
                        students: links.remove(&r.id).unwrap_or_default(),
                        id: r.id,
                        name: r.name,
                    })
                    .collect())
            }

            async fn fetch_students(conn: &mut $conn, filter: &ListFilter) -> Result<Vec<Student>, AppError> {
                let mut qb = QueryBuilder::<$db>::new(
                    "SELECT s.id AS id, s.name AS name, s.birth_date AS birth_date FROM students s WHERE 1 = 1",
                );
                Self::push_filter(&mut qb, "s", filter);
                qb.push(" ORDER BY s.id");
                tracing::debug!(sql = %qb.sql(), ?filter, "query");
                let rows: Vec<StudentRow> = qb.build_query_as().fetch_all(&mut *conn).await?;

                let mut qb = QueryBuilder::<$db>::new(
                    "SELECT l.course_id AS course_id, l.student_id AS student_id \
                     FROM course_students l JOIN students s ON s.id = l.student_id WHERE 1 = 1",
                );
                Self::push_filter(&mut qb, "s", filter);
                qb.push(" ORDER BY l.id");
                let links: Vec<LinkRow> = qb.build_query_as().fetch_all(&mut *conn).await?;
                let mut links = group_links(links, false);

                Ok(rows
                    .into_iter()
                    .map(|r| Student {
                        courses: links.remove(&r.id).unwrap_or_default(),
                        id: r.id,
                        name: r.name,
                        birth_date: r.birth_date,
                    })
                    .collect())
            }

            /// Fails naming every id in `ids` with no student row, in input order.
            async fn ensure_students_exist(conn: &mut $conn, ids: &[i64]) -> Result<(), AppError> {
                let mut found: HashSet<i64> = HashSet::with_capacity(ids.len());
                for chunk in ids.chunks(ID_CHUNK) {
                    let mut qb = QueryBuilder::<$db>::new("SELECT id FROM students WHERE id IN (");
                    let mut separated = qb.separated(", ");
                    for id in chunk {
                        separated.push_bind(*id);
                    }
                    separated.push_unseparated(")");
                    let present: Vec<i64> = qb.build_query_scalar().fetch_all(&mut *conn).await?;
                    found.extend(present);
                }
                let missing: Vec<String> = ids
                    .iter()
                    .filter(|id| !found.contains(*id))
                    .map(|id| format!("Invalid pk \"{}\" - object does not exist.", id))
                    .collect();
                if missing.is_empty() {
                    return Ok(());
                }
                let mut errors = FieldErrors::new();
                errors.insert("students".into(), missing);
                Err(AppError::Validation(errors))
            }

            async fn course_exists(conn: &mut $conn, id: i64) -> Result<bool, AppError> {
                let found: Option<i64> = sqlx::query_scalar("SELECT id FROM courses WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?;
                Ok(found.is_some())
            }

            async fn student_exists(conn: &mut $conn, id: i64) -> Result<bool, AppError> {
                let found: Option<i64> = sqlx::query_scalar("SELECT id FROM students WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?;
                Ok(found.is_some())
            }

            /// Appends links that are not there yet, in the order given. Callers check the ids first.
            async fn link_students(conn: &mut $conn, course_id: i64, student_ids: &[i64]) -> Result<(), AppError> {
                for chunk in student_ids.chunks(ID_CHUNK / 2) {
                    let mut qb = QueryBuilder::<$db>::new("INSERT INTO course_students (course_id, student_id) ");
                    qb.push_values(chunk, |mut row, student_id| {
                        row.push_bind(course_id).push_bind(*student_id);
                    });
                    qb.push(" ON CONFLICT (course_id, student_id) DO NOTHING");
                    qb.build().execute(&mut *conn).await?;
                }
                Ok(())
            }

            async fn one_course(conn: &mut $conn, id: i64) -> Result<Option<Course>, AppError> {
                Ok(Self::fetch_courses(conn, &ListFilter::by_id(id)).await?.into_iter().next())
            }

            async fn one_student(conn: &mut $conn, id: i64) -> Result<Option<Student>, AppError> {
                Ok(Self::fetch_students(conn, &ListFilter::by_id(id)).await?.into_iter().next())
            }
        }

        #[async_trait]
        impl Store for $name {
            async fn ping(&self) -> Result<(), AppError> {
                sqlx::query("SELECT 1").execute(&self.pool).await?;
                Ok(())
            }

            async fn list_courses(&self, filter: &ListFilter) -> Result<Vec<Course>, AppError> {
                let mut conn = self.pool.acquire().await?;
                Self::fetch_courses(&mut *conn, filter).await
            }

            async fn get_course(&self, id: i64) -> Result<Option<Course>, AppError> {
                let mut conn = self.pool.acquire().await?;
                Self::one_course(&mut *conn, id).await
            }

            async fn create_course(&self, input: NewCourse) -> Result<Course, AppError> {
                let mut tx = self.pool.begin().await?;
                Self::ensure_students_exist(&mut *tx, &input.students).await?;
                let id: i64 = sqlx::query_scalar("INSERT INTO courses (name) VALUES ($1) RETURNING id")
                    .bind(&input.name)
                    .fetch_one(&mut *tx)
                    .await?;
                Self::link_students(&mut *tx, id, &input.students).await?;
                let course = Self::one_course(&mut *tx, id).await?.ok_or(sqlx::Error::RowNotFound)?;
                tx.commit().await?;
                tracing::info!(course_id = id, name = %course.name, "course created");
                Ok(course)
            }

            async fn update_course(&self, id: i64, patch: CoursePatch) -> Result<Option<Course>, AppError> {
                let mut tx = self.pool.begin().await?;
                if !Self::course_exists(&mut *tx, id).await? {
                    return Ok(None);
                }
                if let Some(name) = &patch.name {
                    sqlx::query("UPDATE courses SET name = $1 WHERE id = $2")
                        .bind(name)
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                }
                if let Some(students) = &patch.students {
                    Self::ensure_students_exist(&mut *tx, students).await?;
                    sqlx::query("DELETE FROM course_students WHERE course_id = $1")
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                    Self::link_students(&mut *tx, id, students).await?;
                }
                let course = Self::one_course(&mut *tx, id).await?;
                tx.commit().await?;
                tracing::info!(course_id = id, "course updated");
                Ok(course)
            }

            async fn delete_course(&self, id: i64) -> Result<bool, AppError> {
                let mut tx = self.pool.begin().await?;
                let unlinked = sqlx::query("DELETE FROM course_students WHERE course_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
                let deleted = sqlx::query("DELETE FROM courses WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
                tx.commit().await?;
                if deleted > 0 {
                    tracing::info!(course_id = id, unlinked, "course deleted");
                }
                Ok(deleted > 0)
            }

            async fn add_course_students(
                &self,
                course_id: i64,
                student_ids: &[i64],
            ) -> Result<Option<Course>, AppError> {
                let mut tx = self.pool.begin().await?;
                if !Self::course_exists(&mut *tx, course_id).await? {
                    return Ok(None);
                }
                Self::ensure_students_exist(&mut *tx, student_ids).await?;
                Self::link_students(&mut *tx, course_id, student_ids).await?;
                let course = Self::one_course(&mut *tx, course_id).await?;
                tx.commit().await?;
                Ok(course)
            }

            async fn list_students(&self, filter: &ListFilter) -> Result<Vec<Student>, AppError> {
                let mut conn = self.pool.acquire().await?;
                Self::fetch_students(&mut *conn, filter).await
            }

            async fn get_student(&self, id: i64) -> Result<Option<Student>, AppError> {
                let mut conn = self.pool.acquire().await?;
                Self::one_student(&mut *conn, id).await
            }

            async fn create_student(&self, input: NewStudent) -> Result<Student, AppError> {
                let mut tx = self.pool.begin().await?;
                let id: i64 =
                    sqlx::query_scalar("INSERT INTO students (name, birth_date) VALUES ($1, $2) RETURNING id")
                        .bind(&input.name)
                        .bind(input.birth_date)
                        .fetch_one(&mut *tx)
                        .await?;
                let student = Self::one_student(&mut *tx, id).await?.ok_or(sqlx::Error::RowNotFound)?;
                tx.commit().await?;
                tracing::info!(student_id = id, name = %student.name, "student created");
                Ok(student)
            }

            async fn update_student(&self, id: i64, patch: StudentPatch) -> Result<Option<Student>, AppError> {
                let mut tx = self.pool.begin().await?;
                if !Self::student_exists(&mut *tx, id).await? {
                    return Ok(None);
                }
                if let Some(name) = &patch.name {
                    sqlx::query("UPDATE students SET name = $1 WHERE id = $2")
                        .bind(name)
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                }
                if let Some(birth_date) = patch.birth_date {
                    sqlx::query("UPDATE students SET birth_date = $1 WHERE id = $2")
                        .bind(birth_date)
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                }
                let student = Self::one_student(&mut *tx, id).await?;
                tx.commit().await?;
                tracing::info!(student_id = id, "student updated");
                Ok(student)
            }

            async fn delete_student(&self, id: i64) -> Result<bool, AppError> {
                let mut tx = self.pool.begin().await?;
                let unlinked = sqlx::query("DELETE FROM course_students WHERE student_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
                let deleted = sqlx::query("DELETE FROM students WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
                tx.commit().await?;
                if deleted > 0 {
                    tracing::info!(student_id = id, unlinked, "student deleted");
                }
                Ok(deleted > 0)
            }
        }
    };
}

sql_store!(
    /// PostgreSQL store. Schema from `migrations/postgres`.
    PgStore,
    sqlx::Postgres,
    sqlx::PgConnection
);

sql_store!(
    /// SQLite store, used for local runs and tests. Schema from `migrations/sqlite`.
    SqliteStore,
    sqlx::Sqlite,
    sqlx::SqliteConnection
);

impl PgStore {
    /// Connects, creating the database if missing, and applies migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        super::ensure_database_exists(database_url).await?;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations/postgres").run(&pool).await?;
        tracing::info!("postgres store ready");
        Ok(Self::new(pool))
    }
}

impl SqliteStore {
    /// Connects and applies migrations. An in-memory database is held on a
    /// single connection that is never recycled, or its contents would vanish.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| super::invalid_database_url(&e))?
            .create_if_missing(true)
            .foreign_keys(true);
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };
        let pool = pool_options.connect_with(options).await?;
        sqlx::migrate!("./migrations/sqlite").run(&pool).await?;
        tracing::info!(in_memory, "sqlite store ready");
        Ok(Self::new(pool))
    }

    /// Fresh, empty, migrated in-memory database.
    pub async fn in_memory() -> Result<Self, AppError> {
        Self::connect("sqlite::memory:", 1).await
    }
}
