//! Students, courses, and the inputs that create or change them.

use chrono::NaiveDate;
use serde::Serialize;

/// A course with the ids of its students, in the order they were added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub students: Vec<i64>,
}

/// A student with the ids of the courses it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub courses: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub name: String,
    pub students: Vec<i64>,
}

impl NewCourse {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            students: Vec::new(),
        }
    }
}

/// Fields left as `None` are not touched. `students` replaces the whole set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoursePatch {
    pub name: Option<String>,
    pub students: Option<Vec<i64>>,
}

impl From<NewCourse> for CoursePatch {
    fn from(full: NewCourse) -> Self {
        Self {
            name: Some(full.name),
            students: Some(full.students),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
    pub birth_date: Option<NaiveDate>,
}

impl NewStudent {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            birth_date: None,
        }
    }
}

/// `birth_date: Some(None)` clears the date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub birth_date: Option<Option<NaiveDate>>,
}

impl From<NewStudent> for StudentPatch {
    fn from(full: NewStudent) -> Self {
        Self {
            name: Some(full.name),
            birth_date: Some(full.birth_date),
        }
    }
}

/// Exact-match list filters. Both set means both must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub id: Option<i64>,
    pub name: Option<String>,
}

impl ListFilter {
    pub fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            name: None,
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }
}
