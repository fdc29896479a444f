//! Request validation: JSON bodies and query strings into typed inputs.
//!
//! Every field is checked before anything is reported, so a response carries
//! all problems with a body at once.

use crate::error::{AppError, FieldErrors};
use crate::model::{CoursePatch, ListFilter, NewCourse, NewStudent, StudentPatch};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

pub const NAME_MAX_LENGTH: usize = 255;
const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct RequestValidator;

impl RequestValidator {
    /// Exact-match filters from the query string. Empty values are ignored,
    /// unknown keys are ignored, a non-integer `id` is rejected.
    pub fn list_filter(params: &HashMap<String, String>) -> Result<ListFilter, AppError> {
        let mut filter = ListFilter::default();
        if let Some(raw) = params.get("id").map(|s| s.trim()).filter(|s| !s.is_empty()) {
            let id = raw
                .parse::<i64>()
                .map_err(|_| AppError::BadRequest(format!("id filter must be an integer, got {:?}", raw)))?;
            filter.id = Some(id);
        }
        if let Some(name) = params.get("name").filter(|s| !s.is_empty()) {
            filter.name = Some(name.clone());
        }
        Ok(filter)
    }

    pub fn new_course(body: Value) -> Result<NewCourse, AppError> {
        let body = body_to_map(body)?;
        let mut errors = FieldErrors::new();
        let name = required_name(&body, &mut errors);
        let students = match body.get("students") {
            Some(v) => id_list("students", v, &mut errors),
            None => Some(Vec::new()),
        };
        finish(errors)?;
        match (name, students) {
            (Some(name), Some(students)) => Ok(NewCourse { name, students }),
            _ => Err(AppError::BadRequest("invalid course body".into())),
        }
    }

    pub fn course_patch(body: Value) -> Result<CoursePatch, AppError> {
        let body = body_to_map(body)?;
        let mut errors = FieldErrors::new();
        let name = body.get("name").and_then(|v| name_value(v, &mut errors));
        let students = body
            .get("students")
            .and_then(|v| id_list("students", v, &mut errors));
        finish(errors)?;
        Ok(CoursePatch { name, students })
    }

    pub fn new_student(body: Value) -> Result<NewStudent, AppError> {
        let body = body_to_map(body)?;
        let mut errors = FieldErrors::new();
        let name = required_name(&body, &mut errors);
        let birth_date = match body.get("birth_date") {
            Some(v) => birth_date_value(v, &mut errors),
            None => Some(None),
        };
        finish(errors)?;
        match (name, birth_date) {
            (Some(name), Some(birth_date)) => Ok(NewStudent { name, birth_date }),
            _ => Err(AppError::BadRequest("invalid student body".into())),
        }
    }

    pub fn student_patch(body: Value) -> Result<StudentPatch, AppError> {
        let body = body_to_map(body)?;
        let mut errors = FieldErrors::new();
        let name = body.get("name").and_then(|v| name_value(v, &mut errors));
        let birth_date = body
            .get("birth_date")
            .and_then(|v| birth_date_value(v, &mut errors));
        finish(errors)?;
        Ok(StudentPatch { name, birth_date })
    }
}

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

fn finish(errors: FieldErrors) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn push(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors.entry(field.to_string()).or_default().push(message.into());
}

fn required_name(body: &Map<String, Value>, errors: &mut FieldErrors) -> Option<String> {
    match body.get("name") {
        Some(v) => name_value(v, errors),
        None => {
            push(errors, "name", "This field is required.");
            None
        }
    }
}

/// Trimmed, non-blank, bounded text.
fn name_value(v: &Value, errors: &mut FieldErrors) -> Option<String> {
    let s = match v {
        Value::String(s) => s.trim(),
        Value::Null => {
            push(errors, "name", "This field may not be null.");
            return None;
        }
        _ => {
            push(errors, "name", "Not a valid string.");
            return None;
        }
    };
    if s.is_empty() {
        push(errors, "name", "This field may not be blank.");
        return None;
    }
    if s.chars().count() > NAME_MAX_LENGTH {
        push(
            errors,
            "name",
            format!("Ensure this field has no more than {} characters.", NAME_MAX_LENGTH),
        );
        return None;
    }
    Some(s.to_string())
}

/// Array of integer ids; duplicates dropped keeping the first occurrence.
fn id_list(field: &str, v: &Value, errors: &mut FieldErrors) -> Option<Vec<i64>> {
    let Value::Array(items) = v else {
        push(errors, field, "Expected a list of ids.");
        return None;
    };
    let mut out: Vec<i64> = Vec::with_capacity(items.len());
    let mut seen: HashSet<i64> = HashSet::with_capacity(items.len());
    let mut ok = true;
    for item in items {
        match item.as_i64() {
            Some(id) => {
                if seen.insert(id) {
                    out.push(id);
                }
            }
            None => {
                push(errors, field, format!("Incorrect type. Expected pk value, received {}.", item));
                ok = false;
            }
        }
    }
    ok.then_some(out)
}

/// `Some(None)` for an explicit null.
fn birth_date_value(v: &Value, errors: &mut FieldErrors) -> Option<Option<NaiveDate>> {
    match v {
        Value::Null => Some(None),
        Value::String(s) => match NaiveDate::parse_from_str(s.trim(), DATE_FORMAT) {
            Ok(d) => Some(Some(d)),
            Err(_) => {
                push(errors, "birth_date", "Date has wrong format. Use YYYY-MM-DD.");
                None
            }
        },
        _ => {
            push(errors, "birth_date", "Date has wrong format. Use YYYY-MM-DD.");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn field_errors(err: AppError) -> FieldErrors {
        match err {
            AppError::Validation(fields) => fields,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn filter_parses_id_and_name() {
        let f = RequestValidator::list_filter(&params(&[("id", "7"), ("name", "Math")])).unwrap();
        assert_eq!(f.id, Some(7));
        assert_eq!(f.name.as_deref(), Some("Math"));
    }

    #[test]
    fn filter_ignores_empty_and_unknown_params() {
        let f = RequestValidator::list_filter(&params(&[("id", ""), ("name", ""), ("page", "2")])).unwrap();
        assert_eq!(f, ListFilter::default());
    }

    #[test]
    fn filter_rejects_non_integer_id() {
        let err = RequestValidator::list_filter(&params(&[("id", "abc")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn new_course_requires_name() {
        let fields = field_errors(RequestValidator::new_course(json!({})).unwrap_err());
        assert_eq!(fields["name"], vec!["This field is required.".to_string()]);
    }

    #[test]
    fn new_course_trims_name_and_dedups_students() {
        let c = RequestValidator::new_course(json!({"name": "  Physics ", "students": [3, 1, 3]})).unwrap();
        assert_eq!(c.name, "Physics");
        assert_eq!(c.students, vec![3, 1]);
    }

    #[test]
    fn large_student_lists_dedup_in_first_seen_order() {
        let mut ids: Vec<i64> = (1..=50_000).rev().collect();
        ids.extend(1..=50_000);
        let c = RequestValidator::new_course(json!({"name": "Big", "students": ids})).unwrap();
        assert_eq!(c.students.len(), 50_000);
        assert_eq!(c.students[0], 50_000);
        assert_eq!(c.students[49_999], 1);
    }

    #[test]
    fn new_course_reports_every_bad_field() {
        let fields =
            field_errors(RequestValidator::new_course(json!({"name": "   ", "students": ["x"]})).unwrap_err());
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("students"));
    }

    #[test]
    fn name_length_is_bounded() {
        let long = "a".repeat(NAME_MAX_LENGTH + 1);
        let fields = field_errors(RequestValidator::course_patch(json!({ "name": long })).unwrap_err());
        assert!(fields["name"][0].contains("255"));
    }

    #[test]
    fn course_patch_keeps_absent_fields_unset() {
        let p = RequestValidator::course_patch(json!({"name": "History"})).unwrap();
        assert_eq!(p.name.as_deref(), Some("History"));
        assert_eq!(p.students, None);
    }

    #[test]
    fn course_patch_rejects_null_name() {
        let fields = field_errors(RequestValidator::course_patch(json!({"name": null})).unwrap_err());
        assert_eq!(fields["name"], vec!["This field may not be null.".to_string()]);
    }

    #[test]
    fn non_object_body_is_bad_request() {
        let err = RequestValidator::new_course(json!(["name"])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn student_birth_date_parses_and_clears() {
        let s = RequestValidator::new_student(json!({"name": "John Wick", "birth_date": "1964-09-02"})).unwrap();
        assert_eq!(s.birth_date, NaiveDate::from_ymd_opt(1964, 9, 2));

        let p = RequestValidator::student_patch(json!({"birth_date": null})).unwrap();
        assert_eq!(p.birth_date, Some(None));
        assert_eq!(p.name, None);
    }

    #[test]
    fn student_birth_date_rejects_other_formats() {
        let fields = field_errors(
            RequestValidator::new_student(json!({"name": "Ann", "birth_date": "02/09/1964"})).unwrap_err(),
        );
        assert!(fields.contains_key("birth_date"));
    }
}
