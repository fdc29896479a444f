//! Student API integration tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use student_courses::ListFilter;

#[tokio::test]
async fn create_student_with_birth_date() {
    let app = common::spawn().await;

    let (status, body) = app
        .post("/api/v1/students/", json!({"name": "John Wick", "birth_date": "1964-09-02"}))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "John Wick");
    assert_eq!(body["birth_date"], "1964-09-02");
    assert_eq!(body["courses"], json!([]));
}

#[tokio::test]
async fn create_student_without_birth_date() {
    let app = common::spawn().await;

    let (status, body) = app.post("/api/v1/students", json!({"name": "No Date"})).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["birth_date"].is_null());
}

#[tokio::test]
async fn create_student_with_bad_date_is_rejected() {
    let app = common::spawn().await;

    let (status, body) = app
        .post("/api/v1/students/", json!({"name": "Bad Date", "birth_date": "yesterday"}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["birth_date"].is_array());
    assert!(app.store.list_students(&ListFilter::by_name("Bad Date")).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_students_filters_by_name_and_id() {
    let app = common::spawn().await;
    let students = app.student_factory(5).await;

    let (_, by_name) = app.get(&format!("/api/v1/students/?name={}", students[3].name)).await;
    let (_, by_id) = app.get(&format!("/api/v1/students/?id={}", students[1].id)).await;
    let (_, all) = app.get("/api/v1/students/").await;

    assert_eq!(by_name.as_array().unwrap().len(), 1);
    assert_eq!(by_name[0]["id"], students[3].id);
    assert_eq!(by_id[0]["name"], students[1].name);
    assert_eq!(all.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn student_lists_its_courses() {
    let app = common::spawn().await;
    let courses = app.course_factory(3).await;
    let student = app.make_student("Enrolled").await;
    app.enroll(courses[2].id, &[student.id]).await;
    app.enroll(courses[0].id, &[student.id]).await;

    let (status, body) = app.get(&format!("/api/v1/students/{}/", student.id)).await;

    assert_eq!(status, StatusCode::OK);
    let mut listed: Vec<i64> = body["courses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();
    listed.sort_unstable();
    assert_eq!(listed, vec![courses[0].id, courses[2].id]);
}

#[tokio::test]
async fn patch_student_changes_only_supplied_fields() {
    let app = common::spawn().await;
    let (_, created) = app
        .post("/api/v1/students/", json!({"name": "Before", "birth_date": "2001-01-01"}))
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, renamed) = app
        .patch(&format!("/api/v1/students/{}/", id), json!({"name": "After"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "After");
    assert_eq!(renamed["birth_date"], "2001-01-01");

    let (status, cleared) = app
        .patch(&format!("/api/v1/students/{}/", id), json!({"birth_date": null}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["name"], "After");
    assert!(cleared["birth_date"].is_null());
}

#[tokio::test]
async fn put_student_requires_name() {
    let app = common::spawn().await;
    let student = app.make_student("Stays").await;

    let (status, body) = app
        .put(&format!("/api/v1/students/{}/", student.id), json!({"birth_date": "1999-12-31"}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["name"][0], "This field is required.");
}

#[tokio::test]
async fn delete_student_keeps_its_courses() {
    let app = common::spawn().await;
    let course = app.course_factory(1).await.remove(0);
    let students = app.student_factory(2).await;
    app.enroll(course.id, &[students[0].id, students[1].id]).await;

    let (status, _) = app.delete(&format!("/api/v1/students/{}/", students[0].id)).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    let course = app.store.get_course(course.id).await.unwrap().expect("course survives");
    assert_eq!(course.students, vec![students[1].id]);
    let (status, _) = app.get(&format!("/api/v1/students/{}/", students[0].id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_student_is_not_found() {
    let app = common::spawn().await;

    let (read, _) = app.get("/api/v1/students/55/").await;
    let (patch, _) = app.patch("/api/v1/students/55/", json!({"name": "x"})).await;
    let (delete, _) = app.delete("/api/v1/students/55/").await;

    assert_eq!(read, StatusCode::NOT_FOUND);
    assert_eq!(patch, StatusCode::NOT_FOUND);
    assert_eq!(delete, StatusCode::NOT_FOUND);
}
