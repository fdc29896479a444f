//! Shared harness: a fresh in-memory database per test, the full router
//! driven in-process, and factories for bulk fixtures.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use student_courses::{app, AppConfig, AppState, Course, NewCourse, NewStudent, SqliteStore, Store, Student};
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub store: Arc<dyn Store>,
    router: Router,
}

pub async fn spawn() -> TestApp {
    let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().await.expect("in-memory store"));
    let router = app(AppState::new(store.clone()), &AppConfig::default());
    TestApp { store, router }
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

impl TestApp {
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.send_raw(method, uri, body.map(|v| v.to_string())).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is JSON")
        };
        (status, json)
    }

    pub async fn send_raw(&self, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(text) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(text)
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        (status, bytes.to_vec())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn get_html(&self, uri: &str) -> (StatusCode, String) {
        let (status, bytes) = self.send_raw(Method::GET, uri, None).await;
        (status, String::from_utf8(bytes).expect("utf-8 html"))
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    /// `quantity` courses with unique random names, created in id order.
    pub async fn course_factory(&self, quantity: usize) -> Vec<Course> {
        let mut out = Vec::with_capacity(quantity);
        for _ in 0..quantity {
            let course = self
                .store
                .create_course(NewCourse::named(unique("course")))
                .await
                .expect("create course");
            out.push(course);
        }
        out
    }

    /// `quantity` students with unique random names and no birth date.
    pub async fn student_factory(&self, quantity: usize) -> Vec<Student> {
        let mut out = Vec::with_capacity(quantity);
        for _ in 0..quantity {
            let student = self
                .store
                .create_student(NewStudent::named(unique("student")))
                .await
                .expect("create student");
            out.push(student);
        }
        out
    }

    pub async fn make_student(&self, name: &str) -> Student {
        self.store
            .create_student(NewStudent::named(name))
            .await
            .expect("create student")
    }

    pub async fn enroll(&self, course_id: i64, student_ids: &[i64]) -> Course {
        self.store
            .add_course_students(course_id, student_ids)
            .await
            .expect("add students")
            .expect("course exists")
    }

    pub async fn courses_named(&self, name: &str) -> Vec<Course> {
        self.store
            .list_courses(&student_courses::ListFilter::by_name(name))
            .await
            .expect("list courses")
    }
}
