//! Read-only admin listing: one table per record type.

use crate::error::AppError;
use crate::markup::{page, render_table, title};
use crate::model::ListFilter;
use crate::state::AppState;
use axum::extract::State;
use maud::{html, Markup};

pub async fn index() -> Markup {
    page(
        "Admin",
        html! {
            (title("Site administration"))
            ul {
                li { a href="/admin/courses/" { "Courses" } }
                li { a href="/admin/students/" { "Students" } }
            }
        },
    )
}

pub async fn courses(State(state): State<AppState>) -> Result<Markup, AppError> {
    let rows = state
        .store
        .list_courses(&ListFilter::default())
        .await?
        .into_iter()
        .map(|course| [html! { (course.id) }, html! { (course.name) }])
        .collect();
    Ok(page("Courses", render_table("Courses", ["ID", "Name"], rows)))
}

pub async fn students(State(state): State<AppState>) -> Result<Markup, AppError> {
    let rows = state
        .store
        .list_students(&ListFilter::default())
        .await?
        .into_iter()
        .map(|student| {
            [
                html! { (student.id) },
                html! { (student.name) },
                html! {
                    @if let Some(date) = student.birth_date {
                        (date.format("%Y-%m-%d"))
                    } @else {
                        "-"
                    }
                },
            ]
        })
        .collect();
    Ok(page(
        "Students",
        render_table("Students", ["ID", "Name", "Birth date"], rows),
    ))
}
