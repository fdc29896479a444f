use maud::{html, Markup, Render, DOCTYPE};

/// Full admin page around `body`.
pub fn page(page_title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="UTF-8" {}
                meta name="viewport" content="width=device-width, initial-scale=1.0" {}
                title { (page_title) " | Student admin" }
            }
            body {
                nav {
                    a href="/admin/" { "Admin" }
                    " | "
                    a href="/admin/courses/" { "Courses" }
                    " | "
                    a href="/admin/students/" { "Students" }
                }
                main {
                    (body)
                }
            }
        }
    }
}

pub fn render_table<const N: usize>(
    overall_title: &str,
    titles: [&'static str; N],
    items: Vec<[Markup; N]>,
) -> Markup {
    html! {
        div class="listing" {
            (title(overall_title))
            p class="count" { (items.len()) " total" }
            table {
                thead {
                    tr {
                        @for title in titles {
                            th { (title) }
                        }
                    }
                }
                tbody {
                    @for row in items {
                        tr {
                            @for col in row {
                                td { (col) }
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn title(s: impl Render) -> Markup {
    html! {
        h1 { (s) }
    }
}
