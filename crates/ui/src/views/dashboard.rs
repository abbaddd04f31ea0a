use dioxus::prelude::*;
use dioxus_router::Link;

use exam_core::model::Role;

use crate::context::AppContext;
use crate::routes::{RequireRole, Route};
use crate::views::{ViewError, ViewState, view_state_from_resource};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CurriculumCounts {
    chapters: usize,
    topics: usize,
}

/// Load chapter/topic counts for the stat tiles. Thin data-binding: the
/// backend owns the numbers, the dashboard just displays them.
fn use_curriculum_counts() -> Resource<Result<CurriculumCounts, ViewError>> {
    let ctx = use_context::<AppContext>();
    use_resource(move || {
        let curriculum = ctx.curriculum();
        async move {
            let chapters = curriculum
                .list_chapters()
                .await
                .map_err(|_| ViewError::Network)?;
            let mut topics = 0;
            for chapter in &chapters {
                topics += curriculum
                    .list_topics(chapter.id())
                    .await
                    .map_err(|_| ViewError::Network)?
                    .len();
            }
            Ok(CurriculumCounts {
                chapters: chapters.len(),
                topics,
            })
        }
    })
}

#[component]
fn StatTile(label: &'static str, value: String) -> Element {
    rsx! {
        div { class: "stat-tile",
            span { class: "stat-tile__value", "{value}" }
            span { class: "stat-tile__label", "{label}" }
        }
    }
}

#[component]
fn CurriculumStats() -> Element {
    let resource = use_curriculum_counts();
    let state = view_state_from_resource(&resource);

    rsx! {
        match state {
            ViewState::Idle | ViewState::Loading => rsx! {
                p { "Loading stats..." }
            },
            ViewState::Error(err) => rsx! {
                p { "{err.message()}" }
                button {
                    class: "btn btn-secondary",
                    r#type: "button",
                    onclick: move |_| {
                        let mut resource = resource;
                        resource.restart();
                    },
                    "Retry"
                }
            },
            ViewState::Ready(counts) => rsx! {
                div { class: "stat-row",
                    StatTile { label: "Chapters", value: counts.chapters.to_string() }
                    StatTile { label: "Topics", value: counts.topics.to_string() }
                }
            },
        }
    }
}

#[component]
pub fn AdminDashboard() -> Element {
    rsx! {
        RequireRole { allowed: vec![Role::Admin],
            div { class: "page dashboard-page",
                h2 { "Admin Dashboard" }
                CurriculumStats {}
                div { class: "dashboard-links",
                    Link { to: Route::Curriculum {}, "Manage curriculum" }
                }
            }
        }
    }
}

#[component]
pub fn TeacherDashboard() -> Element {
    rsx! {
        RequireRole { allowed: vec![Role::Admin, Role::Teacher],
            div { class: "page dashboard-page",
                h2 { "Teacher Dashboard" }
                CurriculumStats {}
                div { class: "dashboard-links",
                    Link { to: Route::Curriculum {}, "Edit chapters and topics" }
                }
            }
        }
    }
}

#[component]
pub fn StudentDashboard() -> Element {
    rsx! {
        RequireRole { allowed: vec![Role::Admin, Role::Teacher, Role::Student],
            div { class: "page dashboard-page",
                h2 { "Student Dashboard" }
                CurriculumStats {}
                p { "Start a test from the home page when your teacher shares its id." }
                div { class: "dashboard-links",
                    Link { to: Route::Home {}, "Back to Home" }
                }
            }
        }
    }
}
