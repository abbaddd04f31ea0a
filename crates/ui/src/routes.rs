use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable};

use exam_core::model::Role;

use crate::context::AppContext;
use crate::views::{
    AdminDashboard, AttemptView, CurriculumView, HomeView, StudentDashboard, TeacherDashboard,
};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", HomeView)] Home {},
        #[route("/admin", AdminDashboard)] Admin {},
        #[route("/teacher", TeacherDashboard)] Teacher {},
        #[route("/student", StudentDashboard)] Student {},
        #[route("/curriculum", CurriculumView)] Curriculum {},
        #[route("/attempt/:test_id", AttemptView)] Attempt { test_id: String },
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            Sidebar {}
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn Sidebar() -> Element {
    let ctx = use_context::<AppContext>();
    let title = ctx.shell_title();
    let role = ctx.role();

    rsx! {
        nav { class: "sidebar",
            h1 { "{title}" }
            p { class: "sidebar__role", "Signed in as {role}" }
            ul {
                li { Link { to: Route::Home {}, "Home" } }
                match role {
                    Role::Admin => rsx! {
                        li { Link { to: Route::Admin {}, "Admin" } }
                        li { Link { to: Route::Curriculum {}, "Curriculum" } }
                    },
                    Role::Teacher => rsx! {
                        li { Link { to: Route::Teacher {}, "Teacher" } }
                        li { Link { to: Route::Curriculum {}, "Curriculum" } }
                    },
                    Role::Student => rsx! {
                        li { Link { to: Route::Student {}, "Dashboard" } }
                    },
                }
            }
        }
    }
}

/// Thin role gate: renders the child only for the allowed roles, a notice
/// otherwise. Authorization proper lives behind the backend collaborator.
#[component]
pub fn RequireRole(allowed: Vec<Role>, children: Element) -> Element {
    let ctx = use_context::<AppContext>();
    if allowed.contains(&ctx.role()) {
        rsx! { {children} }
    } else {
        rsx! {
            div { class: "not-authorized",
                h2 { "Not authorized" }
                p { "Your role does not have access to this page." }
                Link { to: Route::Home {}, "Back to Home" }
            }
        }
    }
}
