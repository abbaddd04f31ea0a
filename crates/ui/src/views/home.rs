use dioxus::prelude::*;
use dioxus_router::{Link, use_navigator};

use exam_core::model::Role;

use crate::context::AppContext;
use crate::routes::Route;

#[component]
pub fn HomeView() -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let title = ctx.shell_title();
    let role = ctx.role();
    let mut test_id = use_signal(|| "demo".to_string());

    let dashboard_route = match role {
        Role::Admin => Route::Admin {},
        Role::Teacher => Route::Teacher {},
        Role::Student => Route::Student {},
    };

    rsx! {
        div { class: "page home-page",
            h2 { "Welcome to {title}" }
            p { class: "home-page__subtitle", "You are signed in as {role}." }

            div { class: "home-card",
                h3 { "Your dashboard" }
                Link { to: dashboard_route, "Open {role} dashboard" }
            }

            if role == Role::Student {
                div { class: "home-card",
                    h3 { "Take a test" }
                    label { r#for: "home-test-id", "Test id" }
                    input {
                        id: "home-test-id",
                        value: "{test_id}",
                        oninput: move |evt| test_id.set(evt.value()),
                    }
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        onclick: move |_| {
                            let id = test_id().trim().to_string();
                            if !id.is_empty() {
                                let _ = navigator.push(Route::Attempt { test_id: id });
                            }
                        },
                        "Start Attempt"
                    }
                }
            }
        }
    }
}
