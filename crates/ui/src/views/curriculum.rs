use dioxus::prelude::*;

use exam_core::model::{Chapter, ChapterDraft, ChapterId, Role, Topic, TopicDraft};

use crate::context::AppContext;
use crate::routes::RequireRole;
use crate::views::{ViewError, ViewState, view_state_from_resource};

#[derive(Clone, Debug, PartialEq)]
enum ModalState {
    Closed,
    CreateChapter,
    RenameChapter(Chapter),
    CreateTopic(ChapterId),
}

#[component]
pub fn CurriculumView() -> Element {
    rsx! {
        RequireRole { allowed: vec![Role::Admin, Role::Teacher],
            CurriculumEditor {}
        }
    }
}

#[component]
fn CurriculumEditor() -> Element {
    let ctx = use_context::<AppContext>();
    let error = use_signal(|| None::<ViewError>);
    let mut modal = use_signal(|| ModalState::Closed);
    let mut selected = use_signal(|| None::<ChapterId>);

    let chapters_resource = {
        let curriculum = ctx.curriculum();
        use_resource(move || {
            let curriculum = curriculum.clone();
            async move {
                curriculum
                    .list_chapters()
                    .await
                    .map_err(|_| ViewError::Network)
            }
        })
    };

    let topics_resource = {
        let curriculum = ctx.curriculum();
        use_resource(move || {
            let curriculum = curriculum.clone();
            let chapter = selected();
            async move {
                let Some(chapter) = chapter else {
                    return Ok(Vec::<Topic>::new());
                };
                curriculum
                    .list_topics(chapter)
                    .await
                    .map_err(|_| ViewError::Network)
            }
        })
    };

    let on_saved = use_callback(move |()| {
        let mut chapters_resource = chapters_resource;
        let mut topics_resource = topics_resource;
        modal.set(ModalState::Closed);
        chapters_resource.restart();
        topics_resource.restart();
    });

    let delete_chapter = {
        let curriculum = ctx.curriculum();
        use_callback(move |id: ChapterId| {
            let curriculum = curriculum.clone();
            let mut error = error;
            spawn(async move {
                match curriculum.delete_chapter(id).await {
                    Ok(()) => on_saved.call(()),
                    Err(_) => error.set(Some(ViewError::Network)),
                }
            });
        })
    };

    let delete_topic = {
        let curriculum = ctx.curriculum();
        use_callback(move |topic: Topic| {
            let curriculum = curriculum.clone();
            let mut error = error;
            spawn(async move {
                match curriculum.delete_topic(topic.id()).await {
                    Ok(()) => on_saved.call(()),
                    Err(_) => error.set(Some(ViewError::Network)),
                }
            });
        })
    };

    let chapters_state = view_state_from_resource(&chapters_resource);
    let topics_state = view_state_from_resource(&topics_resource);
    let modal_state = modal();

    rsx! {
        div { class: "page curriculum-page",
            header { class: "curriculum-header",
                h2 { "Curriculum" }
                button {
                    class: "btn btn-primary",
                    r#type: "button",
                    onclick: move |_| modal.set(ModalState::CreateChapter),
                    "New Chapter"
                }
            }
            if let Some(err) = *error.read() {
                p { class: "inline-error", "{err.message()}" }
            }

            div { class: "curriculum-columns",
                section { class: "curriculum-list",
                    h3 { "Chapters" }
                    match chapters_state {
                        ViewState::Idle | ViewState::Loading => rsx! {
                            p { "Loading..." }
                        },
                        ViewState::Error(err) => rsx! {
                            p { "{err.message()}" }
                            button {
                                class: "btn btn-secondary",
                                r#type: "button",
                                onclick: move |_| {
                                    let mut chapters_resource = chapters_resource;
                                    chapters_resource.restart();
                                },
                                "Retry"
                            }
                        },
                        ViewState::Ready(chapters) => rsx! {
                            if chapters.is_empty() {
                                p { "No chapters yet. Create the first one." }
                            }
                            ul {
                                for chapter in chapters {
                                    ChapterRow {
                                        chapter: chapter.clone(),
                                        is_selected: selected() == Some(chapter.id()),
                                        on_select: move |id| selected.set(Some(id)),
                                        on_rename: move |chapter| modal.set(ModalState::RenameChapter(chapter)),
                                        on_delete: delete_chapter,
                                    }
                                }
                            }
                        },
                    }
                }

                section { class: "curriculum-list",
                    h3 { "Topics" }
                    if let Some(chapter_id) = selected() {
                        button {
                            class: "btn btn-secondary",
                            r#type: "button",
                            onclick: move |_| modal.set(ModalState::CreateTopic(chapter_id)),
                            "New Topic"
                        }
                        match topics_state {
                            ViewState::Idle | ViewState::Loading => rsx! {
                                p { "Loading..." }
                            },
                            ViewState::Error(err) => rsx! {
                                p { "{err.message()}" }
                            },
                            ViewState::Ready(topics) => rsx! {
                                ul {
                                    for topic in topics {
                                        li { class: "topic-row",
                                            span { "{topic.title()}" }
                                            button {
                                                class: "btn btn-ghost",
                                                r#type: "button",
                                                onclick: {
                                                    let topic = topic.clone();
                                                    move |_| delete_topic.call(topic.clone())
                                                },
                                                "Delete"
                                            }
                                        }
                                    }
                                }
                            },
                        }
                    } else {
                        p { "Select a chapter to see its topics." }
                    }
                }
            }

            if modal_state != ModalState::Closed {
                CurriculumModal { state: modal_state, on_saved, on_close: move |()| modal.set(ModalState::Closed) }
            }
        }
    }
}

#[component]
fn ChapterRow(
    chapter: Chapter,
    is_selected: bool,
    on_select: EventHandler<ChapterId>,
    on_rename: EventHandler<Chapter>,
    on_delete: EventHandler<ChapterId>,
) -> Element {
    let row_class = if is_selected {
        "chapter-row chapter-row--selected"
    } else {
        "chapter-row"
    };
    let id = chapter.id();
    let rename_target = chapter.clone();

    rsx! {
        li { class: "{row_class}",
            button {
                class: "chapter-row__title",
                r#type: "button",
                onclick: move |_| on_select.call(id),
                "{chapter.title()}"
            }
            button {
                class: "btn btn-ghost",
                r#type: "button",
                onclick: move |_| on_rename.call(rename_target.clone()),
                "Rename"
            }
            button {
                class: "btn btn-ghost",
                r#type: "button",
                onclick: move |_| on_delete.call(id),
                "Delete"
            }
        }
    }
}

/// Shared create/rename modal. Validation errors from the draft surface
/// inline next to the field that caused them.
#[component]
fn CurriculumModal(
    state: ModalState,
    on_saved: EventHandler<()>,
    on_close: EventHandler<()>,
) -> Element {
    let ctx = use_context::<AppContext>();
    let mut title = use_signal(|| match &state {
        ModalState::RenameChapter(chapter) => chapter.title().to_string(),
        _ => String::new(),
    });
    let mut description = use_signal(|| match &state {
        ModalState::RenameChapter(chapter) => {
            chapter.description().map(ToString::to_string).unwrap_or_default()
        }
        _ => String::new(),
    });
    let mut field_error = use_signal(|| None::<String>);

    let heading = match &state {
        ModalState::CreateChapter => "New Chapter",
        ModalState::RenameChapter(_) => "Rename Chapter",
        ModalState::CreateTopic(_) => "New Topic",
        ModalState::Closed => "",
    };

    let on_save = {
        let curriculum = ctx.curriculum();
        let state = state.clone();
        use_callback(move |()| {
            let curriculum = curriculum.clone();
            let state = state.clone();
            let title_value = title();
            let description_value = description();
            let mut field_error = field_error;
            spawn(async move {
                let description_value = if description_value.trim().is_empty() {
                    None
                } else {
                    Some(description_value)
                };
                let result = match state {
                    ModalState::CreateChapter => curriculum
                        .create_chapter(ChapterDraft {
                            title: title_value,
                            description: description_value,
                            position: 0,
                        })
                        .await
                        .map(|_| ()),
                    ModalState::RenameChapter(chapter) => curriculum
                        .rename_chapter(
                            chapter.id(),
                            ChapterDraft {
                                title: title_value,
                                description: description_value,
                                position: chapter.position(),
                            },
                        )
                        .await
                        .map(|_| ()),
                    ModalState::CreateTopic(chapter_id) => curriculum
                        .create_topic(
                            chapter_id,
                            TopicDraft {
                                title: title_value,
                                position: 0,
                            },
                        )
                        .await
                        .map(|_| ()),
                    ModalState::Closed => Ok(()),
                };

                match result {
                    Ok(()) => on_saved.call(()),
                    Err(services::CurriculumApiError::Validation(err)) => {
                        field_error.set(Some(err.to_string()));
                    }
                    Err(_) => field_error.set(Some(ViewError::Network.message().to_string())),
                }
            });
        })
    };

    let show_description = matches!(
        state,
        ModalState::CreateChapter | ModalState::RenameChapter(_)
    );

    rsx! {
        div { class: "modal-overlay",
            div { class: "modal", role: "dialog", aria_modal: "true",
                h3 { "{heading}" }
                label { r#for: "curriculum-title", "Title" }
                input {
                    id: "curriculum-title",
                    value: "{title}",
                    oninput: move |evt| title.set(evt.value()),
                }
                if show_description {
                    label { r#for: "curriculum-description", "Description (optional)" }
                    textarea {
                        id: "curriculum-description",
                        value: "{description}",
                        oninput: move |evt| description.set(evt.value()),
                    }
                }
                if let Some(message) = field_error() {
                    p { class: "inline-error", "{message}" }
                }
                div { class: "modal__actions",
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        onclick: move |_| on_close.call(()),
                        "Cancel"
                    }
                    button {
                        class: "btn btn-primary",
                        r#type: "button",
                        onclick: move |_| on_save.call(()),
                        "Save"
                    }
                }
            }
        }
    }
}
