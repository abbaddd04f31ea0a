use std::sync::Arc;

use dioxus::document::eval;
use dioxus::prelude::*;
use tokio::sync::Mutex;

use exam_core::model::TestId;
use services::{
    AttemptPhase, MediaState, PaletteEntry, ProctorController, QuestionStatus, SubmissionReceipt,
};

use crate::context::AppContext;
use crate::hooks::use_second_tick;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{AttemptIntent, AttemptVm, markdown_to_html};
use super::scripts::{parse_viewport_event, proctor_watch_script};

/// Proctoring display state mirrored out of the controller after each
/// async operation, so the panel re-renders without locking.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ProctorPanelState {
    media: Option<MediaState>,
    media_error: Option<String>,
    is_fullscreen: bool,
}

#[component]
pub fn AttemptView(test_id: String) -> Element {
    let ctx = use_context::<AppContext>();
    let attempt_loop = ctx.attempt_loop();
    let clock = attempt_loop.clock();
    let test_id = TestId::new(test_id);
    let source = ctx.test_source();

    let error = use_signal(|| None::<ViewError>);
    let vm = use_signal(|| None::<AttemptVm>);
    let receipt = use_signal(|| None::<SubmissionReceipt>);
    let delivering = use_signal(|| false);
    let mut now_ms = use_signal(|| clock.now_ms());
    let panel = use_signal(ProctorPanelState::default);

    // The controller lives outside the signal graph so the teardown task can
    // keep using it while the view unmounts.
    let proctor = use_hook(|| {
        Arc::new(Mutex::new(ProctorController::new(
            ctx.media_devices(),
            ctx.fullscreen(),
        )))
    });

    let resource = {
        let attempt_loop = attempt_loop.clone();
        let test_id = test_id.clone();
        use_resource(move || {
            let attempt_loop = attempt_loop.clone();
            let test_id = test_id.clone();
            let mut vm = vm;
            let mut error = error;
            let mut receipt = receipt;

            async move {
                receipt.set(None);
                let session = attempt_loop
                    .start_attempt(&test_id, source)
                    .await
                    .map_err(|err| match err {
                        services::AttemptError::Catalog(services::CatalogError::NotFound) => {
                            ViewError::TestNotFound
                        }
                        _ => ViewError::Network,
                    })?;
                vm.set(Some(AttemptVm::new(session)));
                error.set(None);
                Ok::<_, ViewError>(())
            }
        })
    };
    let state = view_state_from_resource(&resource);

    // Deliver the pending payload exactly once at a time. Success releases
    // proctoring immediately: the camera never outlives the attempt.
    let deliver_pending = {
        let attempt_loop = attempt_loop.clone();
        let proctor = Arc::clone(&proctor);
        use_callback(move |()| {
            if delivering() {
                return;
            }
            let attempt_loop = attempt_loop.clone();
            let proctor = Arc::clone(&proctor);
            let mut error = error;
            let mut vm = vm;
            let mut receipt = receipt;
            let mut delivering = delivering;
            let mut panel = panel;

            spawn(async move {
                delivering.set(true);
                let taken = { vm.write().take() };
                let Some(mut vm_value) = taken else {
                    delivering.set(false);
                    return;
                };

                let result = vm_value.deliver(&attempt_loop).await;

                // Always put the session back so the UI stays usable after
                // delivery failures.
                {
                    let mut guard = vm.write();
                    *guard = Some(vm_value);
                }

                match result {
                    Ok(result) => {
                        error.set(None);
                        receipt.set(Some(SubmissionReceipt { result }));
                        let mut guard = proctor.lock().await;
                        guard.teardown().await;
                        panel.set(panel_snapshot(&guard));
                    }
                    Err(err) => error.set(Some(err)),
                }
                delivering.set(false);
            });
        })
    };

    let dispatch_intent = use_callback(move |intent: AttemptIntent| {
        let mut vm = vm;
        let now = clock.now_ms();
        {
            let mut guard = vm.write();
            if let Some(vm_value) = guard.as_mut() {
                vm_value.apply(&intent, now);
            }
        }
        let needs_delivery = vm.read().as_ref().is_some_and(AttemptVm::needs_delivery);
        if needs_delivery {
            deliver_pending.call(());
        }
    });

    // 1 s tick: refresh the header timer and let the machine check expiry.
    // The hook cancels the schedule on every unmount path.
    use_second_tick(move || {
        let mut vm = vm;
        let now = clock.now_ms();
        now_ms.set(now);
        let forced = {
            let mut guard = vm.write();
            guard.as_mut().is_some_and(|vm_value| vm_value.observe_tick(now))
        };
        if forced {
            deliver_pending.call(());
        }
    });

    // Viewport events → controller (debounce) → session (count).
    let watcher = use_hook(|| {
        let proctor = Arc::clone(&proctor);
        spawn(async move {
            let mut channel = eval(proctor_watch_script());
            loop {
                let Ok(tag) = channel.recv::<String>().await else {
                    break;
                };
                let Some(event) = parse_viewport_event(&tag) else {
                    continue;
                };
                let now = clock.now_ms();
                let counted = {
                    let mut guard = proctor.lock().await;
                    let counted = guard.observe(event, now);
                    let mut panel = panel;
                    panel.set(panel_snapshot(&guard));
                    counted
                };
                if counted.is_some() {
                    let forced = {
                        let mut vm = vm;
                        let mut guard = vm.write();
                        guard
                            .as_mut()
                            .is_some_and(|vm_value| vm_value.record_violation(now))
                    };
                    if forced {
                        deliver_pending.call(());
                    }
                }
            }
        })
    });
    use_drop(move || watcher.cancel());

    // Acquire camera + fullscreen; also the `Enable` retry after a denial.
    // If the attempt ended while the permission dialog was open, release
    // straight away instead of keeping the stream.
    let enable_proctoring = {
        let proctor = Arc::clone(&proctor);
        use_callback(move |()| {
            let proctor = Arc::clone(&proctor);
            let mut panel = panel;
            spawn(async move {
                panel.with_mut(|value| value.media = Some(MediaState::Requesting));
                let mut guard = proctor.lock().await;
                let _ = guard.start_media().await;
                let _ = guard.enter_fullscreen().await;

                let in_progress = vm
                    .read()
                    .as_ref()
                    .is_some_and(|vm_value| vm_value.phase() == AttemptPhase::InProgress);
                if !in_progress {
                    guard.teardown().await;
                }
                panel.set(panel_snapshot(&guard));
            });
        })
    };

    // Proctoring starts with the attempt.
    use_effect(move || {
        let ready = vm.read().is_some();
        let untouched = panel.read().media.is_none();
        if ready && untouched {
            enable_proctoring.call(());
        }
    });

    // Single teardown path for navigation away mid-attempt: the tick hook
    // cancels itself, the watcher is canceled above, and this task releases
    // media and leaves fullscreen no matter which phase was active.
    let proctor_for_drop = Arc::clone(&proctor);
    use_drop(move || {
        let proctor = Arc::clone(&proctor_for_drop);
        spawn_forever(async move {
            proctor.lock().await.teardown().await;
        });
    });

    let retry_start = use_callback(move |()| {
        let mut resource = resource;
        resource.restart();
    });

    let panel_state = panel.read().clone();
    let now = now_ms();
    let vm_guard = vm.read();
    let phase = vm_guard.as_ref().map(AttemptVm::phase);
    let receipt_state = receipt.read().clone();

    rsx! {
        div { class: "page attempt-page", id: "attempt-root",
            match state {
                ViewState::Idle => rsx! {
                    p { "Idle" }
                },
                ViewState::Loading => rsx! {
                    p { "Loading test..." }
                },
                ViewState::Error(err) => rsx! {
                    div { class: "attempt-retry",
                        p { "{err.message()}" }
                        if err != ViewError::TestNotFound {
                            button {
                                class: "btn btn-secondary",
                                r#type: "button",
                                onclick: move |_| retry_start.call(()),
                                "Retry"
                            }
                        }
                    }
                },
                ViewState::Ready(()) => rsx! {
                    if let Some(receipt) = receipt_state {
                        SubmittedCard { result: receipt.result }
                    } else if phase == Some(AttemptPhase::Submitting) {
                        SubmittingCard {
                            error: *error.read(),
                            reason: vm_guard.as_ref().and_then(|value| value.submit_reason()).map(|reason| reason.as_str()),
                            on_retry: move |()| deliver_pending.call(()),
                        }
                    } else if let Some(vm_value) = vm_guard.as_ref() {
                        AttemptHeader {
                            title: vm_value.title().to_string(),
                            section: vm_value.section_name().to_string(),
                            timer_label: vm_value.timer_label(now),
                            answered: vm_value.progress().answered,
                            total: vm_value.progress().total,
                        }
                        div { class: "attempt-body",
                            QuestionCard { vm_snapshot: question_snapshot(vm_value), on_intent: dispatch_intent }
                            aside { class: "attempt-side",
                                PalettePanel { entries: vm_value.palette(), on_intent: dispatch_intent }
                                ProctorPanel {
                                    panel: panel_state,
                                    violations_label: vm_value.violations_label(),
                                    on_enable: move |()| enable_proctoring.call(()),
                                }
                                button {
                                    class: "btn btn-primary attempt-submit",
                                    id: "attempt-submit",
                                    r#type: "button",
                                    onclick: move |_| dispatch_intent.call(AttemptIntent::Submit),
                                    "Submit Test"
                                }
                            }
                        }
                    } else {
                        p { "No attempt in progress." }
                    }
                },
            }
        }
    }
}

fn panel_snapshot(controller: &ProctorController) -> ProctorPanelState {
    ProctorPanelState {
        media: Some(controller.media_state()),
        media_error: controller.media_error().map(ToString::to_string),
        is_fullscreen: controller.is_fullscreen(),
    }
}

/// Plain-data snapshot of the current question for rendering.
#[derive(Clone, Debug, PartialEq)]
struct QuestionSnapshot {
    question_id: exam_core::model::QuestionId,
    number: usize,
    text_html: String,
    image: Option<String>,
    options: Vec<OptionSnapshot>,
    selected: Option<exam_core::model::OptionId>,
    marked: bool,
    marks: f64,
    negative_marks: f64,
    at_first: bool,
    at_last: bool,
}

#[derive(Clone, Debug, PartialEq)]
struct OptionSnapshot {
    option_id: exam_core::model::OptionId,
    text_html: String,
    image: Option<String>,
}

fn question_snapshot(vm: &AttemptVm) -> QuestionSnapshot {
    let session = vm.session();
    let question = session.current_question();
    let palette = session.palette();
    let number = palette
        .iter()
        .find(|entry| entry.is_current)
        .map_or(1, |entry| entry.number);

    QuestionSnapshot {
        question_id: question.id().clone(),
        number,
        text_html: markdown_to_html(question.text()),
        image: question.image().map(|uri| uri.as_str().to_string()),
        options: question
            .options()
            .iter()
            .map(|option| OptionSnapshot {
                option_id: option.id().clone(),
                text_html: markdown_to_html(option.text()),
                image: option.image().map(|uri| uri.as_str().to_string()),
            })
            .collect(),
        selected: session.sheet().selected(question.id()).cloned(),
        marked: session.sheet().is_marked_for_review(question.id()),
        marks: question.marks(),
        negative_marks: question.negative_marks(),
        at_first: number == 1,
        at_last: number == palette.len(),
    }
}

#[component]
fn AttemptHeader(
    title: String,
    section: String,
    timer_label: String,
    answered: usize,
    total: usize,
) -> Element {
    rsx! {
        header { class: "attempt-header",
            div { class: "attempt-header__titles",
                h2 { "{title}" }
                p { class: "attempt-header__section", "{section}" }
            }
            div { class: "attempt-header__stats",
                span { class: "attempt-header__progress", "{answered} / {total} answered" }
                span { class: "attempt-header__timer", id: "attempt-timer", "{timer_label}" }
            }
        }
    }
}

#[component]
fn QuestionCard(vm_snapshot: QuestionSnapshot, on_intent: EventHandler<AttemptIntent>) -> Element {
    let question_id = vm_snapshot.question_id.clone();
    let clear_id = question_id.clone();
    let review_id = question_id.clone();
    let review_label = if vm_snapshot.marked {
        "Unmark Review"
    } else {
        "Mark for Review"
    };

    rsx! {
        section { class: "question-card",
            div { class: "question-card__meta",
                h3 { "Question {vm_snapshot.number}" }
                span { class: "question-card__marks",
                    "+{vm_snapshot.marks} / -{vm_snapshot.negative_marks}"
                }
            }
            div { class: "question-card__text", dangerous_inner_html: "{vm_snapshot.text_html}" }
            if let Some(image) = vm_snapshot.image.as_deref() {
                img { class: "question-card__image", src: "{image}", alt: "question illustration" }
            }

            ul { class: "question-card__options",
                for option in vm_snapshot.options.clone() {
                    {
                        let is_selected = vm_snapshot.selected.as_ref() == Some(&option.option_id);
                        let class = if is_selected {
                            "option-row option-row--selected"
                        } else {
                            "option-row"
                        };
                        let question_id = question_id.clone();
                        let option_id = option.option_id.clone();
                        rsx! {
                            li {
                                button {
                                    class: "{class}",
                                    r#type: "button",
                                    onclick: move |_| on_intent.call(AttemptIntent::Select(
                                        question_id.clone(),
                                        option_id.clone(),
                                    )),
                                    div { class: "option-row__text", dangerous_inner_html: "{option.text_html}" }
                                    if let Some(image) = option.image.as_deref() {
                                        img { class: "option-row__image", src: "{image}", alt: "option illustration" }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            div { class: "question-card__actions",
                button {
                    class: "btn btn-ghost",
                    r#type: "button",
                    onclick: move |_| on_intent.call(AttemptIntent::ClearAnswer(clear_id.clone())),
                    "Clear Response"
                }
                button {
                    class: "btn btn-ghost",
                    r#type: "button",
                    onclick: move |_| on_intent.call(AttemptIntent::ToggleReview(review_id.clone())),
                    "{review_label}"
                }
                div { class: "question-card__nav",
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        disabled: vm_snapshot.at_first,
                        onclick: move |_| on_intent.call(AttemptIntent::Previous),
                        "Previous"
                    }
                    button {
                        class: "btn btn-secondary",
                        r#type: "button",
                        disabled: vm_snapshot.at_last,
                        onclick: move |_| on_intent.call(AttemptIntent::Next),
                        "Next"
                    }
                }
            }
        }
    }
}

#[component]
fn PalettePanel(entries: Vec<PaletteEntry>, on_intent: EventHandler<AttemptIntent>) -> Element {
    rsx! {
        div { class: "palette",
            h4 { "Questions" }
            div { class: "palette__grid",
                for entry in entries {
                    {
                        let mut class = match entry.status {
                            QuestionStatus::Answered => "palette__cell palette__cell--answered",
                            QuestionStatus::AnsweredAndMarked => {
                                "palette__cell palette__cell--answered-marked"
                            }
                            QuestionStatus::Marked => "palette__cell palette__cell--marked",
                            QuestionStatus::Unanswered => "palette__cell",
                        }
                        .to_string();
                        if entry.is_current {
                            class.push_str(" palette__cell--current");
                        }
                        let section = entry.section;
                        let question = entry.question;
                        rsx! {
                            button {
                                class: "{class}",
                                r#type: "button",
                                onclick: move |_| on_intent.call(AttemptIntent::JumpTo(section, question)),
                                "{entry.number}"
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Camera/fullscreen status plus the violation counter. A denial renders
/// inline with an `Enable` retry and never blocks the question card.
#[component]
fn ProctorPanel(
    panel: ProctorPanelState,
    violations_label: String,
    on_enable: EventHandler<()>,
) -> Element {
    let media_label = match panel.media {
        Some(MediaState::Active) => "Camera on",
        Some(MediaState::Requesting) => "Requesting camera...",
        Some(MediaState::Denied) => "Camera off",
        Some(MediaState::Inactive) | None => "Camera idle",
    };
    let show_enable = matches!(panel.media, Some(MediaState::Denied | MediaState::Inactive) | None);

    rsx! {
        div { class: "proctor-panel",
            h4 { "Proctoring" }
            p { class: "proctor-panel__media", "{media_label}" }
            if let Some(message) = panel.media_error.as_deref() {
                p { class: "inline-error", "{message}" }
            }
            if show_enable {
                button {
                    class: "btn btn-secondary",
                    id: "proctor-enable",
                    r#type: "button",
                    disabled: panel.media == Some(MediaState::Requesting),
                    onclick: move |_| on_enable.call(()),
                    "Enable"
                }
            }
            if !panel.is_fullscreen {
                p { class: "proctor-panel__note", "Stay in fullscreen to avoid violations." }
            }
            p { class: "proctor-panel__violations", "{violations_label}" }
        }
    }
}

#[component]
fn SubmittingCard(
    error: Option<ViewError>,
    reason: Option<&'static str>,
    on_retry: EventHandler<()>,
) -> Element {
    rsx! {
        div { class: "attempt-final",
            h3 { "Submitting your test" }
            if let Some(reason) = reason {
                p { class: "attempt-final__reason", "Reason: {reason}" }
            }
            if let Some(err) = error {
                p { class: "inline-error", "{err.message()}" }
                button {
                    class: "btn btn-primary",
                    id: "attempt-retry-submit",
                    r#type: "button",
                    onclick: move |_| on_retry.call(()),
                    "Retry Submission"
                }
            } else {
                p { "Delivering your answers..." }
            }
        }
    }
}

#[component]
fn SubmittedCard(result: String) -> Element {
    rsx! {
        div { class: "attempt-final",
            h3 { "Test submitted" }
            p { "Your answers were recorded." }
            p { class: "attempt-final__result", "{result}" }
        }
    }
}
