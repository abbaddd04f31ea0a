use std::time::Duration;

use dioxus::prelude::*;

/// Run `on_tick` once per second for the lifetime of the component.
///
/// The component owns the schedule, not the timer value: the task is created
/// once on mount and canceled on every unmount path, so a navigation away
/// from the attempt view always stops the tick.
pub fn use_second_tick(on_tick: impl FnMut() + 'static) {
    let task = use_hook(|| {
        let mut on_tick = on_tick;
        spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick of a tokio interval fires immediately; skip it
            // so callers see ticks at one-second marks only.
            interval.tick().await;
            loop {
                interval.tick().await;
                on_tick();
            }
        })
    });

    use_drop(move || task.cancel());
}
