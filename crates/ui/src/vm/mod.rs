mod attempt_vm;
mod markdown_vm;
mod time_fmt;

pub use attempt_vm::{AttemptIntent, AttemptVm};
pub use markdown_vm::{markdown_to_html, sanitize_html};
pub use time_fmt::format_datetime;
