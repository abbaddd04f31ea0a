mod attempt;
mod curriculum;
mod dashboard;
mod home;
mod state;

pub use attempt::AttemptView;
pub use curriculum::CurriculumView;
pub use dashboard::{AdminDashboard, StudentDashboard, TeacherDashboard};
pub use home::HomeView;
pub use state::{ViewError, ViewState, view_state_from_resource};
