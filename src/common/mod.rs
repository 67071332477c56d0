pub mod readiness;
pub mod state;

pub use readiness::Readiness;
pub use state::AppState;
