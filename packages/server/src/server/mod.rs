// Transport wiring: webhook app and long-polling loop. The domains never
// know which delivery mechanism is in use.

pub mod app;
pub mod polling;

pub use app::{build_app, AppState};
pub use polling::run_polling;
