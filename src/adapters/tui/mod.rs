pub mod app;
pub mod event;
pub mod form;
pub mod widgets;

pub use app::{run_tui, PreviewSettings, WizardApp};
