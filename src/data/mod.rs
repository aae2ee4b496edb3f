pub mod app_settings;
pub mod persistence;
pub mod step_entry;

pub use app_settings::AppSettings;
pub use persistence::Persistable;
pub use step_entry::StepLedger;
