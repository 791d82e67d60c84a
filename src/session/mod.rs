mod builder;
mod commands;
mod manager;
mod observer;
mod state;
mod worker;

pub use builder::SimpleCameraBuilder;
pub use commands::FocusRequest;
pub use manager::SimpleCamera;
pub use state::{SessionSetupResult, SessionStats, SessionStatsSnapshot, SetupState};

pub(crate) use commands::SessionCommand;
