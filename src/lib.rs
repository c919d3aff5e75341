pub mod api;
pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod settings;
pub mod status;

pub use api::HttpApi;
pub use auth::Session;
pub use engine::{AppointmentLifecycleEngine, BookingStatus, EngineState};
pub use error::ApiError;
pub use settings::{Settings, SettingsStore};
