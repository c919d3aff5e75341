pub mod appointment_repository;
pub mod auth_repository;
pub mod clinic_repository;

pub use appointment_repository::AppointmentRepository;
pub use auth_repository::AuthRepository;
pub use clinic_repository::{ClinicRepository, Geocoder};
