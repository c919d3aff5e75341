use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_CLINIC: &str = "Unknown Clinic";
pub const UNKNOWN_SERVICE: &str = "Unknown Service";
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/100";

/* -------------------------
   Appointments
--------------------------*/

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: String,
    pub booking_status: String,
    #[serde(default)]
    pub transfer_letter: Option<String>,
    /// ISO-8601 offset date-time, UTC.
    pub appointment_date: String,
    pub user_id: String,
    pub center_id: String,
    pub service_id: String,
}

impl Appointment {
    /// Status exactly as the server last reported it.
    pub fn stored_status(&self) -> AppointmentStatus {
        AppointmentStatus::parse(&self.booking_status)
    }

    /// The stored instant, if it parses. Offset-less values are read as UTC.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        let raw = self.appointment_date.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Upcoming,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 3] = [
        AppointmentStatus::Upcoming,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    /// Case-insensitive. `Confirmed` is an upcoming booking; anything
    /// unrecognised is treated as upcoming too.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" => AppointmentStatus::Completed,
            "cancelled" | "canceled" => AppointmentStatus::Cancelled,
            _ => AppointmentStatus::Upcoming,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Upcoming => "Upcoming",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An appointment joined against clinic and service lookups.
/// The joined fields are display-only and never sent back.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedAppointment {
    pub appointment: Appointment,
    pub clinic_name: Option<String>,
    pub service_name: Option<String>,
    pub image_url: Option<String>,
}

impl EnrichedAppointment {
    pub fn bare(appointment: Appointment) -> Self {
        Self {
            appointment,
            clinic_name: None,
            service_name: None,
            image_url: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.appointment.appointment_id
    }

    pub fn clinic(&self) -> &str {
        self.clinic_name.as_deref().unwrap_or(UNKNOWN_CLINIC)
    }

    pub fn service(&self) -> &str {
        self.service_name.as_deref().unwrap_or(UNKNOWN_SERVICE)
    }

    pub fn image(&self) -> &str {
        self.image_url.as_deref().unwrap_or(PLACEHOLDER_IMAGE)
    }

    /// e.g. `Mar 4, 2026` in the given zone.
    pub fn date_label<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        match self.appointment.instant() {
            Some(utc) => utc.with_timezone(tz).format("%b %-d, %Y").to_string(),
            None => "Invalid Date".to_string(),
        }
    }

    /// e.g. `9:30 AM` in the given zone.
    pub fn time_label<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        match self.appointment.instant() {
            Some(utc) => utc.with_timezone(tz).format("%-I:%M %p").to_string(),
            None => "Invalid Time".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentRequest {
    pub center_id: String,
    pub service_id: String,
    pub user_id: String,
    pub appointment_date: String,
    pub transfer_letter: Option<String>,
    pub booking_status: String,
}

impl AppointmentRequest {
    pub fn upcoming(
        center_id: &str,
        service_id: &str,
        user_id: &str,
        appointment_date: String,
    ) -> Self {
        Self {
            center_id: center_id.to_string(),
            service_id: service_id.to_string(),
            user_id: user_id.to_string(),
            appointment_date,
            transfer_letter: None,
            booking_status: AppointmentStatus::Upcoming.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppointmentResponse {
    #[serde(alias = "appointmentId")]
    pub appointment_id: String,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Body of `PUT appointment/{id}/`. The server keys the record on the whole
/// tuple, so every field is required.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub booking_status: String,
    pub user_id: String,
    pub appointment_date: String,
    pub center_id: String,
    pub service_id: String,
}

/// A file read from disk, ready for the multipart `transfer_letter` part.
#[derive(Debug, Clone)]
pub struct TransferLetter {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/* -------------------------
   Clinics & services
--------------------------*/

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicDetails {
    pub center_id: String,
    pub center_name: String,
    #[serde(default)]
    pub center_type: String,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub operational_status: String,
    #[serde(default)]
    pub opening_time: String,
    #[serde(default)]
    pub closing_time: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub user: Option<String>,
}

impl ClinicDetails {
    pub fn hours(&self) -> String {
        format!("{} - {}", self.opening_time, self.closing_time)
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude != 0.0 && self.longitude != 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClinicDetail {
    pub center_id: String,
    pub center_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub opening_time: String,
    #[serde(default)]
    pub closing_time: String,
    #[serde(default)]
    pub image_path: Option<String>,
}

impl ClinicDetail {
    pub fn hours(&self) -> String {
        format!("{} - {}", self.opening_time, self.closing_time)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicService {
    pub service_id: String,
    pub service_name: String,
    pub center_id: String,
    #[serde(default)]
    pub hours: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// A clinic with its own services attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Clinic {
    pub name: String,
    pub address: String,
    pub hours: String,
    pub contact_phone: String,
    pub services: Vec<ClinicService>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArvAvailability {
    pub id: i64,
    pub arv_availability: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(rename = "center")]
    pub center_id: String,
}

impl ArvAvailability {
    pub fn is_available(&self) -> bool {
        self.arv_availability.eq_ignore_ascii_case("available")
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CounselingCenterDetails {
    pub center_id: String,
    pub center_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub operational_status: String,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default, rename = "contact_number")]
    pub contact: String,
    #[serde(default, rename = "opening_time")]
    pub opening_hours: String,
    #[serde(default, rename = "closing_time")]
    pub closing_hours: String,
}

/* -------------------------
   Auth DTOs
--------------------------*/

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_type: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
    pub user_type: String,
}

impl SignUpRequest {
    pub fn patient(first_name: &str, last_name: &str, phone_number: &str, password: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            phone_number: phone_number.to_string(),
            password: password.to_string(),
            confirm_password: password.to_string(),
            user_type: "PATIENT".to_string(),
        }
    }
}
