// src/engine.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveTime};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{
    error::ApiError,
    models::{AppointmentRequest, AppointmentResponse, AppointmentStatus, EnrichedAppointment},
    repository::{
        AppointmentRepository,
        appointment_repository::{local_slot_to_utc, validate_booking_slot},
    },
    settings::SettingsStore,
    status::{filter_by_status, status_counts},
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BookingStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

/// What observers see. Only the engine writes it.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    pub appointments: Vec<EnrichedAppointment>,
    pub is_loading: bool,
    pub is_cancelling: bool,
    pub error_message: Option<String>,
    pub booking: BookingStatus,
    /// `None` until checked for the clinic currently being viewed.
    pub is_user_new_to_clinic: Option<bool>,
}

/// Owns a user's appointment list and drives book / cancel / complete.
///
/// The list is always a full snapshot from the server. After any status
/// change, successful or not, the engine reloads instead of patching.
pub struct AppointmentLifecycleEngine {
    repo: AppointmentRepository,
    settings: SettingsStore,
    state: watch::Sender<EngineState>,
}

impl AppointmentLifecycleEngine {
    pub fn new(repo: AppointmentRepository, settings: SettingsStore) -> Self {
        let (state, _) = watch::channel(EngineState::default());
        Self {
            repo,
            settings,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> EngineState {
        self.state.borrow().clone()
    }

    pub fn repository(&self) -> &AppointmentRepository {
        &self.repo
    }

    fn current_user(&self) -> Result<String, ApiError> {
        self.settings.user_id().ok_or(ApiError::NotLoggedIn)
    }

    /* ============================================================
       Queries
       ============================================================ */

    /// Appointments under one tab, with status derived against `today`.
    pub fn visible_appointments(&self, status: AppointmentStatus, today: NaiveDate) -> Vec<EnrichedAppointment> {
        filter_by_status(&self.state.borrow().appointments, status, today)
    }

    pub fn status_counts(&self, today: NaiveDate) -> HashMap<AppointmentStatus, usize> {
        status_counts(&self.state.borrow().appointments, today)
    }

    /* ============================================================
       Load
       ============================================================ */

    pub async fn load_appointments(&self) -> Result<(), ApiError> {
        self.state.send_modify(|s| s.is_loading = true);

        let result = match self.current_user() {
            Ok(user_id) => self.repo.load_for_user(&user_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(list) => {
                debug!(count = list.len(), "appointments loaded");
                self.state.send_modify(|s| {
                    s.appointments = list;
                    s.is_loading = false;
                });
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "loading appointments failed");
                let message = match &e {
                    ApiError::NotLoggedIn | ApiError::Load(_) => e.to_string(),
                    other => format!("Failed to load appointments: {other}"),
                };
                self.state.send_modify(|s| {
                    s.error_message = Some(message);
                    s.is_loading = false;
                });
                Err(e)
            }
        }
    }

    /* ============================================================
       Cancel / complete
       ============================================================ */

    pub async fn cancel(&self, appointment_id: &str) -> Result<(), ApiError> {
        self.change_status(appointment_id, AppointmentStatus::Cancelled).await
    }

    pub async fn complete(&self, appointment_id: &str) -> Result<(), ApiError> {
        self.change_status(appointment_id, AppointmentStatus::Completed).await
    }

    async fn change_status(&self, appointment_id: &str, target: AppointmentStatus) -> Result<(), ApiError> {
        let verb = match target {
            AppointmentStatus::Cancelled => "cancel",
            _ => "complete",
        };
        self.state.send_modify(|s| s.is_cancelling = true);

        let user_id = self.settings.user_id();
        let appointment = self
            .state
            .borrow()
            .appointments
            .iter()
            .find(|a| a.id() == appointment_id)
            .map(|a| a.appointment.clone());

        let (Some(user_id), Some(appointment)) = (user_id, appointment) else {
            let err = ApiError::NotFound(format!(
                "Cannot {verb} appointment: User not logged in or appointment not found."
            ));
            self.state.send_modify(|s| {
                s.error_message = Some(err.to_string());
                s.is_cancelling = false;
            });
            return Err(err);
        };

        info!(appointment_id, %target, "changing appointment status");
        let result = match target {
            AppointmentStatus::Cancelled => {
                self.repo
                    .cancel_appointment(
                        appointment_id,
                        &user_id,
                        &appointment.appointment_date,
                        &appointment.center_id,
                        &appointment.service_id,
                    )
                    .await
            }
            status => {
                self.repo
                    .update_appointment_status(
                        appointment_id,
                        status,
                        &user_id,
                        &appointment.appointment_date,
                        &appointment.center_id,
                        &appointment.service_id,
                    )
                    .await
            }
        };

        // reconcile with the server whatever happened
        let _ = self.load_appointments().await;

        if let Err(e) = &result {
            error!(appointment_id, error = %e, "status change failed");
            let message = e.to_string();
            self.state.send_modify(|s| s.error_message = Some(message));
        }
        self.state.send_modify(|s| s.is_cancelling = false);
        result
    }

    /* ============================================================
       Booking
       ============================================================ */

    /// Remember a picked transfer letter until the next successful booking.
    pub async fn stage_transfer_letter(&self, path: impl Into<PathBuf>) -> Result<(), ApiError> {
        let path = path.into();
        self.settings
            .update(|s| s.pending_transfer_letter = Some(path))
            .await?;
        Ok(())
    }

    pub fn staged_transfer_letter(&self) -> Option<PathBuf> {
        self.settings.get().pending_transfer_letter
    }

    /// Book with whatever letter is currently staged.
    pub async fn book_with_staged_letter(
        &self,
        center_id: &str,
        service_id: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<AppointmentResponse, ApiError> {
        let staged = self.staged_transfer_letter();
        self.book(center_id, service_id, date, time, staged.as_deref())
            .await
    }

    /// Book a local `(date, time)` slot. On success the staged letter is
    /// cleared and the user is no longer new to this clinic.
    pub async fn book(
        &self,
        center_id: &str,
        service_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        transfer_letter: Option<&Path>,
    ) -> Result<AppointmentResponse, ApiError> {
        self.state.send_modify(|s| s.booking = BookingStatus::Loading);

        let result = self
            .try_book(center_id, service_id, date, time, transfer_letter)
            .await;

        match &result {
            Ok(response) => {
                info!(appointment_id = %response.appointment_id, center_id, "appointment booked");
                self.state.send_modify(|s| {
                    s.booking = BookingStatus::Success;
                    s.is_user_new_to_clinic = Some(false);
                });
            }
            Err(e) => {
                error!(center_id, error = %e, "booking failed");
                let message = e.to_string();
                self.state
                    .send_modify(|s| s.booking = BookingStatus::Error(message));
            }
        }
        result
    }

    async fn try_book(
        &self,
        center_id: &str,
        service_id: &str,
        date: NaiveDate,
        time: NaiveTime,
        transfer_letter: Option<&Path>,
    ) -> Result<AppointmentResponse, ApiError> {
        if center_id.trim().is_empty() || service_id.trim().is_empty() {
            return Err(ApiError::Validation(
                "A clinic and service are required to book.".into(),
            ));
        }
        let now = Local::now().naive_local();
        validate_booking_slot(date, time, now)?;
        let user_id = self.current_user()?;
        let appointment_date = local_slot_to_utc(&Local, date, time)?;

        let request = AppointmentRequest::upcoming(center_id, service_id, &user_id, appointment_date);
        let response = self.repo.book_appointment(&request, transfer_letter).await?;

        // the booking exists server-side from here on
        if let Err(e) = self
            .settings
            .update(|s| s.pending_transfer_letter = None)
            .await
        {
            warn!(appointment_id = %response.appointment_id, error = %e, "could not clear staged transfer letter");
        }
        Ok(response)
    }

    /// Sets `is_user_new_to_clinic` once per view; later calls are no-ops
    /// until `reset_clinic_context`.
    pub async fn check_if_user_is_new(&self, clinic_id: &str) {
        if self.state.borrow().is_user_new_to_clinic.is_some() {
            return;
        }
        let is_new = match self.settings.user_id() {
            Some(user_id) => !self.repo.has_user_booked_at_clinic(&user_id, clinic_id).await,
            None => true,
        };
        self.state
            .send_modify(|s| s.is_user_new_to_clinic = Some(is_new));
    }

    pub fn reset_clinic_context(&self) {
        self.state.send_modify(|s| s.is_user_new_to_clinic = None);
    }

    pub fn reset_booking_status(&self) {
        self.state.send_modify(|s| s.booking = BookingStatus::Idle);
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error_message = None);
    }
}
