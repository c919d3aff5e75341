// src/api/appointment_api.rs

use reqwest::{
    Method,
    multipart::{Form, Part},
};

use super::HttpApi;
use crate::{
    error::ApiError,
    models::{Appointment, AppointmentRequest, AppointmentResponse, StatusUpdate, TransferLetter},
};

/* ============================================================
   GET /appointment/
   ============================================================ */

impl HttpApi {
    /// Every appointment the server knows about; there is no per-user filter.
    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, ApiError> {
        match self.get_json::<Vec<Appointment>>("appointment/").await {
            Err(ApiError::EmptyBody(_)) => Ok(Vec::new()),
            other => other,
        }
    }

    /* ============================================================
       PUT /appointment/{appointment_id}/
       ============================================================ */

    pub async fn update_appointment_status(
        &self,
        appointment_id: &str,
        update: &StatusUpdate,
    ) -> Result<(), ApiError> {
        let path = format!("appointment/{appointment_id}/");
        let label = format!("PUT {path}");
        self.send(self.request(Method::PUT, &path).json(update), &label)
            .await?;
        Ok(())
    }

    /* ============================================================
       POST /appointment/
       ============================================================ */

    pub async fn book_appointment(
        &self,
        request: &AppointmentRequest,
    ) -> Result<AppointmentResponse, ApiError> {
        let label = "POST appointment/";
        let response = self
            .send(self.request(Method::POST, "appointment/").json(request), label)
            .await?;
        Self::read_json(response, label).await
    }

    /// Multipart variant carrying the transfer letter.
    pub async fn book_appointment_with_file(
        &self,
        request: &AppointmentRequest,
        letter: TransferLetter,
    ) -> Result<AppointmentResponse, ApiError> {
        let label = "POST appointment/ (multipart)";

        let file_part = Part::bytes(letter.bytes)
            .file_name(letter.file_name)
            .mime_str(&letter.mime_type)
            .map_err(|_| {
                ApiError::Validation(format!("Unsupported file type: {}", letter.mime_type))
            })?;

        let form = Form::new()
            .text("center_id", request.center_id.clone())
            .text("service_id", request.service_id.clone())
            .text("user_id", request.user_id.clone())
            .text("appointment_date", request.appointment_date.clone())
            .part("transfer_letter", file_part)
            .text("booking_status", request.booking_status.clone());

        let response = self
            .send(self.request(Method::POST, "appointment/").multipart(form), label)
            .await?;
        Self::read_json(response, label).await
    }
}
