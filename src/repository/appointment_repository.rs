// src/repository/appointment_repository.rs

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use futures_util::future::{join, join_all};
use tracing::{debug, error, info, warn};

use crate::{
    api::HttpApi,
    error::ApiError,
    models::{
        Appointment, AppointmentRequest, AppointmentResponse, AppointmentStatus, ClinicDetail,
        ClinicService, EnrichedAppointment, StatusUpdate, TransferLetter,
    },
};

const DEFAULT_LETTER_NAME: &str = "transfer_letter.jpg";
const DEFAULT_LETTER_MIME: &str = "image/jpeg";

/// Stateless appointment operations over the remote API.
#[derive(Clone, Debug)]
pub struct AppointmentRepository {
    api: HttpApi,
}

impl AppointmentRepository {
    pub fn new(api: HttpApi) -> Self {
        Self { api }
    }

    /* ============================================================
       Load + enrich
       ============================================================ */

    /// The user's appointments, joined with clinic and service names.
    ///
    /// A failed clinic or service lookup only loses the display fields for
    /// the affected appointments; a failed list fetch fails the whole call.
    pub async fn load_for_user(&self, user_id: &str) -> Result<Vec<EnrichedAppointment>, ApiError> {
        let all = self
            .api
            .list_appointments()
            .await
            .map_err(|e| ApiError::Load(Box::new(e.with_context("Failed to fetch appointments"))))?;

        let mine: Vec<Appointment> = all.into_iter().filter(|a| a.user_id == user_id).collect();
        if mine.is_empty() {
            return Ok(Vec::new());
        }

        let center_ids = distinct(mine.iter().map(|a| a.center_id.as_str()));
        let service_ids = distinct(mine.iter().map(|a| a.service_id.as_str()));
        debug!(
            user_id,
            appointments = mine.len(),
            clinics = center_ids.len(),
            services = service_ids.len(),
            "enriching appointments"
        );

        let clinic_lookups = join_all(
            center_ids
                .iter()
                .copied()
                .map(|id| async move { (id, self.api.clinic_detail(id).await) }),
        );
        let service_lookups = join_all(
            service_ids
                .iter()
                .copied()
                .map(|id| async move { (id, self.api.service_by_id(id).await) }),
        );
        let (clinics, services) = join(clinic_lookups, service_lookups).await;

        let clinics: HashMap<String, ClinicDetail> = clinics
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(clinic) => Some((clinic.center_id.clone(), clinic)),
                Err(e) => {
                    warn!(center_id = id, error = %e, "clinic lookup failed");
                    None
                }
            })
            .collect();
        let services: HashMap<String, ClinicService> = services
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(service) => Some((service.service_id.clone(), service)),
                Err(e) => {
                    warn!(service_id = id, error = %e, "service lookup failed");
                    None
                }
            })
            .collect();

        Ok(mine
            .into_iter()
            .map(|appointment| {
                let clinic = clinics.get(&appointment.center_id);
                let service = services.get(&appointment.service_id);
                EnrichedAppointment {
                    clinic_name: clinic.map(|c| c.center_name.clone()),
                    image_url: clinic.and_then(|c| c.image_path.clone()),
                    service_name: service.map(|s| s.service_name.clone()),
                    appointment,
                }
            })
            .collect())
    }

    /// Whether the user has any appointment at this clinic. Lookup failures
    /// count as "no".
    pub async fn has_user_booked_at_clinic(&self, user_id: &str, clinic_id: &str) -> bool {
        match self.load_for_user(user_id).await {
            Ok(list) => list.iter().any(|a| a.appointment.center_id == clinic_id),
            Err(e) => {
                error!(error = %e, "checking booking history failed");
                false
            }
        }
    }

    /* ============================================================
       Status changes
       ============================================================ */

    pub async fn cancel_appointment(
        &self,
        appointment_id: &str,
        user_id: &str,
        appointment_date: &str,
        center_id: &str,
        service_id: &str,
    ) -> Result<(), ApiError> {
        let update = StatusUpdate {
            booking_status: AppointmentStatus::Cancelled.as_str().to_string(),
            user_id: user_id.to_string(),
            appointment_date: appointment_date.to_string(),
            center_id: center_id.to_string(),
            service_id: service_id.to_string(),
        };
        if has_blank(appointment_id, &update) {
            error!("missing required details for cancellation");
            return Err(ApiError::Validation(
                "Missing required details for cancellation.".into(),
            ));
        }

        debug!(appointment_id, "sending cancellation");
        self.put_status(appointment_id, &update)
            .await
            .map_err(|e| match e {
                ApiError::Network { .. } => {
                    e.with_context("Failed to reach the server to cancel the appointment.")
                }
                other => other.with_context("Cancellation failed"),
            })?;
        info!(appointment_id, "appointment cancelled");
        Ok(())
    }

    pub async fn update_appointment_status(
        &self,
        appointment_id: &str,
        status: AppointmentStatus,
        user_id: &str,
        appointment_date: &str,
        center_id: &str,
        service_id: &str,
    ) -> Result<(), ApiError> {
        let update = StatusUpdate {
            booking_status: status.as_str().to_string(),
            user_id: user_id.to_string(),
            appointment_date: appointment_date.to_string(),
            center_id: center_id.to_string(),
            service_id: service_id.to_string(),
        };
        if has_blank(appointment_id, &update) {
            error!(%status, "missing required details for status update");
            return Err(ApiError::Validation(
                "Missing required details for status update.".into(),
            ));
        }

        self.put_status(appointment_id, &update)
            .await
            .map_err(|e| match e {
                ApiError::Network { .. } => {
                    e.with_context("Failed to reach the server to update the appointment.")
                }
                other => other.with_context("Failed to update appointment status"),
            })?;
        info!(appointment_id, %status, "appointment status updated");
        Ok(())
    }

    async fn put_status(&self, appointment_id: &str, update: &StatusUpdate) -> Result<(), ApiError> {
        self.api
            .update_appointment_status(appointment_id, update)
            .await
            .inspect_err(|e| error!(appointment_id, error = %e, "status update failed"))
    }

    /* ============================================================
       Booking
       ============================================================ */

    /// One attempt, no retry. With a letter the booking goes out as
    /// multipart; an unreadable letter fails before anything is sent.
    pub async fn book_appointment(
        &self,
        request: &AppointmentRequest,
        transfer_letter: Option<&Path>,
    ) -> Result<AppointmentResponse, ApiError> {
        let result = match transfer_letter {
            Some(path) => {
                let letter = read_transfer_letter(path).await?;
                debug!(file = %letter.file_name, mime = %letter.mime_type, "booking with transfer letter");
                self.api.book_appointment_with_file(request, letter).await
            }
            None => self.api.book_appointment(request).await,
        };

        result.map_err(|e| match e {
            ApiError::Network { .. } => e.with_context("Could not book appointment. Please try again."),
            ApiError::EmptyBody(_) => e.with_context("Booking"),
            other => {
                error!(error = %other, "booking rejected");
                other.with_context("Booking failed")
            }
        })
    }
}

fn has_blank(appointment_id: &str, update: &StatusUpdate) -> bool {
    [
        appointment_id,
        update.user_id.as_str(),
        update.appointment_date.as_str(),
        update.center_id.as_str(),
        update.service_id.as_str(),
    ]
    .iter()
    .any(|v| v.trim().is_empty())
}

fn distinct<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

/// Read a picked document into memory, sniffing its content type from the
/// extension.
pub async fn read_transfer_letter(path: &Path) -> Result<TransferLetter, ApiError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| ApiError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mime_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(DEFAULT_LETTER_MIME)
        .to_string();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LETTER_NAME)
        .to_string();

    Ok(TransferLetter {
        file_name,
        mime_type,
        bytes,
    })
}

/// The slot must be today or later, and strictly after `now` when today.
pub fn validate_booking_slot(date: NaiveDate, time: NaiveTime, now: NaiveDateTime) -> Result<(), ApiError> {
    let today = now.date();
    if date < today {
        return Err(ApiError::Validation(
            "Please choose a date from today onwards.".into(),
        ));
    }
    if date == today && time <= now.time() {
        return Err(ApiError::Validation(
            "Please choose a time later than now.".into(),
        ));
    }
    Ok(())
}

/// Local wall-clock slot to a UTC ISO-8601 instant, e.g. `2026-10-20T07:30:00Z`.
pub fn local_slot_to_utc<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Result<String, ApiError> {
    let local = tz
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .ok_or_else(|| {
            ApiError::Validation(format!("{date} {time} does not exist in the local time zone"))
        })?;
    Ok(local.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, LocalResult};

    /// UTC+0 that jumps to UTC+1 at 01:00 on 2026-03-29, so 01:00..02:00
    /// local never happens that day.
    #[derive(Clone, Copy, Debug)]
    struct SpringForward;

    impl SpringForward {
        fn gap_start() -> NaiveDateTime {
            d(2026, 3, 29).and_time(t(1, 0))
        }

        fn offset_at_utc(utc: &NaiveDateTime) -> FixedOffset {
            let hours = if *utc >= Self::gap_start() { 1 } else { 0 };
            FixedOffset::east_opt(hours * 3600).unwrap()
        }
    }

    impl TimeZone for SpringForward {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            SpringForward
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(t(0, 0)))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let gap_end = Self::gap_start() + chrono::Duration::hours(1);
            if *local < Self::gap_start() {
                LocalResult::Single(FixedOffset::east_opt(0).unwrap())
            } else if *local < gap_end {
                LocalResult::None
            } else {
                LocalResult::Single(FixedOffset::east_opt(3600).unwrap())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            Self::offset_at_utc(&utc.and_time(t(0, 0)))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            Self::offset_at_utc(utc)
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn slot_converts_to_utc_with_z_suffix() {
        let nairobi = FixedOffset::east_opt(3 * 3600).unwrap();
        let iso = local_slot_to_utc(&nairobi, d(2026, 10, 20), t(10, 30)).unwrap();
        assert_eq!(iso, "2026-10-20T07:30:00Z");

        let early = local_slot_to_utc(&nairobi, d(2026, 10, 20), t(1, 0)).unwrap();
        assert_eq!(early, "2026-10-19T22:00:00Z");
    }

    #[test]
    fn slot_in_a_dst_gap_is_rejected() {
        let err = local_slot_to_utc(&SpringForward, d(2026, 3, 29), t(1, 30)).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("does not exist"), "{err}");

        assert_eq!(
            local_slot_to_utc(&SpringForward, d(2026, 3, 29), t(0, 30)).unwrap(),
            "2026-03-29T00:30:00Z"
        );
        assert_eq!(
            local_slot_to_utc(&SpringForward, d(2026, 3, 29), t(2, 30)).unwrap(),
            "2026-03-29T01:30:00Z"
        );
    }

    #[test]
    fn past_dates_are_rejected() {
        let now = d(2026, 10, 19).and_time(t(12, 0));
        let err = validate_booking_slot(d(2026, 10, 18), t(15, 0), now).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn today_needs_a_later_time() {
        let now = d(2026, 10, 19).and_time(t(12, 0));
        assert!(validate_booking_slot(d(2026, 10, 19), t(12, 0), now).is_err());
        assert!(validate_booking_slot(d(2026, 10, 19), t(11, 59), now).is_err());
        assert!(validate_booking_slot(d(2026, 10, 19), t(12, 1), now).is_ok());
        assert!(validate_booking_slot(d(2026, 10, 20), t(8, 0), now).is_ok());
    }

    #[test]
    fn distinct_keeps_first_occurrence_order() {
        let ids = distinct(["c2", "c1", "c2", "c3", "c1"].into_iter());
        assert_eq!(ids, vec!["c2", "c1", "c3"]);
    }

    #[test]
    fn blank_detection_covers_every_field() {
        let full = StatusUpdate {
            booking_status: "Cancelled".into(),
            user_id: "u".into(),
            appointment_date: "d".into(),
            center_id: "c".into(),
            service_id: "s".into(),
        };
        assert!(!has_blank("a", &full));
        assert!(has_blank(" ", &full));
        assert!(has_blank("a", &StatusUpdate { center_id: "".into(), ..full.clone() }));
        assert!(has_blank("a", &StatusUpdate { service_id: "\t".into(), ..full }));
    }

    #[tokio::test]
    async fn letter_type_is_sniffed_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("referral.pdf");
        tokio::fs::write(&pdf, b"%PDF-1.4").await.unwrap();
        let letter = read_transfer_letter(&pdf).await.unwrap();
        assert_eq!(letter.mime_type, "application/pdf");
        assert_eq!(letter.file_name, "referral.pdf");
        assert_eq!(letter.bytes, b"%PDF-1.4");

        let unknown = dir.path().join("scan");
        tokio::fs::write(&unknown, b"\xff\xd8").await.unwrap();
        let letter = read_transfer_letter(&unknown).await.unwrap();
        assert_eq!(letter.mime_type, DEFAULT_LETTER_MIME);
    }

    #[tokio::test]
    async fn missing_letter_is_an_io_error() {
        let err = read_transfer_letter(Path::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Io { .. }));
        assert!(err.to_string().contains("Cannot open selected file"));
    }
}
