// src/status.rs

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::warn;

use crate::models::{AppointmentStatus, EnrichedAppointment};

/// Status an appointment should be shown under, given the local calendar date.
///
/// Explicit `Cancelled`/`Completed` win without looking at the date. Anything
/// else is upcoming unless its date is already behind `today`, in which case
/// it has lapsed and counts as cancelled. The comparison uses the UTC date
/// prefix of the stored instant as-is; near local midnight this can be a day
/// off.
///
/// Pure: recompute on every query, never cache the result.
pub fn effective_status(stored_status: &str, appointment_date: &str, today: NaiveDate) -> AppointmentStatus {
    match AppointmentStatus::parse(stored_status) {
        AppointmentStatus::Cancelled => return AppointmentStatus::Cancelled,
        AppointmentStatus::Completed => return AppointmentStatus::Completed,
        AppointmentStatus::Upcoming => {}
    }

    let date_part = appointment_date.get(..10).unwrap_or(appointment_date);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) if date < today => AppointmentStatus::Cancelled,
        Ok(_) => AppointmentStatus::Upcoming,
        Err(e) => {
            warn!(appointment_date, error = %e, "unparseable appointment date, treating as upcoming");
            AppointmentStatus::Upcoming
        }
    }
}

impl EnrichedAppointment {
    pub fn effective_status(&self, today: NaiveDate) -> AppointmentStatus {
        effective_status(
            &self.appointment.booking_status,
            &self.appointment.appointment_date,
            today,
        )
    }
}

pub fn filter_by_status(
    appointments: &[EnrichedAppointment],
    status: AppointmentStatus,
    today: NaiveDate,
) -> Vec<EnrichedAppointment> {
    appointments
        .iter()
        .filter(|a| a.effective_status(today) == status)
        .cloned()
        .collect()
}

/// Per-tab counts. Every status is present, possibly with zero.
pub fn status_counts(
    appointments: &[EnrichedAppointment],
    today: NaiveDate,
) -> HashMap<AppointmentStatus, usize> {
    let mut counts: HashMap<AppointmentStatus, usize> =
        AppointmentStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for appt in appointments {
        *counts.entry(appt.effective_status(today)).or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Appointment;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn enriched(id: &str, status: &str, date: &str) -> EnrichedAppointment {
        EnrichedAppointment::bare(Appointment {
            appointment_id: id.into(),
            booking_status: status.into(),
            transfer_letter: None,
            appointment_date: date.into(),
            user_id: "u1".into(),
            center_id: "c1".into(),
            service_id: "s1".into(),
        })
    }

    #[test]
    fn explicit_statuses_ignore_the_date() {
        for date in ["2000-01-01T00:00:00Z", "2999-01-01T00:00:00Z", "not-a-date", ""] {
            assert_eq!(effective_status("Cancelled", date, today()), AppointmentStatus::Cancelled);
            assert_eq!(effective_status("cancelled", date, today()), AppointmentStatus::Cancelled);
            assert_eq!(effective_status("Completed", date, today()), AppointmentStatus::Completed);
            assert_eq!(effective_status("COMPLETED", date, today()), AppointmentStatus::Completed);
        }
    }

    #[test]
    fn past_upcoming_has_lapsed() {
        assert_eq!(
            effective_status("Upcoming", "2026-10-18T23:59:00Z", today()),
            AppointmentStatus::Cancelled
        );
        assert_eq!(
            effective_status("Confirmed", "2025-01-01T09:00:00Z", today()),
            AppointmentStatus::Cancelled
        );
    }

    #[test]
    fn today_and_future_stay_upcoming() {
        assert_eq!(
            effective_status("Upcoming", "2026-10-19T00:00:00Z", today()),
            AppointmentStatus::Upcoming
        );
        assert_eq!(
            effective_status("Upcoming", "2027-02-01T08:00:00Z", today()),
            AppointmentStatus::Upcoming
        );
    }

    #[test]
    fn malformed_dates_fail_open() {
        assert_eq!(effective_status("Upcoming", "not-a-date", today()), AppointmentStatus::Upcoming);
        assert_eq!(effective_status("Upcoming", "", today()), AppointmentStatus::Upcoming);
        assert_eq!(effective_status("Upcoming", "2026-13-40T00:00:00Z", today()), AppointmentStatus::Upcoming);
        // multi-byte input must not panic on the 10-byte cut
        assert_eq!(effective_status("Upcoming", "ñññññññññññ", today()), AppointmentStatus::Upcoming);
    }

    #[test]
    fn derivation_is_deterministic() {
        let inputs = [
            ("Upcoming", "2026-10-01T10:00:00Z"),
            ("Upcoming", "2026-11-01T10:00:00Z"),
            ("weird", "garbage"),
            ("Completed", "2026-11-01T10:00:00Z"),
        ];
        for (status, date) in inputs {
            assert_eq!(
                effective_status(status, date, today()),
                effective_status(status, date, today())
            );
        }
    }

    #[test]
    fn date_only_values_parse() {
        assert_eq!(effective_status("Upcoming", "2026-10-18", today()), AppointmentStatus::Cancelled);
    }

    #[test]
    fn buckets_and_counts_agree() {
        let list = vec![
            enriched("1", "Upcoming", "2026-12-01T10:00:00Z"),
            enriched("2", "Upcoming", "2026-01-01T10:00:00Z"),
            enriched("3", "Completed", "2026-01-01T10:00:00Z"),
            enriched("4", "Cancelled", "2026-12-01T10:00:00Z"),
        ];

        let upcoming = filter_by_status(&list, AppointmentStatus::Upcoming, today());
        assert_eq!(upcoming.iter().map(|a| a.id()).collect::<Vec<_>>(), vec!["1"]);

        let cancelled = filter_by_status(&list, AppointmentStatus::Cancelled, today());
        assert_eq!(cancelled.iter().map(|a| a.id()).collect::<Vec<_>>(), vec!["2", "4"]);

        let counts = status_counts(&list, today());
        assert_eq!(counts[&AppointmentStatus::Upcoming], 1);
        assert_eq!(counts[&AppointmentStatus::Completed], 1);
        assert_eq!(counts[&AppointmentStatus::Cancelled], 2);
    }

    #[test]
    fn counts_include_empty_buckets() {
        let counts = status_counts(&[], today());
        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|c| *c == 0));
    }
}
