use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::{Local, NaiveDate, NaiveTime};
use tracing_subscriber::EnvFilter;

use halicare_client::{
    AppointmentLifecycleEngine, HttpApi, Session, SettingsStore,
    config::Config,
    models::{AppointmentStatus, SignUpRequest},
    repository::{AppointmentRepository, AuthRepository, ClinicRepository},
};

const USAGE: &str = "\
usage: halicare <command> [args]

  login <phone> <password>
  register <first_name> <last_name> <phone> <password>
  appointments
  stage-letter <path>
  book <center_id> <service_id> <YYYY-MM-DD> <HH:MM> [transfer_letter]
  cancel <appointment_id>
  complete <appointment_id>
  clinics [<latitude> <longitude>]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = Config::from_env()?;
    let settings = SettingsStore::open(&cfg.settings_path).await?;

    let session = Session::new();
    if let Some(token) = settings.get().auth_token {
        session.set_token(token);
    }
    let api = HttpApi::new(&cfg.api_base_url, cfg.http_timeout_secs, session)?;
    tracing::debug!(base_url = api.base_url(), "api client ready");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["login", phone, password] => {
            let auth = AuthRepository::new(api, settings);
            let profile = auth.login(phone, password).await?;
            println!("Welcome, {} {}", profile.first_name, profile.last_name);
        }
        ["register", first, last, phone, password] => {
            let auth = AuthRepository::new(api, settings);
            auth.register(&SignUpRequest::patient(first, last, phone, password))
                .await?;
            println!("User registered successfully");
        }
        ["appointments"] => {
            let engine = AppointmentLifecycleEngine::new(AppointmentRepository::new(api), settings);
            engine.load_appointments().await?;
            let today = Local::now().date_naive();
            for status in AppointmentStatus::ALL {
                let list = engine.visible_appointments(status, today);
                println!("{status} ({})", list.len());
                for appt in list {
                    println!(
                        "  {}  {}  {}  {} at {}",
                        appt.id(),
                        appt.date_label(&Local),
                        appt.time_label(&Local),
                        appt.service(),
                        appt.clinic()
                    );
                }
            }
        }
        ["stage-letter", path] => {
            let engine = AppointmentLifecycleEngine::new(AppointmentRepository::new(api), settings);
            engine.stage_transfer_letter(PathBuf::from(path)).await?;
            println!("Transfer letter staged: {path}");
        }
        ["book", center_id, service_id, date, time, rest @ ..] => {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("date must be YYYY-MM-DD, got {date}"))?;
            let time = NaiveTime::parse_from_str(time, "%H:%M")
                .with_context(|| format!("time must be HH:MM, got {time}"))?;
            let engine = AppointmentLifecycleEngine::new(AppointmentRepository::new(api), settings);

            let response = match rest {
                [] => engine.book_with_staged_letter(center_id, service_id, date, time).await?,
                [letter] => {
                    let letter = PathBuf::from(letter);
                    engine
                        .book(center_id, service_id, date, time, Some(&letter))
                        .await?
                }
                _ => bail!(USAGE),
            };
            println!("Booked appointment {}", response.appointment_id);
        }
        [verb @ ("cancel" | "complete"), appointment_id] => {
            let engine = AppointmentLifecycleEngine::new(AppointmentRepository::new(api), settings);
            engine.load_appointments().await?;
            if *verb == "cancel" {
                engine.cancel(appointment_id).await?;
                println!("Appointment {appointment_id} cancelled");
            } else {
                engine.complete(appointment_id).await?;
                println!("Appointment {appointment_id} completed");
            }
        }
        ["clinics", rest @ ..] => {
            let (latitude, longitude) = match rest {
                [lat, lng] => {
                    let latitude: f64 = lat.parse().context("latitude must be a number")?;
                    let longitude: f64 = lng.parse().context("longitude must be a number")?;
                    settings
                        .update(|s| {
                            s.last_known_location = Some((latitude, longitude));
                            s.location_setup_complete = true;
                        })
                        .await?;
                    (latitude, longitude)
                }
                [] => {
                    let saved = settings.get();
                    match saved.last_known_location() {
                        Some(location) if saved.has_completed_location_setup() => location,
                        _ => bail!("no saved location; run `halicare clinics <latitude> <longitude>` once"),
                    }
                }
                _ => bail!(USAGE),
            };

            let clinics = ClinicRepository::new(api)
                .fetch_nearby_arv_clinics(latitude, longitude, cfg.nearby_radius_km)
                .await?;
            for clinic in clinics {
                println!(
                    "{}  {}  {}  ({})",
                    clinic.center_id,
                    clinic.center_name,
                    clinic.address,
                    clinic.hours()
                );
            }
        }
        _ => bail!(USAGE),
    }
    Ok(())
}
