use std::env;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://halicare-7bfc32637910.herokuapp.com/api/";

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub settings_path: PathBuf,
    pub http_timeout_secs: u64,
    pub nearby_radius_km: f64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_base_url =
            env::var("HALICARE_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let settings_path = env::var("HALICARE_SETTINGS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("halicare_settings.json"));
        let http_timeout_secs = env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);
        let nearby_radius_km = env::var("NEARBY_RADIUS_KM")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|km| *km > 0.0)
            .unwrap_or(50.0);

        Ok(Self {
            api_base_url,
            settings_path,
            http_timeout_secs,
            nearby_radius_km,
        })
    }
}
