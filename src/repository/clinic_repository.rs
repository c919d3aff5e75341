// src/repository/clinic_repository.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::{
    api::HttpApi,
    error::ApiError,
    models::{ArvAvailability, Clinic, ClinicDetails, ClinicService, CounselingCenterDetails},
};

const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Address to coordinates. Backed by a device service in the app.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<(f64, f64)>, ApiError>;
}

#[derive(Clone)]
pub struct ClinicRepository {
    api: HttpApi,
    geocoder: Option<Arc<dyn Geocoder>>,
    geocoded: Arc<Mutex<HashMap<String, (f64, f64)>>>,
}

impl ClinicRepository {
    pub fn new(api: HttpApi) -> Self {
        Self {
            api,
            geocoder: None,
            geocoded: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub async fn get_clinics(&self) -> Result<Vec<ClinicDetails>, ApiError> {
        match self.api.list_clinics().await {
            Err(ApiError::EmptyBody(_)) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Clinic detail plus the services that belong to it. `None` when the
    /// detail lookup fails; a failed service lookup just yields no services.
    pub async fn get_clinic_with_services(&self, center_id: &str) -> Option<Clinic> {
        let detail = match self.api.clinic_detail(center_id).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(center_id, error = %e, "clinic detail unavailable");
                return None;
            }
        };
        let services = self.get_services_by_center_id(center_id).await;

        Some(Clinic {
            name: detail.center_name.clone(),
            address: detail.address.clone(),
            hours: detail.hours(),
            contact_phone: detail.contact_number.clone(),
            services,
        })
    }

    /// Services for one center. The server filter is advisory, so results
    /// are filtered again here. Failures yield an empty list.
    pub async fn get_services_by_center_id(&self, center_id: &str) -> Vec<ClinicService> {
        match self.api.services_by_center(center_id).await {
            Ok(services) => services
                .into_iter()
                .filter(|s| s.center_id == center_id)
                .collect(),
            Err(e) => {
                error!(center_id, error = %e, "failed to fetch services");
                Vec::new()
            }
        }
    }

    pub async fn get_nearby_clinics(
        &self,
        latitude: f64,
        longitude: f64,
        max_distance_km: f64,
    ) -> Result<Vec<ClinicDetails>, ApiError> {
        let clinics = self.get_clinics().await?;
        Ok(clinics
            .into_iter()
            .filter(|c| {
                distance_m((latitude, longitude), (c.latitude, c.longitude)) <= max_distance_km * 1000.0
            })
            .collect())
    }

    pub async fn get_arv_availability(&self) -> Vec<ArvAvailability> {
        self.api.arv_availability().await.unwrap_or_else(|e| {
            error!(error = %e, "failed to fetch ARV availability");
            Vec::new()
        })
    }

    pub async fn get_arv_availability_by_center_id(&self, center_id: &str) -> Option<ArvAvailability> {
        self.api
            .arv_availability_for_center(center_id)
            .await
            .inspect_err(|e| error!(center_id, error = %e, "failed to fetch ARV availability"))
            .ok()
    }

    pub async fn get_counseling_centers(&self) -> Result<Vec<CounselingCenterDetails>, ApiError> {
        match self.api.list_counseling_centers().await {
            Err(ApiError::EmptyBody(_)) => Ok(Vec::new()),
            Err(e) => Err(e.with_context("API failed")),
            ok => ok,
        }
    }

    /// Nearby clinics that currently report ARV stock.
    ///
    /// Distance filtering runs on the coordinates the server returned;
    /// clinics that came back without coordinates are then geocoded by
    /// address before the availability filter.
    pub async fn fetch_nearby_arv_clinics(
        &self,
        latitude: f64,
        longitude: f64,
        max_distance_km: f64,
    ) -> Result<Vec<ClinicDetails>, ApiError> {
        let availability = self.get_arv_availability().await;
        let nearby = self
            .get_nearby_clinics(latitude, longitude, max_distance_km)
            .await
            .map_err(|e| e.with_context("Failed to load clinics"))?;

        let mut enriched = Vec::with_capacity(nearby.len());
        for clinic in nearby {
            enriched.push(self.geocode_clinic(clinic).await);
        }

        let total = enriched.len();
        let kept: Vec<ClinicDetails> = enriched
            .into_iter()
            .filter(|clinic| {
                availability
                    .iter()
                    .find(|a| a.center_id == clinic.center_id)
                    .is_some_and(ArvAvailability::is_available)
            })
            .collect();
        debug!(kept = kept.len(), total, "clinics filtered by ARV availability");
        Ok(kept)
    }

    async fn geocode_clinic(&self, clinic: ClinicDetails) -> ClinicDetails {
        if clinic.has_coordinates() || clinic.address.trim().is_empty() {
            return clinic;
        }
        let cached = self
            .geocoded
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&clinic.address)
            .copied();
        if let Some((latitude, longitude)) = cached {
            return ClinicDetails { latitude, longitude, ..clinic };
        }
        let Some(geocoder) = &self.geocoder else {
            return clinic;
        };

        match geocoder.geocode(&clinic.address).await {
            Ok(Some((latitude, longitude))) => {
                self.geocoded
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(clinic.address.clone(), (latitude, longitude));
                ClinicDetails { latitude, longitude, ..clinic }
            }
            Ok(None) => {
                warn!(address = %clinic.address, "geocoding returned no results");
                clinic
            }
            Err(e) => {
                error!(address = %clinic.address, error = %e, "geocoding failed");
                clinic
            }
        }
    }
}

/// ARV service of a clinic, matched by name.
pub fn find_arv_service(clinic: &Clinic) -> Option<&ClinicService> {
    clinic
        .services
        .iter()
        .find(|s| s.service_name.to_ascii_uppercase().contains("ARV"))
}

/// Great-circle distance in metres.
pub fn distance_m(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lng2) = (to.0.to_radians(), to.1.to_radians());
    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}
