// src/api/service_api.rs

use reqwest::Method;

use super::HttpApi;
use crate::{error::ApiError, models::ClinicService};

impl HttpApi {
    /// `GET services?center_id=..`. The server may ignore the filter, so
    /// callers still filter by center.
    pub async fn services_by_center(&self, center_id: &str) -> Result<Vec<ClinicService>, ApiError> {
        let label = format!("GET services?center_id={center_id}");
        let builder = self
            .request(Method::GET, "services")
            .query(&[("center_id", center_id)]);
        let response = self.send(builder, &label).await?;
        Self::read_json(response, &label).await
    }

    pub async fn service_by_id(&self, service_id: &str) -> Result<ClinicService, ApiError> {
        self.get_json(&format!("services/{service_id}/")).await
    }
}
