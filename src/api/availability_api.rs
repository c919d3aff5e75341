// src/api/availability_api.rs

use super::HttpApi;
use crate::{error::ApiError, models::ArvAvailability};

impl HttpApi {
    pub async fn arv_availability(&self) -> Result<Vec<ArvAvailability>, ApiError> {
        self.get_json("arvavailability/").await
    }

    pub async fn arv_availability_for_center(
        &self,
        center_id: &str,
    ) -> Result<ArvAvailability, ApiError> {
        self.get_json(&format!("arvavailability/{center_id}/")).await
    }
}
