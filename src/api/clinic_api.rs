// src/api/clinic_api.rs

use super::HttpApi;
use crate::{
    error::ApiError,
    models::{ClinicDetail, ClinicDetails, CounselingCenterDetails},
};

impl HttpApi {
    pub async fn list_clinics(&self) -> Result<Vec<ClinicDetails>, ApiError> {
        self.get_json("clinics").await
    }

    pub async fn clinic_detail(&self, center_id: &str) -> Result<ClinicDetail, ApiError> {
        self.get_json(&format!("clinics/{center_id}/")).await
    }

    pub async fn list_counseling_centers(&self) -> Result<Vec<CounselingCenterDetails>, ApiError> {
        self.get_json("counseling-centers").await
    }
}
