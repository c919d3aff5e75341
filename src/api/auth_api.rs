// src/api/auth_api.rs

use reqwest::Method;

use super::HttpApi;
use crate::{
    error::ApiError,
    models::{LoginRequest, LoginResponse, SignUpRequest},
};

impl HttpApi {
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let label = "POST login/";
        let response = self
            .send(self.request(Method::POST, "login/").json(request), label)
            .await?;
        Self::read_json(response, label).await
    }

    /// The register endpoint returns no useful body on success.
    pub async fn register(&self, request: &SignUpRequest) -> Result<(), ApiError> {
        self.send(
            self.request(Method::POST, "register/").json(request),
            "POST register/",
        )
        .await?;
        Ok(())
    }
}
