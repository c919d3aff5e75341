// src/repository/auth_repository.rs

use tracing::{error, info};

use crate::{
    api::HttpApi,
    auth::{login_error, register_error},
    error::ApiError,
    models::{LoginRequest, LoginResponse, SignUpRequest},
    settings::SettingsStore,
};

#[derive(Clone, Debug)]
pub struct AuthRepository {
    api: HttpApi,
    settings: SettingsStore,
}

impl AuthRepository {
    pub fn new(api: HttpApi, settings: SettingsStore) -> Self {
        Self { api, settings }
    }

    /// On success the token goes into the shared session and the user id
    /// into local settings, so later calls are authorised.
    pub async fn login(&self, phone_number: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = LoginRequest {
            phone_number: phone_number.to_string(),
            password: password.to_string(),
        };

        let response = match self.api.login(&request).await {
            Ok(response) => response,
            Err(ApiError::Http { status, body, .. }) => {
                error!(status, %body, "login rejected");
                return Err(login_error(Some(&body)));
            }
            Err(e @ ApiError::EmptyBody(_)) => return Err(e.with_context("Login")),
            Err(e) => {
                error!(error = %e, "login request failed");
                return Err(e.with_context("Login request failed"));
            }
        };

        self.api.session().set_token(response.token.clone());
        self.settings
            .update(|s| {
                s.auth_token = Some(response.token.clone());
                if let Some(user_id) = &response.user_id {
                    s.user_id = Some(user_id.clone());
                }
            })
            .await?;
        info!(user_id = ?response.user_id, "logged in");
        Ok(response)
    }

    pub async fn register(&self, request: &SignUpRequest) -> Result<(), ApiError> {
        match self.api.register(request).await {
            Ok(()) => {
                info!(phone_number = %request.phone_number, "registered");
                Ok(())
            }
            Err(ApiError::Http { status, body, .. }) => {
                error!(status, %body, "registration rejected");
                Err(register_error(Some(&body), status))
            }
            Err(e) => {
                error!(error = %e, "registration request failed");
                Err(e.with_context("Registration request failed"))
            }
        }
    }

    /// Drop the token everywhere.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.api.session().invalidate();
        self.settings
            .update(|s| {
                s.auth_token = None;
                s.user_id = None;
            })
            .await?;
        Ok(())
    }
}
