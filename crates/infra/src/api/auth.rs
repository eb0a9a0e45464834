//! Email one-time-password sign-in and session management
//!
//! Registration and login both go through `request_otp` then `verify_otp`;
//! only a verified login yields credentials, which are stored through the
//! client's token manager.

use coursehub_common::Credentials;
use coursehub_domain::constants::{
    CURRENT_USER_PATH, LOGOUT_PATH, REGISTRATION_SUBMITTED_MESSAGE, REQUEST_OTP_PATH,
    VERIFY_OTP_PATH,
};
use coursehub_domain::{LoginResponse, MessageResponse, OtpPurpose, OtpRequest, OtpVerification};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::client::ApiClient;
use super::errors::ApiError;
use super::request::{ApiRequest, ApiResponse};

/// OTP authentication endpoints
#[derive(Debug, Clone, Copy)]
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Ask the backend to email a registration code
    ///
    /// # Errors
    /// Returns `ApiError::Status` if the backend rejects the address
    #[instrument(skip(self, email))]
    pub async fn request_registration_otp(&self, email: &str) -> Result<(), ApiError> {
        self.request_otp(email, OtpPurpose::Registration).await
    }

    /// Ask the backend to email a login code
    ///
    /// # Errors
    /// Returns `ApiError::AccountNotFound` if the address is not registered
    #[instrument(skip(self, email))]
    pub async fn request_login_otp(&self, email: &str) -> Result<(), ApiError> {
        match self.request_otp(email, OtpPurpose::Login).await {
            Err(err) if err.status() == Some(StatusCode::NOT_FOUND) => {
                Err(ApiError::AccountNotFound)
            }
            other => other,
        }
    }

    /// Submit a registration code; the account then awaits approval
    ///
    /// # Errors
    /// Returns `ApiError::UnexpectedResponse` unless the backend acknowledges
    /// the registration request
    #[instrument(skip(self, email, otp))]
    pub async fn register(&self, email: &str, otp: &str) -> Result<(), ApiError> {
        let response = self.verify_otp(email, otp, OtpPurpose::Registration).await?;
        let ack: MessageResponse = response.json()?;

        if ack.message.as_deref() != Some(REGISTRATION_SUBMITTED_MESSAGE) {
            return Err(ApiError::UnexpectedResponse(format!(
                "registration was not acknowledged: {}",
                ack.message.unwrap_or_default()
            )));
        }

        info!("Registration request submitted");
        Ok(())
    }

    /// Submit a login code and store the returned credentials
    ///
    /// # Errors
    /// - `ApiError::RegistrationPending` if the account is still awaiting
    ///   approval
    /// - `ApiError::Storage` if the credentials cannot be persisted
    #[instrument(skip(self, email, otp))]
    pub async fn verify_login_otp(&self, email: &str, otp: &str) -> Result<LoginResponse, ApiError> {
        let response = self.verify_otp(email, otp, OtpPurpose::Login).await?;

        let ack: MessageResponse = response.json().unwrap_or_default();
        if ack.message.as_deref() == Some(REGISTRATION_SUBMITTED_MESSAGE) {
            return Err(ApiError::RegistrationPending);
        }

        let login: LoginResponse = response.json()?;
        self.client
            .tokens()
            .store(&Credentials::new(login.access.clone(), login.refresh.clone()))
            .await?;

        info!("Signed in");
        Ok(login)
    }

    /// Fetch the current user if a session is stored
    ///
    /// Returns `None` without touching the network when no access token is
    /// stored, and `None` on any request failure.
    #[instrument(skip(self))]
    pub async fn verify_session(&self) -> Option<Value> {
        match self.client.tokens().access_token().await {
            Ok(Some(_)) => {}
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %err, "Could not read stored access token");
                return None;
            }
        }

        match self.client.get::<Value>(CURRENT_USER_PATH).await {
            Ok(user) => Some(user),
            Err(err) => {
                debug!(error = %err, "Session verification failed");
                None
            }
        }
    }

    /// End the session on the backend and locally
    ///
    /// A failed logout call is logged; the stored credentials are cleared
    /// either way.
    ///
    /// # Errors
    /// Returns `ApiError::Storage` if the credentials cannot be cleared
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        if let Err(err) = self.client.send(ApiRequest::post(LOGOUT_PATH)).await {
            warn!(error = %err, "Logout request failed");
        }

        self.client.tokens().clear().await?;
        Ok(())
    }

    async fn request_otp(&self, email: &str, purpose: OtpPurpose) -> Result<(), ApiError> {
        let request = ApiRequest::post(REQUEST_OTP_PATH).json(&OtpRequest { email, purpose })?;
        self.client.send(request).await?;
        debug!(?purpose, "OTP requested");
        Ok(())
    }

    async fn verify_otp(
        &self,
        email: &str,
        otp: &str,
        purpose: OtpPurpose,
    ) -> Result<ApiResponse, ApiError> {
        let request =
            ApiRequest::post(VERIFY_OTP_PATH).json(&OtpVerification { email, otp, purpose })?;
        self.client.send(request).await
    }
}

impl ApiClient {
    /// OTP authentication endpoints
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }
}
