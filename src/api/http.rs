//! Async HTTP implementation of the remote gateway over `reqwest`.

use chrono::NaiveDate;

use crate::config;
use crate::models::medicine::MedicineSummary;
use crate::models::prescription::PrescriptionRecord;
use crate::models::user::SessionUser;
use crate::session::Credential;

use super::error::GatewayError;
use super::types::{
    CreateResponse, PrescriptionPayload, RegistrationRequest, SearchResponse, SignInRequest,
    SignInResponse, ValidateResponse,
};
use super::{RemoteGateway, SignInGrant};

/// HTTP client for the auth, catalog and prescription services.
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpGateway {
    /// Create a gateway against the given base URL (including `/api`).
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    /// Gateway configured from the environment (`RECETTA_BACKEND_URL`).
    pub fn from_env() -> Self {
        Self::new(&config::backend_url(), config::GATEWAY_TIMEOUT_SECS)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn transport_error(&self, e: reqwest::Error) -> GatewayError {
        if e.is_connect() {
            GatewayError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            GatewayError::Timeout(self.timeout_secs)
        } else {
            GatewayError::Transport(e.to_string())
        }
    }

    /// Map non-success statuses; 401/403 mean the bearer was rejected.
    async fn expect_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(GatewayError::InvalidCredentials);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Backend {
            status: status.as_u16(),
            body,
        })
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::ResponseParsing(e.to_string()))
    }
}

impl RemoteGateway for HttpGateway {
    async fn validate_credential(
        &self,
        credential: &Credential,
    ) -> Result<SessionUser, GatewayError> {
        let response = self
            .client
            .post(self.url("/auth/v1/validate"))
            .bearer_auth(credential.expose())
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let parsed: ValidateResponse = Self::parse(Self::expect_success(response).await?).await?;
        if !parsed.is_valid {
            return Err(GatewayError::InvalidCredentials);
        }
        Ok(SessionUser::from_wire(
            parsed.user_id,
            parsed.email,
            &parsed.first_name,
            &parsed.last_name,
            &parsed.roles,
        ))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInGrant, GatewayError> {
        let response = self
            .client
            .post(self.url("/auth/v1/signin"))
            .json(&SignInRequest { email, password })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let parsed: SignInResponse = Self::parse(Self::expect_success(response).await?).await?;
        let user = SessionUser::from_wire(
            parsed.user_info.id,
            parsed.user_info.email,
            &parsed.user_info.first_name,
            &parsed.user_info.last_name,
            &parsed.user_info.roles,
        );
        Ok(SignInGrant {
            token: parsed.token,
            user,
        })
    }

    async fn sign_out(&self, credential: &Credential) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.url("/auth/v1/sign-out"))
            .bearer_auth(credential.expose())
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn sign_up(&self, request: &RegistrationRequest) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.url("/auth/v1/signup"))
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn search_medicines(
        &self,
        credential: &Credential,
        query: &str,
    ) -> Result<Vec<MedicineSummary>, GatewayError> {
        let response = self
            .client
            .get(self.url("/medicines/v1/search"))
            .query(&[("query", query)])
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let parsed: SearchResponse = Self::parse(Self::expect_success(response).await?).await?;
        Ok(parsed.into_results())
    }

    async fn create_prescription(
        &self,
        credential: &Credential,
        payload: &PrescriptionPayload,
    ) -> Result<i64, GatewayError> {
        let response = self
            .client
            .post(self.url("/prescriptions/v1"))
            .bearer_auth(credential.expose())
            .json(payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let parsed: CreateResponse = Self::parse(Self::expect_success(response).await?).await?;
        Ok(parsed.id)
    }

    async fn submit_prescription(
        &self,
        credential: &Credential,
        prescription_id: i64,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .put(self.url(&format!("/prescriptions/v1/{prescription_id}/submit")))
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn incomplete_prescriptions(
        &self,
        credential: &Credential,
        date: NaiveDate,
    ) -> Result<Vec<PrescriptionRecord>, GatewayError> {
        let response = self
            .client
            .get(self.url("/prescriptions/v1/incomplete"))
            .query(&[("date", date.format("%Y-%m-%d").to_string())])
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::parse(Self::expect_success(response).await?).await
    }

    async fn prescription_by_visit(
        &self,
        credential: &Credential,
        visit_id: i64,
    ) -> Result<PrescriptionRecord, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!("/prescriptions/v1/visits/{visit_id}")))
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::parse(Self::expect_success(response).await?).await
    }

    async fn medicine_by_id(
        &self,
        credential: &Credential,
        catalog_id: &str,
    ) -> Result<MedicineSummary, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!("/medicines/v1/{catalog_id}")))
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::parse(Self::expect_success(response).await?).await
    }

    async fn upload_catalog(&self, credential: &Credential) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.url("/medicines/v1/upload"))
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn rebuild_catalog_cache(&self, credential: &Credential) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.url("/medicines/v1/cache"))
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::expect_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let gateway = HttpGateway::new("http://localhost:8080/api/", 30);
        assert_eq!(gateway.base_url(), "http://localhost:8080/api");
    }

    #[test]
    fn url_joins_base_and_path() {
        let gateway = HttpGateway::new("http://localhost:8080/api", 30);
        assert_eq!(
            gateway.url("/medicines/v1/search"),
            "http://localhost:8080/api/medicines/v1/search"
        );
    }

    #[test]
    fn from_env_uses_config_default() {
        if std::env::var("RECETTA_BACKEND_URL").is_err() {
            let gateway = HttpGateway::from_env();
            assert_eq!(gateway.base_url(), "http://localhost:8080/api");
        }
    }
}
