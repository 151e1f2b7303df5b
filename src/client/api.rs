use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::{ApiClient, ClientResult, Session};
use crate::auth::{LoginRequest, LoginResponse};
use crate::database::models::{
    Actuacion, ActuacionInput, ActuacionPatch, Alerta, AlertaInput, AlertaPatch, CaseDetail, CaseInput,
    CasePatch, CaseSummary, CreateUserRequest, Nota, NotaInput, NotaPatch, UserView,
};
use crate::services::Dashboard;
use crate::types::CaseStatus;

fn to_body<T: Serialize>(value: &T) -> ClientResult<Option<Value>> {
    Ok(Some(serde_json::to_value(value)?))
}

impl ApiClient {
    // Session

    /// Log in and remember the tokens and user
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let request = LoginRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        };
        let response: LoginResponse = self.request_public("/auth/login/", &request).await?;

        self.tokens.save(&Session {
            server_url: Some(self.base_url().to_string()),
            access: Some(response.access.clone()),
            refresh: Some(response.refresh.clone()),
            user: Some(response.user.clone()),
        })?;
        info!("Logged in as '{}'", response.user.username);
        Ok(response)
    }

    pub fn logout(&self) -> ClientResult<()> {
        self.tokens.clear()
    }

    /// The stored user, checked against the server. Any failure ends the session.
    pub async fn current_user(&self) -> ClientResult<Option<UserView>> {
        let mut session = self.tokens.load()?;
        if session.access.is_none() {
            return Ok(None);
        }

        match self.request_json::<UserView>(Method::GET, "/auth/me/", None).await {
            Ok(user) => {
                // A refresh during the call may have replaced the access token
                session = self.tokens.load()?;
                session.user = Some(user.clone());
                self.tokens.save(&session)?;
                Ok(Some(user))
            }
            Err(e) => {
                tracing::debug!("Stored session is no longer valid: {}", e);
                self.tokens.clear()?;
                Ok(None)
            }
        }
    }

    pub async fn dashboard(&self) -> ClientResult<Dashboard> {
        self.request_json(Method::GET, "/dashboard/", None).await
    }

    // Cases

    pub async fn list_cases(
        &self,
        search: Option<&str>,
        estado: Option<CaseStatus>,
    ) -> ClientResult<Vec<CaseSummary>> {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(search) = search.filter(|s| !s.trim().is_empty()) {
            query.append_pair("search", search);
        }
        if let Some(estado) = estado {
            query.append_pair("estado", estado.as_str());
        }
        let query = query.finish();

        let endpoint = if query.is_empty() {
            "/cases/".to_string()
        } else {
            format!("/cases/?{}", query)
        };
        self.request_json(Method::GET, &endpoint, None).await
    }

    pub async fn get_case(&self, id: i64) -> ClientResult<CaseDetail> {
        self.request_json(Method::GET, &format!("/cases/{}/", id), None).await
    }

    pub async fn create_case(&self, input: &CaseInput) -> ClientResult<CaseDetail> {
        self.request_json(Method::POST, "/cases/", to_body(input)?).await
    }

    pub async fn update_case(&self, id: i64, patch: &CasePatch) -> ClientResult<CaseDetail> {
        self.request_json(Method::PATCH, &format!("/cases/{}/", id), to_body(patch)?).await
    }

    pub async fn delete_case(&self, id: i64) -> ClientResult<()> {
        self.request(Method::DELETE, &format!("/cases/{}/", id), None).await?;
        Ok(())
    }

    // Actuaciones

    pub async fn create_actuacion(&self, caso: i64, input: &ActuacionInput) -> ClientResult<Actuacion> {
        self.request_json(Method::POST, &format!("/cases/{}/add_actuacion/", caso), to_body(input)?)
            .await
    }

    pub async fn update_actuacion(&self, id: i64, patch: &ActuacionPatch) -> ClientResult<Actuacion> {
        self.request_json(Method::PATCH, &format!("/actuaciones/{}/", id), to_body(patch)?).await
    }

    pub async fn delete_actuacion(&self, id: i64) -> ClientResult<()> {
        self.request(Method::DELETE, &format!("/actuaciones/{}/", id), None).await?;
        Ok(())
    }

    // Alertas

    pub async fn create_alerta(&self, caso: i64, input: &AlertaInput) -> ClientResult<Alerta> {
        self.request_json(Method::POST, &format!("/cases/{}/add_alerta/", caso), to_body(input)?)
            .await
    }

    pub async fn update_alerta(&self, id: i64, patch: &AlertaPatch) -> ClientResult<Alerta> {
        self.request_json(Method::PATCH, &format!("/alertas/{}/", id), to_body(patch)?).await
    }

    pub async fn toggle_alerta(&self, id: i64) -> ClientResult<Alerta> {
        self.request_json(Method::POST, &format!("/alertas/{}/toggle_cumplida/", id), None)
            .await
    }

    pub async fn delete_alerta(&self, id: i64) -> ClientResult<()> {
        self.request(Method::DELETE, &format!("/alertas/{}/", id), None).await?;
        Ok(())
    }

    // Notas

    pub async fn create_nota(&self, caso: i64, input: &NotaInput) -> ClientResult<Nota> {
        self.request_json(Method::POST, &format!("/cases/{}/add_note/", caso), to_body(input)?)
            .await
    }

    pub async fn update_nota(&self, id: i64, patch: &NotaPatch) -> ClientResult<Nota> {
        self.request_json(Method::PATCH, &format!("/notas/{}/", id), to_body(patch)?).await
    }

    pub async fn delete_nota(&self, id: i64) -> ClientResult<()> {
        self.request(Method::DELETE, &format!("/notas/{}/", id), None).await?;
        Ok(())
    }

    // Users

    pub async fn list_users(&self) -> ClientResult<Vec<UserView>> {
        self.request_json(Method::GET, "/users/", None).await
    }

    pub async fn create_user(&self, request: &CreateUserRequest) -> ClientResult<UserView> {
        self.request_json(Method::POST, "/users/", to_body(request)?).await
    }

    pub async fn delete_user(&self, id: i64) -> ClientResult<()> {
        self.request(Method::DELETE, &format!("/users/{}/", id), None).await?;
        Ok(())
    }
}
