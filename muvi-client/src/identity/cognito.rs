//! User pool client over the identity provider's JSON API
//!
//! Every operation is a `POST /` with an `X-Amz-Target` header naming the action and a
//! JSON body. Unauthenticated actions (sign-up, sign-in, password reset) only need the
//! app client id; `GetUser` and `GlobalSignOut` take the user's access token.

use super::{AuthTokens, IdentityApi, IdentityUser, SignUpOutcome};
use async_trait::async_trait;
use muvi_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";

/// Identity provider client for one app client of one user pool
#[derive(Clone)]
pub struct CognitoClient {
    http_client: reqwest::Client,
    endpoint: String,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(rename = "__type", default)]
    code: String,
    #[serde(alias = "Message", default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
    challenge_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    access_token: String,
    id_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SignUpResponse {
    #[serde(default)]
    user_confirmed: bool,
    user_sub: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetUserResponse {
    username: String,
    #[serde(default)]
    user_attributes: Vec<UserAttribute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserAttribute {
    name: String,
    #[serde(default)]
    value: String,
}

impl CognitoClient {
    /// Client for the regional endpoint
    pub fn new(region: &str, client_id: &str) -> Result<Self> {
        Self::with_endpoint(&format!("https://cognito-idp.{}.amazonaws.com/", region), client_id)
    }

    /// Client for an explicit endpoint (local emulators, tests)
    pub fn with_endpoint(endpoint: &str, client_id: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.to_string(),
            client_id: client_id.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(&self, action: &str, body: Value) -> Result<T> {
        tracing::debug!(action = %action, "Identity request");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .header("X-Amz-Target", format!("{}.{}", TARGET_PREFIX, action))
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            let err: ServiceError = serde_json::from_str(&text).unwrap_or(ServiceError {
                code: String::new(),
                message: text,
            });
            tracing::warn!(
                action = %action,
                status = status.as_u16(),
                code = %err.code,
                "Identity request rejected"
            );
            return Err(Error::identity(&err.code, err.message));
        }

        // Several actions answer with an empty body
        let text = if text.trim().is_empty() { "{}" } else { &text };
        serde_json::from_str(text).map_err(|e| Error::Parse(format!("{}: {}", action, e)))
    }

    async fn initiate_auth(&self, flow: &str, parameters: Value) -> Result<AuthTokens> {
        let response: InitiateAuthResponse = self
            .call(
                "InitiateAuth",
                json!({
                    "AuthFlow": flow,
                    "ClientId": self.client_id,
                    "AuthParameters": parameters,
                }),
            )
            .await?;

        match (response.authentication_result, response.challenge_name) {
            (Some(result), _) => Ok(AuthTokens {
                access_token: result.access_token,
                id_token: result.id_token,
                refresh_token: result.refresh_token,
                expires_in: result.expires_in,
            }),
            (None, Some(challenge)) => Err(Error::Identity {
                kind: muvi_common::IdentityErrorKind::Other,
                message: format!("Sign-in needs an unsupported challenge: {}", challenge),
            }),
            (None, None) => Err(Error::Parse(
                "InitiateAuth returned neither tokens nor a challenge".to_string(),
            )),
        }
    }
}

#[async_trait]
impl IdentityApi for CognitoClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let response: SignUpResponse = self
            .call(
                "SignUp",
                json!({
                    "ClientId": self.client_id,
                    "Username": email,
                    "Password": password,
                    "UserAttributes": [],
                }),
            )
            .await?;

        tracing::info!(confirmed = response.user_confirmed, "Signed up");
        Ok(SignUpOutcome {
            user_sub: response.user_sub,
            user_confirmed: response.user_confirmed,
        })
    }

    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<()> {
        let _: Value = self
            .call(
                "ConfirmSignUp",
                json!({
                    "ClientId": self.client_id,
                    "Username": email,
                    "ConfirmationCode": code,
                    "ForceAliasCreation": true,
                }),
            )
            .await?;
        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthTokens> {
        self.initiate_auth(
            "USER_PASSWORD_AUTH",
            json!({ "USERNAME": email, "PASSWORD": password }),
        )
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens> {
        self.initiate_auth("REFRESH_TOKEN_AUTH", json!({ "REFRESH_TOKEN": refresh_token }))
            .await
    }

    async fn forgot_password(&self, email: &str) -> Result<()> {
        let _: Value = self
            .call(
                "ForgotPassword",
                json!({ "ClientId": self.client_id, "Username": email }),
            )
            .await?;
        Ok(())
    }

    async fn confirm_password(&self, email: &str, code: &str, new_password: &str) -> Result<()> {
        let _: Value = self
            .call(
                "ConfirmForgotPassword",
                json!({
                    "ClientId": self.client_id,
                    "Username": email,
                    "ConfirmationCode": code,
                    "Password": new_password,
                }),
            )
            .await?;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<IdentityUser> {
        let response: GetUserResponse = self
            .call("GetUser", json!({ "AccessToken": access_token }))
            .await?;

        Ok(IdentityUser {
            username: response.username,
            attributes: response
                .user_attributes
                .into_iter()
                .map(|a| (a.name, a.value))
                .collect(),
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let _: Value = self
            .call("GlobalSignOut", json!({ "AccessToken": access_token }))
            .await?;
        Ok(())
    }
}
