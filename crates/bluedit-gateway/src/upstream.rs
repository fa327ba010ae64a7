//! Typed calls against the Bluedit REST backend.

use std::sync::Arc;

use axum::http::Method;
use bluedit_core::{
    ApiAuthResponse, ApiComment, ApiPost, ApiSubbluedit, ApiUser, ApiVoteResponse, GoogleSignIn,
    NewComment, NewPost, NewSubbluedit, NewVote,
};
use bluedit_upstream::{Credential, RestRequest, UpstreamError};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::state::DynRestTransport;

/// The backend's REST surface, one method per endpoint the resolvers use.
#[derive(Clone)]
pub struct UpstreamApi {
    transport: Arc<dyn DynRestTransport>,
}

impl UpstreamApi {
    pub fn new(transport: Arc<dyn DynRestTransport>) -> Self {
        Self { transport }
    }

    /// `GET /auth/me`
    pub async fn me(&self, credential: &Credential) -> Result<ApiUser, UpstreamError> {
        self.call(Method::GET, "/auth/me".into(), None::<&()>, Some(credential))
            .await
    }

    /// `POST /auth/google`
    pub async fn sign_in_with_google(
        &self,
        google_token: &str,
    ) -> Result<ApiAuthResponse, UpstreamError> {
        let body = GoogleSignIn {
            google_token: google_token.to_string(),
        };
        self.call(Method::POST, "/auth/google".into(), Some(&body), None)
            .await
    }

    /// `GET /subbluedits/:name`
    pub async fn subbluedit_by_name(&self, name: &str) -> Result<ApiSubbluedit, UpstreamError> {
        let path = format!("/subbluedits/{}", urlencoding::encode(name));
        self.call(Method::GET, path, None::<&()>, None).await
    }

    /// `POST /subbluedits`
    pub async fn create_subbluedit(
        &self,
        credential: &Credential,
        input: &NewSubbluedit,
    ) -> Result<ApiSubbluedit, UpstreamError> {
        self.call(Method::POST, "/subbluedits".into(), Some(input), Some(credential))
            .await
    }

    /// `GET /posts/:id`
    pub async fn post_by_id(&self, id: &str) -> Result<ApiPost, UpstreamError> {
        let path = format!("/posts/{}", urlencoding::encode(id));
        self.call(Method::GET, path, None::<&()>, None).await
    }

    /// `POST /posts`
    pub async fn create_post(
        &self,
        credential: &Credential,
        input: &NewPost,
    ) -> Result<ApiPost, UpstreamError> {
        self.call(Method::POST, "/posts".into(), Some(input), Some(credential))
            .await
    }

    /// `POST /comments`
    pub async fn create_comment(
        &self,
        credential: &Credential,
        input: &NewComment,
    ) -> Result<ApiComment, UpstreamError> {
        self.call(Method::POST, "/comments".into(), Some(input), Some(credential))
            .await
    }

    /// `POST /votes`
    pub async fn vote(
        &self,
        credential: &Credential,
        input: &NewVote,
    ) -> Result<ApiVoteResponse, UpstreamError> {
        self.call(Method::POST, "/votes".into(), Some(input), Some(credential))
            .await
    }

    async fn call<B, T>(
        &self,
        method: Method,
        path: String,
        body: Option<&B>,
        credential: Option<&Credential>,
    ) -> Result<T, UpstreamError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = RestRequest::new(method, path).with_credential(credential)?;
        if let Some(body) = body {
            let body = serde_json::to_value(body).map_err(|e| UpstreamError::Transport {
                message: format!("could not encode request body: {e}"),
            })?;
            request = request.with_body(body);
        }
        let path = request.path.clone();
        let value = self.transport.send(request).await?;
        serde_json::from_value(value).map_err(|e| {
            tracing::warn!(%path, error = %e, "unexpected upstream response shape");
            UpstreamError::Decode {
                message: format!("Unexpected response from server: {e}"),
            }
        })
    }
}
