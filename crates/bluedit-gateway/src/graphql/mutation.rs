use async_graphql::{Context, ErrorExtensions, Object, Result, ID};
use bluedit_core::{NewComment, NewPost, NewSubbluedit, NewVote};
use bluedit_upstream::{Credential, UpstreamError};
use http::header::SET_COOKIE;

use super::context::{RequestContext, ResolverSettings};
use super::types::{Comment, Post, Subbluedit, User};
use super::validation;
use crate::error::GatewayError;
use crate::upstream::UpstreamApi;

fn credential(ctx: &Context<'_>) -> Result<Credential> {
    let settings = ctx.data::<ResolverSettings>()?;
    let request = ctx.data::<RequestContext>()?;
    request
        .credential(settings)
        .ok_or_else(|| GatewayError::Unauthenticated.extend())
}

fn failed(message: &'static str) -> impl FnOnce(UpstreamError) -> async_graphql::Error {
    move |e| {
        tracing::error!(error = %e, "{message}");
        GatewayError::ResolverFailed {
            message: message.to_string(),
        }
        .extend()
    }
}

#[derive(Default)]
pub struct MutationRoot;

#[Object(name = "Mutation")]
impl MutationRoot {
    /// Exchange a Google token for a session. Sets the session cookie.
    async fn sign_in_with_google(
        &self,
        ctx: &Context<'_>,
        google_token: String,
    ) -> Result<Option<User>> {
        validation::sign_in(&google_token).map_err(|e| e.extend())?;
        let api = ctx.data::<UpstreamApi>()?;
        let settings = ctx.data::<ResolverSettings>()?;

        let auth = api
            .sign_in_with_google(&google_token)
            .await
            .map_err(failed("Failed to sign in with Google"))?;

        let cookie = settings.cookie.header_value(&auth.token).map_err(|e| {
            tracing::error!(error = %e, "session token cannot be set as a cookie");
            GatewayError::ResolverFailed {
                message: "Failed to sign in with Google".into(),
            }
            .extend()
        })?;
        ctx.append_http_header(SET_COOKIE, cookie);
        tracing::info!(user_id = %auth.user.id, "user signed in");
        Ok(Some(auth.user.into()))
    }

    async fn create_subbluedit(
        &self,
        ctx: &Context<'_>,
        name: String,
        description: Option<String>,
    ) -> Result<Option<Subbluedit>> {
        let credential = credential(ctx)?;
        validation::new_subbluedit(&name).map_err(|e| e.extend())?;
        let api = ctx.data::<UpstreamApi>()?;
        let created = api
            .create_subbluedit(&credential, &NewSubbluedit { name, description })
            .await
            .map_err(failed("Failed to create subbluedit"))?;
        Ok(Some(created.into()))
    }

    async fn create_post(
        &self,
        ctx: &Context<'_>,
        subbluedit_name: String,
        title: String,
        body: Option<String>,
    ) -> Result<Option<Post>> {
        let credential = credential(ctx)?;
        validation::new_post(&subbluedit_name, &title, body.as_deref())
            .map_err(|e| e.extend())?;
        let api = ctx.data::<UpstreamApi>()?;
        let input = NewPost {
            subbluedit_name,
            title,
            body,
        };
        let created = api
            .create_post(&credential, &input)
            .await
            .map_err(failed("Failed to create post"))?;
        Ok(Some(created.into()))
    }

    async fn create_comment(
        &self,
        ctx: &Context<'_>,
        post_id: ID,
        body: String,
    ) -> Result<Option<Comment>> {
        let credential = credential(ctx)?;
        validation::new_comment(&post_id, &body).map_err(|e| e.extend())?;
        let api = ctx.data::<UpstreamApi>()?;
        let input = NewComment {
            post_id: post_id.0,
            body,
        };
        let created = api
            .create_comment(&credential, &input)
            .await
            .map_err(failed("Failed to create comment"))?;
        Ok(Some(created.into()))
    }

    /// Returns whether the backend recorded the vote.
    async fn vote(
        &self,
        ctx: &Context<'_>,
        votable_id: ID,
        votable_type: String,
        value: i32,
    ) -> Result<Option<bool>> {
        let credential = credential(ctx)?;
        let kind = validation::new_vote(&votable_id, &votable_type, value)
            .map_err(|e| e.extend())?;
        let api = ctx.data::<UpstreamApi>()?;
        let input = NewVote {
            votable_id: votable_id.0,
            votable_type: kind.to_string(),
            value,
        };
        let response = api
            .vote(&credential, &input)
            .await
            .map_err(failed("Failed to vote"))?;
        Ok(Some(response.success))
    }
}
