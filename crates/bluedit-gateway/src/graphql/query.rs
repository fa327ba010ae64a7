use async_graphql::{Context, ErrorExtensions, Object, Result, ID};
use bluedit_upstream::UpstreamError;

use super::context::{RequestContext, ResolverSettings};
use super::types::{Post, Subbluedit, User};
use crate::error::GatewayError;
use crate::upstream::UpstreamApi;

/// Map an upstream read failure: 404 becomes `None`, anything else a
/// resolver error carrying `message`.
pub(crate) fn found_or_fail<T>(
    result: std::result::Result<T, UpstreamError>,
    message: &str,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => {
            tracing::error!(error = %e, "{message}");
            Err(GatewayError::ResolverFailed {
                message: message.to_string(),
            }
            .extend())
        }
    }
}

#[derive(Default)]
pub struct QueryRoot;

#[Object(name = "Query")]
impl QueryRoot {
    /// The signed-in user, or null without a valid session.
    async fn me(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let api = ctx.data::<UpstreamApi>()?;
        let settings = ctx.data::<ResolverSettings>()?;
        let request = ctx.data::<RequestContext>()?;

        let Some(credential) = request.credential(settings) else {
            return Ok(None);
        };
        match api.me(&credential).await {
            Ok(user) => Ok(Some(user.into())),
            Err(e) => {
                tracing::debug!(error = %e, "could not resolve current user");
                Ok(None)
            }
        }
    }

    async fn post_by_id(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Post>> {
        let api = ctx.data::<UpstreamApi>()?;
        let post = found_or_fail(api.post_by_id(&id).await, "Failed to fetch post")?;
        Ok(post.map(Post::from))
    }

    async fn subbluedit_by_name(
        &self,
        ctx: &Context<'_>,
        name: String,
    ) -> Result<Option<Subbluedit>> {
        let api = ctx.data::<UpstreamApi>()?;
        let subbluedit = found_or_fail(
            api.subbluedit_by_name(&name).await,
            "Failed to fetch subbluedit",
        )?;
        Ok(subbluedit.map(Subbluedit::from))
    }
}
