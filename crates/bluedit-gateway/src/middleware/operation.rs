//! GraphQL payload inspection.
//!
//! On `POST /` the JSON payload is checked for shape and the requested
//! operation is classified by parsing the document, so later stages can tell
//! queries from mutations without looking at the body again.

use async_graphql::parser::parse_query;
use async_graphql::parser::types::{DocumentOperations, OperationDefinition, OperationType, Selection};
use axum::body::Body;
use axum::extract::Request;
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use super::sanitize::JsonBody;
use crate::error::{FieldError, GatewayError};

/// Root mutation fields that may be called without a session.
pub const PUBLIC_MUTATIONS: &[&str] = &["signInWithGoogle", "__typename"];

/// Classification of the operation a GraphQL request will run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    /// A mutation touching at least one protected root field.
    Mutation,
    /// A mutation whose root fields are all public.
    PublicMutation,
}

impl OperationKind {
    pub fn is_mutation(self) -> bool {
        matches!(self, Self::Mutation | Self::PublicMutation)
    }
}

/// Classify `query`, selecting the operation named `operation_name` if given.
///
/// Documents that fail to parse are treated as queries; the executor rejects
/// them before any resolver runs. With no (or an unknown) operation name, the
/// document counts as a mutation if it contains any mutation.
pub fn classify(query: &str, operation_name: Option<&str>) -> OperationKind {
    let document = match parse_query(query) {
        Ok(document) => document,
        Err(e) => {
            tracing::debug!(error = %e, "unparseable GraphQL document");
            return OperationKind::Query;
        }
    };

    let selected: Option<&OperationDefinition> = match (&document.operations, operation_name) {
        (DocumentOperations::Single(op), _) => Some(&op.node),
        (DocumentOperations::Multiple(ops), Some(name)) => ops
            .iter()
            .find(|(op_name, _)| op_name.as_str() == name)
            .map(|(_, op)| &op.node),
        (DocumentOperations::Multiple(_), None) => None,
    };

    match selected {
        Some(op) => kind_of(op),
        None => {
            let mut kinds = document.operations.iter().map(|(_, op)| kind_of(&op.node));
            if kinds.any(|k| k == OperationKind::Mutation) {
                OperationKind::Mutation
            } else if document
                .operations
                .iter()
                .any(|(_, op)| op.node.ty == OperationType::Mutation)
            {
                OperationKind::PublicMutation
            } else {
                OperationKind::Query
            }
        }
    }
}

fn kind_of(op: &OperationDefinition) -> OperationKind {
    if op.ty != OperationType::Mutation {
        return OperationKind::Query;
    }
    let all_public = op.selection_set.node.items.iter().all(|item| match &item.node {
        Selection::Field(field) => PUBLIC_MUTATIONS.contains(&field.node.name.node.as_str()),
        // Fragments at the root are not resolved here.
        _ => false,
    });
    if all_public {
        OperationKind::PublicMutation
    } else {
        OperationKind::Mutation
    }
}

/// Check the `{query, variables?, operationName?}` shape.
pub fn validate_payload(body: &serde_json::Map<String, Value>) -> Result<(), GatewayError> {
    let mut errors = Vec::new();
    if let Some(query) = body.get("query") {
        if !query.is_string() {
            errors.push(FieldError::new("query", "Query must be a string"));
        }
    }
    if let Some(variables) = body.get("variables") {
        if !variables.is_null() && !variables.is_object() {
            errors.push(FieldError::new("variables", "Variables must be an object"));
        }
    }
    if let Some(name) = body.get("operationName") {
        if !name.is_null() && !name.is_string() {
            errors.push(FieldError::new("operationName", "Operation name must be a string"));
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(GatewayError::InvalidFields { errors })
    }
}

/// Validates and classifies GraphQL payloads on `POST /`.
///
/// The body is read whatever its content type, since the executor will try
/// to parse it as JSON regardless.
pub async fn inspect_graphql(request: Request, next: Next) -> Response {
    if request.method() != Method::POST || request.uri().path() != "/" {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let (payload, body) = match parts.extensions.get::<JsonBody>() {
        Some(JsonBody(value)) => (Some(value.clone()), body),
        None => match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => (serde_json::from_slice::<Value>(&bytes).ok(), Body::from(bytes)),
            Err(e) => {
                return GatewayError::MalformedBody {
                    message: e.to_string(),
                }
                .into_response()
            }
        },
    };

    let kind = match payload {
        Some(Value::Object(map)) => {
            if let Err(e) = validate_payload(&map) {
                return e.into_response();
            }
            match map.get("query").and_then(Value::as_str) {
                Some(query) => classify(
                    query,
                    map.get("operationName").and_then(Value::as_str),
                ),
                None => OperationKind::Query,
            }
        }
        _ => OperationKind::Query,
    };

    tracing::debug!(operation = ?kind, "classified GraphQL request");
    parts.extensions.insert(kind);
    next.run(Request::from_parts(parts, body)).await
}
