//! Argument checks run by resolvers before any upstream call.

use bluedit_core::VotableType;

use crate::error::{FieldError, GatewayError};

const MAX_SUBBLUEDIT_NAME: usize = 50;
const MAX_TITLE: usize = 300;
const MAX_POST_BODY: usize = 10_000;
const MAX_COMMENT_BODY: usize = 1_000;

/// Collects at most one error per field.
#[derive(Debug, Default)]
struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    fn check(&mut self, field: &str, ok: bool, message: &str) -> &mut Self {
        if !ok && !self.errors.iter().any(|e| e.field == field) {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    fn finish(&mut self) -> Result<(), GatewayError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::InvalidFields {
                errors: std::mem::take(&mut self.errors),
            })
        }
    }
}

fn len(s: &str) -> usize {
    s.chars().count()
}

fn within(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&len(s))
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn subbluedit_name(checks: &mut Checks, field: &str, name: &str) {
    checks
        .check(
            field,
            within(name, 1, MAX_SUBBLUEDIT_NAME),
            "Subbluedit name must be between 1 and 50 characters",
        )
        .check(
            field,
            is_identifier(name),
            "Subbluedit name can only contain letters, numbers, and underscores",
        );
}

pub fn sign_in(google_token: &str) -> Result<(), GatewayError> {
    Checks::default()
        .check("googleToken", !google_token.is_empty(), "Google token cannot be empty")
        .finish()
}

pub fn new_subbluedit(name: &str) -> Result<(), GatewayError> {
    let mut checks = Checks::default();
    subbluedit_name(&mut checks, "name", name);
    checks.finish()
}

pub fn new_post(subbluedit: &str, title: &str, body: Option<&str>) -> Result<(), GatewayError> {
    let mut checks = Checks::default();
    subbluedit_name(&mut checks, "subblueditName", subbluedit);
    checks
        .check(
            "title",
            within(title, 1, MAX_TITLE),
            "Title must be between 1 and 300 characters",
        )
        .check(
            "body",
            body.is_none_or(|b| len(b) <= MAX_POST_BODY),
            "Body cannot exceed 10,000 characters",
        )
        .finish()
}

pub fn new_comment(post_id: &str, body: &str) -> Result<(), GatewayError> {
    Checks::default()
        .check("postId", !post_id.is_empty(), "Post ID cannot be empty")
        .check(
            "body",
            within(body, 1, MAX_COMMENT_BODY),
            "Comment body must be between 1 and 1,000 characters",
        )
        .finish()
}

/// Validates a vote and returns the parsed votable type.
pub fn new_vote(votable_id: &str, votable_type: &str, value: i32) -> Result<VotableType, GatewayError> {
    let kind = votable_type.parse::<VotableType>().ok();
    Checks::default()
        .check("votableId", !votable_id.is_empty(), "Votable ID cannot be empty")
        .check(
            "votableType",
            kind.is_some(),
            "Votable type must be either Post or Comment",
        )
        .check("value", (-1..=1).contains(&value), "Vote value must be -1, 0, or 1")
        .finish()?;
    kind.ok_or_else(|| GatewayError::Internal {
        message: "votable type vanished after validation".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(result: Result<(), GatewayError>) -> Vec<(String, String)> {
        match result {
            Ok(()) => vec![],
            Err(GatewayError::InvalidFields { errors }) => {
                errors.into_iter().map(|e| (e.field, e.message)).collect()
            }
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn google_token_must_not_be_empty() {
        assert!(sign_in("tok").is_ok());
        assert_eq!(
            fields(sign_in("")),
            vec![("googleToken".into(), "Google token cannot be empty".into())]
        );
    }

    #[test]
    fn subbluedit_names() {
        assert!(new_subbluedit("rust_lang").is_ok());
        assert!(new_subbluedit(&"a".repeat(50)).is_ok());
        assert_eq!(
            fields(new_subbluedit(&"a".repeat(51)))[0].1,
            "Subbluedit name must be between 1 and 50 characters"
        );
        assert_eq!(
            fields(new_subbluedit("has space"))[0].1,
            "Subbluedit name can only contain letters, numbers, and underscores"
        );
        // One error per field.
        assert_eq!(fields(new_subbluedit("")).len(), 1);
    }

    #[test]
    fn post_limits() {
        assert!(new_post("rust", "Hello", None).is_ok());
        assert!(new_post("rust", "Hello", Some("")).is_ok());
        let errors = fields(new_post("bad name", "", Some(&"x".repeat(10_001))));
        let names: Vec<&str> = errors.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(names, vec!["subblueditName", "title", "body"]);
        assert!(new_post("rust", &"t".repeat(300), Some(&"x".repeat(10_000))).is_ok());
    }

    #[test]
    fn comment_limits() {
        assert!(new_comment("1", "nice").is_ok());
        let errors = fields(new_comment("", &"x".repeat(1_001)));
        assert_eq!(errors[0], ("postId".into(), "Post ID cannot be empty".into()));
        assert_eq!(errors[1].0, "body");
    }

    #[test]
    fn titles_count_characters_not_bytes() {
        assert!(new_post("rust", &"é".repeat(300), None).is_ok());
    }

    #[test]
    fn votes() {
        assert_eq!(new_vote("1", "Post", 1).unwrap(), VotableType::Post);
        assert_eq!(new_vote("1", "Comment", -1).unwrap(), VotableType::Comment);
        assert!(new_vote("1", "Comment", 0).is_ok());
        let errors = fields(new_vote("", "post", 2).map(|_| ()));
        let names: Vec<&str> = errors.iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(names, vec!["votableId", "votableType", "value"]);
    }
}
