//! GraphQL object types and their projections from REST records.

use async_graphql::{SimpleObject, Union, ID};
use bluedit_core::{ApiComment, ApiPost, ApiSubbluedit, ApiUser, ApiVote, RecordId, Votable};

fn id(id: RecordId) -> ID {
    ID(id.into_inner())
}

fn list<A, B: From<A>>(items: Option<Vec<A>>) -> Option<Vec<B>> {
    Some(items.unwrap_or_default().into_iter().map(B::from).collect())
}

#[derive(Debug, Clone, SimpleObject)]
pub struct User {
    pub id: ID,
    pub name: Option<String>,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl From<ApiUser> for User {
    fn from(user: ApiUser) -> Self {
        Self {
            id: id(user.id),
            name: user.name,
            email: user.email,
            avatar_url: user.avatar_url,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct Post {
    pub id: ID,
    pub title: String,
    pub body: String,
    pub user: Option<User>,
    pub subbluedit: Option<Box<Subbluedit>>,
    pub comments: Option<Vec<Comment>>,
    pub votes: Option<Vec<Vote>>,
}

impl From<ApiPost> for Post {
    fn from(post: ApiPost) -> Self {
        Self {
            id: id(post.id),
            title: post.title,
            body: post.body.unwrap_or_default(),
            user: post.user.map(User::from),
            subbluedit: post.subbluedit.map(|s| Box::new(Subbluedit::from(*s))),
            comments: list(post.comments),
            votes: list(post.votes),
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct Comment {
    pub id: ID,
    pub body: String,
    pub user: Option<User>,
    pub post: Option<Box<Post>>,
    pub parent_comment: Option<Box<Comment>>,
    pub replies: Option<Vec<Comment>>,
    pub votes: Option<Vec<Vote>>,
}

impl From<ApiComment> for Comment {
    fn from(comment: ApiComment) -> Self {
        Self {
            id: id(comment.id),
            body: comment.body,
            user: comment.user.map(User::from),
            post: comment.post.map(|p| Box::new(Post::from(*p))),
            parent_comment: comment.parent_comment.map(|c| Box::new(Comment::from(*c))),
            replies: list(comment.replies),
            votes: list(comment.votes),
        }
    }
}

/// Anything a vote can target.
#[derive(Debug, Clone, Union)]
pub enum Voteable {
    Post(Post),
    Comment(Comment),
}

impl From<Votable> for Voteable {
    fn from(votable: Votable) -> Self {
        match votable {
            Votable::Post(post) => Self::Post(post.into()),
            Votable::Comment(comment) => Self::Comment(comment.into()),
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct Vote {
    pub id: ID,
    pub value: i32,
    pub user: Option<User>,
    pub votable: Option<Voteable>,
}

impl From<ApiVote> for Vote {
    fn from(vote: ApiVote) -> Self {
        let votable = vote.votable().map(Voteable::from);
        Self {
            id: id(vote.id),
            value: vote.value,
            user: vote.user.map(User::from),
            votable,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct Subbluedit {
    pub id: ID,
    pub name: String,
    pub description: String,
    pub user: Option<User>,
    pub posts: Option<Vec<Post>>,
}

impl From<ApiSubbluedit> for Subbluedit {
    fn from(subbluedit: ApiSubbluedit) -> Self {
        Self {
            id: id(subbluedit.id),
            name: subbluedit.name,
            description: subbluedit.description.unwrap_or_default(),
            user: subbluedit.user.map(User::from),
            posts: list(subbluedit.posts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_relations_become_empty_lists() {
        let post: ApiPost = serde_json::from_value(json!({"id": 1, "title": "t"})).unwrap();
        let post = Post::from(post);
        assert_eq!(post.id, ID::from("1"));
        assert_eq!(post.body, "");
        assert_eq!(post.comments.map(|c| c.len()), Some(0));
        assert_eq!(post.votes.map(|v| v.len()), Some(0));
        assert!(post.subbluedit.is_none());
    }

    #[test]
    fn nested_comment_tree_projects() {
        let comment: ApiComment = serde_json::from_value(json!({
            "id": "c2",
            "body": "reply",
            "parent_comment": {"id": "c1", "body": "root"},
            "replies": [{"id": "c3", "body": "deeper"}],
            "user": {"id": "u", "email": "u@example.com", "avatar_url": "http://img"}
        }))
        .unwrap();
        let comment = Comment::from(comment);
        assert_eq!(comment.parent_comment.as_ref().unwrap().body, "root");
        assert_eq!(comment.replies.as_ref().unwrap()[0].id, ID::from("c3"));
        assert_eq!(
            comment.user.unwrap().avatar_url.as_deref(),
            Some("http://img")
        );
    }

    #[test]
    fn vote_target_uses_discriminant() {
        let vote: ApiVote = serde_json::from_value(json!({
            "id": 9,
            "value": 1,
            "votable_type": "Comment",
            "votable": {"id": 5, "body": "hi", "title": "misleading"}
        }))
        .unwrap();
        match Vote::from(vote).votable {
            Some(Voteable::Comment(c)) => assert_eq!(c.body, "hi"),
            other => panic!("expected a comment, got {other:?}"),
        }
    }

    #[test]
    fn subbluedit_description_defaults_to_empty() {
        let s: ApiSubbluedit = serde_json::from_value(json!({"id": 1, "name": "rust"})).unwrap();
        let s = Subbluedit::from(s);
        assert_eq!(s.description, "");
        assert_eq!(s.posts.map(|p| p.len()), Some(0));
    }
}
