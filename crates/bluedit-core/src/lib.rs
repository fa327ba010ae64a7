pub mod cookie;
pub mod records;
pub mod votable;

pub use cookie::{get_token, parse_cookies, CookieError, CookiePolicy, SameSite};
pub use records::{
    ApiAuthResponse, ApiComment, ApiPost, ApiSubbluedit, ApiUser, ApiVote, ApiVoteResponse,
    GoogleSignIn, NewComment, NewPost, NewSubbluedit, NewVote, RecordId,
};
pub use votable::{UnknownVotableType, Votable, VotableType};
