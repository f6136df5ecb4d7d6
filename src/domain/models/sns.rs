use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPersona {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub persona_id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: String,
    pub persona: PostPersona,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub persona_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub content: String,
    pub created_at: String,
    pub persona: PostPersona,
    #[serde(default)]
    pub replies: Vec<Comment>,
}

impl Comment {
    /// Depth-first walk yielding `(depth, comment)`, replies after parents.
    pub fn flatten(comments: &[Comment]) -> Vec<(usize, &Comment)> {
        let mut res = vec![];
        for comment in comments {
            comment.collect_into(0, &mut res);
        }

        return res;
    }

    fn collect_into<'a>(&'a self, depth: usize, res: &mut Vec<(usize, &'a Comment)>) {
        res.push((depth, self));
        for reply in &self.replies {
            reply.collect_into(depth + 1, res);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentCreate {
    pub persona_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
    pub liked: bool,
    pub like_count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowCreate {
    pub follower_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    #[serde(default)]
    pub id: String,
    pub follower_id: String,
    pub following_id: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub id: String,
    pub name: String,
    pub personality: String,
    pub speaking_style: String,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub post_count: u64,
    #[serde(default)]
    pub follower_count: u64,
    #[serde(default)]
    pub following_count: u64,
}
