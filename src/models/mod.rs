// Domain models - rows of the relational schema and their JSON views

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every kind of record the access policy knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    User,
    Group,
    Post,
    Comment,
    Follow,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::User => "user",
            EntityType::Group => "group",
            EntityType::Post => "post",
            EntityType::Comment => "comment",
            EntityType::Follow => "follow",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn as_author(&self) -> AuthorRef {
        AuthorRef {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Compact author reference embedded in posts and comments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorRef {
    pub id: i64,
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRef {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

/// Flat post row joined with its author and group.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub author_id: i64,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub group_id: Option<i64>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: AuthorRef,
    pub group: Option<GroupRef>,
    /// Path relative to the media root, e.g. `posts/small.gif`.
    pub image: Option<String>,
    pub image_url: Option<String>,
}

impl Post {
    const SHORT_LEN: usize = 15;

    /// First characters of the text, used wherever a post needs a label.
    pub fn short_text(&self) -> String {
        self.text.chars().take(Self::SHORT_LEN).collect()
    }
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        let full_name = format!("{} {}", row.author_first_name, row.author_last_name)
            .trim()
            .to_string();
        let group = match (row.group_id, row.group_title, row.group_slug) {
            (Some(id), Some(title), Some(slug)) => Some(GroupRef { id, title, slug }),
            _ => None,
        };
        Post {
            id: row.id,
            text: row.text,
            pub_date: row.pub_date,
            author: AuthorRef {
                id: row.author_id,
                username: row.author_username,
                full_name,
            },
            group,
            image: row.image.filter(|path| !path.is_empty()),
            image_url: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Owner edits. The author is never part of an edit.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    /// `None` keeps the stored image.
    pub image: Option<String>,
}

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    FollowedBy(i64),
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: AuthorRef,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        let full_name = format!("{} {}", row.author_first_name, row.author_last_name)
            .trim()
            .to_string();
        Comment {
            id: row.id,
            post_id: row.post_id,
            text: row.text,
            pub_date: row.pub_date,
            author: AuthorRef {
                id: row.author_id,
                username: row.author_username,
                full_name,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Follow {
    pub id: i64,
    pub user_id: i64,
    pub author_id: i64,
}
