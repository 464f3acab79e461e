use chrono::Utc;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::QueryBuilder;
use std::str::FromStr;
use tracing::{debug, info, instrument};

use crate::error::{AppError, AppResult};
use crate::models::{
    Comment, CommentRow, Follow, Group, NewComment, NewGroup, NewPost, NewUser, Post,
    PostChanges, PostFilter, PostRow, User, UserCredentials, UserUpdate,
};

const POST_SELECT: &str = "SELECT p.id, p.text, p.pub_date, p.image, p.author_id, \
     u.username AS author_username, u.first_name AS author_first_name, \
     u.last_name AS author_last_name, p.group_id, g.title AS group_title, \
     g.slug AS group_slug \
     FROM posts p \
     JOIN users u ON u.id = p.author_id \
     LEFT JOIN post_groups g ON g.id = p.group_id";

const COMMENT_SELECT: &str = "SELECT c.id, c.post_id, c.text, c.pub_date, c.author_id, \
     u.username AS author_username, u.first_name AS author_first_name, \
     u.last_name AS author_last_name \
     FROM comments c \
     JOIN users u ON u.id = c.author_id";

const USER_COLUMNS: &str = "id, username, first_name, last_name, email, date_joined";

// Relational store for users, groups, posts, comments and follows
pub struct SocialDatabase {
    pub pool: SqlitePool,
}

impl SocialDatabase {
    /// Open a pool; file databases are created on first use.
    /// In-memory databases need `max_connections == 1`, every connection
    /// would otherwise see its own empty database.
    pub async fn connect(database_url: &str, max_connections: u32) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::ConfigurationError(format!("Invalid database url {}: {}", database_url, e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to {}: {}", database_url, e)))?;

        info!("Connected to {}", database_url);
        Ok(Self { pool })
    }

    pub async fn init(&self) -> AppResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL DEFAULT '',
                password_hash TEXT NOT NULL,
                date_joined TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS post_groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT ''
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                pub_date TEXT NOT NULL,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                group_id INTEGER REFERENCES post_groups(id) ON DELETE SET NULL,
                image TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text TEXT NOT NULL,
                pub_date TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS follows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                CONSTRAINT unique_members UNIQUE(user_id, author_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_pub_date ON posts(pub_date DESC, id DESC)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_group ON posts(group_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, pub_date DESC)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_follows_author ON follows(author_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // Users

    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let result = sqlx::query(
            "INSERT INTO users (username, first_name, last_name, email, password_hash, date_joined)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Created user {}", id);
        self.get_user(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("User {} vanished after insert", id)))
    }

    pub async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>> {
        let creds = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(creds)
    }

    #[instrument(skip(self, update))]
    pub async fn update_user(&self, id: i64, update: UserUpdate) -> AppResult<User> {
        let result = sqlx::query(
            "UPDATE users SET username = ?, first_name = ?, last_name = ?, email = ? WHERE id = ?",
        )
        .bind(&update.username)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.email)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        self.get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Removes the user together with their posts, comments, follows and sessions.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Sessions

    pub async fn create_session(&self, user_id: i64, token: &str) -> AppResult<()> {
        sqlx::query("INSERT INTO sessions (token, user_id, created) VALUES (?, ?, ?)")
            .bind(token)
            .bind(user_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_session_user(&self, token: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT u.id, u.username, u.first_name, u.last_name, u.email, u.date_joined
             FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn delete_session(&self, token: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Groups

    #[instrument(skip(self, group), fields(slug = %group.slug))]
    pub async fn create_group(&self, group: NewGroup) -> AppResult<Group> {
        let result = sqlx::query("INSERT INTO post_groups (title, slug, description) VALUES (?, ?, ?)")
            .bind(&group.title)
            .bind(&group.slug)
            .bind(&group.description)
            .execute(&self.pool)
            .await?;

        Ok(Group {
            id: result.last_insert_rowid(),
            title: group.title,
            slug: group.slug,
            description: group.description,
        })
    }

    pub async fn get_group(&self, id: i64) -> AppResult<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    pub async fn get_group_by_slug(&self, slug: &str) -> AppResult<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    pub async fn list_groups(&self) -> AppResult<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    /// Posts of the group survive with no group.
    #[instrument(skip(self))]
    pub async fn delete_group(&self, slug: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM post_groups WHERE slug = ?")
            .bind(slug)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Posts

    #[instrument(skip(self, post), fields(author_id = post.author_id))]
    pub async fn create_post(&self, post: NewPost) -> AppResult<Post> {
        let result = sqlx::query(
            "INSERT INTO posts (text, pub_date, author_id, group_id, image) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&post.text)
        .bind(Utc::now())
        .bind(post.author_id)
        .bind(post.group_id)
        .bind(&post.image)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!("Created post {} by user {}", id, post.author_id);
        self.get_post(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Post {} vanished after insert", id)))
    }

    pub async fn get_post(&self, id: i64) -> AppResult<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!("{} WHERE p.id = ?", POST_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }

    #[instrument(skip(self, changes))]
    pub async fn update_post(&self, id: i64, changes: PostChanges) -> AppResult<Post> {
        let result = sqlx::query(
            "UPDATE posts SET text = ?, group_id = ?, image = COALESCE(?, image) WHERE id = ?",
        )
        .bind(&changes.text)
        .bind(changes.group_id)
        .bind(&changes.image)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Post {} not found", id)));
        }

        self.get_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn push_post_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: PostFilter) {
        match filter {
            PostFilter::All => {}
            PostFilter::Group(group_id) => {
                qb.push(" WHERE p.group_id = ").push_bind(group_id);
            }
            PostFilter::Author(author_id) => {
                qb.push(" WHERE p.author_id = ").push_bind(author_id);
            }
            PostFilter::FollowedBy(user_id) => {
                qb.push(" WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id = ")
                    .push_bind(user_id)
                    .push(")");
            }
        }
    }

    pub async fn count_posts(&self, filter: PostFilter) -> AppResult<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts p");
        Self::push_post_filter(&mut qb, filter);
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Newest first; equal timestamps fall back to insertion order.
    pub async fn list_posts(&self, filter: PostFilter, limit: i64, offset: i64) -> AppResult<Vec<Post>> {
        let mut qb = QueryBuilder::<Sqlite>::new(POST_SELECT);
        Self::push_post_filter(&mut qb, filter);
        qb.push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows: Vec<PostRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    // Comments

    #[instrument(skip(self, comment), fields(post_id = comment.post_id))]
    pub async fn create_comment(&self, comment: NewComment) -> AppResult<Comment> {
        let result = sqlx::query(
            "INSERT INTO comments (post_id, author_id, text, pub_date) VALUES (?, ?, ?, ?)",
        )
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.text)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_comment(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Comment {} vanished after insert", id)))
    }

    pub async fn get_comment(&self, id: i64) -> AppResult<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(&format!("{} WHERE c.id = ?", COMMENT_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Comment::from))
    }

    pub async fn list_comments(&self, post_id: i64) -> AppResult<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{} WHERE c.post_id = ? ORDER BY c.pub_date DESC, c.id DESC",
            COMMENT_SELECT
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    pub async fn count_comments(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn delete_comment(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Follows

    /// Fails with `Conflict` when the pair already exists.
    #[instrument(skip(self))]
    pub async fn create_follow(&self, user_id: i64, author_id: i64) -> AppResult<Follow> {
        let result = sqlx::query("INSERT INTO follows (user_id, author_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;

        Ok(Follow {
            id: result.last_insert_rowid(),
            user_id,
            author_id,
        })
    }

    #[instrument(skip(self))]
    pub async fn delete_follow(&self, user_id: i64, author_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn is_following(&self, user_id: i64, author_id: i64) -> AppResult<bool> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = ? AND author_id = ?)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    pub async fn count_following(&self, user_id: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_followers(&self, author_id: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_db() -> (SocialDatabase, TempDir) {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("test.db").display());
        let db = SocialDatabase::connect(&url, 2).await.unwrap();
        db.init().await.unwrap();
        (db, dir)
    }

    async fn user(db: &SocialDatabase, username: &str) -> User {
        db.create_user(NewUser {
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: format!("{}@example.com", username),
            password_hash: "x".to_string(),
        })
        .await
        .unwrap()
    }

    async fn group(db: &SocialDatabase, slug: &str) -> Group {
        db.create_group(NewGroup {
            title: "Тестовая группа".to_string(),
            slug: slug.to_string(),
            description: "Описание".to_string(),
        })
        .await
        .unwrap()
    }

    async fn post(db: &SocialDatabase, author: &User, group_id: Option<i64>) -> Post {
        db.create_post(NewPost {
            author_id: author.id,
            text: "Тестовый текст".to_string(),
            group_id,
            image: None,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let (db, _dir) = test_db().await;
        db.init().await.unwrap();
        assert_eq!(db.count_posts(PostFilter::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_and_get_post() {
        let (db, _dir) = test_db().await;
        let author = user(&db, "auth").await;
        let group = group(&db, "test-group").await;

        let created = post(&db, &author, Some(group.id)).await;
        let fetched = db.get_post(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.text, "Тестовый текст");
        assert_eq!(fetched.author.username, "auth");
        assert_eq!(fetched.group.unwrap().slug, "test-group");
    }

    #[tokio::test]
    async fn test_update_post_keeps_image_when_not_replaced() {
        let (db, _dir) = test_db().await;
        let author = user(&db, "auth").await;
        let created = db
            .create_post(NewPost {
                author_id: author.id,
                text: "before".into(),
                group_id: None,
                image: Some("posts/small.gif".into()),
            })
            .await
            .unwrap();

        let updated = db
            .update_post(
                created.id,
                PostChanges { text: "after".into(), group_id: None, image: None },
            )
            .await
            .unwrap();

        assert_eq!(updated.text, "after");
        assert_eq!(updated.image.as_deref(), Some("posts/small.gif"));
        assert_eq!(updated.author.id, author.id);
    }

    #[tokio::test]
    async fn test_post_with_unknown_group_is_rejected() {
        let (db, _dir) = test_db().await;
        let author = user(&db, "auth").await;
        let err = db
            .create_post(NewPost {
                author_id: author.id,
                text: "text".into(),
                group_id: Some(999),
                image: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_group_delete_keeps_posts() {
        let (db, _dir) = test_db().await;
        let author = user(&db, "auth").await;
        let group = group(&db, "doomed").await;
        let created = post(&db, &author, Some(group.id)).await;

        assert!(db.delete_group("doomed").await.unwrap());

        let survivor = db.get_post(created.id).await.unwrap().unwrap();
        assert!(survivor.group.is_none());
        assert_eq!(db.count_posts(PostFilter::All).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_user_delete_cascades() {
        let (db, _dir) = test_db().await;
        let author = user(&db, "author").await;
        let reader = user(&db, "reader").await;
        let created = post(&db, &author, None).await;
        db.create_comment(NewComment { post_id: created.id, author_id: author.id, text: "hi".into() })
            .await
            .unwrap();
        db.create_follow(reader.id, author.id).await.unwrap();
        db.create_session(author.id, "token").await.unwrap();

        assert!(db.delete_user(author.id).await.unwrap());

        assert!(db.get_post(created.id).await.unwrap().is_none());
        assert_eq!(db.count_comments().await.unwrap(), 0);
        assert_eq!(db.count_following(reader.id).await.unwrap(), 0);
        assert!(db.get_session_user("token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_post_delete_cascades_comments() {
        let (db, _dir) = test_db().await;
        let author = user(&db, "auth").await;
        let created = post(&db, &author, None).await;
        db.create_comment(NewComment { post_id: created.id, author_id: author.id, text: "hi".into() })
            .await
            .unwrap();

        assert!(db.delete_post(created.id).await.unwrap());
        assert_eq!(db.count_comments().await.unwrap(), 0);
        assert!(!db.delete_post(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_follow_conflicts() {
        let (db, _dir) = test_db().await;
        let follower = user(&db, "auth1").await;
        let author = user(&db, "someauthor").await;

        db.create_follow(follower.id, author.id).await.unwrap();
        let err = db.create_follow(follower.id, author.id).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(db.count_following(follower.id).await.unwrap(), 1);
        assert_eq!(db.count_followers(author.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_followed_feed_filter() {
        let (db, _dir) = test_db().await;
        let follower = user(&db, "auth1").await;
        let author = user(&db, "someauthor").await;
        let stranger = user(&db, "stranger").await;
        let wanted = post(&db, &author, None).await;
        post(&db, &stranger, None).await;

        db.create_follow(follower.id, author.id).await.unwrap();

        let feed = db.list_posts(PostFilter::FollowedBy(follower.id), 10, 0).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, wanted.id);

        assert!(db.delete_follow(follower.id, author.id).await.unwrap());
        assert_eq!(db.count_posts(PostFilter::FollowedBy(follower.id)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let (db, _dir) = test_db().await;
        let author = user(&db, "auth").await;
        let first = post(&db, &author, None).await;
        let second = post(&db, &author, None).await;

        let posts = db.list_posts(PostFilter::Author(author.id), 10, 0).await.unwrap();
        assert_eq!(posts[0].id, second.id);
        assert_eq!(posts[1].id, first.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let (db, _dir) = test_db().await;
        user(&db, "auth").await;
        let err = db
            .create_user(NewUser {
                username: "auth".into(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                password_hash: "x".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
