use social_network::{
    config::Config,
    database::SocialDatabase,
    error::{AppError, AppResult},
    forms::GroupForm,
    infrastructure::security::hash_password,
    models::{NewComment, NewPost, NewUser, User},
};

const SAMPLE_PASSWORD: &str = "sample-password";

async fn ensure_user(db: &SocialDatabase, username: &str, first_name: &str, last_name: &str) -> AppResult<User> {
    if let Some(user) = db.get_user_by_username(username).await? {
        return Ok(user);
    }
    db.create_user(NewUser {
        username: username.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: format!("{}@example.com", username),
        password_hash: hash_password(SAMPLE_PASSWORD)?,
    })
    .await
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let config = Config::from_env().map_err(|e| AppError::ConfigurationError(e.to_string()))?;

    println!("🌱 Seeding {}", config.database.url);
    let db = SocialDatabase::connect(&config.database.url, config.database.max_connections).await?;
    db.init().await?;

    let sample_users = vec![
        ("leo", "Лев", "Толстой"),
        ("anna", "Анна", "Ахматова"),
        ("misha", "Михаил", "Булгаков"),
        ("auth", "", ""),
    ];

    println!("\n👥 Creating {} users...", sample_users.len());
    let mut users = Vec::new();
    for (username, first_name, last_name) in sample_users {
        let user = ensure_user(&db, username, first_name, last_name).await?;
        println!("  ✓ {} (id {})", user.username, user.id);
        users.push(user);
    }

    let sample_groups = vec![
        ("Проза", "prose", "Романы, повести и рассказы"),
        ("Поэзия", "poetry", "Стихи и всё о них"),
    ];

    println!("\n🏷️  Creating groups...");
    let mut groups = Vec::new();
    for (title, slug, description) in sample_groups {
        let group = match db.get_group_by_slug(slug).await? {
            Some(group) => group,
            None => {
                let new_group = GroupForm {
                    title: title.to_string(),
                    slug: slug.to_string(),
                    description: description.to_string(),
                }
                .clean()?;
                db.create_group(new_group).await?
            }
        };
        println!("  ✓ {} ({})", group.title, group.slug);
        groups.push(group);
    }

    println!("\n📝 Creating posts...");
    let mut post_ids = Vec::new();
    for i in 0..13 {
        let author = &users[i % users.len()];
        let group_id = if i % 3 == 0 { None } else { Some(groups[i % groups.len()].id) };
        let post = db
            .create_post(NewPost {
                author_id: author.id,
                text: format!("Запись номер {} от {}", i + 1, author.username),
                group_id,
                image: None,
            })
            .await?;
        post_ids.push(post.id);
        println!("  ✓ post {} by {}", post.id, author.username);
    }

    println!("\n💬 Creating comments...");
    for (i, post_id) in post_ids.iter().enumerate().take(5) {
        let author = &users[(i + 1) % users.len()];
        db.create_comment(NewComment {
            post_id: *post_id,
            author_id: author.id,
            text: "Отличная запись".to_string(),
        })
        .await?;
    }

    println!("\n🤝 Creating follows...");
    let follows = vec![(3, 0), (3, 1), (0, 1), (1, 2), (2, 0)];
    for (from_idx, to_idx) in follows {
        let (user, author) = (&users[from_idx], &users[to_idx]);
        match db.create_follow(user.id, author.id).await {
            Ok(_) => println!("  ✓ {} -> {}", user.username, author.username),
            Err(AppError::Conflict(_)) => println!("  • {} already follows {}", user.username, author.username),
            Err(e) => return Err(e),
        }
    }

    println!("\n✅ Done. Every sample account uses the password '{}'", SAMPLE_PASSWORD);
    Ok(())
}
