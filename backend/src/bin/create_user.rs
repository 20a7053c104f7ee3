use anyhow::{bail, Context};
use parking_backend::{
    config::Config,
    db::connection::create_pool,
    models::user::{User, UserType},
    utils::password::hash_password,
};

#[derive(Debug)]
struct CreateUserOptions {
    username: String,
    password: String,
    email: Option<String>,
    user_type: UserType,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = parse_options(std::env::args().skip(1))?;
    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let password_hash = hash_password(&options.password)?;
    let user = User::new(
        options.username,
        password_hash,
        options.email,
        options.user_type,
    );

    sqlx::query(
        "INSERT INTO users (id, username, password_hash, email, user_type, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(&user.email)
    .bind(user.user_type)
    .bind(user.is_active)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&pool)
    .await
    .with_context(|| format!("failed to insert user {}", user.username))?;

    println!("Created {} user {} ({})", user.user_type, user.username, user.id);
    Ok(())
}

fn parse_options<I>(args: I) -> anyhow::Result<CreateUserOptions>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut positional = Vec::new();
    let mut email = None;
    let mut user_type = UserType::User;
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_ref() {
            "--admin" => user_type = UserType::Admin,
            "--email" => {
                let value = args.next().context("--email needs a value")?;
                email = Some(value.as_ref().to_string());
            }
            other => positional.push(other.to_string()),
        }
    }

    let [username, password]: [String; 2] = match positional.try_into() {
        Ok(pair) => pair,
        Err(_) => bail!("usage: create_user <username> <password> [--email <email>] [--admin]"),
    };
    if username.trim().is_empty() || password.is_empty() {
        bail!("username and password must not be empty");
    }

    Ok(CreateUserOptions {
        username: username.trim().to_string(),
        password,
        email,
        user_type,
    })
}
