use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;

use playhub_auth::Namespace;
use playhub_cli::accounts::{NewAccount, create_account, sweep_expired_sessions};
use playhub_config::AuthPolicyConfig;
use playhub_db::{PgPool, init_db_pool};

#[derive(Parser)]
#[command(name = "playhub-cli")]
#[command(about = "PlayHub CLI - Account administration for PlayHub", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct AccountArgs {
    /// Email address
    #[arg(short = 'e', long)]
    email: Option<String>,

    /// Display name
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Password (will be prompted securely if not provided)
    #[arg(short = 'p', long)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new administrator account
    CreateAdmin(AccountArgs),
    /// Create a new player account
    CreateUser(AccountArgs),
    /// Delete expired sessions
    SweepSessions,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("\n❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let pool = init_db_pool().await?;

    match cli.command {
        Commands::CreateAdmin(args) => handle_create(&pool, Namespace::Admin, args).await,
        Commands::CreateUser(args) => handle_create(&pool, Namespace::User, args).await,
        Commands::SweepSessions => handle_sweep(&pool).await,
    }
}

async fn handle_create(
    pool: &PgPool,
    namespace: Namespace,
    args: AccountArgs,
) -> anyhow::Result<()> {
    let policy = AuthPolicyConfig::from_env();

    let email = match args.email {
        Some(email) => email,
        None => Input::<String>::new().with_prompt("Email address").interact_text()?,
    };

    let name = match args.name {
        Some(name) => name,
        None => Input::<String>::new().with_prompt("Name").interact_text()?,
    };

    let password = match args.password {
        Some(password) => password,
        None => Password::new()
            .with_prompt(format!(
                "Password (min {} characters)",
                policy.password_min_length
            ))
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
    };

    let account = NewAccount::new(namespace, email, name, password);
    let id = create_account(pool, &account, &policy).await?;

    let kind = match namespace {
        Namespace::Admin => "Administrator",
        Namespace::User => "User",
    };
    println!("\n✅ {} created successfully!", kind);
    println!("   ID: {}", id);
    println!("   Email: {}", account.email);
    println!("   Name: {}", account.name);

    Ok(())
}

async fn handle_sweep(pool: &PgPool) -> anyhow::Result<()> {
    let swept = sweep_expired_sessions(pool).await?;
    println!("✅ Deleted {} expired sessions", swept);
    Ok(())
}
