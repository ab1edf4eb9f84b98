use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ecidadania::api::{self, AppState};
use ecidadania::config::SiteSettings;
use ecidadania::db::Database;
use ecidadania::models::{CreateSpaceInput, CreateStaticPageInput, CreateUserInput, Permission};

#[derive(Parser)]
#[command(name = "ecidadania")]
#[command(about = "Citizen participation platform: spaces, proposals and news")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for HTTP
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage participation spaces
    Space {
        #[command(subcommand)]
        action: SpaceAction,
    },
    /// Manage static pages
    Page {
        #[command(subcommand)]
        action: PageAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account
    Create {
        username: String,
        #[arg(long)]
        email: Option<String>,
        /// Grant every permission
        #[arg(long)]
        superuser: bool,
    },
    /// Grant permissions, e.g. `proposals.add_proposal`
    Grant {
        username: String,
        #[arg(required = true)]
        permissions: Vec<String>,
    },
    /// Revoke permissions
    Revoke {
        username: String,
        #[arg(required = true)]
        permissions: Vec<String>,
    },
    /// Enable or disable an account
    Activate {
        username: String,
        #[arg(long)]
        off: bool,
    },
    /// Issue an API token and print it
    Token { username: String },
}

#[derive(Subcommand)]
enum SpaceAction {
    /// Create a space
    Create {
        /// URL slug
        url: String,
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand)]
enum PageAction {
    /// Create a static page
    Create {
        uri: String,
        name: String,
        #[arg(long, default_value = "")]
        content: String,
        /// Link the page from the footer
        #[arg(long)]
        footer: bool,
        #[arg(long, default_value = "0")]
        order: i64,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "ecidadania=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_database(settings: &SiteSettings) -> anyhow::Result<Database> {
    let db = match &settings.db_path {
        Some(path) => Database::open(path.clone())?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

fn parse_permissions(codenames: &[String]) -> anyhow::Result<Vec<Permission>> {
    codenames
        .iter()
        .map(|c| Permission::from_str(c).ok_or_else(|| anyhow::anyhow!("Unknown permission: {}", c)))
        .collect()
}

fn find_user_id(db: &Database, username: &str) -> anyhow::Result<i64> {
    db.get_user_by_username(username)?
        .map(|u| u.id)
        .with_context(|| format!("No such user: {}", username))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let settings = SiteSettings::from_env();
    let db = open_database(&settings)?;

    match cli.command.unwrap_or(Commands::Serve {
        host: "127.0.0.1".to_string(),
        port: 3000,
    }) {
        Commands::Serve { host, port } => {
            tracing::info!(
                "Starting e-cidadania {} ({}) on {}:{}",
                settings.version,
                settings.status,
                host,
                port
            );
            if settings.debug {
                tracing::warn!("Debug mode is enabled");
            }

            let app = api::create_router(AppState::new(db, settings));

            let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
            tracing::info!("e-cidadania listening on http://{}", listener.local_addr()?);

            axum::serve(listener, app).await?;
        }
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                email,
                superuser,
            } => {
                let user = db.create_user(CreateUserInput {
                    username,
                    email,
                    is_superuser: superuser,
                })?;
                println!("Created user {} (id {})", user.username, user.id);
            }
            UserAction::Grant {
                username,
                permissions,
            } => {
                let user_id = find_user_id(&db, &username)?;
                for permission in parse_permissions(&permissions)? {
                    db.grant_permission(user_id, permission)?;
                    println!("Granted {} to {}", permission, username);
                }
            }
            UserAction::Revoke {
                username,
                permissions,
            } => {
                let user_id = find_user_id(&db, &username)?;
                for permission in parse_permissions(&permissions)? {
                    if db.revoke_permission(user_id, permission)? {
                        println!("Revoked {} from {}", permission, username);
                    } else {
                        println!("{} did not hold {}", username, permission);
                    }
                }
            }
            UserAction::Activate { username, off } => {
                let user_id = find_user_id(&db, &username)?;
                db.set_user_active(user_id, !off)?;
                println!(
                    "{} is now {}",
                    username,
                    if off { "inactive" } else { "active" }
                );
            }
            UserAction::Token { username } => {
                let user_id = find_user_id(&db, &username)?;
                println!("{}", db.create_token(user_id)?);
            }
        },
        Commands::Space { action } => match action {
            SpaceAction::Create {
                url,
                name,
                description,
            } => {
                let space = db.create_space(CreateSpaceInput {
                    name,
                    url,
                    description,
                    date: None,
                })?;
                println!("Created space /spaces/{}", space.url);
            }
        },
        Commands::Page { action } => match action {
            PageAction::Create {
                uri,
                name,
                content,
                footer,
                order,
            } => {
                let page = db.create_static_page(CreateStaticPageInput {
                    name,
                    uri,
                    content,
                    show_footer: footer,
                    order,
                })?;
                println!("Created page {}", page.uri);
            }
        },
    }

    Ok(())
}
