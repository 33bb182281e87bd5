//! Operator console for the Hall of Fame backend.
//!
//! Each subcommand is one of the admin screens reduced to its API calls:
//! log in, list or mutate records at an endpoint path, upload images.
//! Protected commands go through the route guard first, exactly like a
//! protected screen would.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hof_client::{ApiClient, ClientConfig, TokenStore, UploadKind};
use hof_core::types::RecordId;
use hof_events::SessionBus;
use hof_session::{GuardDecision, RouteGuard, SessionStore};

#[derive(Parser)]
#[command(name = "hof-admin", about = "Operator console for the Hall of Fame backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and persist the session token.
    Login {
        username: String,
        password: String,
    },
    /// Clear the persisted session.
    Logout,
    /// Show the current session state.
    Status,
    /// List records at an endpoint path, e.g. `gallery` or `chronicles`.
    List {
        path: String,
        /// Filter by parent record id, passed through as a query parameter.
        #[arg(long)]
        parent: Option<String>,
    },
    /// Fetch one record by id.
    Get { path: String, id: String },
    /// Create a record from a JSON body.
    Create {
        path: String,
        /// JSON object for the new record.
        #[arg(long)]
        data: String,
    },
    /// Update a record with a partial JSON body.
    Update {
        path: String,
        id: String,
        #[arg(long)]
        data: String,
    },
    /// Delete a record by id.
    Delete { path: String, id: String },
    /// Upload an image as a multipart form.
    Upload {
        path: String,
        file: PathBuf,
        /// Whether this creates a record or replaces an existing image.
        #[arg(long, value_enum, default_value = "create")]
        kind: KindArg,
        /// Extra form fields as `key=value`, repeatable.
        #[arg(long = "field", value_parser = parse_key_val)]
        fields: Vec<(String, String)>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Create,
    EditImage,
}

impl From<KindArg> for UploadKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Create => UploadKind::Create,
            KindArg::EditImage => UploadKind::EditImage,
        }
    }
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

/// Parse a CLI id argument into the backend's string-or-number form.
fn parse_record_id(raw: &str) -> RecordId {
    raw.parse::<i64>()
        .map(RecordId::Int)
        .unwrap_or_else(|_| RecordId::Str(raw.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hof_admin=info,hof_client=info,hof_session=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::from_env();
    let tokens = TokenStore::from_env();
    let bus = Arc::new(SessionBus::default());
    let client = ApiClient::new(config, tokens, bus);
    let store = SessionStore::new(client.clone());
    let _listener = store.spawn_unauthorized_listener();
    let guard = RouteGuard::new(Arc::clone(&store));

    match cli.command {
        Command::Login { username, password } => {
            let user = store
                .login(&username, &password)
                .await
                .context("login failed")?;
            tracing::info!(username = %user.username, "session persisted");
            println!("logged in as {}", user.username);
        }
        Command::Logout => {
            store.logout();
            tracing::info!("session cleared");
            println!("logged out");
        }
        Command::Status => {
            store.rehydrate();
            match store.state() {
                hof_session::SessionState::Authenticated { user } => {
                    println!("authenticated as {}", user.username)
                }
                state => println!("{state:?}"),
            }
        }
        Command::List { path, parent } => {
            require_session(&guard, &path)?;
            let records = client.list_records(&path, &[("parent", parent)]).await?;
            tracing::info!(%path, count = records.len(), "listed records");
            for record in &records {
                println!("{record}");
            }
            eprintln!("{} record(s)", records.len());
        }
        Command::Get { path, id } => {
            require_session(&guard, &path)?;
            let record = client.get_record(&path, &parse_record_id(&id)).await?;
            println!("{record:#}");
        }
        Command::Create { path, data } => {
            require_session(&guard, &path)?;
            let body: serde_json::Value =
                serde_json::from_str(&data).context("--data must be valid JSON")?;
            let created = client.create_record(&path, body).await?;
            tracing::info!(%path, "record created");
            println!("{created:#}");
        }
        Command::Update { path, id, data } => {
            require_session(&guard, &path)?;
            let body: serde_json::Value =
                serde_json::from_str(&data).context("--data must be valid JSON")?;
            let updated = client
                .update_record(&path, &parse_record_id(&id), body)
                .await?;
            tracing::info!(%path, %id, "record updated");
            println!("{updated:#}");
        }
        Command::Delete { path, id } => {
            require_session(&guard, &path)?;
            client.delete_record(&path, &parse_record_id(&id)).await?;
            tracing::info!(%path, %id, "record deleted");
            println!("deleted {id}");
        }
        Command::Upload {
            path,
            file,
            kind,
            fields,
        } => {
            require_session(&guard, &path)?;
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("upload.bin");
            let borrowed: Vec<(&str, String)> = fields
                .iter()
                .map(|(k, v)| (k.as_str(), v.clone()))
                .collect();
            let created = client
                .upload_image(&path, kind.into(), &borrowed, file_name, bytes)
                .await?;
            tracing::info!(%path, file_name, "image uploaded");
            println!("{created:#}");
        }
    }

    Ok(())
}

/// Run the route guard for a protected command.
fn require_session(guard: &RouteGuard, path: &str) -> anyhow::Result<()> {
    match guard.check(path) {
        GuardDecision::Allow => Ok(()),
        GuardDecision::RedirectToLogin { return_to } => {
            bail!("not logged in (wanted `{return_to}`); run `hof-admin login <username> <password>` first")
        }
    }
}
