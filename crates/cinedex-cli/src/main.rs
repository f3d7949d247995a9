//! cinedex - movie catalog browsing CLI.

/// Application configuration (TOML).
mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use url::Url;

use crate::config::AppConfig;
use cinedex_api::ApiError;
use cinedex_api::catalog::{CatalogApi, CatalogClient, poster_url};
use cinedex_api::docstore::DocStoreClient;
use cinedex_core::{
    AppState, SavedRepo, SearchPhase, SearchPipeline, SessionManager, TrendingRepo,
};
use cinedex_store::paths::config_file;
use cinedex_store::{SessionStore, SqliteKv, open_store};

/// User-Agent for outbound requests.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config/data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Account and session management.
    Auth(AuthCommand),
    /// Query the movie catalog.
    Movies(MoviesCommand),
    /// Manage saved movies.
    Saved(SavedCommand),
    /// Show the most-searched movies.
    Trending,
}

/// Arguments for the `auth` subcommand.
#[derive(clap::Args)]
struct AuthCommand {
    /// Auth subcommand to run.
    #[command(subcommand)]
    command: AuthSubcommands,
}

/// Available auth subcommands.
#[derive(Subcommand)]
enum AuthSubcommands {
    /// Sign in with email and password.
    Login(LoginArgs),
    /// Create a new account.
    Register(RegisterArgs),
    /// Sign out and clear the local session.
    Logout,
    /// Show whether a local session exists.
    Status,
    /// Show the signed-in user's profile.
    Whoami,
}

/// Arguments for the `auth login` subcommand.
#[derive(clap::Args)]
struct LoginArgs {
    /// Account email address.
    #[arg(long, required = true)]
    email: String,
    /// Account password.
    #[arg(long, required = true)]
    password: String,
}

/// Arguments for the `auth register` subcommand.
#[derive(clap::Args)]
struct RegisterArgs {
    /// Display name.
    #[arg(long, required = true)]
    name: String,
    /// Account email address.
    #[arg(long, required = true)]
    email: String,
    /// Account password.
    #[arg(long, required = true)]
    password: String,
}

/// Arguments for the `movies` subcommand.
#[derive(clap::Args)]
struct MoviesCommand {
    /// Movies subcommand to run.
    #[command(subcommand)]
    command: MoviesSubcommands,
}

/// Available movies subcommands.
#[derive(Subcommand)]
enum MoviesSubcommands {
    /// Search movies by title.
    Search(SearchArgs),
    /// List currently popular movies.
    Popular,
    /// Show details for one movie.
    Details(DetailsArgs),
}

/// Arguments for the `movies search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query (e.g. "inception").
    #[arg(long, required = true)]
    query: String,
}

/// Arguments for the `movies details` subcommand.
#[derive(clap::Args)]
struct DetailsArgs {
    /// Catalog movie ID.
    #[arg(long, required = true)]
    id: u64,
}

/// Arguments for the `saved` subcommand.
#[derive(clap::Args)]
struct SavedCommand {
    /// Saved subcommand to run.
    #[command(subcommand)]
    command: SavedSubcommands,
}

/// Available saved subcommands.
#[derive(Subcommand)]
enum SavedSubcommands {
    /// List saved movies, newest first.
    List,
    /// Save a movie by catalog ID.
    Add(SavedIdArgs),
    /// Remove a saved movie by catalog ID.
    Remove(SavedIdArgs),
}

/// Arguments for `saved add` and `saved remove`.
#[derive(clap::Args)]
struct SavedIdArgs {
    /// Catalog movie ID.
    #[arg(long, required = true)]
    id: u64,
}

/// Loads the application config for the given directory override.
fn load_config(dir: Option<&Path>) -> Result<AppConfig> {
    let config_path = config_file(dir).context("failed to resolve config path")?;
    AppConfig::load(&config_path).context("failed to load config")
}

/// Builds a `CatalogClient` from config, with `CINEDEX_CATALOG_TOKEN`
/// taking precedence over the config file.
#[instrument(skip_all)]
fn build_catalog_client(config: &AppConfig) -> Result<CatalogClient> {
    let api_token = std::env::var("CINEDEX_CATALOG_TOKEN")
        .ok()
        .or_else(|| config.catalog.api_token.clone())
        .context("catalog API token is required (set CINEDEX_CATALOG_TOKEN or [catalog] api_token)")?;

    let mut builder = CatalogClient::builder()
        .api_token(api_token)
        .user_agent(USER_AGENT);

    if let Some(base_url) = &config.catalog.base_url {
        let url = Url::parse(base_url).context("invalid [catalog] base_url")?;
        builder = builder.base_url(url);
    }

    builder.build().context("failed to build catalog client")
}

/// Builds the session manager over the local store and backend client.
#[instrument(skip_all)]
fn build_session_manager(
    config: &AppConfig,
    dir: Option<&Path>,
) -> Result<SessionManager<SqliteKv>> {
    let base_url = std::env::var("CINEDEX_BACKEND_URL")
        .ok()
        .or_else(|| config.backend.base_url.clone())
        .context("backend URL is required (set CINEDEX_BACKEND_URL or [backend] base_url)")?;
    let base_url = Url::parse(&base_url).context("invalid backend base URL")?;

    let kv = open_store(dir).context("failed to open local store")?;
    let store = SessionStore::new(kv);
    let backend = cinedex_api::backend::BackendClient::builder()
        .base_url(base_url)
        .user_agent(USER_AGENT)
        .store(store.clone())
        .build()
        .context("failed to build backend client")?;

    Ok(SessionManager::new(backend, store))
}

/// Builds the shared document-store client, when configured.
fn build_docstore(config: &AppConfig) -> Result<Option<Arc<DocStoreClient>>> {
    let (Some(project_id), Some(database_id)) =
        (&config.docstore.project_id, &config.docstore.database_id)
    else {
        return Ok(None);
    };

    let mut builder = DocStoreClient::builder()
        .project_id(project_id.as_str())
        .database_id(database_id.as_str())
        .user_agent(USER_AGENT);

    if let Some(endpoint) = &config.docstore.endpoint {
        let url = Url::parse(endpoint).context("invalid [docstore] endpoint")?;
        builder = builder.endpoint(url);
    }

    let client = builder.build().context("failed to build document store client")?;
    Ok(Some(Arc::new(client)))
}

/// Builds the trending repository (unconfigured when the store or its
/// collection is absent).
fn build_trending_repo(config: &AppConfig) -> Result<TrendingRepo> {
    let docstore = build_docstore(config)?;
    match (docstore, &config.docstore.trending_collection_id) {
        (Some(client), Some(collection)) => Ok(TrendingRepo::new(client, collection.clone())),
        _ => Ok(TrendingRepo::unconfigured()),
    }
}

/// Builds the saved-items repository (unconfigured when the store or its
/// collection is absent).
fn build_saved_repo(config: &AppConfig) -> Result<SavedRepo> {
    let docstore = build_docstore(config)?;
    match (docstore, &config.docstore.saved_collection_id) {
        (Some(client), Some(collection)) => Ok(SavedRepo::new(client, collection.clone())),
        _ => Ok(SavedRepo::unconfigured()),
    }
}

/// Runs the `auth login` subcommand.
///
/// # Errors
///
/// Returns an error if the backend rejects the credentials or the
/// request fails.
#[instrument(skip_all)]
async fn run_auth_login(args: &LoginArgs, dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let manager = build_session_manager(&config, dir)?;

    let profile = manager
        .sign_in(&args.email, &args.password)
        .await
        .context("sign-in failed")?;

    match profile {
        Some(profile) => tracing::info!("Signed in as {} <{}>", profile.full_name, profile.email),
        None => tracing::info!("Signed in"),
    }
    Ok(())
}

/// Runs the `auth register` subcommand.
///
/// # Errors
///
/// Returns an error if the backend rejects the registration (e.g. the
/// email is already taken) or the request fails.
#[instrument(skip_all)]
async fn run_auth_register(args: &RegisterArgs, dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let manager = build_session_manager(&config, dir)?;

    manager
        .sign_up(&args.name, &args.email, &args.password)
        .await
        .context("registration failed")?;

    tracing::info!("Account created and signed in as {}", args.email);
    Ok(())
}

/// Runs the `auth logout` subcommand.
///
/// # Errors
///
/// Returns an error if the backend client cannot be built.
#[instrument(skip_all)]
async fn run_auth_logout(dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let manager = build_session_manager(&config, dir)?;

    manager.sign_out().await;
    tracing::info!("Signed out");
    Ok(())
}

/// Runs the `auth status` subcommand.
///
/// Reads local state only; no network traffic.
///
/// # Errors
///
/// Returns an error if the local store cannot be opened.
#[instrument(skip_all)]
async fn run_auth_status(dir: Option<&Path>) -> Result<()> {
    let kv = open_store(dir).context("failed to open local store")?;
    let store = SessionStore::new(kv);

    if store.token().await.is_some() {
        tracing::info!("Signed in (local session present)");
    } else {
        tracing::info!("Not signed in");
    }
    Ok(())
}

/// Runs the `auth whoami` subcommand.
///
/// An expired session that refresh cannot recover clears the local
/// session so the next `auth status` reports signed out.
///
/// # Errors
///
/// Returns an error if the profile request fails.
#[instrument(skip_all)]
async fn run_auth_whoami(dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let manager = build_session_manager(&config, dir)?;

    if manager.bootstrap().await == AppState::Unauthenticated {
        bail!("not signed in; run `auth login` first");
    }

    match manager.load_profile().await {
        Ok(Some(profile)) => {
            tracing::info!("ID: {}", profile.id);
            tracing::info!("Name: {}", profile.full_name);
            tracing::info!("Email: {}", profile.email);
            Ok(())
        }
        Ok(None) => {
            tracing::info!("No profile record found for this account");
            Ok(())
        }
        Err(ApiError::AuthExpired) => {
            manager.sign_out().await;
            bail!("session expired; signed out, run `auth login` again");
        }
        Err(err) => Err(err).context("failed to load profile"),
    }
}

/// Runs the `movies search` subcommand.
///
/// Drives the search pipeline with the query as a single input and waits
/// for the terminal snapshot of the fired generation. The pipeline
/// records search popularity as a side effect; a failed popularity
/// update is logged but does not fail the command.
///
/// # Errors
///
/// Returns an error if the catalog client fails to build, the query is
/// too short, or the search fails.
#[instrument(skip_all)]
async fn run_movies_search(args: &SearchArgs, dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let catalog = build_catalog_client(&config)?;
    let trending = build_trending_repo(&config)?;

    // Single-shot input: no keystrokes to coalesce, so no debounce delay.
    let pipeline = SearchPipeline::with_debounce(catalog, trending, Duration::ZERO);
    let mut rx = pipeline.subscribe();
    pipeline.input(&args.query).await;

    loop {
        rx.changed()
            .await
            .map_err(|_| anyhow::anyhow!("search pipeline closed"))?;
        let snapshot = rx.borrow_and_update().clone();
        match snapshot.phase {
            SearchPhase::Searching => {}
            SearchPhase::Idle => bail!("query must be at least 3 characters"),
            SearchPhase::Failed(message) => bail!("search failed: {message}"),
            SearchPhase::Results(movies) => {
                tracing::info!("Results: {}", movies.len());
                tracing::info!("ID\tRating\tReleaseDate\tTitle");
                for movie in &movies {
                    tracing::info!(
                        "{}\t{:.1}\t{}\t{}",
                        movie.id,
                        movie.vote_average,
                        movie.release_date.as_deref().unwrap_or("-"),
                        movie.title,
                    );
                }
                break;
            }
        }
    }

    // The popularity update runs as a spawned task; drain it before the
    // runtime shuts down.
    pipeline.flush().await;
    Ok(())
}

/// Runs the `movies popular` subcommand.
///
/// # Errors
///
/// Returns an error if the catalog client fails to build or the API
/// request fails.
#[instrument(skip_all)]
async fn run_movies_popular(dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let catalog = build_catalog_client(&config)?;

    let response = catalog
        .discover_movies()
        .await
        .context("catalog discover request failed")?;

    tracing::info!("ID\tRating\tReleaseDate\tTitle");
    for movie in &response.results {
        tracing::info!(
            "{}\t{:.1}\t{}\t{}",
            movie.id,
            movie.vote_average,
            movie.release_date.as_deref().unwrap_or("-"),
            movie.title,
        );
    }

    Ok(())
}

/// Runs the `movies details` subcommand.
///
/// # Errors
///
/// Returns an error if the catalog client fails to build, the movie does
/// not exist, or the API request fails.
#[instrument(skip_all)]
async fn run_movies_details(args: &DetailsArgs, dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let catalog = build_catalog_client(&config)?;

    let details = catalog
        .movie_details(args.id)
        .await
        .context("catalog details request failed")?;

    tracing::info!("ID: {}", details.id);
    tracing::info!("Title: {}", details.title);
    tracing::info!(
        "Release Date: {}",
        details.release_date.as_deref().unwrap_or("-")
    );
    tracing::info!("Rating: {:.1} ({} votes)", details.vote_average, details.vote_count);
    tracing::info!(
        "Runtime: {}",
        details
            .runtime
            .map_or_else(|| String::from("-"), |r| format!("{r} min")),
    );
    let genres: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
    tracing::info!("Genres: {}", genres.join(", "));
    tracing::info!("Poster: {}", poster_url(details.poster_path.as_deref()));
    if let Some(overview) = &details.overview {
        tracing::info!("Overview: {overview}");
    }

    Ok(())
}

/// Runs the `saved list` subcommand.
///
/// # Errors
///
/// Returns an error if the document store client cannot be built.
#[instrument(skip_all)]
async fn run_saved_list(dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let repo = build_saved_repo(&config)?;

    let saved = repo.list().await;
    if saved.is_empty() {
        tracing::info!("No saved movies");
        return Ok(());
    }

    tracing::info!("ID\tRating\tSavedAt\t\t\tTitle");
    for doc in &saved {
        tracing::info!(
            "{}\t{:.1}\t{}\t{}",
            doc.data.movie_id,
            doc.data.vote_average,
            doc.data.saved_at,
            doc.data.title,
        );
    }
    tracing::info!("Total: {} saved movies", saved.len());

    Ok(())
}

/// Runs the `saved add` subcommand.
///
/// Fetches current catalog details so the saved record carries a fresh
/// snapshot.
///
/// # Errors
///
/// Returns an error if the catalog lookup fails or the document store
/// write fails.
#[instrument(skip_all)]
async fn run_saved_add(args: &SavedIdArgs, dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let catalog = build_catalog_client(&config)?;
    let repo = build_saved_repo(&config)?;

    let details = catalog
        .movie_details(args.id)
        .await
        .context("catalog details request failed")?;

    let doc = repo.save(&details).await.context("failed to save movie")?;
    tracing::info!("Saved \"{}\" ({})", doc.data.title, doc.data.movie_id);
    Ok(())
}

/// Runs the `saved remove` subcommand.
///
/// # Errors
///
/// Returns an error if the document store delete fails.
#[instrument(skip_all)]
async fn run_saved_remove(args: &SavedIdArgs, dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let repo = build_saved_repo(&config)?;

    repo.unsave(args.id).await.context("failed to remove saved movie")?;
    tracing::info!("Removed movie {}", args.id);
    Ok(())
}

/// Runs the `trending` subcommand.
///
/// # Errors
///
/// Returns an error if the document store client cannot be built.
#[instrument(skip_all)]
async fn run_trending(dir: Option<&Path>) -> Result<()> {
    let config = load_config(dir)?;
    let repo = build_trending_repo(&config)?;

    let entries = repo.trending().await;
    if entries.is_empty() {
        tracing::info!("No trending searches yet");
        return Ok(());
    }

    tracing::info!("Count\tMovieID\tTerm\t\tTitle");
    for doc in &entries {
        tracing::info!(
            "{}\t{}\t{}\t{}",
            doc.data.count,
            doc.data.movie_id,
            doc.data.search_term,
            doc.data.title,
        );
    }

    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let dir = cli.dir.as_deref();
    match cli.command {
        Commands::Auth(auth) => match auth.command {
            AuthSubcommands::Login(args) => run_auth_login(&args, dir).await,
            AuthSubcommands::Register(args) => run_auth_register(&args, dir).await,
            AuthSubcommands::Logout => run_auth_logout(dir).await,
            AuthSubcommands::Status => run_auth_status(dir).await,
            AuthSubcommands::Whoami => run_auth_whoami(dir).await,
        },
        Commands::Movies(movies) => match movies.command {
            MoviesSubcommands::Search(args) => run_movies_search(&args, dir).await,
            MoviesSubcommands::Popular => run_movies_popular(dir).await,
            MoviesSubcommands::Details(args) => run_movies_details(&args, dir).await,
        },
        Commands::Saved(saved) => match saved.command {
            SavedSubcommands::List => run_saved_list(dir).await,
            SavedSubcommands::Add(args) => run_saved_add(&args, dir).await,
            SavedSubcommands::Remove(args) => run_saved_remove(&args, dir).await,
        },
        Commands::Trending => run_trending(dir).await,
    }
}
