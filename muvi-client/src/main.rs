//! MUVI terminal client - Main entry point
//!
//! Every screen command goes through the navigation guard exactly as a path typed into
//! `muvi open` does.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Datelike;
use clap::{Args, Parser, Subcommand};
use muvi_client::favorites::ToggleResult;
use muvi_client::router::{Navigation, Route};
use muvi_client::views::admin::{self as admin_view, AdminView, FormField, MovieForm};
use muvi_client::views::detail::{render_preview, render_state, DetailLoader, DetailState};
use muvi_client::views::home::{HomeView, Section};
use muvi_client::views::movies::MovieListView;
use muvi_client::views::{favorites as favorites_view, profile as profile_view, CHECKING_AUTH};
use muvi_client::App;
use muvi_common::config::{default_config_path, ClientConfig, ConfigOverrides, TomlConfig};
use muvi_common::Movie;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for muvi
#[derive(Parser, Debug)]
#[command(name = "muvi")]
#[command(about = "Terminal client for the MUVI movie catalog")]
#[command(version)]
struct Cli {
    /// Folder holding the client store
    #[arg(long, global = true)]
    root_folder: Option<PathBuf>,

    /// Catalog API base URL
    #[arg(long, global = true)]
    catalog_url: Option<String>,

    /// Identity service region
    #[arg(long, global = true)]
    identity_region: Option<String>,

    /// Identity app client id
    #[arg(long, global = true)]
    identity_client_id: Option<String>,

    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Featured movie and curated sections
    Home {
        #[arg(long, default_value_t = 1)]
        trending_page: usize,
        #[arg(long, default_value_t = 1)]
        top_page: usize,
        #[arg(long, default_value_t = 1)]
        new_page: usize,
    },
    /// Browse movies
    Movies {
        /// Title filter (case-insensitive)
        #[arg(long, default_value = "")]
        search: String,
        /// Genre id scope
        #[arg(long)]
        genre: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Full details of one movie
    Movie {
        id: String,
        /// Short hover-style preview
        #[arg(long)]
        preview: bool,
    },
    /// Your favorite movies
    Favourites,
    /// Add or remove a favorite
    ToggleFav { id: String },
    /// List genres
    Genres,
    /// Signed-in user details
    Profile,
    /// Open any route path
    Open { path: String },
    /// Manage the catalog
    #[command(subcommand)]
    Admin(AdminCommand),
    Login {
        email: String,
        #[arg(long, env = "MUVI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Signup {
        email: String,
        #[arg(long, env = "MUVI_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Verify a new account with the emailed code
    ConfirmSignup { email: String, code: String },
    /// Email a password reset code
    ForgotPassword { email: String },
    /// Set a new password with the emailed code
    ResetPassword {
        email: String,
        code: String,
        #[arg(long, env = "MUVI_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
    },
    Logout,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    /// Filtered movie list
    List {
        #[arg(long, default_value = "")]
        search: String,
        /// Genre name
        #[arg(long, default_value = "")]
        genre: String,
        #[arg(long, default_value = "")]
        language: String,
        #[arg(long, default_value = "")]
        year: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    Create(MovieFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: MovieFields,
    },
    Delete {
        id: String,
        /// Confirm the delete
        #[arg(long)]
        yes: bool,
    },
    /// Upload a poster image and print its URL
    Upload { file: PathBuf },
}

#[derive(Args, Debug, Default)]
struct MovieFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    genre_id: Option<String>,
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    summary: Option<String>,
    #[arg(long)]
    poster_url: Option<String>,
    /// Upload this image and use it as the poster
    #[arg(long)]
    poster_file: Option<PathBuf>,
    #[arg(long)]
    release_year: Option<String>,
    #[arg(long)]
    director: Option<String>,
    #[arg(long)]
    actors: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(default_config_path);
    let (toml_config, toml_problem) = load_toml(config_path.as_deref());

    // Initialize tracing; logs go to stderr so stdout carries only the rendered view
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "muvi_client={level},muvi={level},muvi_common={level}",
                    level = toml_config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting muvi v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("MUVI_GIT_HASH"),
        env!("MUVI_BUILT_AT"),
        env!("MUVI_BUILD_PROFILE")
    );
    if let Some(problem) = toml_problem {
        warn!("Ignoring config file: {}", problem);
    }

    let overrides = ConfigOverrides {
        root_folder: cli.root_folder.clone(),
        catalog_url: cli.catalog_url.clone(),
        identity_region: cli.identity_region.clone(),
        identity_client_id: cli.identity_client_id.clone(),
    };
    let config = ClientConfig::resolve(&overrides, &toml_config)
        .map_err(|e| anyhow!(e.to_string()))?;

    let app = App::from_config(&config)
        .await
        .context("Failed to initialize client")?;

    app.start().await;
    run(&app, cli.command).await
}

/// Read the TOML config; a missing or broken file yields defaults and a reason
fn load_toml(path: Option<&Path>) -> (TomlConfig, Option<String>) {
    match path {
        Some(path) if path.exists() => match TomlConfig::load(path) {
            Ok(config) => (config, None),
            Err(e) => (
                TomlConfig::default(),
                Some(format!("{}: {}", path.display(), e)),
            ),
        },
        _ => (TomlConfig::default(), None),
    }
}

fn user_error(e: muvi_common::Error) -> anyhow::Error {
    match e {
        muvi_common::Error::Validation(fields) => anyhow!(fields
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect::<Vec<_>>()
            .join("\n")),
        other => anyhow!(other.user_message()),
    }
}

async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Home {
            trending_page,
            top_page,
            new_page,
        } => {
            if guard(app, "/").await {
                let mut view = HomeView::load(app.catalog.as_ref()).await;
                view.set_page(Section::Trending, trending_page);
                view.set_page(Section::TopPicks, top_page);
                view.set_page(Section::NewReleases, new_page);
                let favorites = favorite_keys(app).await;
                println!("{}", view.render(|m| favorites.contains(m.favorite_key())));
            }
        }
        Command::Movies {
            search,
            genre,
            page,
        } => {
            if guard(app, "/movies").await {
                show_movies(app, &search, genre.as_deref(), page).await?;
            }
        }
        Command::Movie { id, preview } => {
            if guard(app, &Route::MovieDetail(id.clone()).path()).await {
                show_movie(app, &id, preview).await;
            }
        }
        Command::Favourites => {
            if guard(app, "/favourites").await {
                show_favorites(app).await?;
            }
        }
        Command::ToggleFav { id } => {
            if guard(app, "/favourites").await {
                toggle_favorite(app, &id).await?;
            }
        }
        Command::Genres => {
            if guard(app, "/movies").await {
                let genres = app.catalog.list_genres().await.map_err(user_error)?;
                for genre in genres {
                    println!("{}\t{}", genre.id, genre.name);
                }
            }
        }
        Command::Profile => {
            if guard(app, "/profile").await {
                show_profile(app).await?;
            }
        }
        Command::Open { path } => open_path(app, &path).await?,
        Command::Admin(admin) => {
            if guard(app, "/admin").await {
                run_admin(app, admin).await?;
            }
        }
        Command::Login { email, password } => {
            if guard(app, "/login").await {
                app.auth.login(&email, &password).await.map_err(user_error)?;
                println!("Logged in as {}", email.trim());
            }
        }
        Command::Signup {
            email,
            password,
            confirm_password,
        } => {
            if guard(app, "/signup").await {
                let message = app
                    .auth
                    .sign_up(&email, &password, &confirm_password)
                    .await
                    .map_err(user_error)?;
                println!("{}", message);
            }
        }
        Command::ConfirmSignup { email, code } => {
            if guard(app, "/signup").await {
                let message = app
                    .auth
                    .confirm_sign_up(&email, &code)
                    .await
                    .map_err(user_error)?;
                println!("{}", message);
            }
        }
        Command::ForgotPassword { email } => {
            if guard(app, "/forgot-password").await {
                let message = app.auth.forgot_password(&email).await.map_err(user_error)?;
                println!("{}", message);
            }
        }
        Command::ResetPassword {
            email,
            code,
            new_password,
        } => {
            if guard(app, "/confirm-password").await {
                let message = app
                    .auth
                    .reset_password(&email, &code, &new_password)
                    .await
                    .map_err(user_error)?;
                println!("{}", message);
            }
        }
        Command::Logout => {
            let message = app.auth.logout().await.map_err(user_error)?;
            println!("{}", message);
        }
    }
    Ok(())
}

/// Run the navigation guard for `path`; true when the route itself may render
async fn guard(app: &App, path: &str) -> bool {
    let (navigation, redirects) = app.navigate(path).await;
    let target = Route::parse(path);

    match navigation {
        Navigation::Checking => {
            println!("{}", CHECKING_AUTH);
            false
        }
        Navigation::RenderProtected(route) | Navigation::RenderPublic(route)
            if Some(&route) == target.as_ref() =>
        {
            true
        }
        Navigation::RenderPublic(Route::Login) => {
            println!("Please log in first (muvi login <EMAIL>).");
            false
        }
        other => {
            info!(path = %path, redirects = ?redirects, "Navigation redirected");
            match other {
                Navigation::RenderProtected(Route::Home) => println!("You are already logged in."),
                _ => println!("Redirected to {}", redirects.last().map_or("/", String::as_str)),
            }
            false
        }
    }
}

async fn open_path(app: &App, path: &str) -> Result<()> {
    let (navigation, redirects) = app.navigate(path).await;
    if !redirects.is_empty() {
        eprintln!("Redirected: {} -> {}", path, redirects.join(" -> "));
    }

    match navigation {
        Navigation::Checking => println!("{}", CHECKING_AUTH),
        Navigation::RenderProtected(route) => match route {
            Route::Home => {
                let view = HomeView::load(app.catalog.as_ref()).await;
                let favorites = favorite_keys(app).await;
                println!("{}", view.render(|m| favorites.contains(m.favorite_key())));
            }
            Route::Movies => show_movies(app, "", None, 1).await?,
            Route::MovieDetail(id) => show_movie(app, &id, false).await,
            Route::Favourites => show_favorites(app).await?,
            Route::Admin => {
                let view = AdminView::load(app.catalog.as_ref()).await;
                println!("{}", view.render_list());
            }
            Route::Profile => show_profile(app).await?,
            other => println!("{}", other.path()),
        },
        Navigation::RenderPublic(route) => {
            println!("{} (signed out; use the account commands, e.g. muvi login)", route.path())
        }
        Navigation::Redirect { to, .. } => println!("Redirected to {}", to),
    }
    Ok(())
}

async fn favorite_keys(app: &App) -> std::collections::HashSet<String> {
    if let Err(e) = app.sync_favorites().await {
        warn!("Favorites unavailable: {}", e);
    }
    app.favorites
        .favorites()
        .await
        .iter()
        .map(|m| m.favorite_key().to_string())
        .collect()
}

async fn show_movies(app: &App, search: &str, genre: Option<&str>, page: usize) -> Result<()> {
    let mut view = MovieListView::new();
    view.set_genre(genre);
    let (loaded, favorites) = tokio::join!(view.load(app.catalog.as_ref()), favorite_keys(app));
    if let Err(e) = loaded {
        eprintln!("Failed to fetch movies. Please try again. ({})", e.user_message());
    }
    view.set_search_query(search);
    view.set_page(page);
    println!("{}", view.render(|m| favorites.contains(m.favorite_key())));
    Ok(())
}

async fn show_movie(app: &App, id: &str, preview: bool) {
    let loader = DetailLoader::new();
    let state = loader.select(app.catalog.as_ref(), id).await;
    match (&state, preview) {
        (DetailState::Ready(movie), true) => {
            println!("{}", render_preview(movie))
        }
        _ => println!("{}", render_state(&state)),
    }
}

async fn show_favorites(app: &App) -> Result<()> {
    app.sync_favorites().await.map_err(user_error)?;
    println!("{}", favorites_view::render(&app.favorites.favorites().await));
    Ok(())
}

async fn toggle_favorite(app: &App, id: &str) -> Result<()> {
    app.sync_favorites().await.map_err(user_error)?;
    let movie = Movie {
        id: id.to_string(),
        ..Default::default()
    };

    match app.favorites.toggle(&movie).await.map_err(user_error)? {
        ToggleResult::Added(movie) => println!("Added to favorites: {}", movie.title),
        ToggleResult::Removed(id) => println!("Removed from favorites: {}", id),
        ToggleResult::Unchanged(message) => println!("{}", message),
        ToggleResult::NoUser => println!("Please log in first (muvi login <EMAIL>)."),
    }
    Ok(())
}

async fn show_profile(app: &App) -> Result<()> {
    let token = app
        .store
        .auth_token()
        .await
        .map_err(user_error)?
        .ok_or_else(|| anyhow!("Please log in first (muvi login <EMAIL>)."))?;
    let user = app.identity.get_user(&token).await.map_err(user_error)?;
    println!("{}", profile_view::render(&user));
    Ok(())
}

async fn run_admin(app: &App, command: AdminCommand) -> Result<()> {
    let catalog = app.catalog.as_ref();
    let current_year = chrono::Local::now().year();

    match command {
        AdminCommand::List {
            search,
            genre,
            language,
            year,
            page,
        } => {
            let mut view = AdminView::load(catalog).await;
            view.filters.set_search(&search);
            view.filters.set_genre(&genre);
            view.filters.set_language(&language);
            view.filters.set_year(&year);
            view.filters.set_page(page);

            let facets = view.facets();
            println!("{}", view.render_list());
            println!();
            println!("Genres: {}", facets.genres.join(", "));
            println!("Languages: {}", facets.languages.join(", "));
            println!("Years: {}", facets.years.join(", "));
        }
        AdminCommand::Create(fields) => {
            let genres = app.catalog.list_genres().await.map_err(user_error)?;
            let mut form = MovieForm::new();
            fill_form(app, &mut form, &fields, &genres).await?;
            let outcome = form.submit(catalog, current_year).await.map_err(user_error)?;
            println!("{}", outcome.message());
        }
        AdminCommand::Update { id, fields } => {
            let genres = app.catalog.list_genres().await.map_err(user_error)?;
            let existing = app.catalog.get_movie(&id).await.map_err(user_error)?;
            let mut form = MovieForm::new();
            form.edit(
                &Movie {
                    id: id.clone(),
                    ..existing
                },
                &genres,
            );
            fill_form(app, &mut form, &fields, &genres).await?;
            let outcome = form.submit(catalog, current_year).await.map_err(user_error)?;
            println!("{}", outcome.message());
        }
        AdminCommand::Delete { id, yes } => {
            if admin_view::delete_movie(catalog, &id, yes)
                .await
                .map_err(user_error)?
            {
                println!("Movie deleted");
            } else {
                println!("Are you sure you want to delete this movie? Re-run with --yes.");
            }
        }
        AdminCommand::Upload { file } => {
            let mut form = MovieForm::new();
            let url = upload(app, &mut form, &file).await?;
            println!("{}", url);
        }
    }
    Ok(())
}

async fn upload(app: &App, form: &mut MovieForm, file: &Path) -> Result<String> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "poster".to_string());

    form.upload_poster(app.catalog.as_ref(), &file_name, bytes)
        .await
        .map_err(|e| {
            warn!("Upload failed: {}", e);
            anyhow!("Image upload failed: {}", e.user_message())
        })
}

async fn fill_form(
    app: &App,
    form: &mut MovieForm,
    fields: &MovieFields,
    genres: &[muvi_common::Genre],
) -> Result<()> {
    let text_fields = [
        (FormField::Title, &fields.title),
        (FormField::Language, &fields.language),
        (FormField::Summary, &fields.summary),
        (FormField::PosterUrl, &fields.poster_url),
        (FormField::ReleaseYear, &fields.release_year),
        (FormField::Director, &fields.director),
        (FormField::Actors, &fields.actors),
    ];
    for (field, value) in text_fields {
        if let Some(value) = value {
            if !form.set_field(field, value) {
                return Err(anyhow!("Release year must be at most four digits"));
            }
        }
    }

    if let Some(genre_id) = &fields.genre_id {
        form.select_genre(genre_id, genres);
    }

    if let Some(file) = &fields.poster_file {
        upload(app, form, file).await?;
    }
    Ok(())
}
