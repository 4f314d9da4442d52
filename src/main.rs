//! CLI entry point for spacetraveling

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "spacetraveling")]
#[command(version)]
#[command(about = "A statically generated blog backed by the Prismic CMS", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the static site from the content source
    #[command(alias = "g")]
    Generate,

    /// Serve the site, rendering missing and previewed posts on demand
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Serve whatever is already in the public folder
        #[arg(long)]
        skip_generate: bool,
    },

    /// Clean the public folder
    Clean,

    /// List content (post, slug)
    List {
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Print a signed preview cookie value for a preview ref
    SignPreview {
        /// Preview ref issued by the CMS
        token: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "spacetraveling=debug,tower_http=debug,info"
    } else {
        "spacetraveling=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let dotenv = base_dir.join(".env");
    if dotenv.exists() {
        dotenvy::from_path(&dotenv).with_context(|| format!("Failed to load {:?}", dotenv))?;
    }

    match cli.command {
        Commands::Generate => {
            let app = spacetraveling::Spacetraveling::new(&base_dir)?;
            tracing::info!("Generating static files...");
            app.generate().await?;
            println!("Generated successfully!");
        }

        Commands::Server {
            port,
            ip,
            skip_generate,
        } => {
            let app = spacetraveling::Spacetraveling::new(&base_dir)?;

            if !skip_generate {
                tracing::info!("Generating static files...");
                app.generate().await?;
            }

            tracing::info!("Starting server at http://{}:{}", ip, port);
            spacetraveling::server::start(&app, &ip, port).await?;
        }

        Commands::Clean => {
            let app = spacetraveling::Spacetraveling::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            app.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let app = spacetraveling::Spacetraveling::new(&base_dir)?;
            let source = app.content_source()?;
            spacetraveling::commands::list::run(&app, source.as_ref(), &r#type).await?;
        }

        Commands::SignPreview { token } => {
            let app = spacetraveling::Spacetraveling::new(&base_dir)?;
            let secret = app
                .config
                .preview
                .secret
                .as_deref()
                .context("No preview secret configured (set preview.secret or PREVIEW_SECRET)")?;
            let value = spacetraveling::server::preview::sign_preview(secret, &token)
                .map_err(|e| anyhow::anyhow!(e))?;
            println!("{}={}", spacetraveling::server::PREVIEW_COOKIE, value);
        }

        Commands::Version => {
            println!("spacetraveling version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
