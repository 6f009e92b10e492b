//! duplex - side-by-side text and product comparison

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use duplex::catalog::{PageRequest, DEFAULT_PAGE_SIZE, DEFAULT_POPULAR_LIMIT};
use duplex::commands::{self, OutputFormat, TextOptions};
use duplex::config;
use duplex::session::Theme;
use duplex::shell::Shell;

#[derive(Parser)]
#[command(name = "duplex")]
#[command(author, version, about = "Side-by-side text and product comparison")]
struct Cli {
    /// Verbose logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize duplex (writes ~/.duplex/config.toml)
    Init,

    /// List product categories
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List products in a category, most popular first
    List {
        /// Category (smartphone, laptop, tablet, camera, headphone, smartwatch, gaming)
        category: String,

        #[arg(short, long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search products by name, brand or description
    Search {
        /// Search query
        query: String,

        /// Restrict to one category
        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a product by ID
    Show {
        /// Product ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Most popular products
    Popular {
        #[arg(short, long, default_value_t = DEFAULT_POPULAR_LIMIT)]
        limit: usize,

        /// Restrict to one category
        #[arg(short, long)]
        category: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare products attribute by attribute
    Compare {
        /// Product IDs (at least two)
        #[arg(required = true, num_args = 2..)]
        ids: Vec<String>,

        /// Only show attributes that differ
        #[arg(long)]
        only_diff: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load two text files side by side
    Text {
        /// Original (left) file; defaults to the sample document
        left: Option<PathBuf>,

        /// Modified (right) file; defaults to the sample document
        right: Option<PathBuf>,

        /// Swap the two sides after loading
        #[arg(long)]
        swap: bool,

        /// Editor language
        #[arg(short, long)]
        language: Option<String>,

        /// Editor theme: light or dark
        #[arg(short, long)]
        theme: Option<String>,

        /// Write text-comparison.txt into this directory (default ~/.duplex/exports)
        #[arg(short, long, num_args = 0..=1, value_name = "DIR")]
        export: Option<Option<PathBuf>>,

        /// Print the clipboard form instead of the export form
        #[arg(long)]
        clipboard: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive browse and compare shell
    Shell,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string()),
        ))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::load_config()?;

    match cli.command {
        Commands::Init => {
            commands::init()?;
        }
        Commands::Categories { json } => {
            commands::categories(OutputFormat::from_flag(json))?;
        }
        Commands::List {
            category,
            page,
            page_size,
            json,
        } => {
            let source = commands::open_source(&config)?;
            commands::list(
                source.as_ref(),
                &category,
                PageRequest::new(page, page_size),
                OutputFormat::from_flag(json),
            )
            .await?;
        }
        Commands::Search {
            query,
            category,
            page,
            page_size,
            json,
        } => {
            let source = commands::open_source(&config)?;
            commands::search(
                source.as_ref(),
                &query,
                category.as_deref(),
                PageRequest::new(page, page_size),
                OutputFormat::from_flag(json),
            )
            .await?;
        }
        Commands::Show { id, json } => {
            let source = commands::open_source(&config)?;
            commands::show(source.as_ref(), &id, OutputFormat::from_flag(json)).await?;
        }
        Commands::Popular {
            limit,
            category,
            json,
        } => {
            let source = commands::open_source(&config)?;
            commands::popular(
                source.as_ref(),
                limit,
                category.as_deref(),
                OutputFormat::from_flag(json),
            )
            .await?;
        }
        Commands::Compare {
            ids,
            only_diff,
            json,
        } => {
            let source = commands::open_source(&config)?;
            commands::compare(
                source.as_ref(),
                &ids,
                config.selection.max_items,
                only_diff,
                OutputFormat::from_flag(json),
            )
            .await?;
        }
        Commands::Text {
            left,
            right,
            swap,
            language,
            theme,
            export,
            clipboard,
            json,
        } => {
            let theme = theme
                .map(|t| t.parse::<Theme>().map_err(|e| anyhow::anyhow!(e)))
                .transpose()?;
            let options = TextOptions {
                left,
                right,
                swap,
                language,
                theme,
                export,
                clipboard,
            };
            commands::text(&config, options, OutputFormat::from_flag(json))?;
        }
        Commands::Shell => {
            let source = commands::open_source(&config)?;
            let mut shell = Shell::new(source.as_ref(), config.selection.max_items);
            shell.run().await?;
        }
    }

    Ok(())
}
