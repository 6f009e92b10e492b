//! CLI commands for duplex

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::catalog::{self, Catalog, CatalogSource, PageRequest, RemoteCatalog, SearchPage};
use crate::compare::{self, spec_table, AttributeRow, ComparisonResult};
use crate::config::{save_config, CatalogSourceKind, Config, DuplexPaths};
use crate::editor::{BufferSyncController, MemoryWidget, Side};
use crate::models::{Product, ProductCategory, SpecCategory};
use crate::notify::{self, Notifier};
use crate::selection::{AddOutcome, Selection};
use crate::session::{Theme, TextCompareSession};

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Summary,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Summary
        }
    }
}

/// Initialize duplex for first-time setup
pub fn init() -> Result<()> {
    let paths = DuplexPaths::new()?;

    if paths.is_initialized() {
        println!("Duplex is already initialized at {}", paths.root.display());
        return Ok(());
    }

    println!("Initializing duplex at {}...", paths.root.display());

    paths.ensure_dirs()?;
    println!("  Created directory structure");

    save_config(&Config::default())?;
    println!("  Created config.toml");

    println!();
    println!("Duplex initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  duplex categories             List product categories");
    println!("  duplex compare <id> <id>      Compare products side by side");
    println!("  duplex shell                  Browse and compare interactively");

    Ok(())
}

/// Build the catalog source named by the configuration
pub fn open_source(config: &Config) -> Result<Box<dyn CatalogSource>> {
    match config.catalog.source {
        CatalogSourceKind::Builtin => Ok(Box::new(Catalog::builtin()?)),
        CatalogSourceKind::Remote => {
            let remote = RemoteCatalog::new(config.catalog.to_remote_config())
                .context("Failed to create remote catalog client")?;
            tracing::debug!("Using remote catalog at {}", remote.config().base_url);
            Ok(Box::new(remote))
        }
    }
}

fn parse_category(category: &str) -> Result<ProductCategory> {
    category
        .parse::<ProductCategory>()
        .map_err(|e| anyhow::anyhow!(e))
}

/// List all categories
pub fn categories(format: OutputFormat) -> Result<()> {
    let infos = catalog::category_infos();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&infos)?);
        }
        OutputFormat::Summary => {
            println!("{:<4} {:<12} {:<16} {}", "", "ID", "NAME", "DESCRIPTION");
            println!("{}", "-".repeat(72));
            for info in infos {
                println!(
                    "{:<4} {:<12} {:<16} {}",
                    info.icon,
                    info.id.to_string(),
                    info.name,
                    info.description
                );
            }
        }
    }

    Ok(())
}

/// List the products of one category, most popular first
pub async fn list(
    source: &dyn CatalogSource,
    category: &str,
    page: PageRequest,
    format: OutputFormat,
) -> Result<()> {
    let category = parse_category(category)?;
    let result = source.list_by_category(category, page).await?;
    print_page(&result, format)
}

/// Search products by name, brand or description
pub async fn search(
    source: &dyn CatalogSource,
    query: &str,
    category: Option<&str>,
    page: PageRequest,
    format: OutputFormat,
) -> Result<()> {
    let category = category.map(parse_category).transpose()?;
    let result = source.search(query, category, page).await?;
    print_page(&result, format)
}

/// Show a product by id
pub async fn show(source: &dyn CatalogSource, id: &str, format: OutputFormat) -> Result<()> {
    let product = source
        .get_by_id(id)
        .await?
        .with_context(|| format!("Product not found: {}", id))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(product.as_ref())?);
        }
        OutputFormat::Summary => print_product(&product),
    }

    Ok(())
}

/// Most popular products, optionally within one category
pub async fn popular(
    source: &dyn CatalogSource,
    limit: usize,
    category: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let category = category.map(parse_category).transpose()?;
    let products = source.popular(limit, category).await?;

    match format {
        OutputFormat::Json => {
            let products: Vec<&Product> = products.iter().map(|p| p.as_ref()).collect();
            println!("{}", serde_json::to_string_pretty(&products)?);
        }
        OutputFormat::Summary => {
            print_product_header();
            for product in &products {
                print_product_line(product);
            }
        }
    }

    Ok(())
}

/// Compare products side by side
///
/// Ids are added to a selection capped at `max_items`; unknown ids and ids
/// past the cap are reported and skipped.
pub async fn compare(
    source: &dyn CatalogSource,
    ids: &[String],
    max_items: usize,
    only_diff: bool,
    format: OutputFormat,
) -> Result<ComparisonResult> {
    let products = source.get_many(ids).await?;
    for id in ids {
        if !products.iter().any(|p| &p.id == id) {
            eprintln!("⚠ Unknown product: {}", id);
        }
    }

    let mut selection = Selection::new(max_items);
    for product in products {
        let id = product.id.clone();
        if selection.add(product) == AddOutcome::AtCapacity {
            eprintln!("⚠ Selection is full ({}), skipping {}", max_items, id);
        }
    }

    if !selection.can_compare() {
        bail!("Need at least {} known products to compare", compare::MIN_COMPARABLE);
    }

    let result = selection.compare();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Summary => print_comparison(&result, only_diff),
    }

    Ok(result)
}

/// Options for the `text` command
#[derive(Debug, Default)]
pub struct TextOptions {
    pub left: Option<PathBuf>,
    pub right: Option<PathBuf>,
    pub swap: bool,
    pub language: Option<String>,
    pub theme: Option<Theme>,
    /// `Some(None)` exports into the configured exports directory
    pub export: Option<Option<PathBuf>>,
    pub clipboard: bool,
}

/// Load two documents into a headless text-compare session and report on them
pub fn text(config: &Config, options: TextOptions, format: OutputFormat) -> Result<()> {
    let (notifier, mut notices) = Notifier::channel();
    let (controller, _events) = BufferSyncController::<MemoryWidget>::with_warning_interval(
        crate::session::INITIAL_LEFT,
        crate::session::INITIAL_RIGHT,
        notifier,
        config.editor.warning_interval(),
    );
    let mut session = TextCompareSession::with_controller(controller, MemoryWidget::new);

    session.set_language(options.language.as_deref().unwrap_or(&config.editor.language))?;
    session.set_theme(options.theme.unwrap_or(config.editor.theme));
    if session.view_options().line_numbers != config.editor.line_numbers {
        session.toggle_line_numbers();
    }

    if let Some(path) = &options.left {
        load_side(&mut session, Side::Left, path)?;
    }
    if let Some(path) = &options.right {
        load_side(&mut session, Side::Right, path)?;
    }
    if options.swap {
        settle(&mut session);
        session.swap();
    }
    settle(&mut session);

    for notice in notify::drain(&mut notices) {
        eprintln!("[{}] {}", notice.level, notice.message);
    }

    let stats = session.stats();
    match format {
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "left": session.text(Side::Left),
                "right": session.text(Side::Right),
                "language": session.language(),
                "theme": session.theme(),
                "stats": stats,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        OutputFormat::Summary => {
            println!(
                "Original: {} lines, {} characters",
                stats.left_lines, stats.left_chars
            );
            println!(
                "Modified: {} lines, {} characters",
                stats.right_lines, stats.right_chars
            );
            println!();
            if options.clipboard {
                println!("{}", session.clipboard_text());
            } else if options.export.is_none() {
                println!("{}", session.export_text());
            }
        }
    }

    if let Some(requested) = options.export {
        let dir = export_dir(requested, &DuplexPaths::new()?);
        let path = session.write_export(&dir)?;
        println!("✓ Exported comparison to {}", path.display());
    }

    Ok(())
}

/// Where `text --export` writes; a bare flag means `~/.duplex/exports`
fn export_dir(requested: Option<PathBuf>, paths: &DuplexPaths) -> PathBuf {
    requested.unwrap_or_else(|| paths.exports.clone())
}

fn load_side(session: &mut TextCompareSession<MemoryWidget>, side: Side, path: &Path) -> Result<()> {
    settle(session);
    session.load_file(side, path)?;
    Ok(())
}

/// Let the headless widget dispatch its notifications and release the locks
fn settle(session: &mut TextCompareSession<MemoryWidget>) {
    let controller = session.controller_mut();
    controller.deliver_notifications();
    controller.idle_tick();
}

fn print_page(page: &SearchPage, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(page)?);
        }
        OutputFormat::Summary => {
            if page.products.is_empty() {
                println!("No products found for '{}'.", page.query);
                return Ok(());
            }
            print_product_header();
            for product in &page.products {
                print_product_line(product);
            }
            println!();
            println!(
                "Page {} ({} of {} products)",
                page.page,
                page.products.len(),
                page.total
            );
        }
    }
    Ok(())
}

fn print_product_header() {
    println!(
        "{:<22} {:<28} {:<10} {:>10} {:>5}",
        "ID", "NAME", "BRAND", "PRICE", "POP"
    );
    println!("{}", "-".repeat(79));
}

fn print_product_line(product: &Product) {
    println!(
        "{:<22} {:<28} {:<10} {:>10} {:>5}",
        truncate(&product.id, 20),
        truncate(&product.name, 26),
        truncate(&product.brand, 10),
        format_price(product),
        product.popularity
    );
}

fn print_product(product: &Product) {
    println!("Product: {}", product.name);
    println!("{}", "=".repeat(50));
    println!("ID:       {}", product.id);
    println!("Brand:    {}", product.brand);
    println!("Category: {}", product.category);
    println!("Price:    {}", format_price(product));
    println!("Released: {}", product.release_date.format("%Y-%m-%d"));
    println!("Score:    {}", product.popularity);

    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }

    if !product.specs.is_empty() {
        println!();
        println!("Specs: {}", product.specs.len());
        let rows = by_spec_category(spec_table::rows_of(product), |row| row.category);
        let mut current_group = None;
        for row in &rows {
            if current_group != Some(row.category) {
                current_group = Some(row.category);
                println!("  [{}]", row.category);
            }
            let value = product.spec(&row.key).map(|s| s.value.as_str()).unwrap_or("");
            println!("    {:<24} {}", row.label, value);
        }
    }
}

/// Stable sort into spec-category order so each group is contiguous
fn by_spec_category<T>(mut items: Vec<T>, category: impl Fn(&T) -> SpecCategory) -> Vec<T> {
    items.sort_by_key(|item| category(item).order());
    items
}

fn print_comparison(result: &ComparisonResult, only_diff: bool) {
    const LABEL_WIDTH: usize = 22;
    const COLUMN_WIDTH: usize = 24;

    print!("  {:<LABEL_WIDTH$}", "");
    for product in &result.products {
        print!(" {:<COLUMN_WIDTH$}", truncate(&product.name, COLUMN_WIDTH - 1));
    }
    println!();
    println!(
        "{}",
        "-".repeat(2 + LABEL_WIDTH + result.products.len() * (COLUMN_WIDTH + 1))
    );

    let shown: Vec<&AttributeRow> = result
        .rows
        .iter()
        .filter(|row| row.divergent || !only_diff)
        .collect();
    let mut current_group = None;
    for row in by_spec_category(shown, |row| row.category) {
        if current_group != Some(row.category) {
            current_group = Some(row.category);
            println!("[{}]", row.category);
        }
        let marker = if row.divergent { "*" } else { " " };
        print!("{} {:<LABEL_WIDTH$}", marker, truncate(&row.label, LABEL_WIDTH - 1));
        for value in &row.values {
            print!(" {:<COLUMN_WIDTH$}", truncate(value.as_str(), COLUMN_WIDTH - 1));
        }
        println!();
    }

    println!();
    println!(
        "{} attributes, {} differ (*)",
        result.rows.len(),
        result.divergent_count()
    );
}

fn format_price(product: &Product) -> String {
    format!("{:.2} {}", product.price, product.currency)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
