//! Interactive browse-and-compare shell
//!
//! A line-editor front end over [`Browser`]: pick a category or search, add
//! products to the selection, then compare them.

use anyhow::{bail, Result};
use rustyline::{error::ReadlineError, DefaultEditor};

use crate::browse::{Browser, ViewMode};
use crate::catalog::{CatalogSource, PageRequest};
use crate::compare::ComparisonResult;
use crate::models::ProductCategory;
use crate::selection::AddOutcome;

/// What the shell loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell<'a> {
    source: &'a dyn CatalogSource,
    browser: Browser,
    page: PageRequest,
}

impl<'a> Shell<'a> {
    pub fn new(source: &'a dyn CatalogSource, max_items: usize) -> Self {
        Self {
            source,
            browser: Browser::with_capacity(max_items),
            page: PageRequest::default(),
        }
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    pub async fn run(&mut self) -> Result<()> {
        println!("Duplex product shell");
        println!();
        print_help();
        println!();

        self.refresh().await;

        let mut rl = DefaultEditor::new()?;

        loop {
            let prompt = format!("duplex[{}]> ", self.browser.mode());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    match self.execute(trimmed).await {
                        Ok(Flow::Exit) => break,
                        Ok(Flow::Continue) => {}
                        Err(e) => println!("✗ Error: {}", e),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("Interrupted. Use /exit to quit.");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    println!("Error: {:?}", err);
                    break;
                }
            }
        }

        println!("\nSession ended.");
        Ok(())
    }

    /// Run one line of input. Lines not starting with `/` are searches.
    pub async fn execute(&mut self, line: &str) -> Result<Flow> {
        if !line.starts_with('/') {
            self.browser.set_query(line);
            self.page = PageRequest::default();
            self.refresh().await;
            return Ok(Flow::Continue);
        }

        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match command {
            "/exit" | "/quit" => return Ok(Flow::Exit),
            "/help" => print_help(),
            "/cat" => {
                if arg.is_empty() {
                    for category in ProductCategory::ALL {
                        let info = category.info();
                        println!("  {} {:<12} {}", info.icon, category, info.name);
                    }
                } else {
                    let category = arg
                        .parse::<ProductCategory>()
                        .map_err(|e| anyhow::anyhow!(e))?;
                    self.browser.select_category(category);
                    self.page = PageRequest::default();
                    self.refresh().await;
                }
            }
            "/search" => {
                self.browser.set_query(arg);
                self.page = PageRequest::default();
                self.refresh().await;
            }
            "/page" => {
                let page: usize = arg.parse().map_err(|_| anyhow::anyhow!("Invalid page: {}", arg))?;
                self.page = PageRequest::new(page, self.page.page_size);
                self.refresh().await;
            }
            "/add" => self.add(arg).await?,
            "/remove" => {
                if self.browser.remove(arg) {
                    println!("✓ Removed {}", arg);
                } else {
                    println!("{} is not selected", arg);
                }
            }
            "/list" => self.print_selection(),
            "/clear" => {
                self.browser.clear_all();
                println!("✓ Selection cleared");
            }
            "/compare" | "/diff" => match self.browser.start_compare() {
                Some(result) => print_comparison(&result, command == "/diff"),
                None => println!("Select at least 2 products to compare"),
            },
            "/back" => {
                if self.browser.mode() == ViewMode::Compare {
                    self.browser.exit_compare();
                    println!("Left comparison; selection cleared");
                }
                self.refresh().await;
            }
            other => bail!("Unknown command: {}. Type /help for commands", other),
        }

        Ok(Flow::Continue)
    }

    async fn add(&mut self, id: &str) -> Result<()> {
        if id.is_empty() {
            bail!("Usage: /add <product-id>");
        }
        let Some(product) = self.source.get_by_id(id).await? else {
            bail!("Product not found: {}", id);
        };
        let name = product.name.clone();
        match self.browser.add(product) {
            AddOutcome::Added => println!(
                "✓ Added {} ({}/{})",
                name,
                self.browser.selection().len(),
                self.browser.selection().capacity()
            ),
            AddOutcome::AlreadySelected => println!("{} is already selected", name),
            AddOutcome::AtCapacity => println!(
                "Selection is full ({} products). Remove one first.",
                self.browser.selection().capacity()
            ),
        }
        Ok(())
    }

    /// Fetch the listing for the current view; failures are printed, not fatal
    async fn refresh(&mut self) {
        if self.browser.mode() == ViewMode::Compare {
            return;
        }
        match self.browser.refresh(self.source, self.page).await {
            Ok(true) => self.print_listing(),
            Ok(false) => {}
            Err(e) => println!("✗ {}", e),
        }
    }

    fn print_listing(&self) {
        let Some(page) = self.browser.listing() else {
            return;
        };
        if page.products.is_empty() {
            println!("No products found for '{}'.", page.query);
            return;
        }
        for product in &page.products {
            let mark = if self.browser.selection().contains(&product.id) {
                "+"
            } else {
                " "
            };
            println!(
                "{} {:<22} {:<28} {:>3}",
                mark, product.id, product.name, product.popularity
            );
        }
        println!(
            "-- page {} ({} of {})",
            page.page,
            page.products.len(),
            page.total
        );
    }

    fn print_selection(&self) {
        let selection = self.browser.selection();
        if selection.is_empty() {
            println!("Nothing selected. Use /add <product-id>.");
            return;
        }
        for product in selection.iter() {
            println!("  {:<22} {}", product.id, product.name);
        }
        println!("{}/{} selected", selection.len(), selection.capacity());
    }
}

fn print_help() {
    println!("Commands:");
    println!("  <text>          - Search products");
    println!("  /cat [name]     - List categories or browse one");
    println!("  /page <n>       - Show another page of the listing");
    println!("  /add <id>       - Add a product to the selection");
    println!("  /remove <id>    - Remove a product from the selection");
    println!("  /list           - Show the selection");
    println!("  /clear          - Clear the selection");
    println!("  /compare        - Compare the selection");
    println!("  /diff           - Compare, differing attributes only");
    println!("  /back           - Leave the comparison");
    println!("  /exit           - Exit");
}

fn print_comparison(result: &ComparisonResult, only_diff: bool) {
    let names: Vec<&str> = result.products.iter().map(|p| p.name.as_str()).collect();
    println!("{}", names.join(" | "));
    for row in &result.rows {
        if only_diff && !row.divergent {
            continue;
        }
        let values: Vec<&str> = row.values.iter().map(|v| v.as_str()).collect();
        let marker = if row.divergent { "*" } else { " " };
        println!("{} {}: {}", marker, row.label, values.join(" | "));
    }
    println!("{} differing of {} attributes", result.divergent_count(), result.rows.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[tokio::test]
    async fn test_add_then_compare() {
        let catalog = Catalog::builtin().unwrap();
        let mut shell = Shell::new(&catalog, 4);

        shell.execute("/add iphone-15-pro").await.unwrap();
        shell.execute("/add iphone-14").await.unwrap();
        shell.execute("/compare").await.unwrap();
        assert_eq!(shell.browser().mode(), ViewMode::Compare);

        shell.execute("/back").await.unwrap();
        assert!(shell.browser().selection().is_empty());
    }

    #[tokio::test]
    async fn test_plain_text_searches() {
        let catalog = Catalog::builtin().unwrap();
        let mut shell = Shell::new(&catalog, 4);

        shell.execute("apple").await.unwrap();
        assert_eq!(shell.browser().mode(), ViewMode::Search);
        assert!(shell.browser().listing().unwrap().total > 0);
    }

    #[tokio::test]
    async fn test_unknown_product_and_command_are_errors() {
        let catalog = Catalog::builtin().unwrap();
        let mut shell = Shell::new(&catalog, 4);

        assert!(shell.execute("/add nope").await.is_err());
        assert!(shell.execute("/frobnicate").await.is_err());
        assert_eq!(shell.execute("/exit").await.unwrap(), Flow::Exit);
    }
}
