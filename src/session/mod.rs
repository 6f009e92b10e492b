//! Text comparison session
//!
//! Composes a [`BufferSyncController`] with the toolbar operations of the
//! text-compare page: sample content, reset, load, swap, read-only toggles,
//! language and theme switching, statistics and export.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::editor::{
    BufferEvents, BufferSyncController, DiffWidget, Side, ViewOptions, WriteOutcome,
};
use crate::notify::Notifier;

pub const EXPORT_FILE_NAME: &str = "text-comparison.txt";

pub const INITIAL_LEFT: &str = r#"// Original code
function calculateTotal(items) {
  let total = 0;
  for (let i = 0; i < items.length; i++) {
    total += items[i].price * items[i].quantity;
  }
  return total;
}

class ShoppingCart {
  constructor() {
    this.items = [];
  }

  addItem(item) {
    this.items.push(item);
  }

  getTotal() {
    return calculateTotal(this.items);
  }
}"#;

pub const INITIAL_RIGHT: &str = r#"// Modified code
function calculateTotal(items) {
  return items.reduce((total, item) => {
    return total + (item.price * item.quantity);
  }, 0);
}

class ShoppingCart {
  constructor() {
    this.items = [];
    this.discount = 0;
  }

  addItem(item) {
    this.items.push(item);
  }

  setDiscount(percentage) {
    this.discount = percentage;
  }

  getTotal() {
    const subtotal = calculateTotal(this.items);
    return subtotal * (1 - this.discount / 100);
  }

  getItemCount() {
    return this.items.length;
  }
}"#;

/// Editor languages offered by the language picker, `(id, label)`
pub const LANGUAGES: [(&str, &str); 11] = [
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("python", "Python"),
    ("java", "Java"),
    ("csharp", "C#"),
    ("cpp", "C++"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("json", "JSON"),
    ("markdown", "Markdown"),
    ("plaintext", "Plain Text"),
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Theme name understood by the diff widget
    pub fn widget_theme(&self) -> &'static str {
        match self {
            Theme::Light => "vs",
            Theme::Dark => "vs-dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("Invalid theme: {}. Use: light, dark", s)),
        }
    }
}

/// Line and character counts for both panes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferStats {
    pub left_lines: usize,
    pub left_chars: usize,
    pub right_lines: usize,
    pub right_chars: usize,
}

fn count(text: &str) -> (usize, usize) {
    (text.split('\n').count(), text.chars().count())
}

pub fn is_supported_language(language: &str) -> bool {
    LANGUAGES.iter().any(|(id, _)| *id == language)
}

pub struct TextCompareSession<W: DiffWidget> {
    controller: BufferSyncController<W>,
    factory: Box<dyn FnMut() -> W>,
    language: String,
    theme: Theme,
    line_numbers: bool,
}

impl<W: DiffWidget> TextCompareSession<W> {
    /// Session seeded with the sample documents; mounts a first widget
    pub fn new(
        notifier: Notifier,
        factory: impl FnMut() -> W + 'static,
    ) -> (Self, BufferEvents) {
        let (controller, events) = BufferSyncController::new(INITIAL_LEFT, INITIAL_RIGHT, notifier);
        (Self::with_controller(controller, factory), events)
    }

    pub fn with_controller(
        controller: BufferSyncController<W>,
        factory: impl FnMut() -> W + 'static,
    ) -> Self {
        let defaults = ViewOptions::default();
        let mut session = Self {
            controller,
            factory: Box::new(factory),
            language: defaults.language,
            theme: Theme::Light,
            line_numbers: defaults.line_numbers,
        };
        session.remount();
        session
    }

    pub fn controller(&self) -> &BufferSyncController<W> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut BufferSyncController<W> {
        &mut self.controller
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            language: self.language.clone(),
            theme: self.theme.widget_theme().to_string(),
            line_numbers: self.line_numbers,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Recreate the widget; read-only flags and content are re-applied on mount
    fn remount(&mut self) {
        let mut widget = (self.factory)();
        widget.configure(&self.view_options());
        self.controller.mount(widget);
    }

    pub fn text(&self, side: Side) -> &str {
        self.controller.content(side)
    }

    pub fn reset(&mut self) -> [WriteOutcome; 2] {
        [
            self.controller.set_content(Side::Left, INITIAL_LEFT),
            self.controller.set_content(Side::Right, INITIAL_RIGHT),
        ]
    }

    pub fn new_document(&mut self) -> [WriteOutcome; 2] {
        [
            self.controller.set_content(Side::Left, ""),
            self.controller.set_content(Side::Right, ""),
        ]
    }

    pub fn load_file(&mut self, side: Side, path: &Path) -> Result<WriteOutcome> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(self.controller.set_content(side, content))
    }

    pub fn swap(&mut self) -> [WriteOutcome; 2] {
        self.controller.swap()
    }

    pub fn toggle_read_only(&mut self, side: Side) -> bool {
        self.controller.toggle_read_only(side)
    }

    pub fn toggle_line_numbers(&mut self) -> bool {
        self.line_numbers = !self.line_numbers;
        let options = self.view_options();
        if let Some(widget) = self.controller.widget_mut() {
            widget.configure(&options);
        }
        self.controller.refresh_layout();
        self.line_numbers
    }

    pub fn set_language(&mut self, language: &str) -> Result<()> {
        if !is_supported_language(language) {
            bail!("Unsupported language: {}", language);
        }
        if self.language != language {
            self.language = language.to_string();
            self.remount();
        }
        Ok(())
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if self.theme != theme {
            self.theme = theme;
            self.remount();
        }
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.set_theme(self.theme.toggled());
        self.theme
    }

    pub fn stats(&self) -> BufferStats {
        let (left_lines, left_chars) = count(self.text(Side::Left));
        let (right_lines, right_chars) = count(self.text(Side::Right));
        BufferStats {
            left_lines,
            left_chars,
            right_lines,
            right_chars,
        }
    }

    /// Plain-text export of both panes
    pub fn export_text(&self) -> String {
        format!(
            "Original:\n{}\n\nModified:\n{}",
            self.text(Side::Left),
            self.text(Side::Right)
        )
    }

    /// Text placed on the clipboard by "copy diff"
    pub fn clipboard_text(&self) -> String {
        format!(
            "--- Original\n+++ Modified\n\n{}\n\n--- End Original ---\n\n{}",
            self.text(Side::Left),
            self.text(Side::Right)
        )
    }

    /// Write [`export_text`](Self::export_text) to `dir/text-comparison.txt`
    pub fn write_export(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(EXPORT_FILE_NAME);
        fs::write(&path, self.export_text())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}
