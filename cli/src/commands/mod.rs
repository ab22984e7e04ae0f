//! CLI command implementations.

pub mod browse;
pub mod create;
pub mod list;
pub mod open;
pub mod show;

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use notehub_client::form::NoteFormScreen;
use notehub_client::pagination::{PageControls, PageItem};
use notehub_client::query::QueryConfig;
use notehub_client::view::{NoteDetailsScreen, NotesScreen};
use notehub_client::{ClientConfig, HttpNotesApi, NotesQueries, QueryClient};
use notehub_core::Note;
use serde::Serialize;

/// Shared state of a CLI invocation.
pub struct Context {
    pub config: ClientConfig,
    pub api: Arc<HttpNotesApi>,
}

impl Context {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api = Arc::new(HttpNotesApi::from_config(&config)?);
        Ok(Self { config, api })
    }

    /// Queries over a fresh cache.
    pub fn queries(&self) -> NotesQueries<HttpNotesApi> {
        self.queries_with(QueryClient::with_config(QueryConfig::from(&self.config)))
    }

    /// Queries over an existing cache.
    pub fn queries_with(&self, client: QueryClient) -> NotesQueries<HttpNotesApi> {
        NotesQueries::new(Arc::clone(&self.api), client).with_per_page(self.config.per_page)
    }
}

/// Output a response in the appropriate format.
pub fn output<T: Serialize + HumanReadable>(value: &T, human: bool) -> Result<()> {
    if human {
        value.print_human();
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

/// Trait for types that can be printed in human-readable format.
pub trait HumanReadable {
    fn print_human(&self);
}

impl HumanReadable for Note {
    fn print_human(&self) {
        println!("{}", self.title.green().bold());
        println!("{}", "=".repeat(80));
        println!();
        println!("  {} {}", "ID:".cyan(), self.id);
        println!("  {} {}", "Tag:".cyan(), self.tag);
        println!("  {} {}", "Created:".cyan(), format_timestamp(&self.created_at));
        if self.updated_at != self.created_at {
            println!("  {} {}", "Updated:".cyan(), format_timestamp(&self.updated_at));
        }
        println!();
        if self.content.is_empty() {
            println!("  {}", "(no content)".dimmed());
        } else {
            for line in self.content.lines() {
                println!("  {}", line);
            }
        }
    }
}

impl HumanReadable for NotesScreen {
    fn print_human(&self) {
        let heading = match self.tag {
            Some(tag) => format!("Notes: {}", tag),
            None => "Notes: All".to_string(),
        };
        println!("{}", heading.green().bold());
        println!("{}", "=".repeat(80));

        if !self.search_input.is_empty() {
            println!("  {} {}", "Search:".cyan(), self.search_input);
        }
        println!();

        if self.is_loading {
            println!("  {}", "Loading...".dimmed());
        }
        if let Some(error) = &self.error {
            println!("  {}", error.red());
        }
        if let Some(message) = self.empty_message {
            println!("  {}", message.dimmed());
        }

        for note in &self.notes {
            print_note_line(note);
        }
        if self.is_placeholder {
            println!("  {}", "(showing previous results)".dimmed());
        }

        if let Some(controls) = &self.pagination {
            println!();
            print_pagination(controls);
        }

        if let Some(form) = &self.form {
            println!();
            print_form(form);
        }
    }
}

impl HumanReadable for NoteDetailsScreen {
    fn print_human(&self) {
        if self.is_loading {
            println!("{}", "Loading, please wait...".dimmed());
        }
        if let Some(error) = &self.error {
            println!("{}", error.red());
        }
        if let Some(note) = &self.note {
            note.print_human();
        }
    }
}

/// One line of a notes listing.
pub fn print_note_line(note: &Note) {
    println!(
        "  {} {} {}",
        format!("[{}]", note.tag).yellow(),
        note.title.bold(),
        note.id.to_string().dimmed()
    );
    if !note.content.is_empty() {
        println!("      {}", truncate(&note.content, 70).dimmed());
    }
}

pub fn print_pagination(controls: &PageControls) {
    let parts: Vec<String> = controls
        .items
        .iter()
        .map(|item| match *item {
            PageItem::Previous { enabled: true } => "<".to_string(),
            PageItem::Previous { enabled: false } => "<".dimmed().to_string(),
            PageItem::Page { number, current: true } => format!("[{}]", number).bold().to_string(),
            PageItem::Page { number, current: false } => number.to_string(),
            PageItem::Break => "...".to_string(),
            PageItem::Next { enabled: true } => ">".to_string(),
            PageItem::Next { enabled: false } => ">".dimmed().to_string(),
        })
        .collect();
    println!(
        "  {}  {}",
        parts.join(" "),
        format!("(page {} of {})", controls.current, controls.total).dimmed()
    );
}

fn print_form(form: &NoteFormScreen) {
    println!("{}", "New note".yellow());
    println!("{}", "-".repeat(80));
    println!("  {} {}", "Title:".cyan(), form.values.title);
    println!("  {} {}", "Content:".cyan(), truncate(&form.values.content, 60));
    println!("  {} {}", "Tag:".cyan(), form.values.tag);
    for (field, message) in form.errors.iter() {
        println!("  {} {}", format!("{}:", field).red(), message.red());
    }
    if form.is_submitting {
        println!("  {}", "Creating...".dimmed());
    }
}

/// Format a timestamp for display.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Truncate a string to a maximum number of characters, on one line.
pub fn truncate(s: &str, max_chars: usize) -> String {
    let flat = s.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let kept: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
