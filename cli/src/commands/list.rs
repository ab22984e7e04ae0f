//! LIST command - One page of notes.

use anyhow::{Result, anyhow};
use clap::Args;
use colored::Colorize;
use notehub_client::pagination::{PageControls, page_controls};
use notehub_client::view::EMPTY_LIST_MESSAGE;
use notehub_core::{Note, NoteTag};
use serde::Serialize;

use super::{Context, HumanReadable, output, print_note_line, print_pagination};

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Page number, starting at 1
    #[arg(short, long, default_value_t = 1)]
    pub page: u32,

    /// Case-insensitive text to look for in titles and content
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Only notes with this tag (Work, Personal, Meeting, Shopping, Todo)
    #[arg(short, long)]
    pub tag: Option<NoteTag>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub page: u32,
    pub total_pages: u32,
    pub notes: Vec<Note>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageControls>,
}

impl HumanReadable for ListResponse {
    fn print_human(&self) {
        println!("{}", "Notes".green().bold());
        println!("{}", "=".repeat(80));
        println!();

        if self.notes.is_empty() {
            println!("  {}", EMPTY_LIST_MESSAGE.dimmed());
            return;
        }

        for note in &self.notes {
            print_note_line(note);
        }

        if let Some(controls) = &self.pagination {
            println!();
            print_pagination(controls);
        }
    }
}

/// Execute the list command.
pub async fn execute(ctx: &Context, human: bool, args: ListArgs) -> Result<()> {
    let queries = ctx.queries();
    let params = queries.list_params(&args.search, args.page, args.tag);

    let page = queries
        .fetch_list(&params)
        .await
        .map_err(|e| anyhow!("Could not fetch the list of notes. {}", e.user_message()))?;

    let response = ListResponse {
        page: params.page,
        total_pages: page.total_pages,
        notes: page.notes.clone(),
        pagination: page_controls(params.page, page.total_pages),
    };

    output(&response, human)
}
