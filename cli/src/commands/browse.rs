//! BROWSE command - Interactive notes list.
//!
//! Plain text typed at the prompt goes to the search box and applies once
//! typing pauses. Lines starting with `:` are commands, see [`HELP`].

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use notehub_client::pagination::PageControls;
use notehub_client::query::CacheJanitor;
use notehub_client::view::ViewEvent;
use notehub_client::{HttpNotesApi, NotesView, SubmitOutcome, Toast, ToastKind, Toaster};
use notehub_core::NoteTag;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use super::{Context, output};

const HELP: &str = "\
  <text>      search titles and content
  :clear      clear the search
  :page N     go to page N
  :next       next page
  :prev       previous page
  :new        create a note
  :help       show this help
  :quit       exit";

/// Arguments for the browse command.
#[derive(Args)]
pub struct BrowseArgs {
    /// Start filtered by this tag
    #[arg(short, long)]
    pub tag: Option<NoteTag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Search(String),
    Page(u32),
    Next,
    Prev,
    New,
    Help,
    Redraw,
    Quit,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let Some(command) = line.strip_prefix(':') else {
        return if line.is_empty() {
            Input::Redraw
        } else {
            Input::Search(line.to_string())
        };
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("clear"), None) => Input::Search(String::new()),
        (Some("page"), Some(n)) => match n.parse() {
            Ok(page) if page > 0 => Input::Page(page),
            _ => Input::Unknown(line.to_string()),
        },
        (Some("next" | "n"), None) => Input::Next,
        (Some("prev" | "p"), None) => Input::Prev,
        (Some("new"), None) => Input::New,
        (Some("help" | "h"), None) => Input::Help,
        (Some("quit" | "q"), None) => Input::Quit,
        _ => Input::Unknown(line.to_string()),
    }
}

enum Wake {
    Line(Option<String>),
    View(ViewEvent),
    Toast(Option<Toast>),
}

type InputLines = Lines<BufReader<Stdin>>;

/// Execute the browse command.
pub async fn execute(ctx: &Context, human: bool, args: BrowseArgs) -> Result<()> {
    let queries = ctx.queries();
    let mut janitor = CacheJanitor::new(queries.client().clone());
    let _sweeper = janitor.start();

    let toaster = Toaster::new();
    let mut toasts = toaster.subscribe();
    let mut view = NotesView::new(queries, args.tag, toaster, ctx.config.search_debounce);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if human {
        println!("{}", HELP.dimmed());
    }
    output(&view.settle().await, human)?;

    loop {
        let wake = tokio::select! {
            line = lines.next_line() => Wake::Line(line?),
            event = view.next_event() => Wake::View(event),
            toast = toasts.recv() => Wake::Toast(toast.ok()),
        };

        match wake {
            Wake::Line(None) => break,
            Wake::Line(Some(line)) => match parse_input(&line) {
                Input::Quit => break,
                Input::Search(text) => view.type_search(text),
                Input::Page(page) => view.set_page(page),
                Input::Next => step_page(&mut view, PageControls::next),
                Input::Prev => step_page(&mut view, PageControls::prev),
                Input::New => {
                    if let Some(outcome) = fill_form(&mut view, &mut lines).await? {
                        report_outcome(&outcome);
                    }
                    output(&view.render(), human)?;
                }
                Input::Help => println!("{}", HELP),
                Input::Redraw => output(&view.render(), human)?,
                Input::Unknown(text) => eprintln!("{} {}", "Unknown command:".yellow(), text),
            },
            Wake::View(ViewEvent::Closed) => break,
            Wake::View(ViewEvent::SearchApplied(_) | ViewEvent::ListChanged) => {
                output(&view.render(), human)?;
            }
            Wake::Toast(Some(toast)) => print_toast(&toast),
            Wake::Toast(None) => {}
        }
    }

    janitor.shutdown();
    Ok(())
}

/// Prompts for the form fields and submits. Returns `None` when input ends.
async fn fill_form(
    view: &mut NotesView<HttpNotesApi>,
    lines: &mut InputLines,
) -> Result<Option<SubmitOutcome>> {
    view.open_form();

    loop {
        let Some(title) = prompt(lines, "Title").await? else {
            view.close_form();
            return Ok(None);
        };
        let Some(content) = prompt(lines, "Content").await? else {
            view.close_form();
            return Ok(None);
        };
        let Some(tag) = prompt(lines, "Tag").await? else {
            view.close_form();
            return Ok(None);
        };

        if let Some(form) = view.form_mut() {
            form.set_title(title);
            form.set_content(content);
            if !tag.trim().is_empty() {
                form.set_tag(tag.trim());
            }
        }

        match view.submit_form().await {
            Some(SubmitOutcome::Invalid(errors)) => {
                for (field, message) in errors.iter() {
                    eprintln!("  {} {}", format!("{}:", field).red(), message.red());
                }
                let Some(answer) = prompt(lines, "Try again? [Y/n]").await? else {
                    view.close_form();
                    return Ok(None);
                };
                if answer.trim().eq_ignore_ascii_case("n") {
                    view.close_form();
                    return Ok(None);
                }
            }
            other => return Ok(other),
        }
    }
}

async fn prompt(lines: &mut InputLines, label: &str) -> Result<Option<String>> {
    eprint!("{}> ", label.cyan());
    Ok(lines.next_line().await?)
}

fn report_outcome(outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Created(note) => tracing::debug!(id = %note.id, "note created"),
        SubmitOutcome::Failed(error) => tracing::debug!(error = %error, "note creation failed"),
        SubmitOutcome::Invalid(_) | SubmitOutcome::Ignored => {}
    }
}

fn print_toast(toast: &Toast) {
    match toast.kind {
        ToastKind::Success => eprintln!("{}", toast.message.green().bold()),
        ToastKind::Error => eprintln!("{}", toast.message.red().bold()),
    }
}

fn step_page(view: &mut NotesView<HttpNotesApi>, step: fn(&PageControls) -> Option<u32>) {
    match view.render().pagination.as_ref().and_then(step) {
        Some(page) => view.set_page(page),
        None => eprintln!("{}", "No such page".yellow()),
    }
}
