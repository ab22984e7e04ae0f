//! SHOW command - A single note.

use anyhow::{Result, bail};
use clap::Args;
use notehub_client::NoteDetailsView;
use notehub_core::NoteId;

use super::{Context, output};

/// Arguments for the show command.
#[derive(Args)]
pub struct ShowArgs {
    /// Note ID
    pub id: NoteId,
}

/// Execute the show command.
pub async fn execute(ctx: &Context, human: bool, args: ShowArgs) -> Result<()> {
    let queries = ctx.queries();
    let mut view = NoteDetailsView::new(&queries, &args.id);
    let screen = view.settle().await;

    if let Some(error) = screen.error {
        bail!(error);
    }
    match &screen.note {
        Some(note) => output(note, human),
        None => bail!("Note {} not found", args.id),
    }
}
