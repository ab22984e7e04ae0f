//! CREATE command - Create a note through the form.

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use notehub_client::{NoteForm, SubmitOutcome, ToastKind, Toaster};
use notehub_core::NoteTag;

use super::{Context, output};

/// Arguments for the create command.
#[derive(Args)]
pub struct CreateArgs {
    /// Title, 3 to 50 characters
    #[arg(long)]
    pub title: String,

    /// Body text, up to 500 characters
    #[arg(long, default_value = "")]
    pub content: String,

    /// One of Work, Personal, Meeting, Shopping, Todo
    #[arg(long, default_value_t = NoteTag::default().to_string())]
    pub tag: String,
}

/// Execute the create command.
pub async fn execute(ctx: &Context, human: bool, args: CreateArgs) -> Result<()> {
    let queries = ctx.queries();
    let toaster = Toaster::new();

    let mut form = NoteForm::new(NoteTag::default());
    form.set_title(args.title);
    form.set_content(args.content);
    form.set_tag(args.tag);

    match form.submit(&queries, &toaster).await {
        SubmitOutcome::Created(note) => {
            if human {
                for toast in toaster.recent() {
                    if toast.kind == ToastKind::Success {
                        println!("{}", toast.message.green().bold());
                        println!();
                    }
                }
            }
            output(&note, human)
        }
        SubmitOutcome::Invalid(errors) => bail!("{}", errors),
        SubmitOutcome::Failed(error) => bail!(error.user_message()),
        SubmitOutcome::Ignored => bail!("the form is not accepting input"),
    }
}
