//! OPEN command - Render a route, prefetching what it shows first.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use notehub_client::query::QueryConfig;
use notehub_client::{NoteDetailsView, NotesView, QueryClient, Route, Toaster, prefetch_route};

use super::{Context, output};

/// Arguments for the open command.
#[derive(Args)]
pub struct OpenArgs {
    /// Route path: /notes/{id} or /notes/filter/{tag}, where tag may be All
    pub path: String,

    /// Print the prefetched cache state instead of the rendered page
    #[arg(long)]
    pub dehydrate: bool,
}

/// Execute the open command.
pub async fn execute(ctx: &Context, human: bool, args: OpenArgs) -> Result<()> {
    let route = Route::parse(&args.path)?;
    let state = prefetch_route(&route, Arc::clone(&ctx.api), ctx.config.per_page).await;

    if args.dehydrate {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    let client = QueryClient::with_config(QueryConfig::from(&ctx.config));
    let hydrated = client.hydrate(state);
    tracing::debug!(route = %route, hydrated, "hydrated prefetched state");
    let queries = ctx.queries_with(client);

    match route {
        Route::NoteDetails(id) => {
            let mut view = NoteDetailsView::new(&queries, &id);
            output(&view.settle().await, human)
        }
        Route::FilteredNotes { tag } => {
            let mut view = NotesView::new(queries, tag, Toaster::new(), ctx.config.search_debounce);
            output(&view.settle().await, human)
        }
    }
}
