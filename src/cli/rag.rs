//! `index` and `ask`: the retrieval side of the server.

use anyhow::Result;

use crate::cli::args::{AskCliArgs, IndexCliArgs};
use crate::config::Config;
use crate::workspace::Workspace;

pub async fn handle_index_command(args: IndexCliArgs, config: Config) -> Result<()> {
    let workspace = Workspace::from_config(config)?;

    if args.all {
        workspace.index_all().await?;
        println!("Indexed all sessions");
        return Ok(());
    }

    if let Some(session_id) = args.session_id.as_deref() {
        workspace.index_by_id(session_id).await?;
        println!("Indexed {}", session_id);
    }

    Ok(())
}

pub async fn handle_ask_command(args: AskCliArgs, config: Config) -> Result<()> {
    let top_k = args.top_k.unwrap_or(config.rag.top_k);
    let mut workspace = Workspace::from_config(config)?;

    workspace.ask_with(&args.question, top_k).await?;

    let rag = workspace.rag();
    if let Some(answer) = &rag.answer {
        println!("{}", answer);
    }

    if !rag.hits.is_empty() {
        println!("\nSources:");
        for hit in &rag.hits {
            println!(
                "  [{:.2}] {}",
                hit.score,
                hit.meta.session_id.as_deref().unwrap_or("unknown session")
            );
        }
    }

    Ok(())
}
