use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use catalog::{Catalog, Level, SearchForm, SubmitError};
use clap::{Parser, Subcommand};
use client_core::{load_settings, AppContext, NotesClient};
use shared::domain::NoteId;
use tracing_subscriber::EnvFilter;

mod selection;

use selection::SelectionArgs;

#[derive(Parser, Debug)]
#[command(name = "orinotes", about = "Browse and manage OriNotes study notes")]
struct Args {
    /// Settings file; missing files fall back to defaults.
    #[arg(long, default_value = client_core::config::DEFAULT_SETTINGS_FILE)]
    config: PathBuf,
    /// Lookup tables to use instead of the bundled ones.
    #[arg(long)]
    catalog: Option<PathBuf>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the choices for one level given the levels above it.
    Options {
        #[arg(long)]
        level: Level,
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Search notes for a complete selection.
    Search {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Show a note and how much of it is readable without buying it.
    Note {
        #[arg(long)]
        id: i64,
    },
    /// Add or remove a note from the favourites.
    Favourite {
        #[arg(long)]
        id: i64,
    },
    /// Rate a note from 1 to 5 stars.
    Rate {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        stars: u8,
    },
    /// Print the unread notification count.
    Unread,
}

fn load_catalog(path: Option<&PathBuf>) -> Result<Arc<Catalog>> {
    let catalog = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read catalog '{}'", path.display()))?;
            Catalog::from_json_str(&raw)?
        }
        None => Catalog::bundled()?,
    };
    Ok(Arc::new(catalog))
}

async fn sign_in(client: &NotesClient, args: &Args) -> Result<()> {
    let (Some(email), Some(password)) = (&args.email, &args.password) else {
        bail!("this command needs --email and --password");
    };
    let session = client.login(email, password).await?;
    tracing::info!(user_id = session.user.user_id.0, "signed in");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();
    let args = Args::parse();

    let settings = load_settings(&args.config)?;
    let catalog = load_catalog(args.catalog.as_ref())?;
    let client = NotesClient::new(settings, AppContext::new())?;

    match &args.command {
        Command::Options { level, selection } => {
            let mut form = SearchForm::new(catalog);
            selection.apply(form.selector_mut());
            let options = form.selector().options(*level);
            if options.is_empty() {
                println!("No {level} options; choose the levels above it first.");
            }
            for option in options {
                println!("{option}");
            }
        }
        Command::Search { selection } => {
            if args.email.is_some() {
                sign_in(&client, &args).await?;
            }
            let mut form = SearchForm::new(catalog);
            selection.apply(form.selector_mut());
            let client = &client;
            match form
                .submit(|query| async move { client.search_notes(&query).await })
                .await
            {
                Ok(notes) => println!("{}", serde_json::to_string_pretty(&notes)?),
                Err(SubmitError::Incomplete(err)) => {
                    let message = form
                        .validation_message()
                        .map(str::to_string)
                        .unwrap_or_else(|| err.to_string());
                    bail!(message);
                }
                Err(SubmitError::Search(err)) => return Err(err.into()),
            }
        }
        Command::Note { id } => {
            if args.email.is_some() {
                sign_in(&client, &args).await?;
            }
            let detail = client.note_detail(NoteId(*id)).await?;
            let gate = client.paywall_for(&detail);
            println!("{}", serde_json::to_string_pretty(&detail)?);
            if gate.is_fully_unlocked() {
                println!("All {} pages readable.", gate.page_count());
            } else {
                println!(
                    "Preview: pages 1-{} of {}; buy the note to read the remaining {}.",
                    gate.visible_pages(),
                    gate.page_count(),
                    gate.locked_pages()
                );
            }
        }
        Command::Favourite { id } => {
            sign_in(&client, &args).await?;
            let note_id = NoteId(*id);
            client.note_detail(note_id).await?;
            let favourite = client.toggle_favourite(note_id).await?;
            println!(
                "Note {note_id} {} favourites.",
                if favourite { "added to" } else { "removed from" }
            );
        }
        Command::Rate { id, stars } => {
            sign_in(&client, &args).await?;
            let summary = client.rate_note(NoteId(*id), *stars).await?;
            println!(
                "Average rating {:.1} from {} ratings.",
                summary.average_rating, summary.rating_count
            );
        }
        Command::Unread => {
            sign_in(&client, &args).await?;
            println!("{}", client.refresh_unread_count().await?);
        }
    }

    Ok(())
}
