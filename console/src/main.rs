//! Record console entry-point: lists, creates, updates, and deletes records
//! in a remote collection from the command line.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use console::config::ConsoleSettings;
use console::domain::controller::{
    ConsoleState, DeleteOutcome, DialogMode, InteractionController, SubmitOutcome, UserAction,
};
use console::domain::ports::RecordCollection;
use console::domain::{FetchStatus, RecordDraft, RecordId};
use console::outbound::http::HttpRecordCollection;
use console::outbound::memory::InMemoryRecordCollection;
use pagination::SortOrder;

/// `console` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "console",
    about = "Browse and edit records in a remote collection",
    version
)]
struct CliArgs {
    /// Use an empty in-process collection instead of `CONSOLE_BASE_URL`.
    #[arg(long)]
    in_memory: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print one page of records as JSON.
    List(ListArgs),
    /// Create a record.
    Create(DraftArgs),
    /// Replace the editable fields of a record.
    Update {
        /// Record identifier.
        #[arg(long)]
        id: String,
        #[command(flatten)]
        draft: DraftArgs,
    },
    /// Delete a record.
    Delete {
        /// Record identifier.
        #[arg(long)]
        id: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Zero-based page index.
    #[arg(long, default_value_t = 0)]
    page: u32,
    /// Rows per page. Falls back to `CONSOLE_PAGE_SIZE`.
    #[arg(long)]
    size: Option<u32>,
    /// Column filter; repeat for several columns.
    #[arg(long = "filter", value_name = "field=value", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
    /// Free-text filter across name and email.
    #[arg(long = "global", value_name = "text")]
    global_filter: Option<String>,
    /// Sort pair; repeat for secondary sorts.
    #[arg(long = "sort", value_name = "field,asc|desc")]
    sort: Vec<SortOrder>,
}

#[derive(Debug, Args)]
struct DraftArgs {
    /// Full name.
    #[arg(long)]
    full_name: String,
    /// Email address.
    #[arg(long)]
    email: String,
    /// Password.
    #[arg(long)]
    password: String,
}

impl From<DraftArgs> for RecordDraft {
    fn from(args: DraftArgs) -> Self {
        Self::new(args.full_name, args.email, args.password)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let settings = ConsoleSettings::load_from_iter([OsString::from("console")])
        .wrap_err("failed to load console settings")?;
    let collection_name = settings.collection()?.to_owned();
    let page_size = settings.page_size()?;
    let port: Arc<dyn RecordCollection> = if args.in_memory {
        Arc::new(InMemoryRecordCollection::default())
    } else {
        Arc::new(
            HttpRecordCollection::new(
                settings.base_url()?,
                collection_name.as_str(),
                settings.request_timeout()?,
            )
            .wrap_err("failed to build HTTP client")?,
        )
    };

    match args.command {
        Command::List(list) => run_list(port, collection_name, page_size, list).await,
        Command::Create(draft) => {
            let mut state = ConsoleState::new(page_size)?;
            state.apply(UserAction::OpenCreate);
            state.dialog.draft = draft.into();
            run_submit(InteractionController::with_state(port, collection_name, state)).await
        }
        Command::Update { id, draft } => {
            let mut state = ConsoleState::new(page_size)?;
            state.dialog.mode = DialogMode::Editing(RecordId::new(id)?);
            state.dialog.draft = draft.into();
            run_submit(InteractionController::with_state(port, collection_name, state)).await
        }
        Command::Delete { id, yes } => {
            let id = RecordId::new(id)?;
            let mut controller = InteractionController::new(port, collection_name, page_size)?;
            match controller.delete(&id, &|_: &RecordId| yes).await {
                DeleteOutcome::Deleted => print_json(&serde_json::json!({ "deleted": id })),
                DeleteOutcome::Declined => Err(eyre!("refusing to delete {id} without --yes")),
                DeleteOutcome::Rejected(error) => Err(eyre!(error.reason())),
            }
        }
    }
}

async fn run_list(
    port: Arc<dyn RecordCollection>,
    collection_name: String,
    page_size: u32,
    list: ListArgs,
) -> Result<()> {
    let mut state = ConsoleState::new(list.size.unwrap_or(page_size))?;
    for (field, value) in list.filters {
        state.apply(UserAction::SetFilter { field, value });
    }
    state.apply(UserAction::SetGlobalFilter(list.global_filter));
    state.apply(UserAction::SetSort(list.sort));
    state.apply(UserAction::SetPage(list.page));

    let controller = InteractionController::with_state(port, collection_name, state);
    let view = controller.refresh().await;
    if let FetchStatus::Error { message } = view.status {
        return Err(eyre!(message));
    }
    print_json(&view.data)
}

async fn run_submit(mut controller: InteractionController) -> Result<()> {
    match controller.submit().await {
        SubmitOutcome::Saved(record) => print_json(&record),
        SubmitOutcome::Invalid(errors) => Err(eyre!(
            "validation failed: {}",
            serde_json::to_string(&errors)?
        )),
        SubmitOutcome::Rejected(error) => Err(eyre!(error.reason())),
        SubmitOutcome::Ignored => Err(eyre!("nothing to submit")),
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("filter must be field=value, got {raw}"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err("filter field must not be blank".to_owned());
    }
    Ok((field.to_owned(), value.to_owned()))
}
