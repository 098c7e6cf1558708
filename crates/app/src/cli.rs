use std::{collections::HashSet, error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use engine::{Classification, Engine, NewBudget};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::settings::Settings;

type CliResult = Result<(), Box<dyn Error + Send + Sync>>;

#[derive(Debug, Parser)]
#[command(name = "budgetmapper", version)]
pub struct Args {
    /// Optional settings file path (TOML).
    #[arg(long)]
    pub config: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create governments, classifications, budgets and items.
    #[command(subcommand)]
    Add(AddCommand),
    /// Store, read and delete chunked blobs.
    #[command(subcommand)]
    Blob(BlobCommand),
    /// Print the classification tree of a system.
    Tree { system_id: Uuid },
    /// Resolve the value of a classification within a budget.
    Value {
        budget_id: Uuid,
        classification_id: Uuid,
    },
}

#[derive(Debug, Subcommand)]
pub enum AddCommand {
    Government {
        name: String,
    },
    System {
        name: String,
    },
    Classification {
        system_id: Uuid,
        name: String,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        parent: Option<Uuid>,
    },
    Budget {
        government_id: Uuid,
        system_id: Uuid,
        name: String,
        year: i32,
        #[arg(long, default_value = "")]
        subtitle: String,
    },
    /// Item holding a literal amount.
    Atomic {
        budget_id: Uuid,
        classification_id: Uuid,
        amount: f64,
    },
    /// Item summing classifications of another budget.
    Mapped {
        budget_id: Uuid,
        classification_id: Uuid,
        mapped_budget_id: Uuid,
        #[arg(required = true, num_args = 1..)]
        mapped_classification_ids: Vec<Uuid>,
    },
}

#[derive(Debug, Subcommand)]
pub enum BlobCommand {
    /// Store a file as a new blob and print its id.
    Put {
        path: PathBuf,
        /// Blob name, defaults to the file name.
        #[arg(long)]
        name: Option<String>,
        /// Override the configured chunk size (bytes).
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    /// Write the content of a blob to stdout.
    Cat { blob_id: Uuid },
    /// Print name, chunk count and size of a blob.
    Info { blob_id: Uuid },
    /// Delete a blob.
    Rm { blob_id: Uuid },
}

pub async fn run(engine: &Engine, settings: &Settings, command: Command) -> CliResult {
    match command {
        Command::Add(command) => add(engine, command).await,
        Command::Blob(command) => blob(engine, settings, command).await,
        Command::Tree { system_id } => tree(engine, system_id).await,
        Command::Value {
            budget_id,
            classification_id,
        } => {
            let value = engine.value_of(budget_id, classification_id).await?;
            println!("{value}");
            Ok(())
        }
    }
}

/// Every creation prints the id of the new record.
async fn add(engine: &Engine, command: AddCommand) -> CliResult {
    let id = match command {
        AddCommand::Government { name } => engine.new_government(&name).await?,
        AddCommand::System { name } => engine.new_classification_system(&name).await?,
        AddCommand::Classification {
            system_id,
            name,
            code,
            parent,
        } => {
            engine
                .new_classification(system_id, &name, code.as_deref(), parent)
                .await?
        }
        AddCommand::Budget {
            government_id,
            system_id,
            name,
            year,
            subtitle,
        } => {
            engine
                .new_budget(NewBudget {
                    name: &name,
                    year,
                    subtitle: &subtitle,
                    classification_system_id: system_id,
                    government_id,
                })
                .await?
        }
        AddCommand::Atomic {
            budget_id,
            classification_id,
            amount,
        } => {
            engine
                .new_atomic_item(budget_id, classification_id, amount)
                .await?
        }
        AddCommand::Mapped {
            budget_id,
            classification_id,
            mapped_budget_id,
            mapped_classification_ids,
        } => {
            engine
                .new_mapped_item(
                    budget_id,
                    classification_id,
                    mapped_budget_id,
                    &mapped_classification_ids,
                )
                .await?
        }
    };
    println!("{id}");
    Ok(())
}

async fn blob(engine: &Engine, settings: &Settings, command: BlobCommand) -> CliResult {
    match command {
        BlobCommand::Put {
            path,
            name,
            chunk_size,
        } => {
            let file = tokio::fs::File::open(&path).await?;
            let name = name.or_else(|| {
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            });
            let chunk_size = chunk_size.unwrap_or(settings.blobs.chunk_size);
            let blob_id = engine.write_blob(file, name.as_deref(), chunk_size).await?;
            println!("{blob_id}");
        }
        BlobCommand::Cat { blob_id } => {
            let mut reader = engine.blob_reader(blob_id).await?;
            let mut stdout = tokio::io::stdout();
            let mut written = 0usize;
            loop {
                let bytes = reader.read(Some(settings.blobs.chunk_size)).await?;
                if bytes.is_empty() {
                    break;
                }
                stdout.write_all(&bytes).await?;
                written += bytes.len();
            }
            stdout.flush().await?;
            tracing::debug!(blob = %reader.blob_id(), bytes = written, "blob streamed");
        }
        BlobCommand::Info { blob_id } => {
            let blob = engine.blob(blob_id).await?;
            println!(
                "{}\t{}\t{} chunks\t{} bytes\t{}",
                blob.id,
                blob.name.as_deref().unwrap_or("-"),
                blob.chunk_count,
                blob.size,
                blob.created_at.to_rfc3339()
            );
        }
        BlobCommand::Rm { blob_id } => {
            engine.delete_blob(blob_id).await?;
            tracing::info!(blob = %blob_id, "blob deleted");
        }
    }
    Ok(())
}

/// Depth-first dump of a classification system, one node per line,
/// indented by level. Leaves are marked with `*`.
async fn tree(engine: &Engine, system_id: Uuid) -> CliResult {
    let system = engine.classification_system(system_id).await?;
    let leaves: HashSet<Uuid> = engine
        .leaves(system_id)
        .await?
        .into_iter()
        .map(|leaf| leaf.id)
        .collect();
    println!("{}", system.name);

    let mut stack: Vec<Classification> = engine.roots(system_id).await?;
    stack.reverse();
    while let Some(node) = stack.pop() {
        let level = engine.classification_level(node.id).await?;
        let marker = if leaves.contains(&node.id) { "*" } else { "" };
        match &node.code {
            Some(code) => println!("{}{code} {}{marker}", "  ".repeat(level as usize + 1), node.name),
            None => println!("{}{}{marker}", "  ".repeat(level as usize + 1), node.name),
        }

        let mut children = engine.children(node.id).await?;
        children.reverse();
        stack.extend(children);
    }
    Ok(())
}
