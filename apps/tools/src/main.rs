use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use home_api::form::validate;
use shared::domain::{ExerciseRecord, RecordId, UserId};
use storage::{RecordStore, Storage};

#[derive(Parser, Debug)]
#[command(about = "Inspect and edit liftbot exercise records")]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/liftbot.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List records, optionally filtered. `--owner` with `--name` shows the latest match.
    List {
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with_all = ["owner", "name"])]
        equipment: Option<String>,
    },
    Add {
        owner: String,
        name: String,
        #[arg(long, default_value = "")]
        equipment: String,
        #[arg(long, default_value = "")]
        sets: String,
        #[arg(long, default_value = "")]
        reps: String,
        #[arg(long)]
        weight: String,
    },
    Delete {
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::List {
            owner,
            name,
            equipment,
        } => {
            let records = match (owner, name, equipment) {
                (Some(owner), Some(name), _) => storage
                    .find_by_owner_and_name(&UserId::new(owner), &name)
                    .await?
                    .into_iter()
                    .collect(),
                (Some(owner), None, _) => storage.find_all_by_owner(&UserId::new(owner)).await?,
                (None, Some(name), _) => storage.find_all_by_name(&name).await?,
                (None, None, Some(equipment)) => storage.find_all_by_equipment(&equipment).await?,
                (None, None, None) => storage.find_all().await?,
            };
            for record in &records {
                print_record(record);
            }
            println!("{} record(s)", records.len());
        }
        Command::Add {
            owner,
            name,
            equipment,
            sets,
            reps,
            weight,
        } => {
            let record =
                ExerciseRecord::new(UserId::new(owner), name, equipment, sets, reps, weight);
            let errors = validate(&record);
            if let Some(error) = errors.iter().next() {
                bail!("{}: {}", error.field.label(), error.message);
            }
            let saved = storage.save(record).await?;
            print_record(&saved);
        }
        Command::Delete { id } => {
            let id = RecordId(id);
            if storage.find_by_id(id).await?.is_none() {
                bail!("no record with id={id}");
            }
            storage.delete_by_id(id).await?;
            println!("deleted record_id={id}");
        }
    }

    Ok(())
}

fn print_record(record: &ExerciseRecord) {
    let id = record
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{id}\t{}\t{}\t{}",
        record.owner_id,
        record.name,
        record.summary_line()
    );
}
