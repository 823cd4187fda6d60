use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use town_index::config::{DEFAULT_DATA_PATH, DEFAULT_SAVE_PATH};
use town_index::hash_index::DEFAULT_CAPACITY;
use town_index::logger::initialize_logger;
use town_index::shell::Shell;
use town_index::{Catalog, Config};

#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive town catalog", long_about = None)]
struct Args {
    /// Data file loaded at startup
    #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,

    /// File written by the save commands
    #[arg(short, long, default_value = DEFAULT_SAVE_PATH)]
    save: PathBuf,

    /// Hash table slot count
    #[arg(short, long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Start empty instead of seeding a missing data file
    #[arg(long)]
    no_bootstrap: bool,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            capacity: args.capacity,
            data_path: args.data,
            save_path: args.save,
            bootstrap: !args.no_bootstrap,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    initialize_logger();
    let config = Config::from(Args::parse());

    let (mut catalog, summary) = Catalog::open(&config)?;
    for skipped in &summary.skipped {
        eprintln!("skipped: {skipped}");
    }
    info!("{} towns ready", catalog.len());

    let stdin = io::stdin();
    let stdout = io::stdout();
    Shell::new(&mut catalog, stdin.lock(), stdout.lock()).run()?;
    Ok(())
}
