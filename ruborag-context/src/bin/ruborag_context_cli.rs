use clap::{Parser, Subcommand};
use ruborag_context::{Chunking, DEFAULT_CHUNK_SIZE, normalize_html};
use std::fs;
use std::io::{self, Read};
use std::process;

/// A CLI tool to inspect how ruborag normalizes and chunks a document.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a text document into chunks and print them as JSON
    Chunk {
        /// Path to the input text file. If not provided, reads from stdin.
        #[arg(short, long)]
        input: Option<String>,

        /// Source identifier recorded on each chunk.
        #[arg(short, long, default_value = "stdin")]
        source: String,

        /// Maximum length for each chunk, in characters.
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        size: usize,
    },
    /// Strip markup from an HTML document and print the plain text
    Normalize {
        /// Path to the input HTML file. If not provided, reads from stdin.
        #[arg(short, long)]
        input: Option<String>,
    },
}

fn read_input(input: Option<String>) -> io::Result<String> {
    if let Some(input_path) = input {
        fs::read_to_string(input_path)
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Commands::Chunk {
            input,
            source,
            size,
        } => {
            let content = read_input(input)?;
            let chunks = Chunking::Enabled { size }.split(&source, &content)?;
            println!("{}", serde_json::to_string_pretty(&chunks)?);
        }
        Commands::Normalize { input } => {
            let content = read_input(input)?;
            println!("{}", normalize_html(&content));
        }
    }

    Ok(())
}
