//! Command-line front end over a Jotter database file.
//!
//! # Responsibility
//! - Drive note use-cases from scripts and smoke checks.
//! - Keep output line-oriented and stable for `grep`/`awk`.

use clap::{Parser, Subcommand};
use jotter_core::db::open_db;
use jotter_core::{
    init_logging, CoreConfig, NewNote, Note, NoteColor, NoteService, SqliteNoteRepository,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "jotter", version, about = "Local note store")]
struct Cli {
    /// JSON config file; `--db` overrides its `db_path`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite database file.
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a note.
    Add {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        /// Hex color: `RRGGBB` (opaque) or `AARRGGBB`, optional `#`/`0x`.
        #[arg(long, conflicts_with = "palette")]
        color: Option<String>,
        /// Palette entry, `0` (default color) to `13`.
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..14))]
        palette: Option<u8>,
    },
    /// Replace title and/or content of a note.
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Print one note.
    Show { id: i64 },
    /// Print the default list (pinned first, newest first).
    List,
    /// Print archived notes.
    Archived,
    /// Case-insensitive search over title and content.
    Search { query: String },
    /// Toggle the pinned flag.
    Pin { id: i64 },
    /// Toggle the archived flag.
    Archive { id: i64 },
    /// Delete a note.
    Delete { id: i64 },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("jotter: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = match cli.config.as_ref() {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }

    let conn = open_db(&config.db_path)?;
    let mut service = NoteService::new(SqliteNoteRepository::new(&conn));

    match cli.command {
        Command::Add {
            title,
            content,
            color,
            palette,
        } => {
            let mut draft = NewNote::new(title, content);
            draft.color = match (color, palette) {
                (Some(hex), _) => Some(parse_hex_color(&hex)?),
                (None, Some(index)) => Some(palette_color(index)?),
                (None, None) => None,
            };
            print_note(&service.create_note(draft)?);
        }
        Command::Edit { id, title, content } => {
            let mut note = service
                .get_note(id)?
                .ok_or_else(|| format!("note not found: {id}"))?;
            if let Some(title) = title {
                note.title = title;
            }
            if let Some(content) = content {
                note.content = content;
            }
            print_note(&service.update_note(note)?);
        }
        Command::Show { id } => {
            let note = service
                .get_note(id)?
                .ok_or_else(|| format!("note not found: {id}"))?;
            print_note(&note);
            if !note.content.is_empty() {
                println!("{}", note.content);
            }
        }
        Command::List => service.list_notes()?.iter().for_each(print_note),
        Command::Archived => service.list_archived()?.iter().for_each(print_note),
        Command::Search { query } => service.search_notes(&query)?.iter().for_each(print_note),
        Command::Pin { id } => print_note(&service.toggle_pin(id)?),
        Command::Archive { id } => print_note(&service.toggle_archive(id)?),
        Command::Delete { id } => {
            let note = service.delete_note(id)?;
            println!("deleted {}", note.id);
        }
    }
    Ok(())
}

fn parse_hex_color(raw: &str) -> Result<NoteColor, String> {
    let hex = raw.trim_start_matches('#').trim_start_matches("0x");
    let value = u32::from_str_radix(hex, 16).map_err(|_| format!("invalid color `{raw}`"))?;
    match hex.len() {
        6 => Ok(NoteColor(0xFF00_0000 | value)),
        8 => Ok(NoteColor(value)),
        _ => Err(format!("invalid color `{raw}`: expected RRGGBB or AARRGGBB")),
    }
}

fn palette_color(index: u8) -> Result<NoteColor, String> {
    NoteColor::PALETTE
        .get(usize::from(index))
        .copied()
        .ok_or_else(|| format!("no palette color {index}"))
}

fn print_note(note: &Note) {
    let flags = match (note.is_pinned, note.is_archived) {
        (true, true) => "PA",
        (true, false) => "P-",
        (false, true) => "-A",
        (false, false) => "--",
    };
    let color = note
        .color
        .map(|color| format!("{:08X}", color.argb()))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}\t{}\t{}\t{}\t{}",
        note.id, flags, note.modified_at, color, note.title
    );
}
