//! Purpose: `frl` CLI entry point; exercises the handle registry from the shell.
//! Role: Binary crate root; parses args, runs one subcommand, emits JSON on stdout.
//! Invariants: Errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `to_error_code`.
#![allow(clippy::result_large_err)]
use std::cmp::Ordering;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use ferrule::api::{
    Error, Handle, Registry, SeekMode, StreamApiExt, TextApiExt, UuidApiExt, to_error_code,
};
use ferrule::backend::{FileBackend, MemoryBackend};

#[derive(Parser)]
#[command(
    name = "frl",
    version,
    about = "Exercise the ferrule handle registry from the command line"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk text, uuid, and stream handles through a full lifecycle.
    Demo {
        /// Back the stream with a scratch file instead of an in-memory buffer.
        #[arg(long)]
        file: bool,
    },
    /// Mint a new uuid handle and print its value with metadata.
    New {
        /// Mint a time-ordered v7 value instead of a random v4.
        #[arg(long)]
        v7: bool,
    },
    /// Parse a canonical uuid string and print its metadata.
    Parse {
        /// Canonical 8-4-4-4-12 text, like 67e55044-10b1-426f-9247-bb680e5fe0c8.
        value: String,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match run(cli.command) {
        Ok(()) => 0,
        Err(err) => {
            emit_error(&err);
            to_error_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run(command: Command) -> Result<(), Error> {
    let registry = Registry::global();
    match command {
        Command::Demo { file } => demo(registry, file),
        Command::New { v7 } => {
            let handle = if v7 {
                registry.uuid_new_v7()?
            } else {
                registry.uuid_new_v4()?
            };
            print_uuid(registry, handle)
        }
        Command::Parse { value } => {
            let handle = registry.uuid_parse(&value)?;
            print_uuid(registry, handle)
        }
    }
}

fn demo(registry: &Registry, file: bool) -> Result<(), Error> {
    let text = registry.text_create("ferrule")?;
    registry.text_append(text, " demo")?;
    registry.text_make_uppercase(text)?;
    let line = json!({
        "step": "text",
        "handle": format!("{:#x}", text.as_raw()),
        "value": registry.text_get(text)?,
        "len": registry.text_len(text)?,
    });
    println!("{line}");

    let a = registry.uuid_new_v7()?;
    let b = registry.uuid_new_v7()?;
    let order = match registry.uuid_compare(a, b)? {
        Ordering::Less => "a<b",
        Ordering::Equal => "a=b",
        Ordering::Greater => "a>b",
    };
    let line = json!({
        "step": "uuid",
        "a": registry.uuid_to_string(a)?,
        "b": registry.uuid_to_string(b)?,
        "order": order,
        "a_timestamp": registry.uuid_timestamp_rfc3339(a)?,
    });
    println!("{line}");

    let mut scratch: Option<PathBuf> = None;
    let stream = if file {
        let path = scratch_path();
        let backend = FileBackend::create(&path)?;
        scratch = Some(path);
        registry.stream_open(Box::new(backend))?
    } else {
        registry.stream_open(Box::new(MemoryBackend::new()))?
    };
    registry.stream_write(stream, b"ABCDEFGHIJ")?;
    registry.stream_seek(stream, 0, SeekMode::Start)?;
    let mut first = [0u8; 4];
    let moved = registry.stream_read(stream, &mut first)?;
    let first_read = String::from_utf8_lossy(&first[..moved]).into_owned();
    registry.stream_seek(stream, -2, SeekMode::Current)?;
    let mut second = [0u8; 2];
    let moved = registry.stream_read(stream, &mut second)?;
    let second_read = String::from_utf8_lossy(&second[..moved]).into_owned();
    let end_position = registry.stream_seek(stream, 0, SeekMode::End)?;
    registry.stream_flush(stream)?;
    let line = json!({
        "step": "stream",
        "backend": if file { "file" } else { "memory" },
        "first_read": first_read,
        "second_read": second_read,
        "end_position": end_position,
    });
    println!("{line}");

    for handle in [text, a, b, stream] {
        registry.release_any(handle)?;
    }
    if let Some(path) = scratch {
        let _ = std::fs::remove_file(path);
    }
    let line = json!({ "step": "released", "live": registry.live_count() });
    println!("{line}");
    Ok(())
}

fn print_uuid(registry: &Registry, handle: Handle) -> Result<(), Error> {
    let value = registry.uuid_value(handle)?;
    let line = json!({
        "uuid": registry.uuid_to_string(handle)?,
        "urn": registry.uuid_to_urn(handle)?,
        "version": value.get_version_num(),
        "nil": registry.uuid_is_nil(handle)?,
        "max": registry.uuid_is_max(handle)?,
        "timestamp_ms": registry.uuid_timestamp_ms(handle)?,
        "timestamp": registry.uuid_timestamp_rfc3339(handle)?,
    });
    println!("{line}");
    registry.release_any(handle)
}

fn emit_error(err: &Error) {
    let line = json!({
        "error": {
            "code": to_error_code(err.kind()),
            "kind": format!("{:?}", err.kind()),
            "message": err.to_string(),
        }
    });
    eprintln!("{line}");
}

fn scratch_path() -> PathBuf {
    std::env::temp_dir().join(format!("frl-demo-{}.bin", std::process::id()))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
