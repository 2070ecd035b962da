//! Tensor file inspector
//!
//! Prints the field directory of a tensor file and decodes selected text
//! fields.
//!
//! # Usage
//!
//! ```bash
//! # One line per field plus a summary
//! tensor-inspect material.tensor
//!
//! # Directory as JSON
//! tensor-inspect material.tensor --json
//!
//! # Decode text fields (defaults to `description` when the file has one)
//! tensor-inspect material.tensor --text description --text notes
//! ```

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tensor_file::{
    DType, Directory, ReadOptions, TensorReader, decode_string, human_size, with_reader,
};

/// Field shown when no `--text` is given.
const DEFAULT_TEXT_FIELD: &str = "description";

/// Inspect a tensor file
#[derive(Parser, Debug)]
#[command(name = "tensor-inspect")]
#[command(about = "List the fields of a tensor file and decode its text fields")]
#[command(version)]
struct Cli {
    /// Tensor file to inspect
    path: PathBuf,

    /// Print the directory as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Decode a 1-D uint8 field as UTF-8 text (repeatable)
    #[arg(long = "text", value_name = "FIELD")]
    text: Vec<String>,

    /// Let later duplicate names win and skip the payload overlap check
    #[arg(long)]
    permissive: bool,
}

impl Cli {
    fn read_options(&self) -> ReadOptions {
        if self.permissive { ReadOptions::permissive() } else { ReadOptions::default() }
    }

    /// Text fields to decode: the explicit list, or `description` if present.
    fn text_fields(&self, directory: &Directory) -> Vec<String> {
        if !self.text.is_empty() {
            return self.text.clone();
        }
        directory
            .get(DEFAULT_TEXT_FIELD)
            .filter(|f| f.dtype == DType::UInt8 && f.ndim() == 1)
            .map(|f| vec![f.name.clone()])
            .unwrap_or_default()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let stdout = io::stdout();
    inspect(&cli, &mut stdout.lock())
}

fn inspect(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    with_reader(&cli.path, &cli.read_options(), |reader| report(cli, reader, out))
        .with_context(|| format!("reading {}", cli.path.display()))?
}

/// Print the directory, then decode only the requested text fields.
fn report(cli: &Cli, reader: &TensorReader<'_>, out: &mut dyn Write) -> Result<()> {
    let directory = reader.directory();

    if cli.json {
        serde_json::to_writer_pretty(&mut *out, directory)?;
        writeln!(out)?;
        return Ok(());
    }

    for field in directory {
        let bytes = field.byte_len().map_or_else(|| "overflow".to_string(), |n| n.to_string());
        writeln!(
            out,
            "{:<40} {:<8} shape={:?} offset={} bytes={}",
            field.name, field.dtype, field.shape, field.offset, bytes
        )?;
    }
    writeln!(
        out,
        "\n{}: {} fields, {} (format {}.{})",
        cli.path.display(),
        directory.len(),
        human_size(directory.file_len),
        directory.version.0,
        directory.version.1
    )?;

    for name in &cli.text_fields(directory) {
        let Some(tensor) = reader.tensor(name)? else {
            bail!("no field named `{name}` in {}", cli.path.display());
        };
        let text = decode_string(&tensor).with_context(|| format!("decoding field `{name}`"))?;
        writeln!(out, "\n[{name}]\n{text}")?;
    }
    Ok(())
}
