use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use media_backup::reference::{DEFAULT_MEDIA_EXTENSIONS, default_extractors};
use media_backup::scan::DEFAULT_TEXT_EXTENSIONS;
use media_backup::{MediaReference, Scanner};

/// Export every media reference found in a project, one per line.
#[derive(Parser, Debug)]
#[command(name = "export-media-refs")]
#[command(
    author,
    version,
    about = "Export media paths and URLs referenced by a project tree"
)]
struct Args {
    /// Directories to scan (defaults to the current directory)
    roots: Vec<PathBuf>,

    /// Output file path (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// List only references found in text files, not media files present in the tree
    #[arg(long)]
    references_only: bool,

    /// Directory names to skip (repeatable)
    #[arg(long = "exclude-dir", value_name = "NAME")]
    exclude_dirs: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let roots = if args.roots.is_empty() {
        vec![std::env::current_dir().context("Failed to read current directory")?]
    } else {
        args.roots.clone()
    };

    let mut found = BTreeSet::new();
    let mut files_scanned = 0usize;
    for root in &roots {
        files_scanned += export_root(root, &args, &mut found)?;
    }

    let lines: Vec<String> = found.into_iter().collect();
    write_output(&lines, args.output.as_deref())?;

    eprintln!(
        "Scanned {files_scanned} file(s), exported {} reference(s)",
        lines.len()
    );
    Ok(())
}

fn export_root(root: &Path, args: &Args, found: &mut BTreeSet<String>) -> Result<usize> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Input path does not exist: {}", root.display()))?;
    let media = strings(DEFAULT_MEDIA_EXTENSIONS);
    let extractors = default_extractors(&media).context("Failed to compile reference patterns")?;
    let scanner = Scanner::new(&root, extractors, &media, &strings(DEFAULT_TEXT_EXTENSIONS))
        .with_exclude_dirs(&args.exclude_dirs)
        .collect_media_files(!args.references_only);

    let outcome = scanner.scan();
    for error in &outcome.errors {
        eprintln!("warning: {error}");
    }
    found.extend(outcome.references.iter().map(|r| display_reference(r, &root)));
    Ok(outcome.files_scanned)
}

/// URLs verbatim; local paths relative to `root` with `/` separators.
fn display_reference(reference: &MediaReference, root: &Path) -> String {
    match reference {
        MediaReference::Remote { url } => url.clone(),
        MediaReference::Local { path, .. } => {
            let relative = path.strip_prefix(root).unwrap_or(path);
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            if parts.is_empty() {
                ".".to_string()
            } else {
                parts.join("/")
            }
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn write_output(lines: &[String], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let mut content = lines.join("\n");
            if !content.is_empty() {
                content.push('\n');
            }
            fs::write(path, content)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            for line in lines {
                writeln!(stdout, "{line}")?;
            }
        }
    }

    Ok(())
}
