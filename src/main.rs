use clap::{Parser, Subcommand};
use folio::config::{ConvertConfig, PageSize};
use folio::{output, pipeline, scan};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Assemble a bookmarked PDF from a directory tree of images and PDFs")]
#[command(long_about = "\
Assemble a bookmarked PDF from a directory tree of images and PDFs

Your filesystem is the data source. Files become pages in path order, and
the folder hierarchy becomes the document's navigation outline.

Input structure:

  manual/
  ├── cover.png                # One page per image
  ├── ch1/
  │   ├── p1.png               # Outline: ch1 → p1, p2
  │   └── p2.png
  └── appendix/
      └── datasheet.pdf        # Existing PDFs merge page-for-page;
                               # page 2 onward appears as 'Page N'
                               # under the document's outline entry

A folder with no page of its own links to the first page found inside it.
Hidden entries and bundle directories are ignored; files that fail to
decode are skipped with a note, never fatal.")]
#[command(version = version_string())]
struct Cli {
    /// Worker threads for scanning and rendering (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: scan → render → assemble
    Convert {
        /// Input directory
        input: PathBuf,
        /// Output PDF path
        #[arg(short, long)]
        output: PathBuf,
        /// Document title (defaults to the input directory name)
        #[arg(long)]
        title: Option<String>,
        /// Page size: preset (a3|a4|a5|letter|legal|tabloid) or WIDTHxHEIGHT in points
        #[arg(long, default_value = "a4")]
        page_size: PageSize,
    },
    /// Discover and list input items without writing a document
    Scan {
        /// Input directory
        input: PathBuf,
        /// Also write a JSON manifest of items and skips
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Validate the input tree: exit non-zero if nothing would convert
    Check {
        /// Input directory
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_thread_pool(cli.threads);

    match cli.command {
        Command::Convert {
            input,
            output,
            title,
            page_size,
        } => {
            let config = ConvertConfig {
                title: title.unwrap_or_else(|| ConvertConfig::default_title(&input)),
                page_size,
                ..Default::default()
            };

            println!("==> Converting {}", input.display());
            let (tx, printer) = pipeline::spawn_printer();
            let summary = pipeline::convert(&input, &output, &config, Some(tx))?;
            printer.join().ok();

            output::print_convert_summary(&summary);
            println!("==> Wrote {}", output.display());
        }
        Command::Scan { input, manifest } => {
            let result = scan::scan(&input)?;
            output::print_scan_output(&result);
            if let Some(path) = manifest {
                let json = serde_json::to_string_pretty(&result.manifest())?;
                std::fs::write(&path, json)?;
                println!("Manifest: {}", path.display());
            }
        }
        Command::Check { input } => {
            println!("==> Checking {}", input.display());
            let result = scan::scan(&input)?;
            output::print_scan_output(&result);
            if result.items.is_empty() {
                return Err("no convertible items found".into());
            }
            println!("==> {} items would convert", result.items.len());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool.
///
/// Caps at the number of available cores — users can constrain down, not up.
fn init_thread_pool(threads: Option<usize>) {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let threads = threads.unwrap_or(cores).clamp(1, cores);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
