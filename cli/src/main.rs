//! figcite CLI - collect PDF figures and captions under matched citations

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use figcite::{BatchEvent, BatchOptions, BatchSummary, ImageFilter, OutputFormat};

#[derive(Parser)]
#[command(name = "figcite")]
#[command(version)]
#[command(
    about = "Collect large figures and their captions from a tree of PDFs into one document",
    long_about = "Collect large figures and their captions from a tree of PDFs into one \
                  document.\n\n\
                  Each PDF's title is matched against a citation list; the matched citation\n\
                  labels every figure of that PDF. Without arguments, reads ./pdfs and\n\
                  ./Citations.txt and writes into ./output."
)]
struct Cli {
    /// Directory searched recursively for .pdf files
    #[arg(value_name = "PDF_ROOT", requires = "citations")]
    pdf_root: Option<PathBuf>,

    /// Citation list, one per line
    #[arg(value_name = "CITATIONS", requires = "output")]
    citations: Option<PathBuf>,

    /// Combined output document (.docx, or .md for Markdown)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Citation mapping CSV (only written when given)
    #[arg(value_name = "AUDIT_CSV")]
    audit: Option<PathBuf>,

    /// Minimum similarity for a citation match (0-1)
    #[arg(
        long,
        env = "FIGCITE_MATCH_THRESHOLD",
        default_value_t = figcite::assemble::DEFAULT_MATCH_THRESHOLD
    )]
    threshold: f64,

    /// Minimum image width in pixels
    #[arg(long, default_value_t = 500)]
    min_width: u32,

    /// Minimum image height in pixels
    #[arg(long, default_value_t = 500)]
    min_height: u32,

    /// Minimum image area in pixels
    #[arg(long, default_value_t = 300_000)]
    min_area: u64,

    /// Output format (default: from the OUTPUT extension)
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Process files in parallel
    #[arg(short, long)]
    parallel: bool,

    /// Don't show the progress bar
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Word document
    Docx,
    /// Markdown with image links
    Markdown,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Docx => OutputFormat::Docx,
            Format::Markdown => OutputFormat::Markdown,
        }
    }
}

impl Cli {
    fn batch_options(&self) -> BatchOptions {
        let mut options = match (&self.pdf_root, &self.citations, &self.output) {
            (Some(root), Some(citations), Some(output)) => {
                let options = BatchOptions::new(root, citations, output);
                match &self.audit {
                    Some(audit) => options.with_audit(audit),
                    None => options,
                }
            }
            _ => BatchOptions::default(),
        };

        options = options
            .with_match_threshold(self.threshold)
            .with_image_filter(
                ImageFilter::new()
                    .with_min_width(self.min_width)
                    .with_min_height(self.min_height)
                    .with_min_area(self.min_area),
            )
            .with_parallel(self.parallel);

        if let Some(format) = self.format {
            options = options.with_format(format.into());
        }
        options
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = cmd_run(&cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = cli.batch_options();
    log::debug!(
        "input {}, citations {}, output {} ({:?})",
        options.pdf_root.display(),
        options.citations_path.display(),
        options.output_path.display(),
        options.output_format()
    );

    let pb = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let summary = figcite::run(&options, |event| match event {
        BatchEvent::Started { total } => pb.set_length(total as u64),
        BatchEvent::FileDone { done, path } => {
            pb.set_position(done as u64);
            if let Some(name) = path.file_name() {
                pb.set_message(name.to_string_lossy().into_owned());
            }
        }
        BatchEvent::Writing { .. } => pb.set_message("Writing document..."),
    })?;
    pb.finish_and_clear();

    print_summary(&summary, &options);
    Ok(())
}

fn print_summary(summary: &BatchSummary, options: &BatchOptions) {
    if let Some(message) = summary.no_input_message() {
        println!("{}", message.yellow());
        return;
    }

    if let Some(output) = &summary.output {
        let label = match options.output_format() {
            OutputFormat::Docx => "Saved DOCX:",
            OutputFormat::Markdown => "Saved Markdown:",
        };
        println!("{} {}", label.green(), output.display());
    }
    if let Some(audit) = &summary.audit {
        println!("{} {}", "Saved mapping CSV:".green(), audit.display());
    }

    println!(
        "  {} {} files, {} matched, {} images, {} captions",
        "└─".dimmed(),
        summary.files,
        summary.matched,
        summary.images,
        summary.captions
    );
    if summary.degraded > 0 {
        println!(
            "  {} {} files processed with errors (RUST_LOG=warn for details)",
            "⚠".yellow(),
            summary.degraded
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_use_defaults() {
        let cli = Cli::try_parse_from(["figcite"]).unwrap();
        let options = cli.batch_options();
        assert_eq!(options.pdf_root, PathBuf::from("pdfs"));
        assert_eq!(options.citations_path, PathBuf::from("Citations.txt"));
        assert_eq!(
            options.output_path,
            PathBuf::from("output/All_Figures_Captions.docx")
        );
        assert_eq!(
            options.audit_path,
            Some(PathBuf::from("output/pdf_to_citation_map.csv"))
        );
    }

    #[test]
    fn test_three_positionals_skip_csv() {
        let cli = Cli::try_parse_from(["figcite", "in", "refs.txt", "out.docx"]).unwrap();
        let options = cli.batch_options();
        assert_eq!(options.pdf_root, PathBuf::from("in"));
        assert_eq!(options.audit_path, None);
    }

    #[test]
    fn test_four_positionals_write_csv() {
        let cli =
            Cli::try_parse_from(["figcite", "in", "refs.txt", "out.md", "map.csv"]).unwrap();
        let options = cli.batch_options();
        assert_eq!(options.audit_path, Some(PathBuf::from("map.csv")));
        assert_eq!(options.output_format(), OutputFormat::Markdown);
    }

    #[test]
    fn test_partial_positionals_rejected() {
        assert!(Cli::try_parse_from(["figcite", "in"]).is_err());
        assert!(Cli::try_parse_from(["figcite", "in", "refs.txt"]).is_err());
    }

    #[test]
    fn test_empty_input_succeeds_without_output() {
        use std::ffi::OsStr;

        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("pdfs");
        std::fs::create_dir_all(&root).unwrap();
        let output = dir.path().join("out.docx");

        let citations = dir.path().join("refs.txt");
        let args: Vec<&OsStr> = vec![
            OsStr::new("figcite"),
            root.as_os_str(),
            citations.as_os_str(),
            output.as_os_str(),
            OsStr::new("--quiet"),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        cmd_run(&cli).unwrap();
        assert!(!output.exists());
    }

    #[test]
    fn test_flags_map_to_options() {
        let cli = Cli::try_parse_from([
            "figcite",
            "--threshold",
            "0.8",
            "--min-width",
            "300",
            "--format",
            "markdown",
            "--parallel",
        ])
        .unwrap();
        let options = cli.batch_options();
        assert_eq!(options.match_threshold, 0.8);
        assert_eq!(options.image_filter.min_width, 300);
        assert_eq!(options.output_format(), OutputFormat::Markdown);
        assert!(options.parallel);
    }
}
