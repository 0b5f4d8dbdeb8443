use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use lineset::config::load_from_path;
use lineset::edit::DEFAULT_FILE_MODE;
use lineset::{
    set_dry_run, set_exit_on_error, Anchors, Context, EditError, EditResult, LineEdit,
    LineOperation, Limit, MatchMode, MatchSpec, Neighbors,
};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "lineset")]
#[command(about = "Declarative, idempotent line editing for text files", long_about = None)]
#[command(version)]
struct Cli {
    /// Dry run - show a diff of what would change without writing files
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// Stop the process at the first failing edit
    #[arg(long, global = true)]
    exit_on_error: bool,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone, Copy)]
struct MatchArgs {
    /// Require the whole line to match instead of a prefix
    #[arg(long)]
    full: bool,

    /// Compare lines as-is instead of trimming surrounding whitespace
    #[arg(long)]
    verbatim: bool,
}

impl MatchArgs {
    fn mode(self) -> MatchMode {
        MatchMode::new(self.full, self.verbatim)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Ensure a line is present, optionally before/after another line
    Ensure {
        file: PathBuf,
        line: String,

        /// Insert before the first line matching this text
        #[arg(long)]
        before: Option<String>,

        /// Insert after the first line matching this text
        #[arg(long)]
        after: Option<String>,

        /// Octal permission for the file if it has to be created
        #[arg(long, value_parser = parse_octal_mode)]
        mode: Option<u32>,

        #[command(flatten)]
        matching: MatchArgs,
    },

    /// Replace matching lines
    Replace {
        file: PathBuf,
        search: String,
        replacement: String,

        /// Number of lines to replace (-1 for all)
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
        count: i64,

        #[command(flatten)]
        matching: MatchArgs,
    },

    /// Remove matching lines, optionally only between given neighbours
    Remove {
        file: PathBuf,
        search: String,

        /// Number of lines to remove (-1 for all)
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
        count: i64,

        /// Only remove if the preceding line contains this text
        #[arg(long)]
        before: Option<String>,

        /// Only remove if the following line contains this text
        #[arg(long)]
        after: Option<String>,

        #[command(flatten)]
        matching: MatchArgs,
    },

    /// Apply an edit set file, or every .toml edit set in a directory
    Apply { path: PathBuf },

    /// Report which edits in an edit set are still pending
    Check { path: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    set_dry_run(cli.dry_run);
    set_exit_on_error(cli.exit_on_error);
    let ctx = Context::from_process();

    match cli.command {
        Commands::Ensure {
            file,
            line,
            before,
            after,
            mode,
            matching,
        } => {
            if !MatchSpec::new(&line, matching.mode()).matches_itself() {
                anyhow::bail!(
                    "line {line:?} has surrounding whitespace that trimmed matching ignores; trim it or pass --verbatim"
                );
            }
            let edit = LineEdit::new(file, LineOperation::ensure(line, Anchors { before, after }))
                .with_mode(matching.mode())
                .with_create_mode(mode.unwrap_or(DEFAULT_FILE_MODE));
            cmd_single(&edit, &ctx)
        }

        Commands::Replace {
            file,
            search,
            replacement,
            count,
            matching,
        } => {
            let limit = Limit::try_from(count)?;
            let edit = LineEdit::new(file, LineOperation::replace(search, replacement, limit))
                .with_mode(matching.mode());
            cmd_single(&edit, &ctx)
        }

        Commands::Remove {
            file,
            search,
            count,
            before,
            after,
            matching,
        } => {
            let limit = Limit::try_from(count)?;
            let neighbors = Neighbors::new(before, after);
            let edit = LineEdit::new(file, LineOperation::remove(search, limit, neighbors))
                .with_mode(matching.mode());
            cmd_single(&edit, &ctx)
        }

        Commands::Apply { path } => cmd_apply(&path, &ctx),

        Commands::Check { path } => cmd_check(&path),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_directive = if verbose { "lineset=debug" } else { "lineset=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn parse_octal_mode(raw: &str) -> Result<u32, String> {
    let digits = raw.trim_start_matches("0o");
    u32::from_str_radix(digits, 8)
        .ok()
        .filter(|mode| *mode <= 0o7777)
        .ok_or_else(|| format!("'{raw}' is not an octal permission like 644"))
}

fn cmd_single(edit: &LineEdit, ctx: &Context) -> Result<()> {
    let result = edit.apply(ctx)?;
    report("edit", &result);
    Ok(())
}

/// Helper: Collect edit set files from a file or a directory of .toml files.
fn discover_edit_sets(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
        {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No .toml edit sets found in {}", path.display());
    }
    Ok(files)
}

fn report(id: &str, result: &EditResult) {
    match result {
        EditResult::Applied { file, touched } => {
            println!(
                "{} {}: Applied to {} ({} lines)",
                "✓".green(),
                id,
                file.display(),
                touched
            );
        }
        EditResult::AlreadyApplied { file } => {
            println!(
                "{} {}: Already applied to {}",
                "⊙".yellow(),
                id,
                file.display()
            );
        }
        EditResult::Previewed { file, changed, .. } => {
            if *changed {
                println!("{} {}: Would change {}", "✓".green(), id, file.display());
            } else {
                println!("{} {}: No change to {}", "⊙".yellow(), id, file.display());
            }
        }
    }
}

fn report_error(id: &str, err: &EditError) {
    eprintln!("{} {}: Error - {}", "✗".red(), id, err);
    if let EditError::Read { path, source } = err {
        if source.kind() == std::io::ErrorKind::NotFound {
            eprintln!("  File: {}", path.display());
            eprintln!("  Only ensure edits create missing files");
        }
    }
}

fn cmd_apply(path: &Path, ctx: &Context) -> Result<()> {
    let edit_sets = discover_edit_sets(path)?;

    let mut total_applied = 0;
    let mut total_already_applied = 0;
    let mut total_failed = 0;

    if ctx.dry_run {
        println!("{}", "[DRY RUN - no files will be written]".cyan());
    }

    for edit_set in edit_sets {
        println!("Loading edits from {}...", edit_set.display());

        let results = load_from_path(&edit_set)?.apply(ctx);

        for (id, result) in results {
            match result {
                Ok(result) => {
                    report(&id, &result);
                    if result.changed() {
                        total_applied += 1;
                    } else {
                        total_already_applied += 1;
                    }
                }
                Err(err) => {
                    report_error(&id, &err);
                    total_failed += 1;
                }
            }
        }

        println!();
    }

    println!("{}", "Summary:".bold());
    let applied_label = if ctx.dry_run { "would apply" } else { "applied" };
    println!("  {} {}", format!("{}", total_applied).green(), applied_label);
    println!(
        "  {} already applied",
        format!("{}", total_already_applied).yellow()
    );
    println!("  {} failed", format!("{}", total_failed).red());

    if total_failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_check(path: &Path) -> Result<()> {
    let edit_sets = discover_edit_sets(path)?;

    let mut up_to_date = Vec::new();
    let mut pending = Vec::new();
    let mut failed = Vec::new();

    for edit_set in edit_sets {
        for (id, result) in load_from_path(&edit_set)?.check() {
            match result {
                Ok(result) if result.changed() => pending.push((id, result.file().to_path_buf())),
                Ok(_) => up_to_date.push(id),
                Err(err) => failed.push((id, err.to_string())),
            }
        }
    }

    println!("{}", "Edit Status Report".bold());
    println!();

    if !up_to_date.is_empty() {
        println!(
            "{} {} ({} edits)",
            "✓".green(),
            "APPLIED".green().bold(),
            up_to_date.len()
        );
        for id in &up_to_date {
            println!("  - {}", id);
        }
        println!();
    }

    if !pending.is_empty() {
        println!(
            "{} {} ({} edits)",
            "⊙".yellow(),
            "PENDING".yellow().bold(),
            pending.len()
        );
        for (id, file) in &pending {
            println!("  - {} ({})", id, file.display().to_string().dimmed());
        }
        println!();
    }

    if !failed.is_empty() {
        println!(
            "{} {} ({} edits)",
            "✗".red(),
            "FAILED".red().bold(),
            failed.len()
        );
        for (id, reason) in &failed {
            println!("  - {} ({})", id, reason.dimmed());
        }
        println!();
    }

    if !pending.is_empty() || !failed.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}
