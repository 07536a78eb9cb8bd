use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;

use anno_sort_core::category::{classify, rules, Category, RuleMatch};
use anno_sort_core::config::{Config, SortConfig};
use anno_sort_core::{
    output_path_for, process_file, run_batch, AnnoSortError, BatchEntry, FileOutcome, Result,
};

mod args;
use args::{Cli, Commands, ConfigAction, Shell, SortArgs};

/// How much per-file detail to print
#[derive(Clone, Copy, PartialEq, Eq)]
enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };
    init_logging(verbosity);

    let base_dir = resolve_base_dir(cli.base_dir);
    log::debug!("base directory: {}", base_dir.display());

    let result = match cli.command {
        Some(Commands::Run { dir, sort }) => handle_run(&base_dir, dir, &sort, verbosity),
        Some(Commands::File {
            input,
            output,
            sort,
        }) => handle_file(&base_dir, &input, output, &sort, verbosity),
        Some(Commands::Classify { labels }) => {
            handle_classify(&labels);
            Ok(())
        }
        Some(Commands::Rules) => {
            handle_rules();
            Ok(())
        }
        Some(Commands::Config { action }) => handle_config(action, &base_dir),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => handle_run(&base_dir, None, &SortArgs::default(), verbosity),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn init_logging(verbosity: Verbosity) {
    let level = match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "anno-sort", &mut io::stdout());
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> PathBuf {
    if let Some(base) = cli_base {
        return base;
    }

    if let Ok(base) = std::env::var("ANNO_SORT_BASE") {
        return PathBuf::from(base);
    }

    Config::default_base_dir().unwrap_or_else(|_| PathBuf::from(".anno-sort"))
}

/// Build sort settings from config file + CLI options
/// Priority: CLI options > config file > defaults
fn build_sort_config(base_dir: &Path, args: &SortArgs) -> Result<SortConfig> {
    let mut sort = Config::load(base_dir)?.sort;

    if args.alpha {
        sort.alpha_sort_within_category = true;
    }
    if args.first_seen {
        sort.alpha_sort_within_category = false;
    }
    if let Some(encoding) = &args.encoding {
        sort.input_encoding = encoding.clone();
    }
    if let Some(n) = args.max_open {
        sort.max_open_partitions = n;
    }
    if let Some(dir) = &args.spill_dir {
        sort.spill_directory = Some(dir.clone());
    }
    if let Some(suffix) = &args.suffix {
        sort.output_suffix = suffix.clone();
    }
    // An empty suffix would name the output after the input.
    if sort.output_suffix.is_empty() {
        return Err(AnnoSortError::InvalidConfigValue {
            key: "sort.output_suffix".to_string(),
            value: String::new(),
            reason: "suffix must not be empty".to_string(),
        });
    }

    Ok(sort)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_failure(input: &Path, error: &AnnoSortError) {
    eprintln!(
        "  {} {}: {}",
        "[FAIL]".red().bold(),
        file_name(input),
        error
    );
}

fn print_outcome(input: &Path, outcome: &FileOutcome, verbosity: Verbosity) {
    if verbosity == Verbosity::Quiet {
        return;
    }
    match outcome {
        FileOutcome::Completed(report) => {
            println!(
                "  {} {} ({} rows) → {}",
                "[DONE]".green(),
                file_name(input),
                report.rows,
                file_name(&report.output)
            );
            if verbosity == Verbosity::Verbose {
                println!(
                    "         label column: {}, {} group(s)",
                    report.label_column.cyan(),
                    report.groups.len()
                );
                for group in &report.groups {
                    let label = if group.label.is_empty() {
                        "(blank)".dimmed().to_string()
                    } else {
                        group.label.clone()
                    };
                    println!(
                        "         {} {:<12} {} ({})",
                        group.category.index(),
                        group.category.name(),
                        label,
                        group.rows
                    );
                }
            }
        }
        FileOutcome::Skipped { reason, .. } => {
            println!(
                "  {} {}: {}",
                "[SKIP]".yellow(),
                file_name(input),
                reason
            );
        }
    }
}

fn handle_run(
    base_dir: &Path,
    dir: Option<PathBuf>,
    args: &SortArgs,
    verbosity: Verbosity,
) -> Result<()> {
    let sort = build_sort_config(base_dir, args)?;
    let options = sort.to_sort_options()?;
    let dir = match dir {
        Some(dir) => dir,
        None => sort.target_directory_or_cwd()?,
    };

    if verbosity != Verbosity::Quiet {
        println!();
        println!("Directory: {}", dir.display().to_string().cyan());
        println!(
            "Order: category, then {}",
            if options.secondary.is_alphabetical() {
                "label (alphabetical)"
            } else {
                "first appearance"
            }
        );
        println!("Encoding: {}", options.encoding);
        println!();
    }

    let on_file = |entry: &BatchEntry| match &entry.result {
        Ok(outcome) => print_outcome(&entry.input, outcome, verbosity),
        Err(e) => print_failure(&entry.input, e),
    };
    let report = run_batch(&dir, &sort.output_suffix, &options, Some(&on_file))?;

    if report.is_empty() {
        if verbosity != Verbosity::Quiet {
            println!("No CSV files found in {}", dir.display());
        }
        return Ok(());
    }

    if verbosity != Verbosity::Quiet {
        println!();
        println!("Summary:");
        println!("  Sorted: {}", report.completed());
        println!("  Skipped: {}", report.skipped());
        println!("  Failed: {}", report.failed());
        println!("  Rows: {}", report.total_rows());
        println!();
    }

    if report.failed() > 0 {
        return Err(AnnoSortError::BatchFailed {
            failed: report.failed(),
            total: report.entries.len(),
        });
    }
    Ok(())
}

fn handle_file(
    base_dir: &Path,
    input: &Path,
    output: Option<PathBuf>,
    args: &SortArgs,
    verbosity: Verbosity,
) -> Result<()> {
    let sort = build_sort_config(base_dir, args)?;
    let options = sort.to_sort_options()?;
    let output = output.unwrap_or_else(|| output_path_for(input, &sort.output_suffix));

    let outcome = process_file(input, &output, &options)?;
    print_outcome(input, &outcome, verbosity);
    Ok(())
}

fn handle_classify(labels: &[String]) {
    let width = labels.iter().map(|l| l.len()).max().unwrap_or(0).max(5);
    for label in labels {
        let c = classify(label);
        let reason = match c.matched {
            Some(RuleMatch::Exact) => "exact name".to_string(),
            Some(RuleMatch::Prefix(p)) => format!("prefix '{}'", p),
            None => "no rule".to_string(),
        };
        println!(
            "{:<width$}  {} {} {}",
            label,
            c.category.index(),
            format!("{:<12}", c.category.name()).cyan(),
            reason.dimmed(),
            width = width
        );
    }
}

fn handle_rules() {
    println!();
    for rule in rules() {
        println!(
            "{} {}",
            rule.category.index().to_string().bold(),
            rule.category.name().cyan().bold()
        );
        println!("    exact:    {}", rule.exact_names().join(", "));
        println!("    prefixes: {}", rule.prefixes().join(", "));
        println!();
    }
    println!(
        "{} {}",
        Category::Other.index().to_string().bold(),
        Category::Other.name().cyan().bold()
    );
    println!("    {}", "anything not matched above".dimmed());
    println!();
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                }
                None => {
                    return Err(AnnoSortError::ConfigKeyNotFound { key });
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key, value);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            let path = Config::path(base_dir);
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}
