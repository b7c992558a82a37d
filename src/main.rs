use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use smart_edit::config::{self, EditConfig};
use smart_edit::{
    AmbiguityPolicy, Locator, PatchEngine, PatchOutcome, PatchRequest, Toolbox,
};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "SMART_EDIT_LOG";

#[derive(Parser)]
#[command(name = "smart-edit")]
#[command(about = "Whitespace-tolerant find-and-replace for text files", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (otherwise discovered from $SMART_EDIT_CONFIG, ./.smart-edit.toml, ~/.config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the first occurrence of a text excerpt in a file
    Edit(EditArgs),

    /// Search file contents for a pattern
    Search(SearchArgs),

    /// Invoke a tool with JSON arguments and print its status line
    Tool {
        /// Tool name (see `smart-edit tools`)
        name: String,

        /// JSON arguments (read from stdin when omitted)
        #[arg(long)]
        args: Option<String>,
    },

    /// List available tools and their argument schemas
    Tools,
}

#[derive(Args)]
struct EditArgs {
    /// File to edit
    file: PathBuf,

    /// Text to find
    #[arg(long, conflicts_with = "old_file", required_unless_present = "old_file")]
    old: Option<String>,

    /// Read the text to find from a file
    #[arg(long)]
    old_file: Option<PathBuf>,

    /// Replacement text
    #[arg(long, conflicts_with = "new_file", required_unless_present = "new_file")]
    new: Option<String>,

    /// Read the replacement text from a file
    #[arg(long)]
    new_file: Option<PathBuf>,

    /// Show the result without modifying the file
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,

    /// Refuse edits whose excerpt occurs more than once
    #[arg(long)]
    strict: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// Regex pattern (literal with -F)
    pattern: String,

    /// File or directory to search
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Match case exactly
    #[arg(short = 's', long)]
    case_sensitive: bool,

    /// Treat the pattern as a literal string
    #[arg(short = 'F', long)]
    fixed_strings: bool,

    /// Only search files matching this glob
    #[arg(short, long)]
    glob: Option<String>,

    /// Lines of context around each match
    #[arg(short = 'C', long)]
    context: Option<usize>,

    /// Stop after this many matches
    #[arg(long)]
    max_results: Option<usize>,

    /// Search hidden files and directories
    #[arg(long)]
    hidden: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::discover(cli.config.as_deref())?;

    match cli.command {
        Commands::Edit(args) => cmd_edit(&config, args),
        Commands::Search(args) => cmd_search(&config, args),
        Commands::Tool { name, args } => cmd_tool(&config, &name, args),
        Commands::Tools => cmd_tools(&config),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Helper: Inline text wins; otherwise read the file named by the flag.
fn excerpt(inline: Option<String>, file: Option<PathBuf>, flag: &str) -> Result<String> {
    match (inline, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read {flag} from {}", path.display())),
        (None, None) => anyhow::bail!("missing --{flag} or --{flag}-file"),
    }
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (edited)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
    if !modified.ends_with('\n') {
        println!();
    }
}

fn cmd_edit(config: &EditConfig, args: EditArgs) -> Result<()> {
    let search = excerpt(args.old, args.old_file, "old")?;
    let replacement = excerpt(args.new, args.new_file, "new")?;

    let mut options = config.engine_options();
    if args.strict {
        options.ambiguity = AmbiguityPolicy::Reject;
    }
    let engine = PatchEngine::new(options);

    // Captured before the edit for --diff; a missing file is reported by the engine.
    let original = if args.diff {
        fs::read_to_string(&args.file).ok()
    } else {
        None
    };

    let request = PatchRequest::new(&args.file, search, replacement);
    let outcome = if args.dry_run {
        println!("{}", "[DRY RUN - file will not be modified]".cyan());
        engine.preview(&request)
    } else {
        engine.apply(&request)
    };

    match &outcome {
        PatchOutcome::Applied {
            path,
            strategy,
            new_content,
            occurrences,
            changed,
        } => {
            let verb = if args.dry_run { "Would edit" } else { "Edited" };
            println!(
                "{} {} {} using strategy: {}",
                "✓".green(),
                verb,
                path.display(),
                strategy.to_string().bold()
            );
            if !changed {
                println!("{} {}", "⊙".yellow(), "Replacement is identical, file unchanged".yellow());
            }
            if *occurrences > 1 {
                println!(
                    "{} {}",
                    "⊙".yellow(),
                    format!("Excerpt matched {occurrences} locations, edited the first").yellow()
                );
            }
            if let Some(before) = &original {
                if before != new_content {
                    display_diff(path, before, new_content);
                }
            }
            Ok(())
        }
        PatchOutcome::Failed { .. } => {
            eprintln!("{} {}", "✗".red(), outcome);
            std::process::exit(1);
        }
    }
}

fn cmd_search(config: &EditConfig, args: SearchArgs) -> Result<()> {
    let mut options = config.locator_options();
    options.case_sensitive |= args.case_sensitive;
    options.fixed_strings = args.fixed_strings;
    options.include_hidden |= args.hidden;
    options.glob = args.glob;
    if let Some(context) = args.context {
        options.context = context;
    }
    if let Some(max_results) = args.max_results {
        options.max_results = max_results;
    }

    let mut matches = Locator::new(options).search(&args.pattern, &args.path)?;

    let mut count = 0;
    for m in matches.by_ref() {
        count += 1;
        let file = m.file.display().to_string();
        let first_context = m.line_number - m.context_before.len();
        for (offset, line) in m.context_before.iter().enumerate() {
            println!("{}-{}-{}", file.magenta(), first_context + offset, line);
        }
        println!(
            "{}:{}:{}",
            file.magenta(),
            m.line_number.to_string().green(),
            m.line
        );
        for (offset, line) in m.context_after.iter().enumerate() {
            println!("{}-{}-{}", file.magenta(), m.line_number + 1 + offset, line);
        }
    }

    if matches.truncated() {
        eprintln!(
            "{}",
            format!("... (results truncated at {count} matches)").yellow()
        );
    }

    if count == 0 {
        eprintln!("{}", "No matches found.".dimmed());
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_tool(config: &EditConfig, name: &str, args: Option<String>) -> Result<()> {
    let toolbox = Toolbox::from_config(config)?;

    let raw = match args {
        Some(raw) => raw,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read tool arguments from stdin")?;
            buf
        }
    };

    let output = match serde_json::from_str(&raw) {
        Ok(arguments) => toolbox.invoke(name, arguments),
        Err(e) => {
            println!("Invalid arguments: {e}");
            std::process::exit(1);
        }
    };

    println!("{}", output);
    if !output.success {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_tools(config: &EditConfig) -> Result<()> {
    let toolbox = Toolbox::from_config(config)?;

    for tool in toolbox.tools() {
        println!("{}", tool.name().bold());
        println!("  {}", tool.description());
        let schema = serde_json::to_string_pretty(&tool.parameters())?;
        for line in schema.lines() {
            println!("  {}", line.dimmed());
        }
        println!();
    }

    Ok(())
}
