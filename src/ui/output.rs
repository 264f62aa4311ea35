use crate::error::{ArchSweepError, UserFriendlyError};
use crate::pipeline::{PlannedArchive, RunOutcome, RunReport};
use console::{style, Emoji, Term};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputMode {
    Human,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static SPARKLES: Emoji = Emoji("✨ ", "* ");
static PACKAGE: Emoji = Emoji("📦 ", "- ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            OutputMode::Plain => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    // Core messaging methods
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    // User-friendly error handling
    pub fn print_user_friendly_error(&self, error: &ArchSweepError) {
        self.error(&error.user_message());

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    eprintln!();
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Plain => eprintln!("SUGGESTION: {}", suggestion),
            }
        }
    }

    /// Prints the run's summary line, plus counters and failures unless quiet.
    ///
    /// The summary line is printed even in quiet mode so scripts can read it.
    pub fn print_run_summary(&self, report: &RunReport) {
        let summary = report.summary_line();

        if self.quiet {
            println!("{}", summary);
            return;
        }

        match self.mode {
            OutputMode::Human => self.print_human_summary(report, &summary),
            OutputMode::Plain => self.print_plain_summary(report, &summary),
        }

        for root in &report.missing_roots {
            self.error(&format!("Root not found: {}", root.display()));
        }

        for failure in &report.failures {
            self.error(&format!(
                "{} ({}): {}",
                failure.path.display(),
                failure.stage,
                failure.error.user_message()
            ));
        }
    }

    pub fn print_plan(&self, plan: &[PlannedArchive]) {
        self.print_header("Dry run");

        if plan.is_empty() {
            println!("no archives found");
            return;
        }

        for item in plan {
            let note = if item.already_backed_up {
                " (already backed up, source would be deleted)"
            } else {
                ""
            };

            match self.mode {
                OutputMode::Human => {
                    let name = if self.use_colors {
                        style(item.archive.path.display().to_string()).bold().to_string()
                    } else {
                        item.archive.path.display().to_string()
                    };
                    println!("{}{}", PACKAGE, name);
                    println!("    extract to: {}", item.destination.display());
                    println!("    back up to: {}{}", item.backup_dir.display(), note);
                }
                OutputMode::Plain => println!(
                    "PLAN: {} -> {} | backup {}{}",
                    item.archive.path.display(),
                    item.destination.display(),
                    item.backup_dir.display(),
                    note
                ),
            }
        }

        println!();
        println!("would process {} archive(s)", plan.len());
    }

    // Specialized output methods
    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                println!();
                if self.use_colors {
                    println!("{} {}", SPARKLES, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
                println!();
            }
            OutputMode::Plain => println!("=== {} ===", title),
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            println!("{}", style("─".repeat(60)).dim());
        } else {
            println!("{}", "-".repeat(60));
        }
    }

    // Private helper methods
    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn highlight(&self, value: impl ToString) -> String {
        if self.use_colors {
            style(value.to_string()).cyan().bold().to_string()
        } else {
            value.to_string()
        }
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        #[allow(clippy::type_complexity)]
        let (emoji, color_fn): (Emoji, Box<dyn Fn(&str) -> console::StyledObject<&str>>) =
            match msg_type {
                MessageType::Error => (CROSS, Box::new(|msg| style(msg).red().bold())),
                MessageType::Warning => (WARNING, Box::new(|msg| style(msg).yellow().bold())),
                MessageType::Info => (INFO, Box::new(|msg| style(msg).cyan())),
            };

        if self.use_colors {
            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, color_fn(message)),
                _ => println!("{}{}", emoji, color_fn(message)),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_human_summary(&self, report: &RunReport, summary: &str) {
        println!();
        self.print_separator();

        match report.outcome() {
            RunOutcome::Processed(_) | RunOutcome::NothingFound => {
                if self.use_colors {
                    println!("{}{}", CHECKMARK, style(summary).green().bold());
                } else {
                    println!("✓ {}", summary);
                }
            }
            RunOutcome::CompletedWithFailures { .. } | RunOutcome::Cancelled { .. } => {
                if self.use_colors {
                    println!("{}{}", WARNING, style(summary).yellow().bold());
                } else {
                    println!("! {}", summary);
                }
            }
        }

        println!();
        println!("  Companies scanned: {}", self.highlight(report.companies_scanned));
        println!("  Files extracted:   {}", self.highlight(report.files_extracted));
        println!("  Files kept:        {}", self.highlight(report.flatten.moved));
        if report.flatten.renamed > 0 {
            println!("  Renamed:           {}", report.flatten.renamed);
        }
        if report.flatten.overwritten > 0 {
            println!("  Overwritten:       {}", report.flatten.overwritten);
        }
        if report.flatten.skipped > 0 {
            println!("  Skipped:           {}", report.flatten.skipped);
        }
        if report.duplicates_removed > 0 {
            println!("  Already backed up: {}", report.duplicates_removed);
        }
        println!(
            "  Time taken:        {}",
            self.highlight(format_duration(report.duration))
        );

        self.print_separator();
    }

    fn print_plain_summary(&self, report: &RunReport, summary: &str) {
        println!("{}", summary);
        println!("Started: {}", report.started_at.format("%Y-%m-%d %H:%M:%S"));
        println!("Companies scanned: {}", report.companies_scanned);
        println!("Files extracted: {}", report.files_extracted);
        println!("Files kept: {}", report.flatten.moved);
        println!("Already backed up: {}", report.duplicates_removed);
        println!("Duration: {}", format_duration(report.duration));
        if report.failed_archives() > 0 {
            println!("Failed archives: {}", report.failed_archives());
        }
        if report.unreadable_folders() > 0 {
            println!("Unreadable folders: {}", report.unreadable_folders());
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Error,
    Warning,
    Info,
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
