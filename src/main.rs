use archsweep::{
    logging, ArchSweep, ArchSweepError, Cli, OutputFormatter, OutputMode, UserFriendlyError,
};
use clap::Parser;
use std::process;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Held until exit so the file writer flushes.
    let _log_guard = match logging::init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialise logging: {:#}", e);
            return 1;
        }
    };

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let sweep = match ArchSweep::from_cli(&cli) {
        Ok(sweep) => sweep,
        Err(e) => {
            print_startup_error(&e, cli.output_format);
            return startup_exit_code(&e);
        }
    };

    if cli.dry_run {
        return handle_dry_run(&sweep);
    }

    match sweep.run() {
        Ok(report) => {
            tracing::info!(
                processed = report.processed,
                failed = report.failed_archives(),
                unreadable = report.unreadable_folders(),
                duration_ms = report.duration.as_millis() as u64,
                "run finished"
            );
            report.exit_code()
        }
        Err(e) => {
            sweep.handle_error(&e);
            startup_exit_code(&e)
        }
    }
}

fn startup_exit_code(error: &ArchSweepError) -> i32 {
    match error {
        ArchSweepError::NoRoots => 3,
        _ => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "archsweep.toml".to_string());

    match ArchSweep::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  archsweep --config {}", config_path);
            println!("\nEdit the roots and folder names to match your archive tree.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(sweep: &ArchSweep) -> i32 {
    let formatter = sweep.output_formatter();

    formatter.info("DRY RUN MODE - No archives will be touched");
    formatter.print_separator();

    let config = sweep.config();
    formatter.info("Configuration that would be used:");
    if !formatter.is_quiet() {
        for root in &config.scan.roots {
            println!("  Root: {}", root.display());
        }
        println!("  Layout: {}", config.layout.mode);
        println!("  Destination folder: {}", config.layout.destination_dir);
        println!("  Backup folder: {}", config.layout.backup_dir);
        println!("  Tracked extensions: {}", config.flatten.tracked_extensions.join(", "));
        println!("  On collision: {}", config.flatten.on_collision);
    }

    match sweep.plan() {
        Ok(plan) => {
            formatter.print_plan(&plan);
            0
        }
        Err(e) => {
            sweep.handle_error(&e);
            startup_exit_code(&e)
        }
    }
}

fn print_startup_error(error: &ArchSweepError, mode: OutputMode) {
    let formatter = OutputFormatter::new(mode, 0, false);
    formatter.print_user_friendly_error(error);
}
