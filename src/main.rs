use clap::Parser;
use file_service_importer::utils::{logger, validation::Validate};
use file_service_importer::{AnyStore, CliArgs, Importer, ImporterConfig, ImporterError};

async fn run(args: &CliArgs) -> Result<(), ImporterError> {
    let mut config = ImporterConfig::from_file(&args.config)?;
    args.apply_overrides(&mut config);
    config.validate()?;
    tracing::debug!("Importer config: {:?}", config);

    let store = AnyStore::from_settings(&config.store).await?;
    let importer = Importer::new(store, config);

    if args.dry_run {
        let plan = importer.dry_run().await?;
        tracing::info!(
            "Dry run: {} of {} candidate(s) would be processed",
            plan.files.len(),
            plan.candidates
        );
        return Ok(());
    }

    let summary = importer.run().await?;
    tracing::info!(
        "✅ Import finished: {} file(s), {} row(s) written",
        summary.files_written(),
        summary.rows_written()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    if let Err(e) = run(&args).await {
        tracing::error!("❌ Import failed: {} (Category: {:?})", e, e.category());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }
}
