use clap::Parser;
use jobpilot::config::cli::{clean_titles, Command};
use jobpilot::core::drafting::TemplateDrafter;
use jobpilot::core::export::export_csv_file;
use jobpilot::utils::logger;
use jobpilot::{
    AppContext, CancellationFlag, CanonicalListing, CliConfig, DraftRequest, Drafter,
    JobPilotError, ListingStore, Orchestrator, RunSummary, TitleStatus,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting jobpilot");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ jobpilot failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        std::process::exit(e.exit_code());
    }
}

async fn run(cli: CliConfig) -> Result<(), JobPilotError> {
    let ctx = AppContext::init(cli.app_config()?)?;

    match cli.command {
        Command::Search { titles, location } => {
            let titles = clean_titles(&titles);
            if titles.is_empty() {
                return Err(JobPilotError::ValidationError {
                    message: "at least one job title is required".to_string(),
                });
            }
            let location =
                location.unwrap_or_else(|| ctx.config.search.default_location.clone());

            // 先檢查憑證再開資料庫，兩者都是致命錯誤
            let source = ctx.listing_source()?;
            let store = ctx.open_store()?;

            let cancellation = CancellationFlag::new();
            let on_signal = cancellation.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("🛑 Interrupt received, stopping after the current title");
                    on_signal.cancel();
                }
            });

            let orchestrator =
                Orchestrator::new(source, store, ctx.config.search.default_location.clone())
                    .with_cancellation(cancellation);

            let summary = orchestrator.run(titles.as_slice(), &location).await;
            print_summary(&summary);
            println!(
                "📊 Number of jobs in the database: {}",
                orchestrator.store().count()?
            );
        }
        Command::List => {
            let listings = ctx.open_store()?.all()?;
            if listings.is_empty() {
                println!("No jobs stored yet. Run `jobpilot search` first.");
            }
            for (position, listing) in listings.iter().enumerate() {
                print_listing(position + 1, listing);
            }
        }
        Command::Count => {
            println!(
                "📊 Number of jobs in the database: {}",
                ctx.open_store()?.count()?
            );
        }
        Command::Export { out } => {
            let listings = ctx.open_store()?.all()?;
            let written = export_csv_file(&listings, &out)?;
            println!("✅ Exported {} jobs to {}", written, out.display());
        }
        Command::Draft {
            index,
            resume,
            llm,
            out,
        } => {
            let listings = ctx.open_store()?.all()?;
            let listing = index
                .checked_sub(1)
                .and_then(|i| listings.get(i))
                .ok_or_else(|| JobPilotError::ValidationError {
                    message: format!(
                        "no stored listing at position {} ({} stored)",
                        index,
                        listings.len()
                    ),
                })?;

            let resume_text = std::fs::read_to_string(&resume)?;
            let request = DraftRequest::from_listing(listing, resume_text);

            let letter = if llm {
                ctx.chat_drafter()?.draft(&request).await?
            } else {
                TemplateDrafter::new().draft(&request).await?
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, &letter)?;
                    println!("📄 Cover letter saved to {}", path.display());
                }
                None => println!("{}", letter),
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("🎉 Found {} jobs ({} saved)", summary.total, summary.saved_total());
    for report in &summary.titles {
        let line = match &report.status {
            TitleStatus::Saved { count } => format!("✅ {}: {} saved", report.title, count),
            TitleStatus::NoResults => format!("❌ {}: no listings found", report.title),
            TitleStatus::FetchFailed { reason } => {
                format!("🚨 {}: fetch failed ({})", report.title, reason)
            }
            TitleStatus::NotPersisted { count, reason } => format!(
                "⚠️ {}: {} fetched but not saved ({})",
                report.title, count, reason
            ),
            TitleStatus::Skipped { reason } => {
                format!("⚠️ '{}': skipped ({})", report.title, reason)
            }
        };
        println!("{}", line);
    }
    if summary.cancelled {
        println!("🛑 Run was cancelled before all titles were searched");
    }
}

fn print_listing(position: usize, listing: &CanonicalListing) {
    let salary = match (listing.salary_min, listing.salary_max) {
        (Some(min), Some(max)) => format!("£{:.0} - £{:.0}", min, max),
        (Some(min), None) => format!("from £{:.0}", min),
        (None, Some(max)) => format!("up to £{:.0}", max),
        (None, None) => "not listed".to_string(),
    };

    println!("[{}] {} ({})", position, listing.title, listing.job_title);
    println!("    Company:  {}", listing.company);
    println!("    Location: {}", listing.location);
    println!("    Salary:   {}", salary);
    if let Some(posted_at) = &listing.posted_at {
        println!("    Posted:   {}", posted_at);
    }
    println!("    Apply:    {}", listing.apply_link);
}
