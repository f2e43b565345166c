use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stargazer::browser::profiles::ProfileManager;
use stargazer::browser::{LaunchOptions, Session};
use stargazer::cli::Cli;
use stargazer::config::Config;
use stargazer::listing::{self, RepoListing};
use stargazer::sweep::{self, DryRun, SweepReport};
use stargazer::theme as t;
use stargazer::Error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    t::init_color(cli.no_color);

    let default_filter = if cli.verbose {
        "stargazer=debug"
    } else {
        "stargazer=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(cli.config_path())?;
    cli.apply_overrides(&mut config);

    let report = run(&config, cli.dry_run).await?;
    print_summary(&report, cli.dry_run);

    Ok(())
}

/// One run: acquire the saved session, sweep the listing, release the
/// browser regardless of outcome.
async fn run(config: &Config, dry_run: bool) -> Result<SweepReport> {
    let profiles = ProfileManager::new(ProfileManager::default_base_dir());
    let profile = profiles.ensure(&config.profile_name())?;
    profiles.touch(&profile.name)?;

    println!("{}", t::label_value("Target", &config.url));
    println!("{}", t::label_value("Profile", &profile.name));

    let spinner = t::spinner("Launching browser…");
    let launched = Session::launch(&LaunchOptions {
        user_data_dir: profile.data_dir.clone(),
        headless: config.headless,
        window: (config.window_width, config.window_height),
    })
    .await;
    spinner.finish_and_clear();
    let session = launched?;

    let outcome = sweep_listing(&session, config, dry_run).await;
    session.close().await;
    Ok(outcome?)
}

async fn sweep_listing(
    session: &Session,
    config: &Config,
    dry_run: bool,
) -> Result<SweepReport, Error> {
    session.goto(&config.url, config.nav_timeout()).await?;
    // Give dynamically loaded rows a moment before probing for them.
    tokio::time::sleep(config.settle()).await;
    session
        .wait_for_element(listing::LIST_SELECTOR, config.nav_timeout())
        .await?;

    let source = RepoListing::new(session.page(), config.settle());
    if dry_run {
        sweep::run(&mut DryRun(source), config.delay()).await
    } else {
        let mut source = source;
        sweep::run(&mut source, config.delay()).await
    }
}

fn print_summary(report: &SweepReport, dry_run: bool) {
    let verb = if dry_run { "Would star" } else { "Starred" };
    for id in &report.acted {
        println!("{}", t::icon_ok(&format!("{verb} {id}")));
    }
    for id in &report.skipped {
        println!("{}", t::icon_muted(&format!("{id} already starred")));
    }
    for (id, err) in &report.failed {
        println!("{}", t::icon_fail(&format!("{id}: {err}")));
    }

    println!();
    println!(
        "{}",
        t::accent(&format!(
            "Done: {} starred, {} already starred, {} failed ({} passes)",
            report.acted.len(),
            report.skipped.len(),
            report.failed.len(),
            report.passes
        ))
    );
    if !report.is_clean() {
        println!(
            "{}",
            t::muted("Failed rows keep their unstarred marker; rerun to pick them up.")
        );
    }
}
