use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;

use turbo_eraser::app::App;
use turbo_eraser::cli::{self, CliArgs};
use turbo_eraser::config::{self, Settings};
use turbo_eraser::inpaint::CycleEvent;
use turbo_eraser::logging;

fn main() -> ExitCode {
    logging::init();
    let args = CliArgs::parse();
    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "turbo-eraser failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> anyhow::Result<ExitCode> {
    let mut settings = Settings::from_config(&config::load_app_config());
    args.apply_overrides(&mut settings);

    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("failed to read {}", args.image.display()))?;
    let mut app = App::from_settings(&settings);
    app.open_image_bytes(&bytes)
        .with_context(|| format!("failed to open {}", args.image.display()))?;

    let gestures = args.gestures();
    if cli::apply_gestures(&mut app, &gestures) == 0 {
        bail!("no gesture marked the mask; pass --rect, --ellipse, --lasso or --brush");
    }

    let events = cli::wait_until_idle(&mut app, cli::settle_budget(&settings));
    let applied = events
        .iter()
        .any(|event| matches!(event, CycleEvent::Applied { .. }));

    let png = app.export_png().context("failed to encode result")?;
    std::fs::write(&args.output, png)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!("{}", app.status());
    Ok(if applied {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
