use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use offer_autofill::binding;
use offer_autofill::{Autofill, AutofillConfig, Error, FieldReport, FillOutcome, RunReport, Session};

#[derive(Parser)]
#[command(
    name = "offer-autofill",
    version,
    about = "Switch offer-form currency widgets and fill the form from a workbook"
)]
struct Cli {
    /// Workbook holding the offer numbers (first sheet is read)
    #[arg(long, required_unless_present = "currency_only")]
    workbook: Option<PathBuf>,

    /// Remote debugging URL of the already-running browser
    #[arg(long, default_value = "http://127.0.0.1:9222")]
    cdp_url: String,

    /// Currency code to switch every widget to
    #[arg(long, default_value = "INR")]
    currency: String,

    /// Run the currency pass only
    #[arg(long, conflicts_with = "fill_only")]
    currency_only: bool,

    /// Fill fields only, skip the currency pass
    #[arg(long)]
    fill_only: bool,

    /// Print the run report as JSON instead of the summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> offer_autofill::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "offer_autofill=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AutofillConfig::builder()
        .cdp_url(cli.cdp_url)
        .target_currency(cli.currency)
        .build();

    let session = Session::attach(&config).await?;
    let page = session.active_page().await?;
    if let Ok(url) = page.url().await {
        info!(%url, "attached to page");
    }

    let bindings = binding::offer_bindings();
    let autofill = Autofill::new(config);

    let report = if cli.currency_only {
        RunReport {
            currency: Some(autofill.switch_currencies(&page).await?),
            fields: Vec::new(),
        }
    } else {
        let Some(workbook) = cli.workbook.as_deref() else {
            // clap enforces this; keep a hard error rather than a panic.
            return Err(Error::Workbook("--workbook is required".into()));
        };
        if cli.fill_only {
            RunReport {
                currency: None,
                fields: autofill.fill_fields(&page, workbook, &bindings).await?,
            }
        } else {
            autofill.run(&page, workbook, &bindings).await?
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| Error::JsError(e.to_string()))?;
        println!("{json}");
        return Ok(());
    }

    for (n, field) in report.fields.iter().enumerate() {
        println!("[{:2}] {}: {}", n + 1, field.label, outcome_line(field));
    }
    if let Some(currency) = &report.currency {
        println!(
            "Currency change: {}/{} widgets switched",
            currency.changed, currency.attempted
        );
    }
    if !report.fields.is_empty() {
        println!(
            "Data entry: {}/{} fields filled",
            report.filled(),
            report.total()
        );
    }
    Ok(())
}

fn outcome_line(field: &FieldReport) -> String {
    match &field.outcome {
        FillOutcome::Filled(_) => format!("{} ok", field.value),
        FillOutcome::SkippedEmpty => "(empty)".into(),
        FillOutcome::NotFound => format!("{} - no matching field", field.value),
        FillOutcome::ResolveFailed(reason) => {
            format!("{} - resolve failed: {reason}", field.value)
        }
        FillOutcome::Failed { primary, .. } => format!("{} - failed: {primary}", field.value),
    }
}
