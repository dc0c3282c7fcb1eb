//! Manual bug reporting from the command line.

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use bugboard::report::ReportSink;
use bugboard::{BugBoardClient, BugReport, ClientConfig};

/// Submit a single report and print the board's identifier and URL.
pub async fn cmd_report(
    config: ClientConfig,
    input: &str,
    logs: &str,
    error: Option<&str>,
) -> Result<()> {
    let logs = if logs == "-" {
        read_stdin().await.context("Failed to read logs from stdin")?
    } else {
        logs.to_string()
    };

    let mut report = BugReport::new(input, logs);
    if let Some(error) = error {
        report = report.with_error(error);
    }

    let client = BugBoardClient::new(config);
    let submitted = client
        .submit(&report)
        .await
        .context("Failed to submit bug report")?;

    println!(
        "{} {}",
        console::style("Reported bug").green().bold(),
        submitted.id
    );
    println!("  {}", console::style(&submitted.url).dim());
    Ok(())
}

async fn read_stdin() -> std::io::Result<String> {
    let mut buf = String::new();
    tokio::io::stdin().read_to_string(&mut buf).await?;
    Ok(buf)
}
