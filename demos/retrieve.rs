use heatmap::{load_and_aggregate, read_rows, AggregateOptions, DataSource, LoadError, RawRow};
use miette::IntoDiagnostic;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Temperature CSV served over HTTP.
struct HttpCsv {
    url: String,
}

impl DataSource for HttpCsv {
    fn load(&self) -> Result<Vec<RawRow>, LoadError> {
        info!(url = %self.url, "fetching temperature data");
        let response = ureq::get(&self.url)
            .call()
            .map_err(|e| LoadError::Io(std::io::Error::other(e.to_string())))?;
        read_rows(response.into_reader())
    }
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let url = std::env::args().nth(1).ok_or_else(|| miette::miette!("Missing url"))?;
    let output = std::env::args()
        .nth(2)
        .unwrap_or_else(|| String::from("temperature_daily.csv"));
    let source = HttpCsv { url };

    let rows = source.load()?;
    let mut writer = csv::Writer::from_path(&output).into_diagnostic()?;
    writer
        .write_record(["date", "min_temperature", "max_temperature"])
        .into_diagnostic()?;
    for row in &rows {
        writer
            .write_record([&row.date, &row.min_temperature, &row.max_temperature])
            .into_diagnostic()?;
    }
    writer.flush().into_diagnostic()?;
    println!("Wrote {} rows to {output}", rows.len());

    // Check the download before anyone renders it
    let aggregation = load_and_aggregate(&rows, &AggregateOptions::default())?;
    if aggregation.skipped_count() > 0 {
        warn!(
            skipped = aggregation.skipped_count(),
            "downloaded data has malformed rows"
        );
    }
    println!("{} months of data", aggregation.summaries.len());

    Ok(())
}
