use heatmap::{load_and_aggregate, temperature_range, years, Config, CsvFile};
use miette::IntoDiagnostic;
use time::Month;
use tracing_subscriber::EnvFilter;

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut config = Config::from_env()?;
    if let Some(path) = std::env::args().nth(1) {
        config.data_path = path.into();
    }
    if let Some(cutoff_year) = std::env::args().nth(2) {
        config.cutoff_year = Some(cutoff_year.parse().into_diagnostic()?);
    }
    println!("opening {}", config.data_path.display());

    let source = CsvFile::new(&config.data_path);
    let aggregation = load_and_aggregate(&source, &config.aggregate_options())?;
    let mode = config.display_mode;

    println!("{}", mode.title());
    print!("{:>10}", "");
    let years = years(&aggregation.summaries);
    for year in &years {
        print!("{year:>7}");
    }
    println!();

    let mut month = Month::January;
    for _ in 0..12 {
        print!("{:>10}", month.to_string());
        for year in &years {
            match aggregation
                .summaries
                .iter()
                .find(|summary| summary.year == *year && summary.month == month)
            {
                Some(summary) => print!("{:>7.1}", mode.value(summary)),
                None => print!("{:>7}", "-"),
            }
        }
        println!();
        month = month.next();
    }

    if let Some(range) = temperature_range(&aggregation.summaries) {
        println!("Temperatures from {}°C to {}°C", range.start, range.end);
    }
    for skipped in &aggregation.skipped {
        println!("Skipped row {}: {}", skipped.index + 1, skipped.error);
    }
    println!(
        "{} months, {} rows skipped, {} rows before the cutoff",
        aggregation.summaries.len(),
        aggregation.skipped_count(),
        aggregation.excluded
    );

    Ok(())
}
