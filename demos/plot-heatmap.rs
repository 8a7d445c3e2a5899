use heatmap::{
    run, temperature_range, years, ColorScheme, Config, CsvFile, DisplayMode, MonthlySummary,
    PipelineError, Render,
};
use miette::miette;
use plotters::prelude::*;
use tracing_subscriber::EnvFilter;

struct Heatmap {
    output: String,
    scheme: ColorScheme,
}

impl Heatmap {
    fn color(&self, t: f64) -> HSLColor {
        let t = t.clamp(0.0, 1.0);
        match self.scheme {
            // Light yellow for the coldest cells down to dark red for the hottest
            ColorScheme::YlOrRd => HSLColor((1.0 - t) * 55.0 / 360.0, 1.0, 0.85 - 0.5 * t),
            ColorScheme::Rainbow => HSLColor((1.0 - t) * 270.0 / 360.0, 1.0, 0.5),
        }
    }
}

impl Render for Heatmap {
    type Error = Box<dyn std::error::Error>;

    fn render(
        &mut self,
        summaries: &[MonthlySummary],
        mode: DisplayMode,
    ) -> Result<(), Self::Error> {
        let years = years(summaries);
        let (Some(first_year), Some(last_year)) = (years.first(), years.last()) else {
            return Err("nothing to draw".into());
        };
        let Some(domain) = temperature_range(summaries) else {
            return Err("nothing to draw".into());
        };
        let span = (domain.end - domain.start).max(f64::EPSILON);

        let root = BitMapBackend::new(&self.output, (1920, 1080)).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(mode.title(), ("sans-serif", 60).into_font())
            .margin(5)
            .x_label_area_size(80)
            .y_label_area_size(140)
            .build_cartesian_2d(*first_year as f64..(*last_year + 1) as f64, 0.0..12.0)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(years.len() + 1)
            .x_label_formatter(&|x| format!("{}", *x as i32))
            .y_labels(13)
            .y_label_formatter(&|y| {
                // January sits at the top of the grid
                let number = 12 - *y as u8;
                match time::Month::try_from(number) {
                    Ok(month) => month.to_string(),
                    Err(_) => String::new(),
                }
            })
            .draw()?;

        chart.draw_series(summaries.iter().map(|summary| {
            let x = summary.year as f64;
            let y = 12.0 - summary.month_number() as f64;
            let t = (mode.value(summary) - domain.start) / span;
            Rectangle::new(
                [(x + 0.05, y + 0.05), (x + 0.95, y + 0.95)],
                self.color(t).filled(),
            )
        }))?;

        // Sparklines of the daily series, drawn inside their cell
        for summary in summaries {
            let Some(range) = summary.daily_range() else {
                continue;
            };
            let height = (range.end - range.start).max(f64::EPSILON);
            let x = summary.year as f64;
            let y = 12.0 - summary.month_number() as f64;
            let point = |day: u8, value: f64| {
                (
                    x + 0.1 + 0.8 * (day as f64 - 1.0) / 30.0,
                    y + 0.1 + 0.8 * (value - range.start) / height,
                )
            };

            chart.draw_series(LineSeries::new(
                summary
                    .daily_points
                    .iter()
                    .map(|daily| point(daily.day, daily.max)),
                &BLACK,
            ))?;
            chart.draw_series(LineSeries::new(
                summary
                    .daily_points
                    .iter()
                    .map(|daily| point(daily.day, daily.min)),
                &BLUE,
            ))?;
        }

        root.present()?;
        println!("Wrote {}", self.output);
        Ok(())
    }
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut config = Config::from_env()?;
    if let Some(path) = std::env::args().nth(1) {
        config.data_path = path.into();
    }
    let source = CsvFile::new(&config.data_path);
    let mut heatmap = Heatmap {
        output: format!("{}.png", config.display_mode.title().to_lowercase().replace(' ', "-")),
        scheme: config.color_scheme,
    };

    let aggregation = match run(
        &source,
        &config.aggregate_options(),
        config.display_mode,
        &mut heatmap,
    ) {
        Ok(aggregation) => aggregation,
        Err(PipelineError::Load(e)) => return Err(e.into()),
        Err(PipelineError::Render(e)) => return Err(miette!("{e}")),
    };

    // Same model, other temperature
    let mode = config.display_mode.toggle();
    heatmap.output = format!("{}.png", mode.title().to_lowercase().replace(' ', "-"));
    heatmap
        .render(&aggregation.summaries, mode)
        .map_err(|e| miette!("{e}"))?;

    Ok(())
}
