use thiserror::Error;
use tracing::debug;

use crate::{
    aggregate::{aggregate, AggregateOptions, Aggregation, MonthlySummary},
    display::DisplayMode,
    source::{DataSource, LoadError},
};

/// A surface drawing the year by month grid. It is handed the whole model
/// every time something changes and redraws from scratch.
pub trait Render {
    type Error;

    fn render(
        &mut self,
        summaries: &[MonthlySummary],
        mode: DisplayMode,
    ) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum PipelineError<E> {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("Rendering failed: {0}")]
    Render(E),
}

/// Loads every row from `source` and aggregates them. A failed load stops
/// here, nothing is aggregated from a partial load.
pub fn load_and_aggregate<S>(
    source: &S,
    options: &AggregateOptions,
) -> Result<Aggregation, LoadError>
where
    S: DataSource + ?Sized,
{
    let rows = source.load()?;
    Ok(aggregate(&rows, options))
}

/// The whole `load -> aggregate -> render` chain. The aggregation is given
/// back so the caller can redraw it later, in another mode for instance,
/// without loading again.
pub fn run<S, R>(
    source: &S,
    options: &AggregateOptions,
    mode: DisplayMode,
    surface: &mut R,
) -> Result<Aggregation, PipelineError<R::Error>>
where
    S: DataSource + ?Sized,
    R: Render,
{
    let aggregation = load_and_aggregate(source, options)?;
    debug!(mode = mode.title(), "rendering heatmap");
    surface
        .render(&aggregation.summaries, mode)
        .map_err(PipelineError::Render)?;
    Ok(aggregation)
}
