use std::{collections::BTreeSet, ops::Range, str::FromStr};

use crate::aggregate::{DailyPoint, MonthlySummary};

/// Which of the two temperatures a renderer colours the grid with. The
/// aggregation itself never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Max,
    Min,
}

impl DisplayMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Max => Self::Min,
            Self::Min => Self::Max,
        }
    }

    pub fn value(self, summary: &MonthlySummary) -> f64 {
        match self {
            Self::Max => summary.max_temp,
            Self::Min => summary.min_temp,
        }
    }

    pub fn point_value(self, point: &DailyPoint) -> f64 {
        match self {
            Self::Max => point.max,
            Self::Min => point.min,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Max => "Max Temperature",
            Self::Min => "Min Temperature",
        }
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            _ => Err(format!("Unknown display mode {s}. Expecting `max` or `min`")),
        }
    }
}

/// Colour and legend domain: the coldest minimum up to the hottest maximum
/// of the whole grid, whatever the display mode.
pub fn temperature_range(summaries: &[MonthlySummary]) -> Option<Range<f64>> {
    let low = summaries
        .iter()
        .map(|summary| summary.min_temp)
        .min_by(|left, right| left.total_cmp(right))?;
    let high = summaries
        .iter()
        .map(|summary| summary.max_temp)
        .max_by(|left, right| left.total_cmp(right))?;
    Some(low..high)
}

/// Distinct years, ascending. One heatmap column each.
pub fn years(summaries: &[MonthlySummary]) -> Vec<i32> {
    summaries
        .iter()
        .map(|summary| summary.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
