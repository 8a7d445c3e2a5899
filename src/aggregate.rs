use std::{collections::BTreeMap, fmt, ops::Range};

use time::Month;
use tracing::{debug, info, warn};

use crate::record::{DailyRecord, RawRow, RecordError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Inclusive lower bound, years before it are left out of the output.
    pub cutoff_year: i32,
    pub include_daily_series: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            cutoff_year: i32::MIN,
            include_daily_series: false,
        }
    }
}

impl AggregateOptions {
    pub fn new(cutoff_year: i32) -> Self {
        Self {
            cutoff_year,
            ..Self::default()
        }
    }

    pub fn with_daily_series(mut self, include_daily_series: bool) -> Self {
        self.include_daily_series = include_daily_series;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyPoint {
    pub day: u8,
    pub min: f64,
    pub max: f64,
}

impl From<&DailyRecord> for DailyPoint {
    fn from(record: &DailyRecord) -> Self {
        Self {
            day: record.day(),
            min: record.min_temperature,
            max: record.max_temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: Month,
    pub min_temp: f64,
    pub max_temp: f64,
    // Sorted by day, empty unless the daily series was requested
    pub daily_points: Vec<DailyPoint>,
}

impl MonthlySummary {
    pub fn month_number(&self) -> u8 {
        u8::from(self.month)
    }

    /// Vertical domain of the sparkline: the lowest daily minimum up to the
    /// highest daily maximum. `None` without a daily series.
    pub fn daily_range(&self) -> Option<Range<f64>> {
        let low = self
            .daily_points
            .iter()
            .map(|point| point.min)
            .min_by(|left, right| left.total_cmp(right))?;
        let high = self
            .daily_points
            .iter()
            .map(|point| point.max)
            .max_by(|left, right| left.total_cmp(right))?;
        Some(low..high)
    }
}

impl fmt::Display for MonthlySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}: max {}°C, min {}°C",
            self.year, self.month, self.max_temp, self.min_temp
        )
    }
}

/// A row that was left out of the aggregation because it could not be
/// validated. `index` is the position of the row in the input.
#[derive(Debug)]
pub struct SkippedRow {
    pub index: usize,
    pub error: RecordError,
}

#[derive(Debug, Default)]
pub struct Aggregation {
    // Ordered by year, then by month
    pub summaries: Vec<MonthlySummary>,
    pub skipped: Vec<SkippedRow>,
    /// Valid rows dropped because their year is before the cutoff.
    pub excluded: usize,
}

impl Aggregation {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

struct MonthAccumulator {
    month: Month,
    min: f64,
    max: f64,
    points: Option<Vec<DailyPoint>>,
}

impl MonthAccumulator {
    fn new(record: &DailyRecord, keep_points: bool) -> Self {
        Self {
            month: record.month(),
            min: record.min_temperature,
            max: record.max_temperature,
            points: keep_points.then(|| vec![DailyPoint::from(record)]),
        }
    }

    fn update(&mut self, record: &DailyRecord) {
        self.min = f64::min(self.min, record.min_temperature);
        self.max = f64::max(self.max, record.max_temperature);
        if let Some(points) = &mut self.points {
            points.push(DailyPoint::from(record));
        }
    }

    fn into_summary(self, year: i32) -> MonthlySummary {
        let mut daily_points = self.points.unwrap_or_default();
        // Stable, so days recorded twice keep their input order
        daily_points.sort_by_key(|point| point.day);

        MonthlySummary {
            year,
            month: self.month,
            min_temp: self.min,
            max_temp: self.max,
            daily_points,
        }
    }
}

/// Groups raw CSV rows by year and month and reduces every group to its
/// min/max temperature.
///
/// Rows that fail validation never reach a group, they are reported in
/// [`Aggregation::skipped`] instead. A month made only of such rows is not
/// emitted.
pub fn aggregate<'a, I>(rows: I, options: &AggregateOptions) -> Aggregation
where
    I: IntoIterator<Item = &'a RawRow>,
{
    let mut skipped = Vec::new();
    let mut total = 0usize;

    let records = rows.into_iter().enumerate().filter_map(|(index, row)| {
        total += 1;
        match DailyRecord::parse(row) {
            Ok(record) => Some(record),
            Err(error) => {
                debug!(index, %error, "skipping malformed row");
                skipped.push(SkippedRow { index, error });
                None
            }
        }
    });
    let (summaries, excluded) = reduce(records, options);

    if !skipped.is_empty() {
        warn!(
            skipped = skipped.len(),
            "left malformed rows out of the aggregation"
        );
    }
    info!(
        rows = total,
        summaries = summaries.len(),
        skipped = skipped.len(),
        excluded,
        cutoff_year = options.cutoff_year,
        "aggregated daily temperatures"
    );

    Aggregation {
        summaries,
        skipped,
        excluded,
    }
}

/// Same as [`aggregate`] for records that are already validated.
pub fn aggregate_records<I>(records: I, options: &AggregateOptions) -> Aggregation
where
    I: IntoIterator<Item = DailyRecord>,
{
    let (summaries, excluded) = reduce(records.into_iter(), options);
    info!(
        summaries = summaries.len(),
        excluded,
        cutoff_year = options.cutoff_year,
        "aggregated daily temperatures"
    );

    Aggregation {
        summaries,
        skipped: Vec::new(),
        excluded,
    }
}

fn reduce(
    records: impl Iterator<Item = DailyRecord>,
    options: &AggregateOptions,
) -> (Vec<MonthlySummary>, usize) {
    let mut years: BTreeMap<i32, BTreeMap<u8, MonthAccumulator>> = BTreeMap::new();
    let mut excluded = 0;

    for record in records {
        if record.year() < options.cutoff_year {
            excluded += 1;
            continue;
        }

        years
            .entry(record.year())
            .or_default()
            .entry(u8::from(record.month()))
            .and_modify(|month| month.update(&record))
            .or_insert_with(|| MonthAccumulator::new(&record, options.include_daily_series));
    }

    let summaries = years
        .into_iter()
        .flat_map(|(year, months)| {
            months
                .into_values()
                .map(move |month| month.into_summary(year))
        })
        .collect();

    (summaries, excluded)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn row(date: &str, min: &str, max: &str) -> RawRow {
        RawRow::new(date, min, max)
    }

    fn sample() -> Vec<RawRow> {
        vec![
            row("1996-12-31", "-4", "3"),
            row("2009-01-03", "5", "10"),
            row("2009-01-01", "2", "12"),
            row("2009-01-02", "8", "9"),
            row("2009-02-14", "-1.5", "6"),
            row("2010-07-20", "18", "31"),
            row("2010-07-04", "16", "29.5"),
            row("2003-06-10", "14", "25"),
        ]
    }

    #[test]
    fn reduces_a_single_month() {
        let rows = vec![
            row("2009-01-03", "5", "10"),
            row("2009-01-01", "2", "12"),
            row("2009-01-02", "8", "9"),
        ];
        let aggregation = aggregate(&rows, &AggregateOptions::new(2000));

        assert_eq!(
            aggregation.summaries,
            vec![MonthlySummary {
                year: 2009,
                month: Month::January,
                min_temp: 2.0,
                max_temp: 12.0,
                daily_points: Vec::new(),
            }]
        );
        assert_eq!(aggregation.skipped_count(), 0);
    }

    #[test]
    fn drops_years_before_the_cutoff() {
        let rows = vec![row("1990-06-15", "10", "20"), row("2000-06-15", "12", "22")];
        let aggregation = aggregate(&rows, &AggregateOptions::new(1997));

        assert_eq!(aggregation.summaries.len(), 1);
        assert_eq!(aggregation.summaries[0].year, 2000);
        assert_eq!(aggregation.summaries[0].month, Month::June);
        assert_eq!(aggregation.excluded, 1);
        assert_eq!(aggregation.skipped_count(), 0);
    }

    #[test]
    fn cutoff_is_inclusive() {
        let rows = vec![row("1997-01-01", "1", "2")];
        assert_eq!(aggregate(&rows, &AggregateOptions::new(1997)).summaries.len(), 1);
        assert!(aggregate(&rows, &AggregateOptions::new(1998)).is_empty());
    }

    #[test]
    fn malformed_rows_are_counted_not_aggregated() {
        let rows = vec![
            row("2009-01-01", "2", "12"),
            row("2009-01-02", "abc", "40"),
            row("2009-03-01", "1", "NaN"),
        ];
        let aggregation = aggregate(&rows, &AggregateOptions::default());

        // The bad maximum of 40 never reaches January and March is gone
        assert_eq!(aggregation.summaries.len(), 1);
        assert_eq!(aggregation.summaries[0].max_temp, 12.0);
        assert_eq!(aggregation.skipped_count(), 2);
        assert_eq!(
            aggregation
                .skipped
                .iter()
                .map(|skipped| skipped.index)
                .collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn bad_dates_never_land_in_a_group() {
        let rows = vec![row("", "1", "2"), row("2009-02-30", "1", "2")];
        let aggregation = aggregate(&rows, &AggregateOptions::default());

        assert!(aggregation.is_empty());
        assert_eq!(aggregation.skipped_count(), 2);
        assert!(matches!(
            aggregation.skipped[0].error,
            RecordError::BadDate(_)
        ));
        assert!(matches!(
            aggregation.skipped[1].error,
            RecordError::InvalidDate(_)
        ));
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let options = AggregateOptions::new(2000).with_daily_series(true);
        let aggregation = aggregate(&Vec::<RawRow>::new(), &options);
        assert!(aggregation.is_empty());
        assert_eq!(aggregation.skipped_count(), 0);
        assert_eq!(aggregation.excluded, 0);
    }

    #[test]
    fn summaries_are_ordered_by_year_then_month() {
        let aggregation = aggregate(&sample(), &AggregateOptions::default());
        let keys: Vec<_> = aggregation
            .summaries
            .iter()
            .map(|summary| (summary.year, summary.month_number()))
            .collect();

        assert_eq!(
            keys,
            vec![(1996, 12), (2003, 6), (2009, 1), (2009, 2), (2010, 7)]
        );
    }

    #[test]
    fn one_summary_per_distinct_month() {
        let rows = sample();
        let expected: BTreeSet<_> = rows
            .iter()
            .map(|row| {
                let record = DailyRecord::parse(row).unwrap();
                (record.year(), u8::from(record.month()))
            })
            .collect();
        let aggregation = aggregate(&rows, &AggregateOptions::default());

        assert_eq!(aggregation.summaries.len(), expected.len());
        let produced: BTreeSet<_> = aggregation
            .summaries
            .iter()
            .map(|summary| (summary.year, summary.month_number()))
            .collect();
        assert_eq!(produced, expected);
    }

    #[test]
    fn min_never_exceeds_max() {
        let aggregation = aggregate(&sample(), &AggregateOptions::default());
        for summary in &aggregation.summaries {
            assert!(summary.min_temp <= summary.max_temp, "{summary}");
        }
    }

    #[test]
    fn raising_the_cutoff_only_removes_summaries() {
        let rows = sample();
        let mut previous: Option<Vec<MonthlySummary>> = None;

        for cutoff_year in 1990..=2012 {
            let summaries = aggregate(&rows, &AggregateOptions::new(cutoff_year)).summaries;
            assert!(summaries.iter().all(|summary| summary.year >= cutoff_year));
            if let Some(previous) = &previous {
                assert!(summaries.len() <= previous.len());
                assert!(summaries.iter().all(|summary| previous.contains(summary)));
            }
            previous = Some(summaries);
        }
    }

    #[test]
    fn daily_series_is_sorted_by_day() {
        let options = AggregateOptions::new(2000).with_daily_series(true);
        let aggregation = aggregate(&sample(), &options);
        let january = &aggregation.summaries[1];
        assert_eq!(january.month, Month::January);
        assert_eq!(
            january.daily_points,
            vec![
                DailyPoint { day: 1, min: 2.0, max: 12.0 },
                DailyPoint { day: 2, min: 8.0, max: 9.0 },
                DailyPoint { day: 3, min: 5.0, max: 10.0 },
            ]
        );
        assert_eq!(january.daily_range(), Some(2.0..12.0));

        let july = &aggregation.summaries[3];
        assert_eq!(
            july.daily_points.iter().map(|point| point.day).collect::<Vec<_>>(),
            vec![4, 20]
        );
    }

    #[test]
    fn daily_series_keeps_one_point_per_valid_record() {
        let rows = vec![
            row("2011-05-02", "7", "15"),
            row("2011-05-01", "6", "14"),
            row("2011-05-02", "5", "16"),
            row("2011-05-03", "oops", "16"),
        ];
        let aggregation = aggregate(&rows, &AggregateOptions::default().with_daily_series(true));
        let may = &aggregation.summaries[0];

        assert_eq!(may.daily_points.len(), 3);
        assert!(may
            .daily_points
            .windows(2)
            .all(|pair| pair[0].day <= pair[1].day));
        // Duplicate days stay in input order
        assert_eq!(may.daily_points[1].min, 7.0);
        assert_eq!(may.daily_points[2].min, 5.0);
    }

    #[test]
    fn no_daily_series_unless_requested() {
        let aggregation = aggregate(&sample(), &AggregateOptions::default());
        assert!(aggregation
            .summaries
            .iter()
            .all(|summary| summary.daily_points.is_empty() && summary.daily_range().is_none()));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let rows = sample();
        let options = AggregateOptions::new(2000).with_daily_series(true);
        let first = aggregate(&rows, &options);
        let second = aggregate(&rows, &options);

        assert_eq!(first.summaries, second.summaries);
        assert_eq!(first.skipped_count(), second.skipped_count());
        assert_eq!(first.excluded, second.excluded);
    }

    #[test]
    fn aggregates_validated_records() {
        let records = sample()
            .iter()
            .map(|row| DailyRecord::parse(row).unwrap())
            .collect::<Vec<_>>();
        let from_records = aggregate_records(records, &AggregateOptions::new(2005));
        let from_rows = aggregate(&sample(), &AggregateOptions::new(2005));

        assert_eq!(from_records.summaries, from_rows.summaries);
        assert_eq!(from_records.excluded, 2);
    }

    #[test]
    fn tooltip_text() {
        let aggregation = aggregate(&sample(), &AggregateOptions::new(2009));
        assert_eq!(
            aggregation.summaries[0].to_string(),
            "2009-January: max 12°C, min 2°C"
        );
    }
}
