//! Static Chart Renderer
//! Draws the weekly standardized-index trend per earnings group to a PNG.
//!
//! Layout:
//! 1. Caption centered at the top
//! 2. One line per group (low earnings blue, high earnings orange)
//! 3. Vertical black marker at the event date
//! 4. Legend in the upper-left corner

use crate::data::FinalRecord;
use crate::stats::StatsCalculator;
use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

// Colors
const BLUE: RGBColor = RGBColor(91, 155, 213); // Low earnings (control)
const ORANGE: RGBColor = RGBColor(237, 125, 49); // High earnings (treatment)

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("No data to plot")]
    NoData,
    #[error("Failed to draw chart: {0}")]
    Draw(String),
}

/// Weekly mean standardized index for one earnings group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSeries {
    pub high_earnings: bool,
    pub points: Vec<(NaiveDate, f64)>,
}

impl GroupSeries {
    pub fn label(&self) -> &'static str {
        if self.high_earnings {
            "High earnings"
        } else {
            "Low earnings"
        }
    }
}

/// Everything the trend chart needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub series: Vec<GroupSeries>,
    pub event_date: NaiveDate,
}

impl ChartData {
    /// Average the standardized index per week within each earnings group.
    pub fn from_records(records: &[FinalRecord], event_date: NaiveDate) -> Self {
        let mut by_group: BTreeMap<(bool, NaiveDate), Vec<f64>> = BTreeMap::new();
        for record in records {
            by_group
                .entry((record.high_earnings, record.week_start))
                .or_default()
                .push(record.standardized_index);
        }

        let series = [false, true]
            .into_iter()
            .map(|high_earnings| GroupSeries {
                high_earnings,
                points: by_group
                    .iter()
                    .filter(|((high, _), _)| *high == high_earnings)
                    .map(|((_, week), values)| {
                        (*week, StatsCalculator::compute_descriptive_stats(values).mean)
                    })
                    .collect(),
            })
            .filter(|s| !s.points.is_empty())
            .collect();

        Self { series, event_date }
    }

    fn x_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|(d, _)| *d))
            .chain(std::iter::once(self.event_date));
        let min = dates.clone().min()?;
        let max = dates.max()?;
        Some((min, max))
    }

    fn y_range(&self) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for (_, v) in self.series.iter().flat_map(|s| s.points.iter()) {
            if v.is_finite() {
                min = min.min(*v);
                max = max.max(*v);
            }
        }
        if min.is_infinite() {
            return (-1.0, 1.0);
        }
        let pad = ((max - min) * 0.15).max(0.1);
        (min - pad, max + pad)
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the trend chart as a PNG at `path`.
    pub fn render_trend_png(
        data: &ChartData,
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), ChartError> {
        if data.series.is_empty() {
            return Err(ChartError::NoData);
        }
        let (first, last) = data.x_range().ok_or(ChartError::NoData)?;
        let (y_min, y_max) = data.y_range();

        // X axis is days since the first plotted week.
        let to_x = |date: NaiveDate| (date - first).num_days() as f64;
        let x_max = to_x(last).max(1.0);
        let label_date = |x: &f64| (first + Duration::days(x.round() as i64)).to_string();

        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "Standardized search interest by earnings group",
                ("sans-serif", 24),
            )
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..x_max, y_min..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc("Week")
            .y_desc("Mean standardized index")
            .x_labels(8)
            .x_label_formatter(&label_date)
            .y_label_formatter(&|y| format!("{:.2}", y))
            .draw()
            .map_err(draw_err)?;

        for series in &data.series {
            let color = if series.high_earnings { ORANGE } else { BLUE };
            chart
                .draw_series(LineSeries::new(
                    series.points.iter().map(|(d, v)| (to_x(*d), *v)),
                    color.stroke_width(2),
                ))
                .map_err(draw_err)?
                .label(series.label())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }

        let event_x = to_x(data.event_date);
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(event_x, y_min), (event_x, y_max)],
                BLACK.stroke_width(2),
            )))
            .map_err(draw_err)?
            .label(format!("Scorecard release ({})", data.event_date))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(2)));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        Ok(())
    }
}

fn draw_err<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::Draw(err.to_string())
}
