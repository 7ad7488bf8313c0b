//! Charts module - Chart rendering

mod renderer;

pub use renderer::{ChartData, ChartError, GroupSeries, StaticChartRenderer};
