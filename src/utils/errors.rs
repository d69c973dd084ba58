use thiserror::Error;

/// Errors from loading or rendering the returns chart
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Returns file not found: {0}")]
    FileNotFound(String),
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row {row}: invalid DATE '{value}'")]
    InvalidDate { row: usize, value: String },
    #[error("Row {row}: invalid Returns '{value}'")]
    InvalidReturn { row: usize, value: String },
    #[error("No data points to render")]
    NoData,
    #[error("Failed to render chart: {0}")]
    Render(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the plotting call for returns-graph figures
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("Invalid figure: {0}")]
    InvalidFigure(String),
    #[error("Figure has no plottable traces")]
    EmptyFigure,
    #[error("Failed to render plot: {0}")]
    Render(String),
}

/// Errors raised by a success handler while applying a fragment
#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("Response body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error(transparent)]
    Plot(#[from] PlotError),
}
