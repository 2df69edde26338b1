//! Line-chart configuration for a product's price history.
//!
//! The shape mirrors what the charting widget on the detail page expects:
//! one label per history record and two datasets, current and original price.

use serde::Serialize;

use crate::model::PriceHistory;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriceChart {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: ChartData,
    pub options: ChartOptions,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Series>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Series {
    pub label: &'static str,
    pub data: Vec<i64>,
    #[serde(rename = "borderColor")]
    pub border_color: &'static str,
    pub fill: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartOptions {
    pub legend: Legend,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Legend {
    pub display: bool,
}

impl PriceChart {
    pub fn from_histories(histories: &[PriceHistory]) -> Self {
        let labels = histories.iter().map(|h| h.update_time.to_rfc3339()).collect();
        let current = histories.iter().map(|h| h.current_price).collect();
        let original = histories.iter().map(|h| h.original_price).collect();

        Self {
            kind: "line",
            data: ChartData {
                labels,
                datasets: vec![
                    Series {
                        label: "Current Price",
                        data: current,
                        border_color: "red",
                        fill: false,
                    },
                    Series {
                        label: "Original Price",
                        data: original,
                        border_color: "green",
                        fill: false,
                    },
                ],
            },
            options: ChartOptions {
                legend: Legend { display: false },
            },
        }
    }

    pub fn current(&self) -> &Series {
        &self.data.datasets[0]
    }

    pub fn original(&self) -> &Series {
        &self.data.datasets[1]
    }

    /// Rows of (label, current, original) for plain-text output.
    pub fn points(&self) -> impl Iterator<Item = (&str, i64, i64)> + '_ {
        self.data
            .labels
            .iter()
            .zip(self.current().data.iter())
            .zip(self.original().data.iter())
            .map(|((label, current), original)| (label.as_str(), *current, *original))
    }
}
