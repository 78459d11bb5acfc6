use std::fmt;

/// Contingency counts produced by hypothesis-based measures.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HypothesisCounts {
    pub tp: u64,
    pub fp: u64,
    pub tn: u64,
    pub fn_: u64,
}

impl HypothesisCounts {
    pub fn new(tp: u64, fp: u64, tn: u64, fn_: u64) -> Self {
        Self { tp, fp, tn, fn_ }
    }

    pub fn render(&self) -> String {
        format!(
            "TP: {}\nFP: {}\nTN: {}\nFN: {}",
            self.tp, self.fp, self.tn, self.fn_
        )
    }
}

/// Result of one measure evaluation. The framework passes it through untouched;
/// each measure decides its own shape.
#[cfg_attr(
    feature = "serde-full",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", content = "value", rename_all = "snake_case")
)]
#[derive(Clone, Debug, PartialEq)]
pub enum MeasureValue {
    Scalar(f64),
    AvgWithStdev { avg: f64, stdev: f64 },
    Histogram(Vec<f64>),
    Counts(HypothesisCounts),
    Text(String),
}

impl MeasureValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            MeasureValue::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_histogram(&self) -> Option<&[f64]> {
        match self {
            MeasureValue::Histogram(bins) => Some(bins),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MeasureValue::Scalar(_) => "scalar",
            MeasureValue::AvgWithStdev { .. } => "avg_with_stdev",
            MeasureValue::Histogram(_) => "histogram",
            MeasureValue::Counts(_) => "counts",
            MeasureValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for MeasureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureValue::Scalar(value) => write!(f, "{value}"),
            MeasureValue::AvgWithStdev { avg, stdev } => write!(f, "{avg} (stdev {stdev})"),
            MeasureValue::Histogram(bins) => {
                let rendered: Vec<String> = bins.iter().map(|bin| bin.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            MeasureValue::Counts(counts) => f.write_str(&counts.render()),
            MeasureValue::Text(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_render_one_line_per_cell() {
        let counts = HypothesisCounts::new(4, 1, 10, 2);
        assert_eq!(counts.render(), "TP: 4\nFP: 1\nTN: 10\nFN: 2");
        assert_eq!(MeasureValue::Counts(counts).to_string(), counts.render());
    }

    #[test]
    fn display_covers_each_shape() {
        assert_eq!(MeasureValue::Scalar(1.5).to_string(), "1.5");
        assert_eq!(
            MeasureValue::Histogram(vec![1.0, 2.0]).to_string(),
            "[1, 2]"
        );
        assert_eq!(
            MeasureValue::AvgWithStdev {
                avg: 2.0,
                stdev: 0.5
            }
            .to_string(),
            "2 (stdev 0.5)"
        );
        assert_eq!(MeasureValue::Text("ok".into()).kind(), "text");
    }
}
