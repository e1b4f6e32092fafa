use crate::models::{
    Metric, MetricClass, MetricSummary, MetricValue, Metrics, METRIC_COUNT,
};

/// Running mean that ignores missing values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    pub fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            self.sum += v;
            self.count += 1;
        }
    }

    pub fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Sum for additive metrics, mean-of-non-null for rates.
#[derive(Debug, Clone, Default)]
pub struct MetricAccumulator {
    totals: [f64; METRIC_COUNT],
    means: [Mean; METRIC_COUNT],
    rows: usize,
}

impl MetricAccumulator {
    pub fn push(&mut self, metrics: &Metrics) {
        for metric in Metric::ALL {
            let i = metric.index();
            match metric.class() {
                MetricClass::Additive => self.totals[i] += metrics.get(metric).unwrap_or(0.0),
                MetricClass::Rate => self.means[i].push(metrics.get(metric)),
            }
        }
        self.rows += 1;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(&self) -> MetricSummary {
        let mut values = [MetricValue::Missing; METRIC_COUNT];
        for metric in Metric::ALL {
            let i = metric.index();
            values[i] = match metric.class() {
                MetricClass::Additive => MetricValue::Number(self.totals[i]),
                MetricClass::Rate => self.means[i]
                    .value()
                    .map_or(MetricValue::Missing, MetricValue::Number),
            };
        }
        MetricSummary::new(values)
    }
}
