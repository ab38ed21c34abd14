//! Fill gauge for one vessel resource (current amount over capacity).

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Gauge, Paragraph};

use kerminal_api::catalog::{self, ResourceQuery};
use kerminal_core::{LiveDataStore, NOT_AVAILABLE};

use crate::theme;

#[derive(Debug, Clone)]
pub struct ResourceGauge {
    title: &'static str,
    units: &'static str,
    current_var: String,
    max_var: String,
    reading: Option<(f64, f64)>,
}

impl ResourceGauge {
    /// `stage` limits the reading to the current stage.
    pub fn new(title: &'static str, resource: &str, units: &'static str, stage: bool) -> Self {
        let current = if stage {
            ResourceQuery::CurrentStage
        } else {
            ResourceQuery::Total
        };
        Self {
            title,
            units,
            current_var: catalog::resource(current, resource),
            max_var: catalog::resource(ResourceQuery::Maximum, resource),
            reading: None,
        }
    }

    pub fn variables(&self) -> [&str; 2] {
        [&self.current_var, &self.max_var]
    }

    pub fn feed(&mut self, store: &LiveDataStore) {
        let current = store.get(&self.current_var).and_then(|v| v.as_f64());
        let max = store.get(&self.max_var).and_then(|v| v.as_f64());
        self.reading = current.zip(max).filter(|&(_, max)| max > 0.0);
    }

    /// Fill fraction, clamped to `0.0..=1.0`.
    pub fn ratio(&self) -> Option<f64> {
        self.reading
            .map(|(current, max)| (current / max).clamp(0.0, 1.0))
    }

    pub fn value_text(&self) -> String {
        match self.reading {
            Some((current, max)) => format!("{current:.1}/{max:.1} {}", self.units),
            None => NOT_AVAILABLE.to_owned(),
        }
    }

    /// Title and amounts on the first row, the bar on the second.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let [text_area, bar_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(area);

        let value_style = if self.reading.is_some() {
            theme::value()
        } else {
            theme::value_missing()
        };
        let text = Line::from(vec![
            Span::styled(format!("{} ", self.title), theme::label()),
            Span::styled(self.value_text(), value_style),
        ]);
        frame.render_widget(Paragraph::new(text), text_area);

        let ratio = self.ratio().unwrap_or(0.0);
        let gauge = Gauge::default()
            .ratio(ratio)
            .gauge_style(theme::gauge(ratio))
            .label(format!("{:.0}%", ratio * 100.0))
            .use_unicode(true);
        frame.render_widget(gauge, bar_area);
    }
}
