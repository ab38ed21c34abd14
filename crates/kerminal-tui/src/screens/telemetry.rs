//! Telemetry screen.
//!
//! Layout:
//! ┌─ Orbit ──────────────────┐ ┌─ Vessel ─────────────────┐
//! │ label            value   │ │ label            value   │
//! └──────────────────────────┘ └──────────────────────────┘
//! ┌─ Resources ──────────────────────────────────────────┐
//! │ gauge              gauge                             │
//! └──────────────────────────────────────────────────────┘

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Row, Table};

use kerminal_core::LiveDataStore;

use crate::component::Component;
use crate::live::LiveElement;
use crate::theme;
use crate::widgets::format::Format;
use crate::widgets::resource_gauge::ResourceGauge;

const ORBIT: &[(&str, Format)] = &[
    ("o.ApA", Format::Distance),
    ("o.PeA", Format::Distance),
    ("o.timeToAp", Format::Duration),
    ("o.timeToPe", Format::Duration),
    ("o.period", Format::Duration),
    ("o.sma", Format::Distance),
    ("o.eccentricity", Format::Fixed(4)),
    ("o.inclination", Format::Angle),
    ("o.lan", Format::Angle),
    ("o.argumentOfPeriapsis", Format::Angle),
    ("o.trueAnomaly", Format::Angle),
    ("o.relativeVelocity", Format::Speed),
];

const VESSEL: &[(&str, Format)] = &[
    ("v.body", Format::Raw),
    ("v.missionTime", Format::Duration),
    ("v.altitude", Format::Distance),
    ("v.heightFromTerrain", Format::Distance),
    ("v.surfaceSpeed", Format::Speed),
    ("v.verticalSpeed", Format::Speed),
    ("v.orbitalVelocity", Format::Speed),
    ("v.geeForce", Format::Fixed(2)),
    ("v.dynamicPressure", Format::Fixed(1)),
    ("v.lat", Format::Angle),
    ("v.long", Format::Angle),
    ("n.heading", Format::Angle),
    ("n.pitch", Format::Angle),
    ("n.roll", Format::Angle),
];

pub struct TelemetryScreen {
    orbit: Vec<LiveElement>,
    vessel: Vec<LiveElement>,
    resources: Vec<ResourceGauge>,
}

impl TelemetryScreen {
    pub fn new() -> Self {
        let elements = |fields: &[(&str, Format)]| {
            fields
                .iter()
                .map(|&(name, format)| LiveElement::cataloged(name, format))
                .collect()
        };
        Self {
            orbit: elements(ORBIT),
            vessel: elements(VESSEL),
            resources: vec![
                ResourceGauge::new("Electric Charge:", "ElectricCharge", "Wh", false),
                ResourceGauge::new("Monopropellant:", "MonoPropellant", "L", false),
                ResourceGauge::new("Liquid Fuel:", "LiquidFuel", "L", false),
                ResourceGauge::new("Current Stage:", "LiquidFuel", "L", true),
                ResourceGauge::new("Oxidizer:", "Oxidizer", "L", false),
                ResourceGauge::new("Current Stage:", "Oxidizer", "L", true),
            ],
        }
    }

    fn live_elements(&self) -> impl Iterator<Item = &LiveElement> {
        self.orbit.iter().chain(&self.vessel)
    }

    fn render_group(frame: &mut Frame, area: Rect, title: &str, elements: &[LiveElement]) {
        let rows = elements.iter().map(|element| {
            let value_style = if element.is_available() {
                theme::value()
            } else {
                theme::value_missing()
            };
            Row::new([
                Cell::from(element.label()).style(theme::label()),
                Cell::from(element.text()).style(value_style),
            ])
        });
        let table = Table::new(rows, [Constraint::Percentage(55), Constraint::Percentage(45)])
            .block(panel(title));
        frame.render_widget(table, area);
    }

    fn render_resources(&self, frame: &mut Frame, area: Rect) {
        let block = panel("Resources");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .spacing(2)
                .areas(inner);
        let rows = self.resources.len().div_ceil(2);
        let row_constraints = vec![Constraint::Length(2); rows];
        let left_rows = Layout::vertical(row_constraints.clone()).split(left);
        let right_rows = Layout::vertical(row_constraints).split(right);

        for (i, gauge) in self.resources.iter().enumerate() {
            let column = if i % 2 == 0 { &left_rows } else { &right_rows };
            if let Some(cell) = column.get(i / 2) {
                gauge.render(frame, *cell);
            }
        }
    }
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {title} "))
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_default())
}

impl Default for TelemetryScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for TelemetryScreen {
    fn variables(&self) -> Vec<String> {
        self.live_elements()
            .map(|element| element.name().to_owned())
            .chain(
                self.resources
                    .iter()
                    .flat_map(ResourceGauge::variables)
                    .map(str::to_owned),
            )
            .collect()
    }

    fn feed(&mut self, store: &LiveDataStore) {
        for element in self.orbit.iter_mut().chain(&mut self.vessel) {
            element.feed(store);
        }
        for gauge in &mut self.resources {
            gauge.feed(store);
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let gauge_rows = u16::try_from(self.resources.len().div_ceil(2)).unwrap_or(u16::MAX);
        let [top, bottom] = Layout::vertical([
            Constraint::Min(8),
            Constraint::Length(gauge_rows.saturating_mul(2).saturating_add(2)),
        ])
        .areas(area);
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(top);

        Self::render_group(frame, left, "Orbit", &self.orbit);
        Self::render_group(frame, right, "Vessel", &self.vessel);
        self.render_resources(frame, bottom);
    }

    fn id(&self) -> &'static str {
        "telemetry"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use serde_json::{Map, json};

    use super::*;

    fn screen_text(screen: &TelemetryScreen) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|frame| screen.render(frame, frame.area()))
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(usize::from(buffer.area.width))
            .map(|row| row.iter().map(ratatui::buffer::Cell::symbol).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn subscribes_every_displayed_variable() {
        let screen = TelemetryScreen::new();
        let variables = screen.variables();
        assert!(variables.contains(&"o.ApA".to_owned()));
        assert!(variables.contains(&"n.heading".to_owned()));
        assert!(variables.contains(&"r.resourceCurrent[Oxidizer]".to_owned()));
        assert!(variables.contains(&"r.resourceMax[ElectricCharge]".to_owned()));
    }

    #[test]
    fn unfed_screen_shows_not_available() {
        let screen = TelemetryScreen::new();
        let text = screen_text(&screen);
        assert!(text.contains("Apoapsis"));
        assert!(text.contains("N/A"));
    }

    #[test]
    fn fed_values_are_rendered() {
        let store = LiveDataStore::new();
        let mut record = Map::new();
        record.insert("o.ApA".into(), json!(80_000.0));
        record.insert("v.body".into(), json!("Kerbin"));
        store.merge(record);

        let mut screen = TelemetryScreen::new();
        screen.feed(&store);
        let text = screen_text(&screen);
        assert!(text.contains("80.000 km"));
        assert!(text.contains("Kerbin"));
    }
}
