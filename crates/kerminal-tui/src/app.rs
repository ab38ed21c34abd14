//! Application core: poll/render loop, command dispatch, screen switching.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::Local;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use kerminal_api::protocol::VESSEL_NAME;
use kerminal_core::{Command, ConnectionState, Outcome, ResultSink, Session};

use crate::action::Action;
use crate::command_line::CommandLine;
use crate::commands::{self, Parsed, UiCommand};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::live::LiveElement;
use crate::screens::ScreenId;
use crate::screens::telemetry::TelemetryScreen;
use crate::screens::text::TextScreen;
use crate::status::StatusBar;
use crate::theme;
use crate::tui::Tui;
use crate::widgets::format::Format;

pub struct App {
    session: Session,
    poll: Duration,
    active_screen: ScreenId,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    command_line: CommandLine,
    status: StatusBar,
    vessel_name: LiveElement,
    /// Whether the screens' variables are in the ledger for the current
    /// connection.
    subscribed: bool,
    running: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(session: Session, poll: Duration) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let mut screens: HashMap<ScreenId, Box<dyn Component>> = HashMap::new();
        screens.insert(ScreenId::Telemetry, Box::new(TelemetryScreen::new()));
        screens.insert(ScreenId::Text, Box::new(TextScreen::new()));

        Self {
            session,
            poll,
            active_screen: ScreenId::Text,
            screens,
            command_line: CommandLine::default(),
            status: StatusBar::default(),
            vessel_name: LiveElement::new(VESSEL_NAME, "Vessel", Format::Raw),
            subscribed: false,
            running: true,
            action_tx,
            action_rx,
        }
    }

    /// Run until quit. `connect_to` is dialed before the first frame.
    pub async fn run(&mut self, connect_to: Option<(String, u16)>) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        if let Some((address, port)) = connect_to {
            self.action_tx.send(Action::Execute(Command::Connect {
                address,
                port: Some(port),
            }))?;
        }

        let mut events = EventReader::new(self.poll);
        info!(poll_ms = self.poll.as_millis(), "UI loop started");

        while self.running {
            self.drain_actions();
            tui.draw(|frame| self.render(frame))?;

            let Some(event) = events.next().await else {
                break;
            };
            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key) {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Paste(text) => self.command_line.paste(&text),
                Event::Resize => {}
                Event::Tick => self.tick(Instant::now()),
            }
        }

        events.stop();
        info!("UI loop ended");
        Ok(())
    }

    fn drain_actions(&mut self) {
        while let Ok(action) = self.action_rx.try_recv() {
            self.process_action(action);
        }
    }

    /// Feed every live element from the store.
    fn tick(&mut self, now: Instant) {
        self.sync_subscriptions();
        let store = self.session.store();
        self.vessel_name.feed(store);
        for screen in self.screens.values_mut() {
            screen.feed(store);
        }
        self.status.expire(now);
    }

    /// Register the screens' variables once per connection. A teardown
    /// resets the ledger, so they are registered again on the next one.
    ///
    /// The state is read with the ledger locked: teardown leaves
    /// `Streaming` before it resets the ledger.
    fn sync_subscriptions(&mut self) {
        let mut ledger = self.session.ledger();
        match self.session.state() {
            ConnectionState::Streaming if !self.subscribed => {
                let mut count = 0;
                for screen in self.screens.values() {
                    for name in screen.variables() {
                        ledger.add(&name);
                        count += 1;
                    }
                }
                self.subscribed = true;
                debug!(count, "subscribed screen variables");
            }
            ConnectionState::Idle => self.subscribed = false,
            _ => {}
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }
        match key.code {
            KeyCode::PageUp | KeyCode::PageDown => self
                .screens
                .get_mut(&self.active_screen)
                .and_then(|screen| screen.handle_key_event(key)),
            KeyCode::Tab => Some(match self.active_screen {
                ScreenId::Telemetry => Action::ShowLastText,
                ScreenId::Text => Action::ShowTelemetry,
            }),
            _ => self.command_line.handle_key_event(key).map(Action::Submit),
        }
    }

    fn process_action(&mut self, action: Action) {
        match action {
            Action::Submit(line) => self.submit(&line),
            Action::Execute(command) => self.execute(command),
            Action::ShowText(_) => {
                self.update_screen(ScreenId::Text, &action);
                self.switch_to(ScreenId::Text);
            }
            Action::ShowLastText => self.switch_to(ScreenId::Text),
            Action::ShowTelemetry => self.switch_to(ScreenId::Telemetry),
            Action::ScrollUp | Action::ScrollDown => self.update_screen(self.active_screen, &action),
            Action::Quit => {
                info!("quit requested");
                self.running = false;
            }
        }
    }

    fn switch_to(&mut self, id: ScreenId) {
        if self.active_screen != id {
            if let Some(screen) = self.screens.get(&id) {
                debug!(from = %self.active_screen, to = screen.id(), "switching screen");
            }
            self.active_screen = id;
        }
    }

    fn update_screen(&mut self, id: ScreenId, action: &Action) {
        if let Some(screen) = self.screens.get_mut(&id) {
            screen.update(action);
        }
    }

    /// Parse a command line and queue what it asks for, in order.
    fn submit(&mut self, line: &str) {
        debug!(line, "command line submitted");
        for segment in commands::split_commands(line) {
            let action = match commands::parse(segment) {
                Ok(Parsed::Core(command)) => Action::Execute(command),
                Ok(Parsed::Ui(UiCommand::ShowText(text))) => Action::ShowText(text),
                Ok(Parsed::Ui(UiCommand::Text)) => Action::ShowLastText,
                Ok(Parsed::Ui(UiCommand::Telemetry)) => Action::ShowTelemetry,
                Ok(Parsed::Ui(UiCommand::Quit)) => Action::Quit,
                Err(message) => {
                    self.status.error(&message);
                    // Later commands on the line may depend on this one.
                    break;
                }
            };
            self.process_action(action);
        }
    }

    /// Run a core command. `connect` blocks this thread until the attempt
    /// resolves, so it runs on a blocking-capable worker.
    fn execute(&mut self, command: Command) {
        self.sync_subscriptions();
        let session = &self.session;
        let status = &mut self.status;
        let outcome = tokio::task::block_in_place(|| kerminal_core::execute(command, session, status));
        self.sync_subscriptions();

        match outcome {
            Outcome::Done => {}
            Outcome::ShowText(text) => self.process_action(Action::ShowText(text)),
            Outcome::ShowTelemetry => self.switch_to(ScreenId::Telemetry),
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let [header, main, status, command] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.render_header(frame, header);
        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, main);
        }
        self.status.render(frame, status);
        self.command_line.render(frame, command);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let title = format!(
            " Kerminal v{} - Sys. Time: {} ",
            env!("CARGO_PKG_VERSION"),
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let state = self.session.state();
        let connection = match state {
            ConnectionState::Streaming => format!(" Connected: {} ", self.vessel_name.text()),
            other => format!(" {} ", capitalize(&other.to_string())),
        };
        let line = Line::from(vec![
            Span::styled(title, theme::bar()),
            Span::styled(connection, theme::connection(state == ConnectionState::Streaming)),
        ]);
        frame.render_widget(Paragraph::new(line).style(theme::bar()), area);
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
