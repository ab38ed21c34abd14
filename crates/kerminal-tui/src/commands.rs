//! Command line parsing.
//!
//! One input line may hold several commands separated by `;`. Each is
//! tokenized (double quotes group words) and parsed with a multicall clap
//! parser, then mapped either to a core [`Command`] or to a UI-only
//! [`UiCommand`].

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};

use kerminal_core::command::{FlyByWire, SmartAssMode, Switch, Throttle};
use kerminal_core::{Command, FileMode, LogCommand};

/// Result of parsing one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Core(Command),
    Ui(UiCommand),
}

/// Commands the UI answers itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    /// Show this text in the text view.
    ShowText(String),
    /// Bring back the last text shown.
    Text,
    Telemetry,
    Quit,
}

#[derive(Debug, Parser)]
#[command(
    name = "kerminal",
    multicall = true,
    disable_help_subcommand = true,
    disable_version_flag = true
)]
enum CommandLine {
    /// Send signal to craft to execute Abort.
    Abort,
    /// Send signal to craft to execute an Action Group command.
    Action {
        /// Action group number, 1 to 10.
        number: u8,
    },
    /// Enable or disable landing gear brakes.
    Brakes { state: Toggle },
    /// Connect to a Telemachus server if not already connected.
    Connect {
        /// Server host name or IP address.
        #[arg(value_name = "HOST")]
        host_address: String,
        /// Defaults to 8085.
        port: Option<u16>,
    },
    /// Disconnect from the Telemachus server if currently connected.
    Disconnect,
    /// Utilize the Telemachus FlyByWire system.
    Fbw {
        #[arg(conflicts_with_all = ["yaw", "pitch", "roll"])]
        state: Option<Toggle>,
        #[arg(long, allow_negative_numbers = true)]
        yaw: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        pitch: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        roll: Option<f64>,
    },
    /// Raise or lower the landing gear.
    Gear { position: GearPosition },
    /// Puts a haiku on the screen.
    Haiku,
    /// Display available commands, or details on one command.
    Help {
        /// Command whose information should be displayed.
        command: Option<String>,
    },
    /// Turn the craft's lights on or off.
    Lights { state: Toggle },
    /// Utilities for logging data to file; see "help log".
    Log {
        #[command(subcommand)]
        action: Option<LogAction>,
    },
    /// Set the interval in milliseconds between server updates.
    Rate {
        #[arg(allow_negative_numbers = true)]
        interval: f64,
    },
    /// Enable or disable the craft's RCS.
    Rcs { state: Toggle },
    /// Enable or disable the craft's SAS.
    Sas { state: Toggle },
    /// Utilize MechJeb SmartASS; disable with "sa off".
    Sa {
        mode: SmartAssMode,
        /// Heading for surface mode.
        #[arg(allow_negative_numbers = true)]
        heading: Option<f64>,
        /// Pitch for surface mode.
        #[arg(allow_negative_numbers = true)]
        pitch: Option<f64>,
    },
    /// Send a JSON message to the server as-is.
    Send {
        /// e.g. {"+": ["v.altitude", "o.period"]}
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true, trailing_var_arg = true)]
        json: Vec<String>,
    },
    /// Send signal to craft to activate the next stage.
    Stage,
    /// Bring up the telemetry screen.
    Telemetry,
    /// Show the most recently displayed text.
    Text,
    /// Adjust the throttle: up, down or a percentage.
    Throttle {
        #[arg(value_parser = parse_throttle, allow_hyphen_values = true)]
        setting: Throttle,
    },
    /// Shut down Kerminal.
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GearPosition {
    Up,
    Down,
    /// Synonym for down.
    On,
    /// Synonym for up.
    Off,
}

#[derive(Debug, Subcommand)]
enum LogAction {
    /// Show whether logging is active, the file, and the variables.
    Status,
    /// Enable data logging.
    On,
    /// Disable data logging.
    Off,
    /// Log every known plottable variable.
    All,
    /// Log only the mandatory time variables.
    #[command(name = "none")]
    MandatoryOnly,
    /// Add variables to the log.
    Add {
        #[arg(required = true)]
        variables: Vec<String>,
    },
    /// Remove variables from the log.
    Remove {
        #[arg(required = true)]
        variables: Vec<String>,
    },
    /// Choose the log file.
    File {
        filename: PathBuf,
        /// Append to the file if it already exists.
        #[arg(short, long, conflicts_with = "overwrite")]
        append: bool,
        /// Overwrite the file if it already exists.
        #[arg(short, long)]
        overwrite: bool,
    },
}

fn parse_throttle(value: &str) -> Result<Throttle, String> {
    match value {
        "up" => Ok(Throttle::Up),
        "down" => Ok(Throttle::Down),
        other => other
            .trim_end_matches('%')
            .parse::<f64>()
            .map(Throttle::Percent)
            .map_err(|_| "Set Throttle value must be a number".to_owned()),
    }
}

const HAIKU: &str = "\
A field of cotton--
as if the moon
had flowered.
- Matsuo Bashō (松尾 芭蕉)";

// ── Parsing ──────────────────────────────────────────────────────────

/// Split an input line into its `;`-separated commands, skipping blanks.
/// Semicolons inside double quotes belong to the command.
pub fn split_commands(line: &str) -> impl Iterator<Item = &str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => {
                segments.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&line[start..]);
    segments.into_iter().map(str::trim).filter(|s| !s.is_empty())
}

/// Parse one command. `Err` carries a message for the status bar.
pub fn parse(segment: &str) -> Result<Parsed, String> {
    let words = split_words(segment);
    let Some(name) = words.first().cloned() else {
        return Err("empty command".into());
    };

    if !is_known(&name) {
        return Err(format!("command \"{name}\" not recognized. See \"help\""));
    }

    let line = match CommandLine::try_parse_from(&words) {
        Ok(line) => line,
        Err(err) => {
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                    Ok(Parsed::Ui(UiCommand::ShowText(err.render().to_string())))
                }
                _ => {
                    tracing::debug!(error = %err, "command usage error");
                    Err(format!("command usage incorrect. See \"help {name}\""))
                }
            };
        }
    };

    Ok(match line {
        CommandLine::Abort => Parsed::Core(Command::Abort),
        CommandLine::Stage => Parsed::Core(Command::Stage),
        CommandLine::Action { number } => Parsed::Core(Command::ActionGroup { group: number }),
        CommandLine::Brakes { state } => switch(Switch::Brakes, state.is_on()),
        CommandLine::Lights { state } => switch(Switch::Lights, state.is_on()),
        CommandLine::Rcs { state } => switch(Switch::Rcs, state.is_on()),
        CommandLine::Sas { state } => switch(Switch::Sas, state.is_on()),
        CommandLine::Gear { position } => switch(
            Switch::Gear,
            matches!(position, GearPosition::Down | GearPosition::On),
        ),
        CommandLine::Connect { host_address, port } => Parsed::Core(Command::Connect {
            address: host_address,
            port,
        }),
        CommandLine::Disconnect => Parsed::Core(Command::Disconnect),
        CommandLine::Fbw {
            state,
            yaw,
            pitch,
            roll,
        } => Parsed::Core(Command::FlyByWire(match state {
            Some(state) => FlyByWire::Enable(state.is_on()),
            None => FlyByWire::Axes { yaw, pitch, roll },
        })),
        CommandLine::Throttle { setting } => Parsed::Core(Command::Throttle(setting)),
        CommandLine::Rate { interval } => Parsed::Core(Command::Rate {
            interval_ms: interval,
        }),
        CommandLine::Sa {
            mode,
            heading,
            pitch,
        } => Parsed::Core(Command::SmartAss {
            mode,
            heading,
            pitch,
        }),
        // The parser only checks that something follows; the payload is
        // the untouched remainder of the segment.
        CommandLine::Send { .. } => Parsed::Core(Command::Send {
            payload: raw_remainder(segment, &name),
        }),
        CommandLine::Log { action } => Parsed::Core(Command::Log(log_command(action))),
        CommandLine::Help { command } => Parsed::Ui(UiCommand::ShowText(help(command.as_deref())?)),
        CommandLine::Haiku => Parsed::Ui(UiCommand::ShowText(HAIKU.to_owned())),
        CommandLine::Text => Parsed::Ui(UiCommand::Text),
        CommandLine::Telemetry => Parsed::Ui(UiCommand::Telemetry),
        CommandLine::Quit => Parsed::Ui(UiCommand::Quit),
    })
}

fn switch(system: Switch, on: bool) -> Parsed {
    Parsed::Core(Command::Switch { system, on })
}

fn log_command(action: Option<LogAction>) -> LogCommand {
    match action {
        None | Some(LogAction::Status) => LogCommand::Status,
        Some(LogAction::On) => LogCommand::On,
        Some(LogAction::Off) => LogCommand::Off,
        Some(LogAction::All) => LogCommand::All,
        Some(LogAction::MandatoryOnly) => LogCommand::None,
        Some(LogAction::Add { variables }) => LogCommand::Add(variables),
        Some(LogAction::Remove { variables }) => LogCommand::Remove(variables),
        Some(LogAction::File {
            filename,
            append,
            overwrite,
        }) => {
            let mode = if append {
                FileMode::Append
            } else if overwrite {
                FileMode::Overwrite
            } else {
                FileMode::Create
            };
            LogCommand::File {
                path: filename,
                mode,
            }
        }
    }
}

fn is_known(name: &str) -> bool {
    CommandLine::command().find_subcommand(name).is_some()
}

fn raw_remainder(segment: &str, name: &str) -> String {
    segment
        .trim_start()
        .strip_prefix(name)
        .unwrap_or(segment)
        .trim()
        .to_owned()
}

/// Whitespace split where double quotes group words. Quotes are removed.
fn split_words(segment: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for c in segment.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

// ── Help ─────────────────────────────────────────────────────────────

/// Command listing, or the long help of one command.
pub fn help(command: Option<&str>) -> Result<String, String> {
    let mut cli = CommandLine::command();
    if let Some(name) = command {
        return cli
            .find_subcommand_mut(name)
            .map(|sub| sub.render_long_help().to_string())
            .ok_or_else(|| format!("command \"{name}\" not recognized. See \"help\""));
    }

    let mut text = format!(
        "Kerminal v{} Command Listing\n\n\
         Type \"help <command>\" to see greater detail about any command.\n\
         Several commands can be given on one line, separated by \";\".\n\n",
        env!("CARGO_PKG_VERSION")
    );
    for sub in cli.get_subcommands_mut() {
        let usage = sub.render_usage().to_string();
        let usage = usage.trim_start_matches("Usage: ").trim();
        let _ = writeln!(text, "{usage}");
        if let Some(about) = sub.get_about() {
            let _ = writeln!(text, " -- {about}");
        }
    }
    Ok(text)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn core(segment: &str) -> Command {
        match parse(segment).unwrap() {
            Parsed::Core(command) => command,
            Parsed::Ui(ui) => panic!("expected a core command, got {ui:?}"),
        }
    }

    #[test]
    fn splits_on_semicolons() {
        let parts: Vec<&str> = split_commands("stage; ; throttle 50 ;abort").collect();
        assert_eq!(parts, vec!["stage", "throttle 50", "abort"]);
    }

    #[test]
    fn quoted_semicolons_stay_in_the_command() {
        let line = r#"send {"run": ["a;b"]}; stage"#;
        let parts: Vec<&str> = split_commands(line).collect();
        assert_eq!(parts, vec![r#"send {"run": ["a;b"]}"#, "stage"]);
        assert_eq!(
            core(parts[0]),
            Command::Send {
                payload: r#"{"run": ["a;b"]}"#.into()
            }
        );
    }

    #[test]
    fn quotes_group_words() {
        assert_eq!(
            split_words(r#"log file "my flight.csv" --append"#),
            vec!["log", "file", "my flight.csv", "--append"]
        );
    }

    #[test]
    fn connect_with_and_without_port() {
        assert_eq!(
            core("connect 10.0.0.2"),
            Command::Connect {
                address: "10.0.0.2".into(),
                port: None
            }
        );
        assert_eq!(
            core("connect localhost 8086"),
            Command::Connect {
                address: "localhost".into(),
                port: Some(8086)
            }
        );
    }

    #[test]
    fn gear_synonyms() {
        assert_eq!(
            core("gear down"),
            Command::Switch {
                system: Switch::Gear,
                on: true
            }
        );
        assert_eq!(
            core("gear off"),
            Command::Switch {
                system: Switch::Gear,
                on: false
            }
        );
    }

    #[test]
    fn throttle_settings() {
        assert_eq!(core("throttle up"), Command::Throttle(Throttle::Up));
        assert_eq!(core("throttle 75%"), Command::Throttle(Throttle::Percent(75.0)));
        assert_eq!(core("throttle -5"), Command::Throttle(Throttle::Percent(-5.0)));
        assert!(parse("throttle lots").is_err());
    }

    #[test]
    fn fbw_axes_accept_negative_numbers() {
        assert_eq!(
            core("fbw --yaw -0.5 --roll 1"),
            Command::FlyByWire(FlyByWire::Axes {
                yaw: Some(-0.5),
                pitch: None,
                roll: Some(1.0)
            })
        );
        assert_eq!(core("fbw on"), Command::FlyByWire(FlyByWire::Enable(true)));
        assert!(parse("fbw on --yaw 1").is_err());
    }

    #[test]
    fn send_keeps_the_payload_verbatim() {
        assert_eq!(
            core(r#"send {"+": ["v.altitude",  "o.period"]}"#),
            Command::Send {
                payload: r#"{"+": ["v.altitude",  "o.period"]}"#.into()
            }
        );
    }

    #[test]
    fn smart_ass_surface() {
        assert_eq!(
            core("sa surface 90 -10"),
            Command::SmartAss {
                mode: SmartAssMode::Surface,
                heading: Some(90.0),
                pitch: Some(-10.0)
            }
        );
    }

    #[test]
    fn log_subcommands() {
        assert_eq!(core("log"), Command::Log(LogCommand::Status));
        assert_eq!(
            core("log add v.altitude o.ApA"),
            Command::Log(LogCommand::Add(vec!["v.altitude".into(), "o.ApA".into()]))
        );
        assert_eq!(
            core("log file out.csv -o"),
            Command::Log(LogCommand::File {
                path: "out.csv".into(),
                mode: FileMode::Overwrite
            })
        );
        assert!(parse("log file out.csv --append --overwrite").is_err());
        assert!(parse("log add").is_err());
    }

    #[test]
    fn ui_commands() {
        assert_eq!(parse("exit").unwrap(), Parsed::Ui(UiCommand::Quit));
        assert_eq!(parse("telemetry").unwrap(), Parsed::Ui(UiCommand::Telemetry));
        let Parsed::Ui(UiCommand::ShowText(haiku)) = parse("haiku").unwrap() else {
            panic!("haiku should show text");
        };
        assert!(haiku.contains("A field of cotton"));
    }

    #[test]
    fn unknown_and_misused_commands() {
        assert_eq!(
            parse("warp 4").unwrap_err(),
            "command \"warp\" not recognized. See \"help\""
        );
        assert_eq!(
            parse("action").unwrap_err(),
            "command usage incorrect. See \"help action\""
        );
    }

    #[test]
    fn help_lists_every_command() {
        let listing = help(None).unwrap();
        assert!(listing.starts_with("Kerminal v"));
        for name in ["abort", "connect", "log", "sa", "throttle", "quit"] {
            assert!(listing.contains(name), "missing {name}");
        }
        let connect = help(Some("connect")).unwrap();
        assert!(connect.contains("<HOST>"), "{connect}");
        assert!(connect.contains("Server host name"));
        assert!(help(Some("warp")).is_err());
    }
}
