use anyhow::{anyhow, bail, Result};
use std::str::FromStr;
use zone_engine::{Mode, ZoneId};

pub const HELP: &str = "\
commands:
  list                    show every zone
  toggle <id>             switch a zone on/off
  setpoint <id> <temp>    change the target temperature
  mode <id> heat|cool     change the operating mode
  all on|off              switch every zone
  details <id>            describe one zone
  json                    dump all zones as JSON
  reseed                  reload the initial zones
  help                    this text
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Toggle(ZoneId),
    Setpoint(ZoneId, f64),
    Mode(ZoneId, Mode),
    All(bool),
    Details(ZoneId),
    Json,
    Reseed,
    Help,
    Quit,
}

fn zone_id(arg: Option<&str>) -> Result<ZoneId> {
    let arg = arg.ok_or_else(|| anyhow!("missing zone id"))?;
    arg.parse().map_err(|_| anyhow!("bad zone id: {}", arg))
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Command> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            bail!("empty command");
        };
        let command = match name {
            "list" | "ls" => Command::List,
            "toggle" | "t" => Command::Toggle(zone_id(words.next())?),
            "setpoint" | "sp" => {
                let id = zone_id(words.next())?;
                let value = words.next().ok_or_else(|| anyhow!("missing temperature"))?;
                let value: f64 = value
                    .parse()
                    .map_err(|_| anyhow!("bad temperature: {}", value))?;
                if !value.is_finite() {
                    bail!("bad temperature: {}", value);
                }
                Command::Setpoint(id, value)
            }
            "mode" => {
                let id = zone_id(words.next())?;
                let mode = match words.next() {
                    Some("heat") => Mode::Heat,
                    Some("cool") => Mode::Cool,
                    Some(other) => bail!("unknown mode: {}", other),
                    None => bail!("missing mode"),
                };
                Command::Mode(id, mode)
            }
            "all" => match words.next() {
                Some("on") => Command::All(true),
                Some("off") => Command::All(false),
                _ => bail!("usage: all on|off"),
            },
            "details" | "d" => Command::Details(zone_id(words.next())?),
            "json" => Command::Json,
            "reseed" => Command::Reseed,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => bail!("unknown command: {} (try `help`)", other),
        };
        if let Some(extra) = words.next() {
            bail!("unexpected argument: {}", extra);
        }
        Ok(command)
    }
}
