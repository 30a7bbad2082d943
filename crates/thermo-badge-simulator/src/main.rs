//! Terminal simulator for thermo-badge.
//!
//! Runs several badges on a virtual clock. They share one simulated radio
//! medium, so a badge hears the others only if they are on the same group.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=info cargo run -p thermo-badge-simulator -- --groups 21,21,7 --upper 30 --lower 3
//! ```
//!
//! # Commands
//!
//! | Command             | Action                                          |
//! |---------------------|-------------------------------------------------|
//! | `a` / `b`           | Press button A / B on the selected badge        |
//! | `t <celsius>`       | Set the selected badge's sensor reading         |
//! | `s <name> <value>`  | Send a value frame on the selected badge's group (`-` for no value) |
//! | `w <minutes>`       | Let every badge run for a while                 |
//! | `n <index>`         | Select a badge                                  |
//! | `g`                 | Print badge state                               |
//! | `h`                 | Help                                            |
//! | `q`                 | Quit                                            |

mod sim_hardware;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use embassy_time::{Duration, Instant};
use log::{debug, info, warn};

use thermo_badge_core::events::post;
use thermo_badge_core::{
    Badge, BadgeConfig, BadgeEvent, Celsius, EventChannel, RadioFrame, RadioPacket, Runtime,
    ValueMessage,
};

use sim_hardware::{AirFrame, Ether, SimAudio, SimDisplay, SimPin, SimRadio, SimSensor};

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Virtual time one pass of the main loop takes besides blocking playback.
const LOOP_PERIOD: Duration = Duration::from_millis(100);

/// Reading every badge starts with.
const START_CELSIUS: Celsius = 21;

const DEFAULT_GROUPS: [u8; 2] = [21, 21];

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Options {
    groups: Vec<u8>,
    upper: Option<Celsius>,
    lower: Option<Celsius>,
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        groups: DEFAULT_GROUPS.to_vec(),
        upper: None,
        lower: None,
    };

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args
            .get(i + 1)
            .ok_or_else(|| format!("{} needs a value", flag))?;
        match flag {
            "--groups" => {
                options.groups = value
                    .split(',')
                    .map(|g| {
                        g.trim()
                            .parse::<u8>()
                            .map_err(|e| format!("bad group {:?}: {}", g, e))
                    })
                    .collect::<Result<_, _>>()?;
                if options.groups.is_empty() {
                    return Err("need at least one badge".to_string());
                }
            }
            "--upper" => options.upper = Some(parse_celsius(value)?),
            "--lower" => options.lower = Some(parse_celsius(value)?),
            other => return Err(format!("unknown option {}", other)),
        }
        i += 2;
    }
    Ok(options)
}

fn parse_celsius(text: &str) -> Result<Celsius, String> {
    text.parse::<Celsius>()
        .map_err(|e| format!("bad temperature {:?}: {}", text, e))
}

// ---------------------------------------------------------------------------
// Prompt commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Command {
    ButtonA,
    ButtonB,
    SetTemperature(Celsius),
    Send { name: u8, value: Option<f64> },
    Wait { minutes: u64 },
    Select(usize),
    Status,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty command".to_string());
    };
    let mut arg = |what: &str| words.next().ok_or_else(|| format!("missing {}", what));

    let command = match verb {
        "a" => Command::ButtonA,
        "b" => Command::ButtonB,
        "t" => Command::SetTemperature(parse_celsius(arg("temperature")?)?),
        "s" => {
            let name = arg("name index")?;
            let name = name
                .parse::<u8>()
                .map_err(|e| format!("bad name index {:?}: {}", name, e))?;
            let value = match arg("value")? {
                "-" => None,
                v => Some(v.parse::<f64>().map_err(|e| format!("bad value {:?}: {}", v, e))?),
            };
            Command::Send { name, value }
        }
        "w" => {
            let text = arg("minutes")?;
            let minutes = text
                .parse::<u64>()
                .map_err(|e| format!("bad minutes {:?}: {}", text, e))?;
            if minutes > MAX_WAIT_MINUTES {
                return Err(format!("wait at most {} minutes", MAX_WAIT_MINUTES));
            }
            Command::Wait { minutes }
        }
        "n" => {
            let index = arg("badge index")?;
            Command::Select(
                index
                    .parse::<usize>()
                    .map_err(|e| format!("bad badge index {:?}: {}", index, e))?,
            )
        }
        "g" => Command::Status,
        "h" | "?" => Command::Help,
        "q" | "quit" => Command::Quit,
        other => return Err(format!("unknown command {:?}", other)),
    };
    Ok(command)
}

/// Longest single `w` step: one week of virtual time.
const MAX_WAIT_MINUTES: u64 = 7 * 24 * 60;

const HELP: &str = "a | b | t <celsius> | s <name> <value|-> | w <minutes> | n <index> | g | q";

// ---------------------------------------------------------------------------
// Simulated badges
// ---------------------------------------------------------------------------

type SimRuntime<'a> = Runtime<'a, SimSensor, SimDisplay, SimAudio, SimPin, SimRadio>;

struct SimBadge<'a> {
    runtime: SimRuntime<'a>,
    events: &'a EventChannel,
    /// This badge's virtual clock
    clock: Instant,
}

impl SimBadge<'_> {
    /// One pass of the badge's main loop on its virtual clock.
    fn step(&mut self) {
        let report = self.runtime.poll(self.clock);
        if report.reminder_fired {
            debug!("reminder fired at {} ms", self.clock.as_millis());
        }
        self.clock += report.blocked + LOOP_PERIOD;
    }

    fn group(&self) -> u8 {
        self.runtime.badge().radio().group().unwrap_or_default()
    }
}

fn build_badges<'a>(
    options: &Options,
    channels: &'a [EventChannel],
    ether: &Ether,
) -> Result<Vec<SimBadge<'a>>, String> {
    let mut badges = Vec::new();
    for (index, (group, events)) in options.groups.iter().zip(channels).enumerate() {
        let mut config = BadgeConfig::default().with_radio_group(*group);
        if let Some(upper) = options.upper {
            config.upper_limit = upper;
        }
        if let Some(lower) = options.lower {
            config.lower_limit = lower;
        }
        config.validate().map_err(|e| e.to_string())?;

        let label = format!("badge {}", index);
        let badge = Badge::new(
            SimSensor {
                celsius: START_CELSIUS,
            },
            SimDisplay::new(&label),
            SimAudio::new(&label, config.tempo_bpm),
            SimPin::new(&label),
            SimRadio::new(index, Rc::clone(ether)),
            config,
        );
        let clock = Instant::from_millis(0);
        let runtime = Runtime::start(badge, events, clock);
        if let Some(e) = runtime.startup_error() {
            warn!("badge {} started with errors: {}", index, e);
        }
        badges.push(SimBadge {
            runtime,
            events,
            clock,
        });
    }
    Ok(badges)
}

/// Deliver every frame in flight to each badge on the frame's group,
/// except its sender.
fn deliver_frames(ether: &Ether, badges: &[SimBadge<'_>]) {
    while let Some(frame) = ether.borrow_mut().pop_front() {
        for (index, badge) in badges.iter().enumerate() {
            if frame.sender == Some(index) {
                continue;
            }
            match RadioFrame::decode_for_group(&frame.bytes, badge.group()) {
                Ok(packet) => {
                    if let Some(event) = BadgeEvent::from_packet(packet) {
                        post(badge.events, event);
                    }
                }
                Err(e) => debug!("badge {} drops frame: {}", index, e),
            }
        }
    }
}

/// Run every badge for `duration` of virtual time.
fn run_for(badges: &mut [SimBadge<'_>], ether: &Ether, duration: Duration) {
    let target = badges
        .iter()
        .map(|b| b.clock)
        .max()
        .unwrap_or(Instant::from_millis(0))
        + duration;
    for badge in badges.iter_mut() {
        while badge.clock < target {
            badge.step();
        }
    }
    deliver_frames(ether, badges);
}

fn print_status(badges: &[SimBadge<'_>], selected: usize) {
    for (index, badge) in badges.iter().enumerate() {
        let runtime = &badge.runtime;
        let b = runtime.badge();
        println!(
            "{} badge {}: group {} | {}°C | mode {:?} | avg_temp {} | display {:?} | P1 {:?} | t={}s next reminder {}s",
            if index == selected { ">" } else { " " },
            index,
            badge.group(),
            b.sensor().celsius,
            b.state().mode(),
            b.state().avg_temp(),
            b.display().current().unwrap_or(""),
            b.pin().level(),
            badge.clock.as_secs(),
            runtime.next_reminder().as_secs(),
        );
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_options(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("usage: thermo-badge-simulator [--groups 21,21] [--upper C] [--lower C]");
            std::process::exit(2);
        }
    };

    let ether: Ether = Rc::new(RefCell::new(VecDeque::new()));
    let channels: Vec<EventChannel> = options.groups.iter().map(|_| EventChannel::new()).collect();
    let mut badges = match build_badges(&options, &channels, &ether) {
        Ok(badges) => badges,
        Err(e) => {
            eprintln!("cannot start badges: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting thermo-badge simulator with {} badges", badges.len());
    deliver_frames(&ether, &badges);
    for badge in badges.iter_mut() {
        badge.step();
    }
    println!("{}", HELP);

    let mut selected = 0;
    let stdin = io::stdin();
    loop {
        print!("badge {}> ", selected);
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("stdin: {}", e);
                break;
            }
        }
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{} ({})", e, HELP);
                continue;
            }
        };

        let badge = &mut badges[selected];
        match command {
            Command::ButtonA => {
                post(badge.events, BadgeEvent::ButtonA);
            }
            Command::ButtonB => {
                post(badge.events, BadgeEvent::ButtonB);
            }
            Command::SetTemperature(celsius) => {
                badge.runtime.badge_mut().sensor_mut().celsius = celsius;
            }
            Command::Send { name, value } => {
                let frame = RadioFrame::new(
                    badge.group(),
                    RadioPacket::Value(ValueMessage::new(name, value)),
                );
                match frame.to_vec() {
                    Ok(bytes) => ether.borrow_mut().push_back(AirFrame {
                        sender: None,
                        bytes,
                    }),
                    Err(e) => println!("cannot encode frame: {}", e),
                }
            }
            Command::Wait { minutes } => {
                run_for(&mut badges, &ether, Duration::from_secs(minutes * 60));
                continue;
            }
            Command::Select(index) => {
                if index < badges.len() {
                    selected = index;
                } else {
                    println!("no badge {}", index);
                }
                continue;
            }
            Command::Status => {
                print_status(&badges, selected);
                continue;
            }
            Command::Help => {
                println!("{}", HELP);
                continue;
            }
            Command::Quit => break,
        }

        // Let the badges react to the input
        deliver_frames(&ether, &badges);
        for badge in badges.iter_mut() {
            badge.step();
        }
    }

    info!("Simulator exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn options(groups: &[u8]) -> Options {
        Options {
            groups: groups.to_vec(),
            upper: None,
            lower: None,
        }
    }

    #[test]
    fn test_parse_options() {
        assert_eq!(parse_options(&[]), Ok(options(&DEFAULT_GROUPS)));
        let parsed = parse_options(&args(&["--groups", "21, 7", "--upper", "25"])).unwrap();
        assert_eq!(parsed.groups, vec![21, 7]);
        assert_eq!(parsed.upper, Some(25));
        assert!(parse_options(&args(&["--upper"])).is_err());
        assert!(parse_options(&args(&["--groups", "300"])).is_err());
        assert!(parse_options(&args(&["--loud", "1"])).is_err());
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("a\n"), Ok(Command::ButtonA));
        assert_eq!(parse_command("t -5"), Ok(Command::SetTemperature(-5)));
        assert_eq!(
            parse_command("s 0 12.5"),
            Ok(Command::Send {
                name: 0,
                value: Some(12.5)
            })
        );
        assert_eq!(
            parse_command("s 4 -"),
            Ok(Command::Send {
                name: 4,
                value: None
            })
        );
        assert_eq!(parse_command("w 60"), Ok(Command::Wait { minutes: 60 }));
        assert_eq!(
            parse_command("w 10080"),
            Ok(Command::Wait {
                minutes: MAX_WAIT_MINUTES
            })
        );
        assert!(parse_command("w 10081").is_err());
        assert!(parse_command("w 18446744073709551615").is_err());
        assert!(parse_command("s 0").is_err());
        assert!(parse_command("x").is_err());
    }

    #[test]
    fn test_peers_on_same_group_hear_startup_broadcast() {
        let ether: Ether = Rc::new(RefCell::new(VecDeque::new()));
        let opts = options(&[21, 21, 7]);
        let channels: Vec<EventChannel> = opts.groups.iter().map(|_| EventChannel::new()).collect();
        let badges = build_badges(&opts, &channels, &ether).unwrap();
        assert_eq!(ether.borrow().len(), 3, "one startup broadcast per badge");

        // Bare numbers are not value messages, so nothing is queued
        deliver_frames(&ether, &badges);
        assert!(ether.borrow().is_empty());
        assert!(channels.iter().all(|c| c.is_empty()));
    }

    #[test]
    fn test_value_frame_reaches_only_its_group() {
        let ether: Ether = Rc::new(RefCell::new(VecDeque::new()));
        let opts = options(&[21, 21, 7]);
        let channels: Vec<EventChannel> = opts.groups.iter().map(|_| EventChannel::new()).collect();
        let mut badges = build_badges(&opts, &channels, &ether).unwrap();
        ether.borrow_mut().clear();

        let bytes = RadioFrame::new(21, RadioPacket::Value(ValueMessage::new(0, Some(4.0))))
            .to_vec()
            .unwrap();
        ether.borrow_mut().push_back(AirFrame {
            sender: None,
            bytes,
        });
        deliver_frames(&ether, &badges);
        for badge in badges.iter_mut() {
            badge.step();
        }

        let totals: Vec<f64> = badges
            .iter()
            .map(|b| b.runtime.badge().state().avg_temp())
            .collect();
        assert_eq!(totals, vec![23.0, 23.0, 0.0]);
    }

    #[test]
    fn test_waiting_an_hour_fires_reminder() {
        let ether: Ether = Rc::new(RefCell::new(VecDeque::new()));
        let opts = options(&[21]);
        let channels: Vec<EventChannel> = vec![EventChannel::new()];
        let mut badges = build_badges(&opts, &channels, &ether).unwrap();

        run_for(&mut badges, &ether, Duration::from_secs(61 * 60));
        let badge = badges[0].runtime.badge();
        assert_eq!(badge.display().current(), Some("DrinkWater"));
        assert!(badges[0].runtime.next_reminder() > Instant::from_millis(3_600_000));
    }
}
