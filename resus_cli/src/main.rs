use clap::{Parser, Subcommand};
use resus_core::{
    evaluate, hs_and_ts, report, Config, Drug, Evaluation, Result, Rhythm, SessionController,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;
use std::thread;

#[derive(Parser)]
#[command(name = "aclsassist")]
#[command(about = "ACLS resuscitation checklist and timer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override report output directory
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive resuscitation session (default)
    Run {
        /// Disable the background 1s timer; time advances only via `wait`
        #[arg(long)]
        no_timer: bool,
    },

    /// Print the Hs & Ts reversible-causes checklist
    Causes,
}

enum Event {
    Command(String),
    Tick,
    Eof,
}

/// Destructive command awaiting a y/N answer
enum Pending {
    Reset,
    End,
}

fn main() -> Result<()> {
    resus_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let output_dir = cli
        .output_dir
        .unwrap_or_else(|| config.report.output_dir.clone());

    match cli.command {
        Some(Commands::Run { no_timer }) => cmd_run(no_timer, output_dir, &config),
        Some(Commands::Causes) => cmd_causes(),
        None => cmd_run(false, output_dir, &config),
    }
}

fn cmd_causes() -> Result<()> {
    println!("Hs & Ts - reversible causes of cardiac arrest\n");
    for item in hs_and_ts() {
        println!("  {:<28} {}", item.en, item.cn);
    }
    Ok(())
}

fn cmd_run(no_timer: bool, output_dir: PathBuf, config: &Config) -> Result<()> {
    let (tx, rx): (Sender<Event>, Receiver<Event>) = channel();

    // Stdin reader thread: one Event::Command per line
    let input_tx = tx.clone();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if input_tx.send(Event::Command(line)).is_err() {
                        return;
                    }
                }
                Err(_) => break,
            }
        }
        let _ = input_tx.send(Event::Eof);
    });

    let mut controller = if no_timer {
        SessionController::new()
    } else {
        let tick_tx = Mutex::new(tx);
        SessionController::new().with_ticker(move || {
            if let Ok(tx) = tick_tx.lock() {
                let _ = tx.send(Event::Tick);
            }
        })
    };

    println!("ACLS Resuscitation Assistant - type 'help' for commands\n");
    let mut last_panel = render_panel(&controller, config, None);
    let mut pending: Option<Pending> = None;

    loop {
        let event = match rx.recv() {
            Ok(event) => event,
            Err(_) => break,
        };

        match event {
            Event::Tick => {
                controller.tick();
                // Redraw only when the advisory set actually changed
                last_panel = render_panel(&controller, config, Some(&last_panel));
            }
            Event::Eof => break,
            Event::Command(line) => {
                if let Some(p) = pending.take() {
                    handle_confirmation(&mut controller, p, &line);
                    last_panel = render_panel(&controller, config, None);
                    continue;
                }

                match dispatch(&mut controller, &line, &output_dir)? {
                    Outcome::Continue => {
                        last_panel = render_panel(&controller, config, None);
                    }
                    Outcome::Quiet => {}
                    Outcome::Confirm(p) => pending = Some(p),
                    Outcome::Quit => break,
                }
            }
        }
    }

    Ok(())
}

enum Outcome {
    /// State may have changed; redraw the panel
    Continue,
    /// Informational command; leave the display alone
    Quiet,
    Confirm(Pending),
    Quit,
}

fn dispatch(
    controller: &mut SessionController,
    line: &str,
    output_dir: &std::path::Path,
) -> Result<Outcome> {
    tracing::debug!("command: {}", line);
    let mut parts = line.split_whitespace();
    let command = match parts.next() {
        Some(word) => word.to_lowercase(),
        None => return Ok(Outcome::Quiet),
    };
    let rest: Vec<&str> = parts.collect();

    match command.as_str() {
        "start" => controller.start(),
        "pause" => controller.pause(),
        "shock" => controller.record_shock(),
        "cycle" => controller.reset_cycle(),
        "airway" => controller.record_airway(),
        "epi" => controller.record_drug(Drug::Epinephrine),
        "amio300" => controller.record_drug(Drug::AmiodaroneFirstDose),
        "amio150" => controller.record_drug(Drug::AmiodaroneSecondDose),

        "rhythm" => match rest.first() {
            Some(word) => match word.parse::<Rhythm>() {
                Ok(rhythm) => controller.record_rhythm(rhythm),
                Err(e) => {
                    eprintln!("{}", e);
                    return Ok(Outcome::Quiet);
                }
            },
            None => {
                let labels: Vec<String> = resus_core::rhythm_options()
                    .iter()
                    .map(|o| o.label.to_lowercase())
                    .collect();
                eprintln!("usage: rhythm <{}>", labels.join("|"));
                return Ok(Outcome::Quiet);
            }
        },

        "drug" => {
            if rest.is_empty() {
                eprintln!("usage: drug <name>");
                return Ok(Outcome::Quiet);
            }
            controller.record_drug(Drug::Other(rest.join(" ")));
        }

        "proc" => {
            if rest.is_empty() {
                eprintln!("usage: proc <description>");
                return Ok(Outcome::Quiet);
            }
            let text = rest.join(" ");
            controller.record_procedure(text.clone(), text);
        }

        "wait" => {
            let n: u32 = rest
                .first()
                .and_then(|w| w.parse().ok())
                .unwrap_or(1);
            for _ in 0..n {
                controller.tick();
            }
        }

        "log" => {
            print_log(controller, rest.first() == Some(&"json"))?;
            return Ok(Outcome::Quiet);
        }

        "report" => {
            let dir = rest
                .first()
                .map(PathBuf::from)
                .unwrap_or_else(|| output_dir.to_path_buf());
            match report::write_report(controller.session(), &dir) {
                Ok(path) => println!("Report written to {}", path.display()),
                Err(resus_core::Error::EmptyLog) => println!("No log entries to export."),
                Err(e) => return Err(e),
            }
            return Ok(Outcome::Quiet);
        }

        "csv" => match rest.first() {
            Some(path) => {
                let path = PathBuf::from(path);
                match report::write_log_csv(controller.session(), &path) {
                    Ok(count) => println!("Exported {} log rows to {}", count, path.display()),
                    Err(resus_core::Error::EmptyLog) => println!("No log entries to export."),
                    Err(e) => return Err(e),
                }
                return Ok(Outcome::Quiet);
            }
            None => {
                eprintln!("usage: csv <path>");
                return Ok(Outcome::Quiet);
            }
        },

        "reset" => {
            println!("Reset all data? This cannot be undone. (y/N)");
            return Ok(Outcome::Confirm(Pending::Reset));
        }

        "end" => {
            println!("Are you sure you want to end resuscitation? Patient Deceased. (y/N)");
            return Ok(Outcome::Confirm(Pending::End));
        }

        "causes" => {
            cmd_causes()?;
            return Ok(Outcome::Quiet);
        }

        "help" => {
            print_help();
            return Ok(Outcome::Quiet);
        }

        "quit" | "exit" => return Ok(Outcome::Quit),

        _ => {
            eprintln!("Unknown command: {} (try 'help')", command);
            return Ok(Outcome::Quiet);
        }
    }

    Ok(Outcome::Continue)
}

fn handle_confirmation(controller: &mut SessionController, pending: Pending, answer: &str) {
    if !answer.trim().eq_ignore_ascii_case("y") {
        println!("Cancelled.");
        return;
    }
    match pending {
        Pending::Reset => {
            controller.reset_all();
            println!("All data reset.");
        }
        Pending::End => {
            controller.end();
            println!("Resuscitation ended.");
        }
    }
}

/// Render the status line and advisory panel
///
/// With `unchanged_since` set (tick redraws), skips printing when the
/// panel text is identical to the previous one and returns it as-is.
fn render_panel(
    controller: &SessionController,
    config: &Config,
    unchanged_since: Option<&String>,
) -> String {
    let state = controller.session().state();
    let mut panel = String::new();

    panel.push_str(&format!(
        "Elapsed {} | Cycle {} | Shocks {} | Rhythm {}\n",
        report::format_offset(state.elapsed_seconds),
        report::format_offset(state.cycle_seconds),
        state.shock_count,
        state
            .current_rhythm
            .map(|r| r.label())
            .unwrap_or("none"),
    ));

    match evaluate(state) {
        Evaluation::Idle => {
            panel.push_str(&localized("  READY", "准备就绪", config));
            panel.push_str(&localized(
                "  Select rhythm and start timer to begin algorithm.",
                "选择心律并启动计时器以开始流程。",
                config,
            ));
        }
        Evaluation::Advisories(advisories) if advisories.is_empty() => {
            if state.active {
                panel.push_str(&localized(
                    "  CONTINUE HIGH-QUALITY CPR",
                    "持续高质量心肺复苏",
                    config,
                ));
                panel.push_str("    - Push hard & fast (100-120/min)\n");
                panel.push_str("    - Allow recoil / Minimize interruptions\n");
            }
        }
        Evaluation::Advisories(advisories) => {
            for advisory in advisories {
                let marker = if advisory.urgent { "[!!]" } else { "[--]" };
                panel.push_str(&localized(
                    &format!("  {} {}", marker, advisory.message),
                    advisory.message_cn,
                    config,
                ));
            }
        }
    }

    if unchanged_since == Some(&panel) {
        return panel;
    }
    print!("{}", panel);
    panel
}

fn localized(en: &str, cn: &str, config: &Config) -> String {
    if config.display.localized {
        format!("{} / {}\n", en, cn)
    } else {
        format!("{}\n", en)
    }
}

fn print_log(controller: &SessionController, json: bool) -> Result<()> {
    let log = controller.session().log();
    if json {
        println!("{}", serde_json::to_string_pretty(log)?);
        return Ok(());
    }
    if log.is_empty() {
        println!("(log empty)");
        return Ok(());
    }
    for entry in log {
        println!(
            "[{}] {:<9} {} ({})",
            report::format_offset(entry.time_offset),
            entry.category.as_str(),
            entry.action,
            entry.action_cn,
        );
    }
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  start | pause            start or pause the timer");
    println!("  rhythm <vf|pvt|pea|asystole|rosc>");
    println!("                           record a rhythm check");
    println!("  shock                    record a delivered shock");
    println!("  epi | amio300 | amio150  record a drug dose");
    println!("  drug <name>              record any other drug");
    println!("  airway | proc <text>     record a procedure");
    println!("  cycle                    reset the 2-minute cycle timer");
    println!("  wait <n>                 advance n seconds (with --no-timer)");
    println!("  log [json]               show the event log");
    println!("  report [dir]             export the text report");
    println!("  csv <path>               export the event log as CSV");
    println!("  causes                   show the Hs & Ts checklist");
    println!("  end | reset              end session / reset all (confirmed)");
    println!("  quit");
}
