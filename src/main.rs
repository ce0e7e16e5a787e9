use std::io::{self, BufRead, Write};

use forecast_dash::notify::notifier_from_config;
use forecast_dash::{DashboardConfig, DataSource, Event, Presenter, Session, TerminalPresenter};

/// One line typed at the prompt
#[derive(Debug, PartialEq)]
enum Command {
    Apply(Event),
    Entities(usize),
    Show,
    Help,
    Quit,
}

/// Panels are numbered from 1 at the prompt
fn parse_panel(arg: Option<&str>) -> Result<usize, String> {
    let arg = arg.ok_or("missing panel number")?;
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("invalid panel number '{}'", arg)),
    }
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let command = match words.next() {
        Some(word) => word,
        None => return Ok(Command::Show),
    };
    let parsed = match command {
        "select" => {
            let panel = parse_panel(words.next())?;
            let entity: Vec<&str> = words.by_ref().collect();
            if entity.is_empty() {
                return Err("missing entity".into());
            }
            Command::Apply(Event::SelectEntity {
                panel,
                entity: entity.join(" "),
            })
        }
        "years" => {
            let panel = parse_panel(words.next())?;
            let arg = words.next().ok_or("missing number of years")?;
            let years = arg
                .parse()
                .map_err(|_| format!("invalid number of years '{}'", arg))?;
            Command::Apply(Event::SetYears { panel, years })
        }
        "email" => Command::Apply(Event::SetRecipient(words.next().map(str::to_string))),
        "entities" => Command::Entities(parse_panel(words.next())?),
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{}'", other)),
    };
    if words.next().is_some() {
        return Err(format!("too many arguments for '{}'", command));
    }
    Ok(parsed)
}

fn print_help() {
    println!("Commands:");
    println!("  select <panel> <entity>   Choose the entity shown in a panel");
    println!("  years <panel> <n>         Forecast horizon in years (1-4)");
    println!("  email [address]           Set or clear the notification recipient");
    println!("  entities <panel>          List the entities a panel can show");
    println!("  show                      Redraw the dashboard");
    println!("  quit                      Exit");
}

fn run() -> forecast_dash::Result<()> {
    let config = DashboardConfig::load_default()?;
    let notifier = match &config.notification {
        Some(notification) => match notifier_from_config(notification, config.network_timeout()) {
            Ok(notifier) => Some(notifier),
            Err(e) => {
                log::warn!("notifications disabled: {}", e);
                None
            }
        },
        None => None,
    };
    let source = DataSource::new(config.network_timeout());

    let mut session = Session::new(config, source, notifier)?;
    let mut presenter = TerminalPresenter::stdout();
    session.refresh();
    presenter.present(&session.report())?;

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_command(&line) {
            Ok(Command::Apply(event)) => match session.apply(event) {
                Ok(recomputed) if recomputed.is_empty() => println!("Nothing changed."),
                Ok(_) => presenter.present(&session.report())?,
                Err(e) => println!("Error: {}", e),
            },
            Ok(Command::Entities(panel)) => match session.entities(panel) {
                Ok(entities) => println!("{}", entities.join(", ")),
                Err(e) => println!("Error: {}", e),
            },
            Ok(Command::Show) => presenter.present(&session.report())?,
            Ok(Command::Help) => print_help(),
            Ok(Command::Quit) => break,
            Err(message) => {
                println!("Error: {}", message);
                print_help();
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();

    println!("forecast-dash {}", forecast_dash::VERSION);
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
