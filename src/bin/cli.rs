#![cfg(not(tarpaulin_include))]

use calcweb::command::{Command, HELP, parse_command};
use calcweb::input::format_number;
use calcweb::saving::{load_history, save_history};
use calcweb::{CalcError, CalcOutcome, Calculator, Config, Continuation, HttpBackend};
use std::env;
use std::io::{self, Write};
use std::time::Instant;

/// Run one command. `Ok(false)` ends the session.
async fn execute(
    calc: &mut Calculator<HttpBackend>,
    command: Command,
    status: &mut String,
) -> Result<bool, CalcError> {
    let outcome: Option<CalcOutcome> = match command {
        Command::Quit => return Ok(false),
        Command::Help => {
            println!("{}", HELP);
            None
        }
        Command::History => {
            if calc.history().is_empty() {
                println!("(no calculations yet)");
            }
            for (i, entry) in calc.history().entries().enumerate() {
                println!("{:>3}. {}", i + 1, entry);
            }
            None
        }
        Command::Recall(n) => {
            let value = calc.recall(n - 1)?;
            println!("continuing from {}", format_number(value));
            None
        }
        Command::Clear => {
            calc.clear();
            None
        }
        Command::ClearHistory => {
            calc.clear_all();
            None
        }
        Command::Save(file) => {
            save_history(calc.history(), &file)?;
            println!("saved {} entries to {}", calc.history().len(), file);
            None
        }
        Command::Load(file) => {
            let history = load_history(&file)?;
            calc.replace_history(history)?;
            println!("loaded {} entries from {}", calc.history().len(), file);
            None
        }
        Command::Add { num1, num2 } => Some(calc.add(&num1, &num2).await?),
        Command::Simple {
            num1,
            operation,
            num2,
        } => Some(calc.simple(&num1, operation, &num2).await?),
        Command::Complex(expression) => Some(calc.complex(&expression).await?),
        Command::Scientific { function, value } => {
            Some(calc.scientific(function, &value).await?)
        }
        Command::Matrix {
            operation,
            matrix_a,
            matrix_b,
        } => Some(
            calc.matrix(operation, &matrix_a, matrix_b.as_deref())
                .await?,
        ),
    };

    if let Some(outcome) = outcome {
        println!("Result: {}", outcome);
    }
    *status = String::from("ok");
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = Config::load(None)?;
    // Backend URL may be given on the command line instead of CALCWEB_BASE_URL
    if let Some(url) = args.get(1) {
        config.base_url = url.clone();
        config.validate()?;
    }

    let backend = HttpBackend::from_config(&config)?;
    println!("Calculator using {} (type 'help' for commands)", backend.base_url());
    let mut calc = Calculator::new(backend, config.history_capacity)?;

    let mut start_time = Instant::now();
    let mut status = String::from("ok");
    loop {
        let elapsed_time = start_time.elapsed().as_secs_f64();
        let running = match calc.state() {
            Continuation::Chained(value) => format!(" {}", format_number(value)),
            Continuation::Fresh => String::new(),
        };
        print!("[{:.1}] ({}){} > ", elapsed_time, status, running);
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        start_time = Instant::now();

        let result = match parse_command(&line) {
            Ok(command) => execute(&mut calc, command, &mut status).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                eprintln!("Error: {}", e);
                status = e.to_string();
            }
        }
    }

    Ok(())
}
