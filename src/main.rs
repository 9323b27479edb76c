use clap::{Args, Parser as ClapParser, Subcommand};
use matrix_expr::{
    Command, CommandState, Limits,
    cli::{self, CliError, EvalOptions},
    output,
};
use std::{
    io::{self, BufRead, Read, Write},
    path::PathBuf,
};

#[derive(ClapParser)]
#[command(name = "mxe")]
#[command(about = "mxe - An interactive matrix expression calculator")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Most matrices a session may name
    #[arg(long, global = true, default_value_t = Limits::default().max_matrices)]
    max_matrices: usize,

    /// Most tables a session may name
    #[arg(long, global = true, default_value_t = Limits::default().max_tables)]
    max_tables: usize,

    /// Longest allowed matrix name
    #[arg(long, global = true, default_value_t = Limits::default().max_name_length)]
    max_name_length: usize,

    /// Largest row or column count a function may create
    #[arg(long, global = true, default_value_t = Limits::default().max_dimension)]
    max_dimension: usize,

    /// Decimal places shown in results
    #[arg(long, global = true, default_value_t = Limits::default().decimals)]
    decimals: u32,

    /// Bind a JSON file before running, as NAME=PATH (repeatable)
    #[arg(long = "load", global = true, value_parser = parse_load)]
    loads: Vec<(String, PathBuf)>,

    /// Print each command as a JSON object
    #[arg(long, global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(short, long, global = true)]
    pretty: bool,

    /// Log tokens, postfix order and dispatch to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

impl GlobalArgs {
    fn limits(&self) -> Limits {
        Limits {
            max_matrices: self.max_matrices,
            max_tables: self.max_tables,
            max_name_length: self.max_name_length,
            max_dimension: self.max_dimension,
            decimals: self.decimals,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate commands in order against one session
    Eval {
        /// Commands to run (one per line from stdin if not provided)
        commands: Vec<String>,
    },

    /// Read commands from stdin until EOF or 'exit'
    Repl,

    /// List every built-in function
    Functions,

    /// Show documentation for a topic or function
    Doc {
        /// Topic or function name (omit to list topics)
        name: Option<String>,
    },
}

fn parse_load(s: &str) -> Result<(String, PathBuf), String> {
    cli::parse_load_spec(s).map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Eval { commands } => run_eval(&cli.global, commands),
        Commands::Repl => run_repl(&cli.global),
        Commands::Functions => cli::open_session(cli.global.limits(), &[]).map(|session| {
            print!("{}", matrix_expr::docs::overview(session.registry()));
            true
        }),
        Commands::Doc { name: None } => {
            print!("{}", cli::get_docs_overview());
            Ok(true)
        }
        Commands::Doc { name: Some(name) } => cli::open_session(cli.global.limits(), &[])
            .and_then(|session| cli::get_doc(&name, session.registry()))
            .map(|content| {
                println!("{}", content.trim_end());
                true
            }),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every command succeeded.
fn run_eval(global: &GlobalArgs, commands: Vec<String>) -> Result<bool, CliError> {
    let commands = if commands.is_empty() && !atty::is(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(String::from)
            .collect()
    } else {
        commands
    };

    let options = EvalOptions {
        commands,
        limits: global.limits(),
        loads: global.loads.clone(),
    };

    let mut ok = true;
    for command in cli::execute_eval(&options)? {
        print_command(global, &command)?;
        ok &= command.state() != CommandState::Error;
    }
    Ok(ok)
}

fn run_repl(global: &GlobalArgs) -> Result<bool, CliError> {
    let mut session = cli::open_session(global.limits(), &global.loads)?;
    let interactive = atty::is(atty::Stream::Stdin);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        if interactive {
            print!("mxe> ");
            io::stdout().flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        match line.trim() {
            "" => continue,
            "exit" | "quit" => break,
            text => {
                let command = session.run(text);
                print_command(global, command)?;
            }
        }
    }
    Ok(true)
}

fn print_command(global: &GlobalArgs, command: &Command) -> Result<(), CliError> {
    if global.json {
        println!("{}", output::to_json(command, global.pretty)?);
        return Ok(());
    }
    match command.state() {
        CommandState::Error => eprintln!("Error: {}", command.message()),
        CommandState::Warning => {
            eprintln!("Warning: {}", command.message());
            println!("{}", command.output());
        }
        _ if command.output().is_empty() => {}
        _ => println!("{}", command.output()),
    }
    Ok(())
}
