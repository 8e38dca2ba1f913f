use bf_blocks::commands::{ir, run};
use bf_blocks::{config, logging};
use clap::{Parser, Subcommand};
use std::env;
use std::io::{self, IsTerminal, Read, Write};

fn print_top_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run [--trace|-t] "<code>"      # Compile and run Brainfuck code (args are concatenated)
  {0} run [--trace|-t] --file <PATH> # Compile and run Brainfuck code loaded from file
  {0} ir  "<code>"                   # Print the compiled block graph
  {0} ir  --file <PATH>              # Print the block graph for a file
  {0} < program.bf                   # Compile and run Brainfuck code piped on stdin

Run "{0} <subcommand> --help" for more info.
Set BF_LOG (e.g. BF_LOG=debug) to see compiler and executor logs on stderr.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "bf", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Run(run::RunArgs),
    Ir(ir::IrArgs),
}

/// Run a program piped on stdin. Empty input exits quietly.
fn run_stdin(program: &str) -> i32 {
    if io::stdin().is_terminal() {
        print_top_usage_and_exit(program, 2);
    }

    let mut source = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut source) {
        eprintln!("{program}: failed reading UTF-8 from stdin: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    if source.trim().is_empty() {
        return 0;
    }

    run::execute_source(program, &source, false, config::resolve_limits(None, None))
}

fn main() {
    logging::init_logging();

    // We still pull the program name for help rendering consistency
    let program = env::args().next().unwrap_or_else(|| String::from("bf"));

    let cli = Cli::parse();

    if cli.help {
        print_top_usage_and_exit(&program, 0);
    }

    let code = match cli.command {
        Some(Command::Run(args)) => run::run(&program, args),
        Some(Command::Ir(args)) => ir::run(&program, args),
        None => run_stdin(&program),
    };

    std::process::exit(code);
}
