use clap::Args;
use std::io::{self, Write};
use crate::cli_util::{load_source, print_compile_error};
use crate::compile;

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct IrArgs {
    /// Read Brainfuck code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Concatenated Brainfuck code parts
    #[arg(value_name = "code", trailing_var_arg = true)]
    pub code: Vec<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: IrArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let IrArgs { file, code, .. } = args;

    if file.is_some() && !code.is_empty() {
        eprintln!("{program}: cannot use positional code together with --file");
        usage_and_exit(program, 2);
    }

    let code_str = match load_source(program, file, code) {
        Ok(s) => s,
        Err(exit_code) => return exit_code,
    };

    match compile(&code_str) {
        Ok(compiled) => {
            print!("{compiled}");
            let _ = io::stdout().flush();
            0
        }
        Err(err) => {
            print_compile_error(Some(program), &code_str, &err);
            1
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} ir "<code>"
  {0} ir --file <PATH>

Options:
  --file, -f <PATH>  Read Brainfuck code from PATH instead of positional "<code>"
  --help, -h         Show this help

Description:
  Compiles the program and prints its block graph without running it.
  With no code the graph for the empty program is printed.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
