use clap::Args;
use std::thread;
use std::io::{self, Write};
use std::sync::{mpsc, Arc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};
use crate::cli_util::{load_source, print_compile_error, print_exec_error};
use crate::config::{self, Limits};
use crate::{compile, ExecError, Executor, Interpreter, StdoutOutput, StepControl};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    /// Print a step-by-step table of executed blocks
    #[arg(short = 't', long = "trace")]
    pub trace: bool,

    /// Read Brainfuck code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Concatenated Brainfuck code parts
    #[arg(value_name = "code", trailing_var_arg = true)]
    pub code: Vec<String>,

    /// Wall-clock timeout in milliseconds (fallback BF_TIMEOUT_MS; default 2_000)
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum interpreter steps before abort (fallback BF_MAX_STEPS; default unlimited)
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<u64>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("failed to write program output: {0}")]
    Output(#[from] io::Error),
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let RunArgs {
        trace,
        file,
        code,
        timeout_ms,
        max_steps,
        ..
    } = args;

    if file.is_none() && code.is_empty() {
        usage_and_exit(program, 2);
    }

    if file.is_some() && !code.is_empty() {
        eprintln!("{program}: cannot use positional code together with --file");
        usage_and_exit(program, 2);
    }

    let code_str = match load_source(program, file, code) {
        Ok(s) => s,
        Err(exit_code) => return exit_code,
    };

    execute_source(program, &code_str, trace, config::resolve_limits(timeout_ms, max_steps))
}

/// Compile `code` and run it on a worker thread under `limits`.
///
/// Program output goes to stdout followed by a newline; diagnostics go to
/// stderr. Returns the process exit code.
pub fn execute_source(program: &str, code: &str, trace: bool, limits: Limits) -> i32 {
    // Compile up front so bracket errors are reported before anything runs
    let compiled = match compile(code) {
        Ok(p) => p,
        Err(err) => {
            print_compile_error(Some(program), code, &err);
            return 1;
        }
    };

    let cancel = Arc::new(AtomicBool::new(false));

    // Ctrl+C cancels the running program instead of killing the process
    let sigint_flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || sigint_flag.store(true, Ordering::Relaxed)) {
        warn!(error = %e, "failed to set ctrl+c handler");
    }

    let (tx, rx) = mpsc::channel::<Result<(), RunError>>();
    let cancel_clone = cancel.clone();
    debug!(timeout_ms = limits.timeout_ms, max_steps = ?limits.max_steps, "starting worker");

    thread::spawn(move || {
        let max_steps = limits.max_steps.map(|n| usize::try_from(n).unwrap_or(usize::MAX));
        let mut interp = Interpreter::new()
            .with_control(StepControl::new(max_steps, cancel_clone))
            .with_trace(trace);

        let res = if trace {
            // Output is collected so it doesn't interleave with the table
            let mut values: Vec<i32> = Vec::new();
            let res = interp.invoke(&compiled, &mut values);
            let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            println!("OUTPUT | {}", rendered.join(" "));
            res.map_err(RunError::from)
        } else {
            let mut out = StdoutOutput::stdout();
            interp
                .invoke(&compiled, &mut out)
                .map_err(RunError::from)
                .and_then(|()| out.finish().map(drop).map_err(RunError::from))
        };
        let _ = tx.send(res);
    });

    let timeout = Duration::from_millis(limits.timeout_ms);
    let exit_code = match rx.recv_timeout(timeout) {
        Ok(Ok(())) => 0,
        Ok(Err(RunError::Exec(err))) => {
            print_exec_error(Some(program), &err);
            1
        }
        Ok(Err(err @ RunError::Output(_))) => {
            eprintln!("{program}: {err}");
            let _ = io::stderr().flush();
            1
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            cancel.store(true, Ordering::Relaxed);
            eprintln!("Execution aborted: wall-clock timeout exceeded ({} ms)", limits.timeout_ms);
            let _ = io::stderr().flush();
            1
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => 1,
    };

    // For readability, ensure output ends with a newline
    println!();
    let _ = io::stdout().flush();
    exit_code
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run [--trace|-t] "<code>"
  {0} run [--trace|-t] --file <PATH>

Options:
  --file,  -f <PATH>  Read Brainfuck code from PATH instead of positional "<code>"
  --trace, -t         Print a step-by-step table of executed blocks
  --timeout <MS>      Wall-clock timeout (fallback BF_TIMEOUT_MS, then bf.toml; default 2000)
  --max-steps <N>     Abort after N steps (fallback BF_MAX_STEPS, then bf.toml; default unlimited)
  --help,  -h         Show this help

Notes:
- The program is compiled to a block graph before anything runs; unmatched
  brackets are reported without executing.
- Characters outside of ><+-.[] are comments.
- Addressing a cell with the cursor off the 30,000-cell tape is a runtime error.

Examples:
- Load Brainfuck code from a file:
    {0} run --file ./program.bf
- Show which blocks run:
    {0} run --trace "++[>+<-]"
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
