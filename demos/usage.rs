use bf_blocks::{compile, Executor, Interpreter, StdoutOutput};

fn main() {
    // Classic Brainfuck "Hello World!" program
    let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";

    let program = match compile(code) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("Brainfuck compile error: {err}");
            std::process::exit(1);
        }
    };

    let mut out = StdoutOutput::stdout();
    if let Err(err) = Interpreter::new().invoke(&program, &mut out) {
        eprintln!("Brainfuck runtime error: {err}");
        std::process::exit(1);
    }
    if let Err(err) = out.finish() {
        eprintln!("failed to write output: {err}");
        std::process::exit(1);
    }

    // Tip: to inspect the compiled block graph instead, print the program:
    // println!("{program}");
}
