use bf_blocks::{compile, Executor, Interpreter};

fn main() {
    // Copy cell 0 into cell 1, then print it
    let program = compile("+++[>+<-]>.").expect("program should compile");

    // The block graph, as `bf ir` prints it
    println!("{program}");

    // Walk the graph with a trace table; output values are collected instead of printed
    let mut values: Vec<i32> = Vec::new();
    let mut interp = Interpreter::new().with_trace(true);
    interp.invoke(&program, &mut values).expect("program should run");
    println!("output: {values:?}");
}
