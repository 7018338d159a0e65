// tapefold: an optimizing interpreter for the eight-symbol tape language

use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;
use std::{env, fs, process};

use tapefold::interpreter::engine::Interpreter;
use tapefold::parser::parser::Parser;
use tapefold::trace::agent::{self, AgentConfig};
use tapefold::trace::{SpanRecorder, TraceSink};

fn main() {
    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        let program_name = args.first().map(|s| s.as_str()).unwrap_or("tapefold");
        eprintln!("Error: No input file provided");
        eprintln!();
        eprintln!("Usage: {} <file.bf>", program_name);
        eprintln!();
        eprintln!("Examples:");
        eprintln!(
            "  {} demos/hello.bf           # Run the traced hello-world demo",
            program_name
        );
        eprintln!(
            "  {} myprogram.bf             # Run your own program",
            program_name
        );
        eprintln!();
        eprintln!("Set {} to echo trace markers to stderr;", tapefold::interpreter::engine::DEBUG_ENV);
        eprintln!(
            "set {} or {} to ship recorded spans to a trace agent.",
            agent::NAME_ENV,
            agent::SOCKET_ENV
        );
        process::exit(1);
    }

    let source_path = &args[1];

    if !Path::new(source_path).exists() {
        eprintln!("Error: File '{}' not found", source_path);
        eprintln!(
            "Usage: {} [file.bf]",
            args.first().map(|s| s.as_str()).unwrap_or("tapefold")
        );
        process::exit(1);
    }

    let mut recorder = SpanRecorder::new();

    // The read-and-compile phase is itself a reported span.
    recorder.span_begin("LoadCode", SystemTime::now(), 0);

    let source = match fs::read_to_string(source_path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading '{}': {}", source_path, e);
            process::exit(1);
        }
    };

    // An unmatched bracket aborts here, before any instruction executes.
    let program = match Parser::new(&source).parse_program() {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    recorder.span_end("LoadCode", SystemTime::now(), 0);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut machine =
        Interpreter::with_trace(program, stdin.lock(), stdout.lock(), recorder);

    if let Err(e) = machine.run() {
        eprintln!("Runtime error: {}", e);
        process::exit(1);
    }

    let mut recorder = machine.into_trace();
    recorder.finish();
    let _ = io::stdout().flush();

    // Span reporting is fire-and-forget and only attempted when configured.
    if let Some(config) = AgentConfig::from_env() {
        agent::report(&config, recorder.records(), recorder.start_time(), source_path);
    }
}
