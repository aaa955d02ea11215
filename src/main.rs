//! forge – command-line report markup → PDF converter.
//!
//! Usage:
//!   forge [input|-] [output.pdf] [--landscape] [--legacy-size] [--title "My Report"]
//!         [--config cfg.json] [--dump-commands] [--dump-draw] [-v] [--debug]
//!
//! With no input (or `-`) the markup is read from stdin. If `output.pdf` is
//! omitted the PDF is written next to the input file with the same stem
//! (e.g. `orders.rpt` → `orders.pdf`), or to `report.pdf` for stdin.

use std::io::{self, Read};
use std::{env, fs, path::PathBuf, process};

use report_forge::compiler::{commands_to_json, decode_input};
use report_forge::pipeline::{
    compile_markup, generate_pdf, render_to_log, PageOrientation, PipelineConfig,
};

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut landscape = false;
    let mut legacy_size = false;
    let mut dump_commands = false;
    let mut dump_draw = false;
    let mut level = log::LevelFilter::Warn;
    let mut title: Option<String> = None;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--landscape" | "-l" => landscape = true,
            "--legacy-size" => legacy_size = true,
            "--dump-commands" => dump_commands = true,
            "--dump-draw" => dump_draw = true,
            "--verbose" | "-v" => level = level.max(log::LevelFilter::Info),
            "--debug" => level = log::LevelFilter::Debug,
            "--title" | "-t" => match iter.next() {
                Some(v) => title = Some(v.clone()),
                None => fail_usage(&args[0], "--title needs a value"),
            },
            "--config" | "-c" => match iter.next() {
                Some(v) => config_path = Some(PathBuf::from(v)),
                None => fail_usage(&args[0], "--config needs a path"),
            },
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            "-" if positional == 0 => positional += 1,
            other if other.starts_with('-') => {
                fail_usage(&args[0], &format!("Unknown flag: {other}"));
            }
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    fail_usage(&args[0], &format!("Unexpected argument: {path}"));
                }
                positional += 1;
            }
        }
    }

    // RUST_LOG, when set, overrides the flag-derived level.
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let mut config = match &config_path {
        Some(path) => {
            let json = fs::read_to_string(path).unwrap_or_else(|e| {
                fail(&format!("Error reading config '{}': {e}", path.display()))
            });
            PipelineConfig::from_json(&json)
                .unwrap_or_else(|e| fail(&format!("Error in config '{}': {e}", path.display())))
        }
        None => PipelineConfig::default(),
    };
    if legacy_size {
        let legacy = PipelineConfig::legacy_page();
        config.page_width = legacy.page_width;
        config.page_height = legacy.page_height;
    }
    if landscape {
        config.orientation = PageOrientation::Landscape;
    }
    if let Some(t) = title {
        config.title = t;
    }
    // Includes and pictures are also looked up next to the input file.
    if let Some(dir) = input_path.as_ref().and_then(|p| p.parent()) {
        if !dir.as_os_str().is_empty() {
            config.search_paths.push(dir.to_path_buf());
        }
    }

    let markup = read_input(input_path.as_ref());

    if dump_commands {
        match compile_markup(&markup, &config) {
            Ok(commands) => println!("{}", commands_to_json(&commands)),
            Err(e) => fail(&format!("Error compiling markup: {e}")),
        }
        return;
    }

    if dump_draw {
        match render_to_log(&markup, &config) {
            Ok(log) => println!("{}", log.to_json()),
            Err(e) => fail(&format!("Error rendering markup: {e}")),
        }
        return;
    }

    // Default output: same directory + same stem as input, but with .pdf
    let output = output_path.unwrap_or_else(|| match &input_path {
        Some(input) => {
            let mut o = input.clone();
            o.set_extension("pdf");
            o
        }
        None => PathBuf::from("report.pdf"),
    });

    match generate_pdf(&markup, &config) {
        Ok(out) => {
            // Create output directory if necessary.
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        fail(&format!("Error creating output directory: {e}"));
                    }
                }
            }
            if let Err(e) = fs::write(&output, &out.bytes) {
                fail(&format!("Error writing '{}': {e}", output.display()));
            }
            eprintln!(
                "Wrote '{}' ({} bytes, {} page{}, {} cop{})",
                output.display(),
                out.bytes.len(),
                out.pages,
                if out.pages == 1 { "" } else { "s" },
                out.copies,
                if out.copies == 1 { "y" } else { "ies" }
            );
        }
        Err(e) => fail(&format!("Error generating PDF: {e}")),
    }
}

fn read_input(path: Option<&PathBuf>) -> String {
    let result = match path {
        Some(p) => fs::read(p),
        None => {
            let mut bytes = Vec::new();
            io::stdin().read_to_end(&mut bytes).map(|_| bytes)
        }
    };
    match result {
        Ok(bytes) => decode_input(&bytes),
        Err(e) => {
            let source = path.map_or("stdin".to_string(), |p| format!("'{}'", p.display()));
            fail(&format!("Error reading {source}: {e}"))
        }
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    process::exit(1);
}

fn fail_usage(prog: &str, message: &str) -> ! {
    eprintln!("{message}");
    print_usage(prog);
    process::exit(1);
}

fn print_usage(prog: &str) {
    eprintln!("forge – report markup to PDF converter (report-forge)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} [input|-] [output.pdf] [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [input]        Markup file to convert (default: stdin)");
    eprintln!("  [output.pdf]   Output path  (default: same stem as input with .pdf, or report.pdf)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --title, -t      Document title in PDF metadata (default: Report)");
    eprintln!("  --landscape      Use landscape page orientation");
    eprintln!("  --legacy-size    Use the 590×890 pt legacy printer page");
    eprintln!("  --config, -c     Read a JSON pipeline config");
    eprintln!("  --dump-commands  Print the compiled commands as JSON and exit");
    eprintln!("  --dump-draw      Print the recorded draw log as JSON and exit");
    eprintln!("  --verbose, -v    Log at info level");
    eprintln!("  --debug          Log at debug level");
    eprintln!("  --help           Print this message");
}
