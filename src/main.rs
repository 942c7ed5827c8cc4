//! # Rapport CLI
//!
//! Usage:
//!   rapport form.json submission.json -o report.json
//!   rapport form.json - < submission.json
//!   rapport --example > submission.json
//!
//! Assembles the submission onto the recording canvas and writes a JSON
//! document holding the draw-op dump and the assembly report.

use std::env;
use std::fs;
use std::io::{self, Read};

use rapport::RecordingCanvas;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_submission_json());
        return;
    }

    let Some(cli) = parse_args(&args) else {
        eprintln!("Usage: rapport <form.json> <submission.json|-> [-o report.json]");
        std::process::exit(2);
    };

    let form_json = fs::read_to_string(&cli.form).unwrap_or_else(|e| {
        eprintln!("✗ Failed to read form '{}': {}", cli.form, e);
        std::process::exit(1);
    });
    let submission_json = if cli.submission == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .expect("Failed to read stdin");
        buf
    } else {
        fs::read_to_string(&cli.submission).unwrap_or_else(|e| {
            eprintln!("✗ Failed to read submission '{}': {}", cli.submission, e);
            std::process::exit(1);
        })
    };

    let output_path = cli.output;

    let mut canvas = RecordingCanvas::new();
    match rapport::assemble_json(&mut canvas, &form_json, &submission_json) {
        Ok(report) => {
            let output = serde_json::json!({
                "report": &report,
                "canvas": &canvas,
            });
            let pretty = serde_json::to_string_pretty(&output).expect("report serialization");
            fs::write(&output_path, &pretty).expect("Failed to write report");
            eprintln!(
                "✓ Assembled {} pages, {} overflow entries, written to {}",
                report.page_count,
                report.overflow_placements.len(),
                output_path
            );
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    }
}

struct CliArgs {
    form: String,
    submission: String,
    output: String,
}

/// Parse command-line arguments. `-o` consumes the following token, so an
/// output path never counts as a positional input.
fn parse_args(args: &[String]) -> Option<CliArgs> {
    let mut positional: Vec<&str> = Vec::new();
    let mut output = "report.json".to_string();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "-o" {
            output = iter.next()?.clone();
        } else if arg == "-" || !arg.starts_with('-') {
            positional.push(arg.as_str());
        }
    }

    if positional.len() != 2 {
        return None;
    }
    Some(CliArgs {
        form: positional[0].to_string(),
        submission: positional[1].to_string(),
        output,
    })
}

fn example_submission_json() -> &'static str {
    r#"{
  "values": {
    "customer": "Hartmann Facility Services GmbH",
    "site": "Warehouse 4, Dock C",
    "work_done": [
      "Replaced the damaged conveyor belt segment",
      "Re-tensioned drive chain and lubricated all bearings",
      "Verified emergency stop loop end to end"
    ]
  },
  "checkboxes": {
    "safety_briefing": true,
    "area_cleaned": true
  },
  "notes": {
    "area_cleaned": "Minor oil residue removed near dock gate"
  },
  "partsRows": [
    ["Conveyor belt segment B-220", "1", "replaced"],
    ["", "", ""],
    ["Chain lubricant 5L", "2", "consumed"]
  ],
  "employees": [
    { "name": "A. Keller", "role": "technician",
      "arrival": "2024-06-24 08:00", "departure": "2024-06-24 17:30" },
    { "name": "S. Brandt", "role": "apprentice",
      "arrival": "2024-06-24 09:00", "departure": "" }
  ],
  "images": []
}
"#
}
