//! PulseMesh CLI
//!
//! Usage:
//!   pulsemesh --pulse '{"id":"p1","origin":"mirror",...}'   # Single validation
//!   pulsemesh --pulse '...' --track                          # Validate + track
//!   pulsemesh --interactive                                  # Interactive mode
//!   pulsemesh --pulse '...' --json                           # JSON output

use clap::Parser;
use colored::Colorize;
use std::io::{self, BufRead, Write};

use pulsemesh::core::{DecayService, GovernanceGate};
use pulsemesh::types::{Pulse, Verdict};
use pulsemesh::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "pulsemesh",
    version = VERSION,
    about = "PulseMesh - validate pulses and track their coherence decay",
    long_about = "PulseMesh gates pulses through governance validation and tracks\n\
                  a continuously decaying coherence score per pulse.\n\n\
                  Modes:\n  \
                  --pulse        Validate one pulse (JSON)\n  \
                  --interactive  REPL: enter pulses, inspect rules/log/metrics\n\n\
                  Statuses:\n  \
                  ACTIVE      - coherence above the decay threshold\n  \
                  DECAYED     - coherence dropped below threshold\n  \
                  TERMINATED  - explicitly ended"
)]
struct Args {
    /// Pulse to validate, as JSON (single mode)
    #[arg(short, long)]
    pulse: Option<String>,

    /// Also register the pulse with the decay tracker and show its metrics
    #[arg(short, long)]
    track: bool,

    /// Interactive mode - read pulses from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show matched rule detail and warnings
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if args.interactive {
        run_interactive(&args).await;
    } else if let Some(ref raw) = args.pulse {
        run_single(raw, &args).await;
    } else {
        // Default to interactive if no mode specified
        run_interactive(&args).await;
    }
}

/// Validate (and optionally track) a single pulse
async fn run_single(raw: &str, args: &Args) {
    let pulse = match parse_pulse(raw) {
        Ok(pulse) => pulse,
        Err(e) => {
            eprintln!("invalid pulse JSON: {}", e);
            std::process::exit(2);
        }
    };

    let mut gate = GovernanceGate::new();
    let service = DecayService::new();

    let verdict = gate.validate(&pulse);
    print_verdict(&verdict, args, &gate);

    if args.track && verdict.approved {
        let metrics = service.track(&pulse).await;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&metrics).unwrap_or_default());
        } else if args.no_color {
            println!("{}", metrics.to_parseable_string());
        } else {
            println!("{}", metrics.to_terminal_string());
        }
    }

    if !verdict.approved {
        std::process::exit(1);
    }
}

/// Interactive mode: pulses in, verdicts and metrics out
async fn run_interactive(args: &Args) {
    let mut gate = GovernanceGate::new();
    let mut service = DecayService::new();
    service.initialize().await;

    print_header(args.no_color);
    println!("Enter a pulse as JSON, or shorthand: <origin> <target> <intent> [coherence]");
    println!("Commands: rules | log | metrics | quit");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("pulse> ");
        let _ = stdout.flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        match line {
            "rules" => {
                for rule in gate.all_rules() {
                    println!("  {} {} [{}]", rule.rule_id, rule.name, rule.condition);
                }
                continue;
            }
            "log" => {
                for entry in gate.validation_log() {
                    println!(
                        "  {} pulse={} approved={} rule={}",
                        entry.timestamp.format("%H:%M:%S"),
                        entry.pulse_id,
                        entry.approved,
                        entry.rule_id
                    );
                }
                continue;
            }
            "metrics" => {
                let mut all = service.all_metrics().await;
                all.sort_by(|a, b| a.pulse_id.cmp(&b.pulse_id));
                for m in all {
                    if args.no_color {
                        println!("  {}", m.to_parseable_string());
                    } else {
                        println!("  {}", m.to_terminal_string());
                    }
                }
                continue;
            }
            _ => {}
        }

        let pulse = if line.starts_with('{') {
            match parse_pulse(line) {
                Ok(pulse) => pulse,
                Err(e) => {
                    println!("invalid pulse JSON: {}", e);
                    continue;
                }
            }
        } else {
            match parse_shorthand(line) {
                Some(pulse) => pulse,
                None => {
                    println!("expected: <origin> <target> <intent> [coherence]");
                    continue;
                }
            }
        };

        let verdict = gate.validate(&pulse);
        print_verdict(&verdict, args, &gate);

        if verdict.approved {
            let metrics = service.track(&pulse).await;
            if !args.json {
                if args.no_color {
                    println!("{}", metrics.to_parseable_string());
                } else {
                    println!("{}", metrics.to_terminal_string());
                }
            }
        }
    }

    service.stop_decay_updates();
    println!("\nSession ended. Tracked pulses: {}", service.all_metrics().await.len());
}

/// Parse a pulse from JSON, generating an id if the caller omitted one
fn parse_pulse(raw: &str) -> Result<Pulse, serde_json::Error> {
    let mut value: serde_json::Value = serde_json::from_str(raw)?;
    if let Some(obj) = value.as_object_mut() {
        obj.entry("id").or_insert_with(|| generate_pulse_id().into());
    }
    serde_json::from_value(value)
}

/// Shorthand: "mirror core update 0.8"
fn parse_shorthand(line: &str) -> Option<Pulse> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 || parts.len() > 4 {
        return None;
    }
    let coherence = match parts.get(3) {
        Some(raw) => Some(raw.parse::<f64>().ok()?),
        None => None,
    };
    Some(Pulse {
        id: generate_pulse_id(),
        origin: Some(parts[0].to_string()),
        target: Some(parts[1].to_string()),
        intent: Some(parts[2].to_string()),
        payload: serde_json::Value::Null,
        coherence,
        timestamp: chrono::Utc::now(),
        status: Default::default(),
    })
}

fn print_verdict(verdict: &Verdict, args: &Args, gate: &GovernanceGate) {
    if args.json {
        println!("{}", serde_json::to_string_pretty(verdict).unwrap_or_default());
        return;
    }
    if args.no_color {
        println!("{}", verdict.to_parseable_string());
        for warning in &verdict.warnings {
            println!("warning: {}", warning);
        }
    } else {
        println!("{}", verdict.to_terminal_string());
    }
    if args.verbose {
        if let Some(rule) = gate.rule(&verdict.rule_id) {
            println!("  rule: {} - {}", rule.name, rule.description);
            println!("  condition: {}", rule.condition);
            for constraint in &rule.constraints {
                println!("  constraint: {}", constraint);
            }
        }
    }
}

fn print_header(no_color: bool) {
    let title = format!("PulseMesh v{} - Interactive Mode", VERSION);
    if no_color {
        println!("{}", title);
        println!("{}", "=".repeat(title.len()));
    } else {
        println!("{}", title.cyan().bold());
        println!("{}", "=".repeat(title.len()).cyan());
    }
}

/// Generate a pulse id from the current instant
fn generate_pulse_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("pulse_{:x}", nanos as u64)
}
