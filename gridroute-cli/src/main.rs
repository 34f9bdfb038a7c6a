//! GridRoute CLI - batch PCB routing and clearance checking from the
//! command line.

use clap::{Parser, Subcommand, ValueEnum};
use gridroute::prelude::*;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "gridroute")]
#[command(about = "Grid-based PCB routing and clearance checking", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route nets on a board, in the order given
    Route {
        /// Input board snapshot (JSON)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output board snapshot (JSON)
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Net names to route, in routing order
        #[arg(value_name = "NET", required = true, num_args = 1..)]
        nets: Vec<String>,

        /// Routing configuration file (JSON); defaults apply otherwise
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with an error code if any net fails to route
        #[arg(long)]
        fail_on_unrouted: bool,
    },

    /// Check a board for cross-net clearance violations
    Drc {
        /// Board snapshot (JSON)
        #[arg(value_name = "BOARD")]
        board: PathBuf,

        /// Required clearance in millimeters
        #[arg(short, long, default_value_t = 0.15)]
        clearance: f64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// List the nets on a board
    Nets {
        /// Board snapshot (JSON)
        #[arg(value_name = "BOARD")]
        board: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Route {
            input,
            output,
            nets,
            config,
            format,
            fail_on_unrouted,
        } => handle_route(&input, &output, &nets, config.as_deref(), format, fail_on_unrouted),
        Commands::Drc {
            board,
            clearance,
            format,
        } => handle_drc(&board, clearance, format),
        Commands::Nets { board } => handle_nets(&board),
    };

    process::exit(exit_code);
}

fn load_config(path: Option<&Path>) -> Result<RouteConfig, String> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("invalid config {}: {}", path.display(), e))
        }
        None => Ok(RouteConfig::default()),
    }
}

fn handle_route(
    input: &Path,
    output: &Path,
    nets: &[String],
    config_path: Option<&Path>,
    format: OutputFormat,
    fail_on_unrouted: bool,
) -> i32 {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let mut board = match RouterCore::load_board(input) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let report = match RouterCore::route_board(&mut board, &config, nets) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if let Err(e) = RouterCore::save_board(output, &board) {
        eprintln!("Error: {}", e);
        return 1;
    }

    match format {
        OutputFormat::Human => print_route_report(&report),
        OutputFormat::Json => print_route_json(&report),
    }

    if fail_on_unrouted && report.failed_count() > 0 {
        return 1;
    }
    0
}

fn print_route_report(report: &BatchReport) {
    println!("Routing report");
    println!("{}", "─".repeat(60));
    for net in &report.nets {
        match &net.status {
            NetStatus::Routed {
                tracks,
                vias,
                iterations,
            } => println!(
                "  {:<20} routed ({} tracks, {} vias, {} iterations)",
                net.name, tracks, vias, iterations
            ),
            NetStatus::AlreadyConnected => {
                println!("  {:<20} already connected", net.name)
            }
            NetStatus::Unroutable { forward, .. } => println!(
                "  {:<20} UNROUTABLE (gave up after {} iterations)",
                net.name, forward
            ),
            NetStatus::Malformed { reason } => {
                println!("  {:<20} SKIPPED: {}", net.name, reason)
            }
        }
    }
    println!(
        "\n  Summary: {} routed, {} failed, {} nets total",
        report.routed_count(),
        report.failed_count(),
        report.nets.len()
    );
}

fn print_route_json(report: &BatchReport) {
    let output = serde_json::json!({
        "nets": report.nets,
        "summary": {
            "total": report.nets.len(),
            "routed": report.routed_count(),
            "failed": report.failed_count(),
        }
    });
    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}

fn handle_drc(board_path: &Path, clearance: f64, format: OutputFormat) -> i32 {
    let board = match RouterCore::load_board(board_path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let violations = RouterCore::check_clearance(&board, clearance);

    match format {
        OutputFormat::Human => print_drc_report(board_path, &board, &violations),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "board": board_path.display().to_string(),
                "clearance": clearance,
                "violations": violations,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        }
    }

    if violations.is_empty() {
        0
    } else {
        1
    }
}

fn print_drc_report(path: &Path, board: &Board, violations: &[Violation]) {
    println!("Clearance check: {}", path.display());
    println!("{}", "─".repeat(60));
    if violations.is_empty() {
        println!("  No violations found");
        return;
    }
    for v in violations {
        let net_a = board.net_name(v.net_a).unwrap_or("<unnamed>");
        let net_b = board.net_name(v.net_b).unwrap_or("<unnamed>");
        println!(
            "  {:?} between {} and {} at ({:.3}, {:.3}): {:.4} mm required, {:.4} mm actual ({:.4} mm short)",
            v.kind, net_a, net_b, v.x, v.y, v.required, v.actual, v.penetration
        );
    }
    println!("\n  {} violations", violations.len());
}

fn handle_nets(board_path: &Path) -> i32 {
    let board = match RouterCore::load_board(board_path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    println!("Nets on {}", board_path.display());
    println!("{}", "─".repeat(60));
    for net in board.nets() {
        let segments = board
            .segments()
            .iter()
            .filter(|s| s.net == net.id)
            .count();
        let vias = board.vias().iter().filter(|v| v.net == net.id).count();
        let pads = board.pads().iter().filter(|p| p.net == net.id).count();
        println!(
            "  {:<24} {} segments, {} vias, {} pads",
            net.name, segments, vias, pads
        );
    }
    0
}
