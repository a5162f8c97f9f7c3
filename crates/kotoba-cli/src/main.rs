//! kotoba CLI — feed stdin through the segmentation engine.
//!
//! ```text
//! kotoba segment [--tag think] [--strategy linguistic|regex] [--no-fast-first]
//! kotoba detect-json
//! ```
//!
//! Each stdin line is treated as one arriving fragment; every emitted
//! segment (or detected JSON object) is printed as one JSON line. Mainly a
//! debug surface for poking at divider behavior without a running server.

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use kotoba_lib::kotoba_core::{
    DividerConfig, Segment, SegmentStrategy, SentenceDivider, StreamJsonDetector,
};

/// kotoba — streaming text segmentation for voice pipelines
#[derive(Parser)]
#[command(name = "kotoba", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Segment stdin fragments into sentences with tag context
    Segment {
        /// Recognized tag name (repeatable)
        #[arg(long = "tag", default_value = "think")]
        tags: Vec<String>,
        /// Boundary classifier strategy
        #[arg(long, default_value = "linguistic")]
        strategy: String,
        /// Disable the comma split on the first sentence
        #[arg(long)]
        no_fast_first: bool,
    },
    /// Detect JSON objects embedded in stdin chunks
    DetectJson,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Segment {
            tags,
            strategy,
            no_fast_first,
        } => {
            let strategy = match strategy.as_str() {
                "regex" => SegmentStrategy::Regex,
                "linguistic" => SegmentStrategy::Linguistic,
                other => {
                    eprintln!("unknown strategy '{other}', expected linguistic|regex");
                    std::process::exit(2);
                }
            };
            let config = DividerConfig {
                fast_first_response: !no_fast_first,
                strategy,
                valid_tags: tags,
            };
            segment_stdin(config).await;
        }
        Command::DetectJson => detect_json_stdin().await,
    }
}

async fn segment_stdin(config: DividerConfig) {
    let mut divider = SentenceDivider::new(config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        divider.push(&line);
        divider.push("\n");
        for seg in divider.drain() {
            print_segment(&seg);
        }
    }
    for seg in divider.flush() {
        print_segment(&seg);
    }
}

fn print_segment(seg: &Segment) {
    // Segment derives Serialize; to_string only fails on non-string keys.
    println!("{}", serde_json::to_string(seg).unwrap());
}

async fn detect_json_stdin() {
    let mut detector = StreamJsonDetector::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        for obj in detector.process_chunk(&line) {
            println!("{obj}");
        }
    }
}
