use chrono::Utc;
use clap::{Arg, Command};
use log::LevelFilter;
use std::process;
use streamjack_detector::detector::{CandidateFile, ResultsDocument};
use streamjack_detector::{BatchSummary, DetectorConfig, Lexicon, RiskCategory, StreamJackingDetector};

fn main() {
    let matches = Command::new("streamjack-detector")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Risk scoring for hijacked YouTube channels running crypto scam streams")
        .long_about("Scores video and channel metadata snapshots for stream-jacking:\n\
                    • Homoglyph-aware impersonation matching of crypto figures and brands\n\
                    • Channel signals for hijacked, dormant and repurposed accounts\n\
                    • Video signals with educational and crypto-native dampening\n\
                    • Composite CRITICAL/HIGH/MEDIUM/LOW classification with confidence")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("streamjack-detector.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity and pattern compilation")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("JSON file of candidates ({video, channel?, search_query?})")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the results document here instead of stdout")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("detections-only")
                .long("detections-only")
                .help("Only include records at or above the detection threshold")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("summary")
                .long("summary")
                .help("Print a summary report of the batch")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging with per-rule detail")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    // Initialize logger based on verbose flag
    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("streamjack-detector.yaml");

    let config = match DetectorConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };

    let lexicon = match Lexicon::compile(&config.lexicon) {
        Ok(lexicon) => lexicon,
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        test_config(&config, &lexicon);
        return;
    }

    let Some(input_path) = matches.get_one::<String>("input") else {
        eprintln!("No input given. Use --input FILE (or --help for usage).");
        process::exit(1);
    };

    let entries = match std::fs::read_to_string(input_path)
        .map_err(anyhow::Error::from)
        .and_then(|content| CandidateFile::from_json(&content))
    {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error reading candidates from {input_path}: {e:#}");
            process::exit(1);
        }
    };

    let detector = StreamJackingDetector::new(&lexicon, &config.scoring);
    let outcome = detector.evaluate_entries(&entries, Utc::now());

    let threshold = config.scoring.composite.detection_threshold;
    let document = ResultsDocument::from_outcome(
        &outcome,
        threshold,
        matches.get_flag("detections-only"),
        Utc::now(),
    );

    let json = match serde_json::to_string_pretty(&document) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error serializing results: {e}");
            process::exit(1);
        }
    };

    match matches.get_one::<String>("output") {
        Some(output_path) => {
            if let Err(e) = std::fs::write(output_path, json) {
                eprintln!("Error writing results to {output_path}: {e}");
                process::exit(1);
            }
            println!("💾 Results written to: {output_path}");
        }
        None => println!("{json}"),
    }

    for record in outcome
        .records
        .iter()
        .filter(|r| r.total_risk_score >= threshold)
    {
        let emoji = match record.risk_category {
            RiskCategory::Critical | RiskCategory::High => "🔴",
            RiskCategory::Medium => "🟡",
            RiskCategory::Low => "🟢",
        };
        eprintln!(
            "{emoji} {}: {} (score {:.1}, confidence {:.2}, {} signal(s))",
            record.risk_category,
            truncate_string(&record.video_title, 60),
            record.total_risk_score,
            record.confidence_score,
            record.signal_count()
        );
    }

    if matches.get_flag("summary") {
        let detections: Vec<_> = outcome
            .records
            .iter()
            .filter(|r| r.total_risk_score >= threshold)
            .cloned()
            .collect();
        eprintln!();
        eprint!("{}", BatchSummary::from_records(&detections).render());
    }

    if !outcome.failures.is_empty() {
        eprintln!(
            "⚠️  {} of {} candidate(s) could not be scored",
            outcome.failures.len(),
            entries.len()
        );
    }
}

fn test_config(config: &DetectorConfig, lexicon: &Lexicon) {
    println!("🔍 Testing configuration...");
    println!();
    println!("Impersonation targets: {}", lexicon.targets.len());
    println!("Scam phrase patterns: {}", lexicon.scam_phrases.len());
    println!("Trusted channels: {}", lexicon.trusted_channels.len());
    println!("Variant cap: {}", config.scoring.max_variations);
    println!(
        "Thresholds: HIGH >= {}, MEDIUM >= {}, detection >= {}",
        config.scoring.composite.high_threshold,
        config.scoring.composite.medium_threshold,
        config.scoring.composite.detection_threshold
    );
    println!("All regex patterns compiled successfully.");
    println!("✅ Configuration validated");
}

fn generate_default_config(path: &str) {
    let config = DetectorConfig::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
