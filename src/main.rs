use clap::{Arg, Command};
use log::LevelFilter;
use sms_sift::classifier::{Category, SmsClassifier};
use sms_sift::config::Config;
use sms_sift::detection::ExpressScorer;
use sms_sift::extractor::ExpressExtractor;
use sms_sift::message::SmsMessage;
use sms_sift::rules::RuleEngine;
use std::process;

fn main() {
    let matches = Command::new("sms-sift")
        .version(env!("CARGO_PKG_VERSION"))
        .about("SMS classification and pickup-code extraction engine")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("sms-sift.yaml"),
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
                .help("Test configuration validity")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("classify")
                .long("classify")
                .value_name("FILE")
                .help("Classify a JSON batch of messages and print per-category groups")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("extract")
                .long("extract")
                .value_name("FILE")
                .help("Extract pickup records from a JSON batch of messages")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("score")
                .long("score")
                .value_name("FILE")
                .help("Print the legitimacy score of every message in a JSON batch")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("tag")
                .long("tag")
                .value_name("FILE")
                .help("Run the configured tagging rules over a JSON batch of messages")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging with per-signal score details")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let config_path = matches.get_one::<String>("config").unwrap();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        match Config::default().to_file(generate_path) {
            Ok(()) => {
                println!("Default configuration written to {generate_path}");
                return;
            }
            Err(e) => {
                eprintln!("Failed to write configuration: {e}");
                process::exit(1);
            }
        }
    }

    if matches.get_flag("test-config") {
        match Config::from_file(config_path) {
            Ok(config) => {
                let invalid = config
                    .rules
                    .iter()
                    .filter(|rule| !RuleEngine::validate_rule(rule))
                    .count();
                println!(
                    "Configuration OK: {} rules ({} invalid, will be skipped)",
                    config.rules.len(),
                    invalid
                );
                return;
            }
            Err(e) => {
                eprintln!("Configuration error: {e}");
                process::exit(1);
            }
        }
    }

    if let Some(path) = matches.get_one::<String>("classify") {
        exit_on_error(classify_batch(path));
    } else if let Some(path) = matches.get_one::<String>("extract") {
        exit_on_error(extract_batch(path));
    } else if let Some(path) = matches.get_one::<String>("score") {
        exit_on_error(score_batch(path));
    } else if let Some(path) = matches.get_one::<String>("tag") {
        exit_on_error(tag_batch(path, config_path));
    } else {
        eprintln!("Nothing to do; see --help");
        process::exit(2);
    }
}

fn exit_on_error(result: anyhow::Result<()>) {
    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn load_messages(path: &str) -> anyhow::Result<Vec<SmsMessage>> {
    let content = std::fs::read_to_string(path)?;
    let messages: Vec<SmsMessage> = serde_json::from_str(&content)?;
    log::info!("loaded {} messages from {path}", messages.len());
    Ok(messages)
}

fn classify_batch(path: &str) -> anyhow::Result<()> {
    let messages = load_messages(path)?;
    let groups = SmsClassifier::classify_batch(&messages);

    // Fixed order, so the summary is stable across runs.
    let order = [
        Category::VerificationCode,
        Category::Express,
        Category::Bank,
        Category::Marketing,
        Category::Notification,
        Category::Unknown,
    ];
    for category in order {
        let count = groups.get(&category).map_or(0, |group| group.len());
        println!("{category}: {count}");
    }

    let printable: Vec<(String, &Vec<SmsMessage>)> = order
        .iter()
        .filter_map(|category| {
            groups
                .get(category)
                .map(|group| (category.to_string(), group))
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&printable)?);
    Ok(())
}

fn extract_batch(path: &str) -> anyhow::Result<()> {
    let messages = load_messages(path)?;
    let records = ExpressExtractor::extract_all(&messages);
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn score_batch(path: &str) -> anyhow::Result<()> {
    let messages = load_messages(path)?;
    for message in &messages {
        let (is_express, score) = ExpressScorer::score(message);
        println!(
            "{}\t{}\t{}",
            message.sender,
            score,
            if is_express { "express" } else { "-" }
        );
    }
    Ok(())
}

fn tag_batch(path: &str, config_path: &str) -> anyhow::Result<()> {
    let config = Config::from_file(config_path)?;
    let messages = load_messages(path)?;

    for message in &messages {
        let results = RuleEngine::execute_rules(&message.sender, &message.content, &config.rules);
        for result in results {
            println!(
                "{}\t{}\t{}",
                message.sender, result.tag_name, result.extracted_value
            );
        }
    }
    Ok(())
}
