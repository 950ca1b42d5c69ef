use clap::{Arg, ArgAction, Command};
use log::LevelFilter;
use mail_triage::config::{load_config_or_default, TriageConfig};
use mail_triage::history::{
    CachedProvider, JsonFileSource, StaticProvider, StatisticsBuilder, StatisticsProvider,
};
use mail_triage::mailbox::{ActionApplier, ActionPolicy, DryRunMailbox};
use mail_triage::runner::{ThreadInput, TriageRunner};
use mail_triage::{EmailSignal, TriageClassifier};
use std::process;
use std::time::Duration;

fn main() {
    let matches = Command::new("mail-triage")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Rule-based and history-assisted email triage")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("mail-triage.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the configuration and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .value_name("FILE")
                .help("Historical statistics JSON (overrides statistics.path)")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("classify")
                .long("classify")
                .help("Classify a single email given by --from/--subject/--snippet")
                .action(ArgAction::SetTrue),
        )
        .arg(Arg::new("from").long("from").value_name("ADDRESS"))
        .arg(Arg::new("subject").long("subject").value_name("TEXT").default_value(""))
        .arg(Arg::new("snippet").long("snippet").value_name("TEXT").default_value(""))
        .arg(
            Arg::new("batch")
                .long("batch")
                .value_name("FILE")
                .help("Triage a JSON array of threads against the dry-run mailbox")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("build-stats")
                .long("build-stats")
                .value_name("CORPUS")
                .help("Build historical statistics from a labeled JSON corpus")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Where --build-stats writes its result")
                .default_value("triage-stats.json"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue),
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

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("mail-triage.yaml");

    let mut config = match load_config_or_default(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        match config.validate() {
            Ok(()) => {
                println!("✅ Configuration valid");
                println!(
                    "  VIP: {} senders, {} domains",
                    config.senders.vip_senders.len(),
                    config.senders.vip_domains.len()
                );
                println!(
                    "  Protected: {} senders, {} domains",
                    config.senders.protected_senders.len(),
                    config.senders.protected_domains.len()
                );
                println!(
                    "  Thresholds: high {} / medium {}",
                    config.thresholds.high_confidence, config.thresholds.medium_confidence
                );
            }
            Err(e) => {
                println!("❌ Configuration validation failed: {e}");
                process::exit(1);
            }
        }
        return;
    }

    if let Some(stats_path) = matches.get_one::<String>("stats") {
        config.statistics.path = Some(stats_path.clone());
    }

    if let Some(corpus_path) = matches.get_one::<String>("build-stats") {
        let output = matches
            .get_one::<String>("output")
            .map(String::as_str)
            .unwrap_or("triage-stats.json");
        if let Err(e) = build_stats(&config, corpus_path, output) {
            eprintln!("Error building statistics: {e:#}");
            process::exit(1);
        }
        return;
    }

    let provider = statistics_provider(&config);
    let classifier = TriageClassifier::new(&config);

    if matches.get_flag("classify") {
        let Some(from) = matches.get_one::<String>("from") else {
            eprintln!("--classify requires --from");
            process::exit(2);
        };
        let subject = matches.get_one::<String>("subject").map_or("", String::as_str);
        let snippet = matches.get_one::<String>("snippet").map_or("", String::as_str);

        let email = EmailSignal::new(from, subject, snippet);
        let decision = classifier.classify_with(&email, provider.as_ref());
        match serde_json::to_string_pretty(&decision) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing decision: {e}");
                process::exit(1);
            }
        }
        return;
    }

    if let Some(batch_path) = matches.get_one::<String>("batch") {
        if let Err(e) = run_batch(&config, &classifier, provider.as_ref(), batch_path) {
            eprintln!("Error running batch: {e:#}");
            process::exit(1);
        }
        return;
    }

    eprintln!("Nothing to do: pass --classify, --batch, --build-stats or --test-config");
    process::exit(2);
}

fn statistics_provider(config: &TriageConfig) -> Box<dyn StatisticsProvider> {
    match &config.statistics.path {
        Some(path) => Box::new(CachedProvider::new(
            JsonFileSource::new(path),
            Duration::from_secs(config.statistics.cache_ttl_seconds),
        )),
        None => {
            log::info!("No historical statistics configured, using rule-based triage only");
            Box::new(StaticProvider::empty())
        }
    }
}

fn build_stats(config: &TriageConfig, corpus_path: &str, output: &str) -> anyhow::Result<()> {
    let corpus = StatisticsBuilder::load_corpus(corpus_path)?;
    let stats = StatisticsBuilder::new(config.statistics.clone()).build(&corpus);
    std::fs::write(output, stats.to_json()?)?;
    println!("Historical statistics written to: {output}");
    Ok(())
}

fn run_batch(
    config: &TriageConfig,
    classifier: &TriageClassifier,
    provider: &dyn StatisticsProvider,
    batch_path: &str,
) -> anyhow::Result<()> {
    let threads = ThreadInput::load_batch(batch_path)?;
    let applier = ActionApplier::new(
        ActionPolicy::new(&config.thresholds, &config.policy),
        DryRunMailbox::new(),
        config.policy.preview,
    );
    let mut runner = TriageRunner::new(classifier, provider, applier, config.run.clone());

    let outcomes = runner.run(&threads);
    println!("{}", serde_json::to_string_pretty(&outcomes)?);
    runner.statistics().print_summary();
    Ok(())
}

fn generate_default_config(path: &str) {
    let config = TriageConfig::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e:#}");
            process::exit(1);
        }
    }
}
