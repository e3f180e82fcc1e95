//! dx - exact Bayesian-network diagnosis
//!
//! The main entry point for the `dx` binary, handling:
//! - Diagnosis from labelled findings
//! - Posterior queries for arbitrary variables
//! - Network inspection and configuration checks

use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use dx_common::{format_error_human, OutputFormat, RunId, StructuredError, SCHEMA_VERSION};
use dx_core::config::{
    list_presets, load_network, load_spec, NetworkOptions, NetworkSpec, PresetName,
    ResolvedNetwork,
};
use dx_core::diagnosis::Diagnosis;
use dx_core::exit_codes::ExitCode;
use dx_core::inference::{EnumerationConfig, Enumerator, Evidence};
use dx_core::log_event;
use dx_core::logging::{
    event_names, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use dx_config::resolve::{ConfigSource, ResolvedPath};
use std::collections::HashSet;
use std::io::IsTerminal;
use std::path::PathBuf;

/// dx - rank candidate causes by exact posterior probability
#[derive(Parser)]
#[command(name = "dx")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Network specification file (JSON, or TOML by extension)
    #[arg(long, global = true, env = "DX_NETWORK")]
    network: Option<PathBuf>,

    /// Built-in network to use when no file is given
    #[arg(long, global = true, env = "DX_PRESET")]
    preset: Option<PresetName>,

    /// Directory searched for network.json / network.toml
    #[arg(long, global = true, env = "DX_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Refuse queries with more hidden variables than this
    #[arg(long, global = true, env = "DX_MAX_HIDDEN")]
    max_hidden: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank candidate causes given observed findings
    Diagnose(DiagnoseArgs),

    /// Posterior P(var = true) for one or more variables
    Query(QueryArgs),

    /// Show variables, parents, and CPTs of the active network
    Network,

    /// Configuration management
    Config(ConfigArgs),

    /// Print version information
    Version,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Diagnose(_) => "diagnose",
            Commands::Query(_) => "query",
            Commands::Network => "network",
            Commands::Config(_) => "config",
            Commands::Version => "version",
        }
    }
}

#[derive(Args, Debug)]
struct DiagnoseArgs {
    /// Finding as FACTOR=LABEL (e.g. Xray=Abnormal, Asia=NA)
    #[arg(short = 'F', long = "finding", value_parser = parse_finding)]
    findings: Vec<(String, String)>,

    /// One label per factor, in declared factor order
    #[arg(conflicts_with = "findings")]
    labels: Vec<String>,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Variables to query; defaults to every variable without evidence
    variables: Vec<String>,

    /// Evidence as VAR=BOOL (e.g. Smoking=true)
    #[arg(short, long = "evidence", value_parser = parse_evidence)]
    evidence: Vec<(String, bool)>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Validate a network file (or the resolved network)
    Validate {
        /// Network file to validate
        path: Option<PathBuf>,
    },
    /// Show the resolved network and where it came from
    Show,
    /// Print the JSON schema for network files
    Schema,
    /// List built-in presets
    Presets,
}

fn parse_finding(s: &str) -> Result<(String, String), String> {
    let (name, label) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FACTOR=LABEL, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing factor name in '{}'", s));
    }
    Ok((name.to_string(), label.trim().to_string()))
}

fn parse_evidence(s: &str) -> Result<(String, bool), String> {
    let (name, value) = parse_finding(s)?;
    let value = match value.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => true,
        "false" | "f" | "no" | "n" | "0" => false,
        other => return Err(format!("expected a boolean for {}, got '{}'", name, other)),
    };
    Ok((name, value))
}

/// Each variable may be observed at most once per query.
fn check_repeated_evidence(evidence: &[(String, bool)]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for (name, _) in evidence {
        if !seen.insert(name.as_str()) {
            return Err(format!("evidence for {} is given more than once", name));
        }
    }
    Ok(())
}

/// Checks clap cannot express on its own.
fn validate_args(cli: Cli) -> Result<Cli, clap::Error> {
    if let Commands::Query(args) = &cli.command {
        check_repeated_evidence(&args.evidence)
            .map_err(|msg| Cli::command().error(ErrorKind::ArgumentConflict, msg))?;
    }
    Ok(cli)
}

fn main() {
    let cli = match Cli::try_parse().and_then(validate_args) {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::ArgsError.as_i32()
            } else {
                ExitCode::Clean.as_i32()
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let cli_level = (cli.global.verbose > 0 || cli.global.quiet)
        .then(|| LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet));
    let mut log_config = LogConfig::from_env(cli_level, None);
    if std::env::var_os("DX_LOG_FORMAT").is_none() && cli.global.format.is_machine() {
        log_config.format = LogFormat::Jsonl;
    }
    init_logging(&log_config);

    let run_id = RunId::new();
    let ctx = LogContext::new(run_id.0.clone(), cli.command.name());
    log_event!(ctx, DEBUG, event_names::RUN_STARTED, Stage::Init, "dx starting");

    let result = match &cli.command {
        Commands::Diagnose(args) => run_diagnose(&cli.global, &ctx, args),
        Commands::Query(args) => run_query(&cli.global, &ctx, args),
        Commands::Network => run_network(&cli.global, &ctx),
        Commands::Config(args) => run_config(&cli.global, &ctx, args),
        Commands::Version => print_version(&cli.global),
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Clean,
        Err(e) => output_error(&cli.global, &ctx, &e),
    };

    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_FINISHED,
        Stage::Output,
        "dx finished",
        exit_code = exit_code.as_i32()
    );
    std::process::exit(exit_code.as_i32());
}

type CmdResult = Result<(), dx_common::Error>;

fn network_options(global: &GlobalOpts) -> NetworkOptions {
    let network_from_env = match (&global.network, std::env::var_os("DX_NETWORK")) {
        (Some(path), Some(env)) => path.as_os_str() == env,
        _ => false,
    };
    NetworkOptions {
        network_path: global.network.clone(),
        network_from_env,
        preset: global.preset,
        config_dir: global.config_dir.clone(),
    }
}

fn enumerator(global: &GlobalOpts) -> Enumerator {
    let mut config = EnumerationConfig::default();
    if let Some(limit) = global.max_hidden {
        config.max_hidden_variables = limit;
    }
    Enumerator::new(config)
}

fn load(global: &GlobalOpts, ctx: &LogContext) -> Result<ResolvedNetwork, dx_common::Error> {
    let loaded = load_network(&network_options(global))?;
    log_event!(
        ctx,
        DEBUG,
        event_names::NETWORK_BUILT,
        Stage::Build,
        "network ready",
        variables = loaded.model.len()
    );
    Ok(loaded)
}

/// Common fields of every JSON payload.
fn envelope(ctx: &LogContext) -> serde_json::Map<String, serde_json::Value> {
    let mut map = serde_json::Map::new();
    map.insert("schema_version".into(), SCHEMA_VERSION.into());
    map.insert("run_id".into(), ctx.run_id.clone().into());
    map.insert(
        "generated_at".into(),
        chrono::Utc::now().to_rfc3339().into(),
    );
    map.insert("command".into(), ctx.command.clone().into());
    map
}

fn network_provenance(loaded: &ResolvedNetwork) -> serde_json::Value {
    serde_json::json!({
        "origin": loaded.origin(),
        "source": loaded.resolved.source.to_string(),
        "path": loaded.resolved.path.as_ref().map(|p| p.display().to_string()),
        "preset": loaded.preset.map(|p| p.as_str()),
        "hash": loaded.snapshot.content_hash,
    })
}

fn print_json(map: serde_json::Map<String, serde_json::Value>) -> CmdResult {
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::Value::Object(map))?
    );
    Ok(())
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_diagnose(global: &GlobalOpts, ctx: &LogContext, args: &DiagnoseArgs) -> CmdResult {
    let loaded = load(global, ctx)?;
    let diagnoser = loaded
        .diagnoser
        .clone()
        .ok_or_else(|| {
            dx_common::Error::Diagnosis(format!(
                "network {} has no diagnosis section",
                loaded.origin()
            ))
        })?
        .with_enumerator(enumerator(global));

    let findings = if args.labels.is_empty() {
        diagnoser.parse_findings(&args.findings)?
    } else {
        diagnoser.parse_positional(&args.labels)?
    };
    let diagnosis = diagnoser.diagnose(&loaded.model, &findings)?;

    log_event!(
        ctx,
        INFO,
        event_names::DIAGNOSE_FINISHED,
        Stage::Diagnose,
        "diagnosis ready",
        label = diagnosis.label(),
        probability = diagnosis.probability()
    );

    match global.format {
        OutputFormat::Json => {
            let mut out = envelope(ctx);
            out.insert("network".into(), network_provenance(&loaded));
            out.insert("evidence".into(), serde_json::to_value(&diagnosis.evidence)?);
            out.insert(
                "result".into(),
                serde_json::json!({
                    "label": diagnosis.best.label,
                    "variable": diagnosis.best.variable,
                    "probability": diagnosis.best.probability,
                }),
            );
            out.insert("ranking".into(), serde_json::to_value(&diagnosis.ranking)?);
            print_json(out)?;
        }
        OutputFormat::Summary => {
            println!(
                "[{}] diagnose: {} p={:.4}",
                ctx.run_id,
                diagnosis.label(),
                diagnosis.probability()
            );
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => print_diagnosis_md(&loaded, &diagnosis),
    }
    Ok(())
}

fn print_diagnosis_md(loaded: &ResolvedNetwork, diagnosis: &Diagnosis) {
    println!("# dx diagnose");
    println!();
    println!("Network: {}", loaded.origin());
    println!("Evidence: {}", diagnosis.evidence);
    println!();
    println!("| Candidate | Variable | P(true) |");
    println!("|---|---|---|");
    for score in &diagnosis.ranking {
        println!(
            "| {} | {} | {:.6} |",
            score.label, score.variable, score.probability
        );
    }
    println!();
    println!(
        "**Most likely: {} ({:.6})**",
        diagnosis.label(),
        diagnosis.probability()
    );
}

fn run_query(global: &GlobalOpts, ctx: &LogContext, args: &QueryArgs) -> CmdResult {
    let loaded = load(global, ctx)?;
    let evidence: Evidence = args.evidence.iter().cloned().collect();

    let variables: Vec<String> = if args.variables.is_empty() {
        loaded
            .model
            .variables()
            .into_iter()
            .filter(|v| !evidence.contains(v))
            .map(str::to_string)
            .collect()
    } else {
        args.variables.clone()
    };

    let posteriors = enumerator(global).ask_many(&variables, &evidence, &loaded.model)?;
    log_event!(
        ctx,
        DEBUG,
        event_names::QUERY_FINISHED,
        Stage::Infer,
        "queries answered",
        count = posteriors.len()
    );

    match global.format {
        OutputFormat::Json => {
            let rows: Vec<_> = variables
                .iter()
                .zip(&posteriors)
                .map(|(v, d)| {
                    serde_json::json!({
                        "variable": v,
                        "p_true": d.p_true,
                        "p_false": d.p_false,
                    })
                })
                .collect();
            let mut out = envelope(ctx);
            out.insert("network".into(), network_provenance(&loaded));
            out.insert("evidence".into(), serde_json::to_value(&evidence)?);
            out.insert("posteriors".into(), rows.into());
            print_json(out)?;
        }
        OutputFormat::Summary => {
            let parts: Vec<String> = variables
                .iter()
                .zip(&posteriors)
                .map(|(v, d)| format!("{}={:.4}", v, d.p_true))
                .collect();
            println!("[{}] query: {}", ctx.run_id, parts.join(" "));
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            println!("# dx query");
            println!();
            println!("Network: {}", loaded.origin());
            println!("Evidence: {}", evidence);
            println!();
            println!("| Variable | P(true) | P(false) |");
            println!("|---|---|---|");
            for (v, d) in variables.iter().zip(&posteriors) {
                println!("| {} | {:.6} | {:.6} |", v, d.p_true, d.p_false);
            }
        }
    }
    Ok(())
}

fn run_network(global: &GlobalOpts, ctx: &LogContext) -> CmdResult {
    let loaded = load(global, ctx)?;

    match global.format {
        OutputFormat::Json => {
            let variables: Vec<_> = loaded
                .model
                .iter()
                .map(|var| {
                    let rows: Vec<_> = var
                        .cpt()
                        .rows()
                        .map(|(given, p)| serde_json::json!({ "given": given, "p": p }))
                        .collect();
                    serde_json::json!({
                        "name": var.name(),
                        "parents": var.parents(),
                        "cpt": rows,
                    })
                })
                .collect();
            let mut out = envelope(ctx);
            out.insert("network".into(), network_provenance(&loaded));
            out.insert("variables".into(), variables.into());
            if let Some(diagnoser) = &loaded.diagnoser {
                out.insert("factors".into(), serde_json::to_value(diagnoser.factors())?);
                out.insert(
                    "candidates".into(),
                    serde_json::to_value(diagnoser.candidates())?,
                );
            }
            print_json(out)?;
        }
        OutputFormat::Summary => {
            println!(
                "[{}] network: {} variables from {}",
                ctx.run_id,
                loaded.model.len(),
                loaded.origin()
            );
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            println!("# dx network");
            println!();
            println!("Source: {}", loaded.origin());
            if let Some(description) = &loaded.spec.description {
                println!("Description: {}", description);
            }
            for var in loaded.model.iter() {
                println!();
                if var.parents().is_empty() {
                    println!("## {}", var.name());
                } else {
                    println!("## {} | {}", var.name(), var.parents().join(", "));
                }
                for (given, p) in var.cpt().rows() {
                    let given: Vec<String> = given.iter().map(|v| v.to_string()).collect();
                    if given.is_empty() {
                        println!("- P(true) = {}", p);
                    } else {
                        println!("- ({}) -> {}", given.join(", "), p);
                    }
                }
            }
            if let Some(diagnoser) = &loaded.diagnoser {
                println!();
                println!("## Diagnosis");
                for factor in diagnoser.factors() {
                    println!(
                        "- factor {}: {} / {}",
                        factor.variable, factor.positive, factor.negative
                    );
                }
                for candidate in diagnoser.candidates() {
                    println!("- candidate {} ({})", candidate.label, candidate.variable);
                }
            }
        }
    }
    Ok(())
}

fn run_config(global: &GlobalOpts, ctx: &LogContext, args: &ConfigArgs) -> CmdResult {
    match &args.command {
        ConfigCommands::Validate { path } => run_config_validate(global, ctx, path.as_ref()),
        ConfigCommands::Show => run_config_show(global, ctx),
        ConfigCommands::Schema => run_config_schema(global),
        ConfigCommands::Presets => run_config_presets(global, ctx),
    }
}

/// Validate a network file.
fn run_config_validate(global: &GlobalOpts, ctx: &LogContext, path: Option<&PathBuf>) -> CmdResult {
    let loaded = match path {
        Some(p) => {
            let spec = NetworkSpec::from_file(p).map_err(dx_core::config::ConfigError::from)?;
            let resolved = ResolvedPath {
                path: Some(p.clone()),
                source: ConfigSource::CliArgument,
            };
            load_spec(spec, resolved, None)?
        }
        None => load(global, ctx)?,
    };

    match global.format {
        OutputFormat::Json => {
            let mut out = envelope(ctx);
            out.insert("status".into(), "valid".into());
            out.insert("network".into(), network_provenance(&loaded));
            out.insert("variables".into(), loaded.model.len().into());
            out.insert(
                "candidates".into(),
                loaded
                    .diagnoser
                    .as_ref()
                    .map(|d| d.candidates().len())
                    .unwrap_or(0)
                    .into(),
            );
            print_json(out)?;
        }
        OutputFormat::Summary => {
            println!("[{}] config validate: OK", ctx.run_id);
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            println!("# Network Validation");
            println!();
            println!("Status: ✓ Valid");
            println!("Network: {}", loaded.origin());
            println!("Variables: {}", loaded.model.len());
            println!("Hash: {}", loaded.snapshot.short_id());
        }
    }
    Ok(())
}

/// Display the resolved network spec and its snapshot.
fn run_config_show(global: &GlobalOpts, ctx: &LogContext) -> CmdResult {
    let loaded = load(global, ctx)?;

    match global.format {
        OutputFormat::Json => {
            let mut out = envelope(ctx);
            out.insert("snapshot".into(), serde_json::to_value(&loaded.snapshot)?);
            out.insert("spec".into(), serde_json::to_value(&loaded.spec)?);
            print_json(out)?;
        }
        OutputFormat::Summary => {
            println!(
                "[{}] config: network={} hash={}",
                ctx.run_id,
                loaded.origin(),
                loaded.snapshot.short_id()
            );
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            println!("# dx config show");
            println!();
            println!("Source: {}", loaded.origin());
            println!("Schema version: {}", loaded.snapshot.schema_version);
            println!("Hash: {}", loaded.snapshot.content_hash);
            println!();
            println!("```json");
            println!("{}", loaded.spec.to_json_pretty()?);
            println!("```");
        }
    }
    Ok(())
}

fn run_config_schema(global: &GlobalOpts) -> CmdResult {
    let schema = schemars::schema_for!(NetworkSpec);
    if global.format != OutputFormat::Exitcode {
        println!("{}", serde_json::to_string_pretty(&schema)?);
    }
    Ok(())
}

fn run_config_presets(global: &GlobalOpts, ctx: &LogContext) -> CmdResult {
    let presets = list_presets();
    match global.format {
        OutputFormat::Json => {
            let mut out = envelope(ctx);
            out.insert("presets".into(), serde_json::to_value(&presets)?);
            print_json(out)?;
        }
        OutputFormat::Summary => {
            let names: Vec<&str> = presets.iter().map(|p| p.name.as_str()).collect();
            println!("[{}] presets: {}", ctx.run_id, names.join(", "));
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            println!("# Presets");
            println!();
            for preset in &presets {
                println!(
                    "- **{}** ({} variables): {}",
                    preset.name, preset.node_count, preset.description
                );
            }
        }
    }
    Ok(())
}

fn print_version(global: &GlobalOpts) -> CmdResult {
    let version_info = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "dx_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&version_info)?);
        }
        OutputFormat::Exitcode => {}
        _ => {
            println!("dx {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
    Ok(())
}

/// Report an error in the requested format and pick the exit code.
fn output_error(global: &GlobalOpts, ctx: &LogContext, error: &dx_common::Error) -> ExitCode {
    let exit_code = ExitCode::for_error(error);
    if exit_code.is_internal_error() {
        log_event!(
            ctx,
            ERROR,
            event_names::INTERNAL_ERROR,
            Stage::Output,
            error,
            code = error.code()
        );
    } else if exit_code == ExitCode::ConfigError {
        log_event!(
            ctx,
            WARN,
            event_names::CONFIG_ERROR,
            Stage::Init,
            error,
            code = error.code()
        );
    } else {
        log_event!(
            ctx,
            DEBUG,
            event_names::RUN_FAILED,
            Stage::Output,
            "command failed",
            code = error.code(),
            exit_code = exit_code.as_i32()
        );
    }

    match global.format {
        OutputFormat::Json => {
            let mut out = envelope(ctx);
            out.insert("status".into(), "error".into());
            out.insert("exit_code".into(), exit_code.code_name().into());
            let structured = StructuredError::from(error);
            out.insert(
                "error".into(),
                serde_json::to_value(&structured).unwrap_or(serde_json::Value::Null),
            );
            let body = serde_json::to_string_pretty(&serde_json::Value::Object(out))
                .unwrap_or_else(|_| structured.to_json());
            eprintln!("{}", body);
        }
        OutputFormat::Summary => {
            eprintln!("[{}] error {}: {}", ctx.run_id, error.code(), error);
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            eprintln!("{}", format_error_human(error, std::io::stderr().is_terminal()));
        }
    }

    exit_code
}
