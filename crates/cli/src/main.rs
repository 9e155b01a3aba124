use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::fmt::format::FmtSpan;

use s3nest_cfn::resolve;
use s3nest_core::{DeployContext, RawParameters, ResolveError, Schema};

mod scenarios;

#[derive(Parser, Debug)]
#[command(author, version, about = "s3nest — S3 nested-stack configuration resolver")]
struct Cli {
    /// Parameter file (YAML map of ParameterName: value)
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Deployment region (AWS::Region pseudo-parameter)
    #[arg(long, default_value = "us-east-1", global = true)]
    region: String,

    /// Deploying account id (AWS::AccountId pseudo-parameter)
    #[arg(long = "account-id", default_value = "123456789012", global = true)]
    account_id: String,

    /// ARN partition (AWS::Partition pseudo-parameter)
    #[arg(long, default_value = "aws", global = true)]
    partition: String,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Resolve a parameter file into a configuration document
    Resolve {
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Write to this path instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Validate a parameter file, reporting every violation
    Check,
    /// Run the built-in scenario suite
    Scenarios,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().json().with_span_events(FmtSpan::CLOSE).init();
    let cli = Cli::parse();
    let schema = Schema::builtin();
    let ctx = DeployContext {
        region: cli.region.clone(),
        account_id: cli.account_id.clone(),
        partition: cli.partition.clone(),
    };

    match cli.cmd {
        Cmd::Resolve { format, out } => {
            let raw = load_parameters(cli.file.as_deref())?;
            let resolution = resolve(&schema, &raw, &ctx).map_err(report_resolve_error)?;
            for w in &resolution.warnings {
                eprintln!("warning: {w}");
            }
            let rendered = match format {
                Format::Json => serde_json::to_string_pretty(&resolution.document)?,
                Format::Yaml => serde_yaml::to_string(&resolution.document)?,
            };
            match out {
                Some(path) => std::fs::write(&path, rendered)
                    .with_context(|| format!("write {}", path.display()))?,
                None => println!("{rendered}"),
            }
        }
        Cmd::Check => {
            let raw = load_parameters(cli.file.as_deref())?;
            match schema.validate(&raw) {
                Ok(_) => println!("all parameters valid"),
                Err(errs) => {
                    for e in &errs {
                        eprintln!("{e}");
                    }
                    anyhow::bail!("{} parameter constraint violation(s)", errs.len());
                }
            }
        }
        Cmd::Scenarios => {
            let results = scenarios::run_suite(&schema, &ctx);
            let mut failed = 0usize;
            for (name, failures) in &results {
                if failures.is_empty() {
                    println!("PASS {name}");
                } else {
                    failed += 1;
                    println!("FAIL {name}");
                    for f in failures {
                        println!("     {f}");
                    }
                }
            }
            println!("{} scenario(s), {} failed", results.len(), failed);
            if failed > 0 {
                anyhow::bail!("{failed} scenario(s) failed");
            }
        }
    }
    Ok(())
}

// Parameter files carry YAML scalars; numbers and booleans coerce to the
// string values the template layer works with.
fn load_parameters(file: Option<&std::path::Path>) -> Result<RawParameters> {
    let path = file.context("a parameter file is required (--file)")?;
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let values: BTreeMap<String, serde_yaml::Value> =
        serde_yaml::from_slice(&bytes).context("parse parameter file")?;

    let mut raw = RawParameters::new();
    for (name, value) in values {
        let rendered = match value {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            other => anyhow::bail!(
                "parameter '{name}' has unsupported YAML value: {other:?}"
            ),
        };
        raw.insert(name, rendered);
    }
    Ok(raw)
}

fn report_resolve_error(err: ResolveError) -> anyhow::Error {
    if let ResolveError::Validation(errs) = &err {
        for e in errs {
            eprintln!("{e}");
        }
    }
    anyhow::Error::new(err)
}
