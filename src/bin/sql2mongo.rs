use clap::Parser;
use sql2mongo::{translate_sql, FieldType, RenderOptions, TranslateOptions};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug)]
struct CliError(String);

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T> From<T> for CliError
where
    T: std::error::Error,
{
    fn from(e: T) -> Self {
        CliError(e.to_string())
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Translate a subset of SQL into MongoDB shell syntax", long_about = None)]
struct Cli {
    #[arg(index = 1, help = "The SQL query to translate")]
    query: String,
    #[arg(
        short = 'f',
        long = "field-types",
        help = "JSON file mapping column names to field types (STRING, NUMBER, DATE, BOOLEAN, UNKNOWN)"
    )]
    field_types: Option<PathBuf>,
    #[arg(
        short,
        long,
        value_parser = parse_field_type,
        help = "Field type assumed for columns missing from the map, default = UNKNOWN"
    )]
    default_type: Option<FieldType>,
    #[arg(long, help = "Set allowDiskUse on emitted aggregations")]
    allow_disk_use: Option<bool>,
    #[arg(long, help = "Set the aggregation cursor batch size")]
    batch_size: Option<i32>,
    #[arg(
        long,
        default_value = "warn",
        help = "Log level (error, warn, info, debug, trace)"
    )]
    log_level: String,
}

fn parse_field_type(text: &str) -> Result<FieldType, String> {
    match text.to_uppercase().as_str() {
        "STRING" => Ok(FieldType::String),
        "NUMBER" => Ok(FieldType::Number),
        "DATE" => Ok(FieldType::Date),
        "BOOLEAN" => Ok(FieldType::Boolean),
        "UNKNOWN" => Ok(FieldType::Unknown),
        other => Err(format!("unknown field type: {other}")),
    }
}

fn main() -> Result<(), CliError> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let mut options = TranslateOptions::default();
    if let Some(path) = &args.field_types {
        let text = std::fs::read_to_string(path)?;
        options.field_types = serde_json::from_str::<HashMap<String, FieldType>>(&text)?;
    }
    if let Some(default_type) = args.default_type {
        options.default_field_type = default_type;
    }

    tracing::debug!(query = %args.query, "translating");
    let plan = translate_sql(&args.query, &options)?;
    tracing::debug!(
        operation = ?plan.operation,
        collection = %plan.collection,
        "translation complete"
    );

    let render = RenderOptions {
        allow_disk_use: args.allow_disk_use,
        batch_size: args.batch_size,
    };
    println!("{}", plan.shell(&render));
    Ok(())
}

fn init_tracing(level: &str) -> Result<(), CliError> {
    let level: tracing::Level = level
        .parse()
        .map_err(|_| CliError(format!("invalid log level: {level}")))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
