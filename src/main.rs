//! builtio - command-line client for built.io applications
//!
//! Fetches the application, its classes, single objects or query results and
//! prints them as JSON.

use clap::Parser;
use serde_json::{json, Value};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use builtio::client::{resolve_credentials, Client};
use builtio::config::{Args, Command, Config};
use builtio::error::{Error, Result};
use builtio::model::{Application, Class, Model, Object};
use builtio::query::Query;
use builtio::util;
use builtio::VERSION;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Internal(format!("Failed to set tracing subscriber: {}", e)))?;

    let credentials =
        resolve_credentials(args.api_key.as_deref(), args.master_key.as_deref()).await?;
    let command = args.command.clone();

    // Build configuration from args
    let mut config: Config = args.into();
    config.application_api_key = credentials.api_key;
    config.master_key = credentials.master_key;

    debug!("builtio v{} against {}", VERSION, config.base_uri());
    let client = Client::new(config)?;

    let output = run(&client, command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

async fn run(client: &Client, command: Command) -> Result<Value> {
    match command {
        Command::App => {
            let app = Application::get(client).await?;
            Ok(app.record().to_value())
        }
        Command::Classes => {
            let classes = Class::get_all(client).await?;
            Ok(Value::Array(
                classes.iter().map(|c| c.record().to_value()).collect(),
            ))
        }
        Command::Class { uid } => {
            let class = Class::get(client, &uid).await?;
            Ok(class.record().to_value())
        }
        Command::Object { class_uid, uid } => {
            let mut object = Object::with_uid(class_uid, uid)?;
            object.sync(client).await?;
            Ok(object.record().to_value())
        }
        Command::Query {
            class_uid,
            filters,
            limit,
            skip,
            include_count,
        } => {
            let mut query = Query::for_class(class_uid);
            for filter in &filters {
                let (field, value) = parse_filter(filter)?;
                query = query.where_eq(field, value);
            }
            if let Some(limit) = limit {
                query = query.limit(limit);
            }
            if let Some(skip) = skip {
                query = query.skip(skip);
            }
            if include_count {
                query = query.include_count();
            }

            let response = query.exec(client).await?;
            let objects: Vec<Value> = response
                .objects
                .iter()
                .map(|o| o.record().to_value())
                .collect();
            Ok(json!({ "objects": objects, "count": response.count }))
        }
    }
}

/// Parse a `field=value` filter. Integer and boolean literals are typed,
/// anything else is a string.
fn parse_filter(filter: &str) -> Result<(String, Value)> {
    let (field, raw) = filter
        .split_once('=')
        .ok_or_else(|| Error::Validation(format!("filter {:?} is not field=value", filter)))?;
    util::require("filter field", field)?;

    let value = if util::is_integer(raw) {
        raw.parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string()))
    } else {
        match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        }
    };
    Ok((field.to_string(), value))
}
