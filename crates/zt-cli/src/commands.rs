use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};
use url::Url;
use zt_persistence::{DEFAULT_JSON, DEFAULT_SCHEMA};
use zt_session::{Session, ValidationRecord};

use zt_cli::settings::{Settings, save_settings};

use crate::cli::{
    ConfigArgs, InputArgs, OpenArgs, OutputArg, ShareArgs, ValidateArgs, VersionArg, VersionsArgs,
};

pub async fn run_versions(session: &Session, args: &VersionsArgs) -> Result<i32> {
    if args.refresh {
        session.resolver().invalidate().await;
    }
    let listing = session.versions().await;
    let default = session.resolver().resolve_default().await;
    if listing.degraded {
        warn!("Registry unavailable, version list is empty");
        println!("Registry unavailable. Default version: {default}");
        return Ok(0);
    }
    for entry in &listing.versions {
        let marker = if entry.version == default { "*" } else { " " };
        let tags = listing.tags.tags_for(&entry.version);
        if tags.is_empty() {
            println!("{marker} {}", entry.version);
        } else {
            println!("{marker} {} ({})", entry.version, tags.join(", "));
        }
    }
    Ok(0)
}

pub async fn run_validate(session: &Session, args: &ValidateArgs) -> Result<i32> {
    select(session, &args.version).await?;
    let (schema, json) = read_inputs(&args.input)?;
    let record = session.validate(&schema, &json)?;
    print_record(&record, args.output)?;
    Ok(exit_code(&record))
}

pub async fn run_declarations(session: &Session, args: &VersionArg) -> Result<i32> {
    select(session, args).await?;
    let declarations = session.declarations().await?;
    if declarations.is_empty() {
        warn!("No declarations available");
        eprintln!("No type declarations could be fetched for this version.");
        return Ok(1);
    }
    println!("{declarations}");
    Ok(0)
}

pub async fn run_share(session: &Session, args: &ShareArgs) -> Result<i32> {
    select(session, &args.version).await?;
    let (schema, json) = read_inputs(&args.input)?;
    let record = session.validate(&schema, &json)?;
    let query = session.share_query();
    match &args.base_url {
        Some(base) => println!("{}", share_link(base, &query)?),
        None => println!("{query}"),
    }
    Ok(exit_code(&record))
}

pub async fn run_open(session: &Session, args: &OpenArgs) -> Result<i32> {
    let query = query_of(&args.link);
    let version = session.apply_query(&query);
    let selection = match version {
        Some(version) => session.select_version(&version).await?,
        None => session.select_default().await?,
    };
    info!(version = selection.module().version(), "Opened shared session");

    let input = &args.input;
    if let Some(schema) = read_override(input.schema.as_ref(), input.schema_text.as_ref())? {
        session.set_schema_text(schema);
    }
    if let Some(json) = read_override(input.json.as_ref(), input.json_text.as_ref())? {
        session.set_json_text(json);
    }

    let texts = session.texts();
    println!("// version {}", selection.module().version());
    println!("{}\n", texts.schema_text);
    println!("{}\n", texts.json_text);
    if args.no_validate {
        println!("{}", texts.result_text);
        return Ok(0);
    }
    let record = session.validate_current()?;
    println!("{}", record.result.render());
    Ok(exit_code(&record))
}

pub fn run_config(args: &ConfigArgs, path: Option<&Path>, settings: &Settings) -> Result<i32> {
    let Some(path) = path else {
        anyhow::bail!("could not determine a settings path; pass --config");
    };
    if args.init {
        if path.exists() {
            println!("Settings already exist at {}", path.display());
        } else {
            save_settings(&Settings::default(), path)?;
            println!("Wrote default settings to {}", path.display());
        }
        return Ok(0);
    }
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(settings).context("serialize settings")?);
    Ok(0)
}

async fn select(session: &Session, args: &VersionArg) -> Result<()> {
    let selection = match &args.version {
        Some(version) => session.select_version(version).await?,
        None => session.select_default().await?,
    };
    info!(version = selection.module().version(), "Using library version");
    Ok(())
}

fn read_inputs(args: &InputArgs) -> Result<(String, String)> {
    let schema = read_input(args.schema.as_ref(), args.schema_text.as_ref(), DEFAULT_SCHEMA)?;
    let json = read_input(args.json.as_ref(), args.json_text.as_ref(), DEFAULT_JSON)?;
    Ok((schema, json))
}

fn read_input(file: Option<&PathBuf>, text: Option<&String>, default: &str) -> Result<String> {
    Ok(read_override(file, text)?.unwrap_or_else(|| default.to_string()))
}

/// Inline text, else the file (`-` for stdin), else nothing.
fn read_override(file: Option<&PathBuf>, text: Option<&String>) -> Result<Option<String>> {
    if let Some(text) = text {
        return Ok(Some(text.clone()));
    }
    match file {
        Some(path) if path.as_os_str() == "-" => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("read stdin")?;
            Ok(Some(buffer))
        }
        Some(path) => fs::read_to_string(path)
            .map(Some)
            .with_context(|| format!("read {}", path.display())),
        None => Ok(None),
    }
}

fn print_record(record: &ValidationRecord, output: OutputArg) -> Result<()> {
    match output {
        OutputArg::Text => println!("{}", record.result.render()),
        OutputArg::Json => {
            let value = serde_json::json!({
                "version": record.version,
                "sequence": record.sequence,
                "outcome": record.result.label(),
                "error": record.result.is_error(),
                "result": record.result.render(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

fn exit_code(record: &ValidationRecord) -> i32 {
    i32::from(record.result.is_error())
}

/// The query part of a shared link, or the input itself when it is not a URL.
fn query_of(link: &str) -> String {
    match Url::parse(link) {
        Ok(url) => url.query().unwrap_or_default().to_string(),
        Err(_) => link.trim_start_matches('?').to_string(),
    }
}

fn share_link(base: &str, query: &str) -> Result<String> {
    let mut url = Url::parse(base).with_context(|| format!("invalid base URL {base}"))?;
    url.set_query((!query.is_empty()).then_some(query));
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_of_accepts_links_and_queries() {
        assert_eq!(
            query_of("https://example.com/?schema=abc&version=3.24.2"),
            "schema=abc&version=3.24.2"
        );
        assert_eq!(query_of("?json=xyz"), "json=xyz");
        assert_eq!(query_of("json=xyz"), "json=xyz");
        assert_eq!(query_of("https://example.com/"), "");
    }

    #[test]
    fn test_share_link_replaces_query() {
        assert_eq!(
            share_link("https://example.com/play?old=1", "json=abc").unwrap(),
            "https://example.com/play?json=abc"
        );
        assert_eq!(share_link("https://example.com/", "").unwrap(), "https://example.com/");
        assert!(share_link("not a url", "x=1").is_err());
    }

    #[test]
    fn test_inline_text_wins_over_default() {
        assert_eq!(read_input(None, Some(&"1".to_string()), DEFAULT_JSON).unwrap(), "1");
        assert_eq!(read_input(None, None, DEFAULT_JSON).unwrap(), DEFAULT_JSON);
        assert_eq!(read_override(None, None).unwrap(), None);
        let missing = PathBuf::from("/nonexistent/schema.ts");
        assert!(read_override(Some(&missing), None).is_err());
    }
}
