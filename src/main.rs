use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use metaform_kit::form::{
    DataRecord, Form, FormConfig, FormSchema, FsFileSource, OptionLoader, PartBody,
    ReqwestHttpClient,
};

/// Mount a form schema against a record and print its payload
#[derive(Parser)]
#[command(name = "metaform", version, about)]
struct Args {
    /// Form schema (a `{"fields": [...]}` object or a bare field array)
    schema: PathBuf,

    /// Data record to mount the form against
    record: Option<PathBuf>,

    /// Engine config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the multipart parts instead of the flat JSON
    #[arg(long)]
    multipart: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => FormConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => FormConfig::default(),
    };

    let schema_json = std::fs::read_to_string(&args.schema)
        .with_context(|| format!("failed to read schema {}", args.schema.display()))?;
    let schema = FormSchema::from_json_str(&schema_json).context("invalid form schema")?;

    let record = match &args.record {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read record {}", path.display()))?;
            DataRecord::from_value(serde_json::from_str(&json).context("invalid data record")?)
        }
        None => DataRecord::new(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, run(config, schema, record, args.multipart))
}

async fn run(
    config: FormConfig,
    schema: FormSchema,
    record: DataRecord,
    multipart: bool,
) -> Result<()> {
    let client = Rc::new(ReqwestHttpClient::from_config(&config)?);
    let loader = OptionLoader::from_config(client, &config);

    let (form, pending) = Form::mount(&schema, &record, &loader, &config);
    log::info!(
        "[metaform] mounted {} fields in {} rows, waiting for {} option lists",
        form.widgets().count(),
        form.rows().len(),
        pending.len()
    );
    futures::future::join_all(pending).await;

    let missing = form.missing_required();
    if !missing.is_empty() {
        log::warn!("[metaform] required fields without a value: {}", missing.join(", "));
    }

    if multipart {
        let payload = form.serialize_multipart(&FsFileSource).await;
        for part in &payload.parts {
            match &part.body {
                PartBody::Text(text) => println!("{} = {}", part.name, text),
                PartBody::File { file_name, bytes } => {
                    println!("{} = <{}, {} bytes>", part.name, file_name, bytes.len())
                }
            }
        }
        for failure in &payload.failures {
            eprintln!("{failure}");
        }
    } else {
        println!("{}", form.serialize()?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let args = Args::try_parse_from([
            "metaform",
            "schema.json",
            "record.json",
            "--config",
            "form.json",
            "--multipart",
        ])
        .unwrap();
        assert_eq!(args.schema, PathBuf::from("schema.json"));
        assert_eq!(args.record, Some(PathBuf::from("record.json")));
        assert_eq!(args.config, Some(PathBuf::from("form.json")));
        assert!(args.multipart);

        let args = Args::try_parse_from(["metaform", "schema.json"]).unwrap();
        assert_eq!(args.record, None);
        assert!(!args.multipart);

        assert!(Args::try_parse_from(["metaform"]).is_err());
        assert!(Args::try_parse_from(["metaform", "s.json", "--bogus"]).is_err());
    }
}
