use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use schemaform::{
    FormController, FormValue,
    data::build_defaults,
    file::load_file,
    render::text::TextBackend,
    sources::FormSources,
};

#[derive(Parser)]
#[command(name = "schemaform", version, about = "Schema driven forms from the command line")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the default data tree of a schema
    Defaults {
        #[command(flatten)]
        input: FormArgs,
    },
    /// Validate the data and print the error map
    Validate {
        #[command(flatten)]
        input: FormArgs,
    },
    /// Validate and print the submitted `{"formData": ...}` payload
    Submit {
        #[command(flatten)]
        input: FormArgs,
    },
    /// Print the form as a text outline
    Outline {
        #[command(flatten)]
        input: FormArgs,
    },
}

#[derive(Args)]
struct FormArgs {
    /// Data schema (.json or .toml)
    #[arg(short, long)]
    schema: PathBuf,
    /// Presentation schema (.json or .toml)
    #[arg(short, long)]
    ui: Option<PathBuf>,
    /// Prefilled data (.json or .toml)
    #[arg(short, long)]
    data: Option<PathBuf>,
    /// Field edit, `path=value`; the value is read as JSON when it parses
    #[arg(long = "set", value_name = "PATH=VALUE")]
    sets: Vec<String>,
    /// File selection, `path=FILE[:mime]`
    #[arg(long = "attach", value_name = "PATH=FILE[:MIME]")]
    attachments: Vec<String>,
}

fn split_assignment(arg: &str) -> anyhow::Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((path, value)) if !path.is_empty() => Ok((path, value)),
        _ => bail!("expected PATH=VALUE, got {arg:?}"),
    }
}

fn parse_value(raw: &str) -> FormValue {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(v) => v.into(),
        Err(_) => raw.into(),
    }
}

impl FormArgs {
    async fn open(&self) -> anyhow::Result<FormController> {
        let sources = FormSources::load(&self.schema, self.ui.as_ref(), self.data.as_ref())
            .with_context(|| format!("failed to load form from {}", self.schema.display()))?;
        let mut form: FormController = sources.builder().build();

        for arg in &self.sets {
            let (path, raw) = split_assignment(arg)?;
            debug!("set {path} = {raw}");
            form.on_field_change(path, parse_value(raw));
        }

        for arg in &self.attachments {
            let (path, target) = split_assignment(arg)?;
            let (file, mime) = match target.rsplit_once(':') {
                Some((file, mime)) if mime.contains('/') => (file, Some(mime)),
                _ => (target, None),
            };
            let raw = load_file(file, mime)
                .await
                .with_context(|| format!("failed to attach {file} to {path}"))?;
            info!("attached {} ({} bytes) to {path}", raw.name, raw.size());
            if let Some(read) = form.select_file(path, raw) {
                let result = read.read().await?;
                form.complete_file_read(result);
            }
        }
        Ok(form)
    }
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Defaults { input } => {
            let sources = FormSources::load(&input.schema, None::<PathBuf>, None::<PathBuf>)?;
            print_json(&build_defaults(&sources.schema))?;
        }
        Cmd::Validate { input } => {
            let form = input.open().await?;
            let validation = form.validate();
            print_json(&validation.errors)?;
            if !validation.is_valid() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Cmd::Submit { input } => {
            let mut form = input.open().await?;
            let outcome = form.submit();
            match outcome {
                schemaform::SubmitOutcome::Submitted(data) => print_json(&data)?,
                schemaform::SubmitOutcome::Rejected(validation) => {
                    print_json(&validation.errors)?;
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Cmd::Outline { input } => {
            let form = input.open().await?;
            for line in form.render(&TextBackend) {
                println!("{line}");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
