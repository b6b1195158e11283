use anyhow::{bail, Context, Result};
use assetkit_core::structured_data::NodeContent;
use assetkit_core::{ClientConfig, DefinitionTree, StructuredData, Transport};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "assetkit")]
#[command(about = "assetkit CLI - inspect and edit CMS structured data")]
#[command(version)]
struct Cli {
    /// Config file (default: $ASSETKIT_CONFIG, then ./assetkit.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Output dialect, overrides the config (rest or soap)
    #[arg(long, global = true)]
    transport: Option<Transport>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// Structured data JSON file, or an asset holding `structuredData`
    file: PathBuf,
    /// Data definition JSON file
    #[arg(long)]
    definition: PathBuf,
}

#[derive(Args)]
struct OutputArgs {
    /// Write the result here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List every node with its FQI
    Nodes {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Report phantom nodes and values
    Phantoms {
        #[command(flatten)]
        data: DataArgs,
        /// Remove them and write the cleaned data
        #[arg(long)]
        remove: bool,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Set the text of a node
    SetText {
        #[command(flatten)]
        data: DataArgs,
        /// Fully qualified identifier, e.g. contact;1;name
        #[arg(long)]
        node: String,
        #[arg(long)]
        value: String,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Append a blank instance of a multiple field
    Append {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long)]
        node: String,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Remove the last instance of a multiple field
    RemoveLast {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long)]
        node: String,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Swap the data of two instances of the same field
    Swap {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long)]
        first: String,
        #[arg(long)]
        second: String,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Rewrite the data in another dialect
    Convert {
        #[command(flatten)]
        data: DataArgs,
        /// Target dialect (rest or soap)
        #[arg(long)]
        to: Transport,
        #[command(flatten)]
        out: OutputArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        ClientConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(transport) = cli.transport {
        config.transport = transport;
    }
    init_tracing(&config);
    debug!("using {} transport", config.transport);

    match cli.command {
        Commands::Nodes { data } => list_nodes(&load_data(&data, &config, true)?),
        Commands::Phantoms { data, remove, out } => {
            let mut sd = load_data(&data, &config, false)?;
            report_phantoms(&mut sd, remove, config.transport, out.output.as_deref())
        }
        Commands::SetText {
            data,
            node,
            value,
            out,
        } => {
            let mut sd = load_data(&data, &config, true)?;
            sd.set_text(&node, &value)
                .with_context(|| format!("Failed to set text of {}", node))?;
            write_data(&sd, config.transport, out.output.as_deref())
        }
        Commands::Append { data, node, out } => {
            let mut sd = load_data(&data, &config, true)?;
            let created = sd
                .append_sibling(&node)
                .with_context(|| format!("Failed to append after {}", node))?;
            eprintln!("Appended {}", created);
            write_data(&sd, config.transport, out.output.as_deref())
        }
        Commands::RemoveLast { data, node, out } => {
            let mut sd = load_data(&data, &config, true)?;
            sd.remove_last_sibling(&node)
                .with_context(|| format!("Failed to remove the last instance of {}", node))?;
            write_data(&sd, config.transport, out.output.as_deref())
        }
        Commands::Swap {
            data,
            first,
            second,
            out,
        } => {
            let mut sd = load_data(&data, &config, true)?;
            sd.swap_data(&first, &second)
                .with_context(|| format!("Failed to swap {} and {}", first, second))?;
            write_data(&sd, config.transport, out.output.as_deref())
        }
        Commands::Convert { data, to, out } => {
            let sd = load_data(&data, &config, true)?;
            write_data(&sd, to, out.output.as_deref())
        }
    }
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(config: &ClientConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in file: {}", path.display()))
}

/// Load the data; `strict` applies the config's phantom policy
fn load_data(args: &DataArgs, config: &ClientConfig, strict: bool) -> Result<StructuredData> {
    let definition = DefinitionTree::from_value(&read_json(&args.definition)?)
        .with_context(|| format!("Invalid data definition: {}", args.definition.display()))?;

    let mut value = read_json(&args.file)?;
    if let Some(inner) = value.get_mut("structuredData").map(Value::take) {
        value = inner;
    }
    let data = StructuredData::from_wire(&value, Arc::new(definition))
        .with_context(|| format!("Invalid structured data: {}", args.file.display()))?;

    if strict && config.reject_phantoms && data.has_phantom_nodes() {
        bail!(
            "{} holds phantom nodes: {}",
            args.file.display(),
            data.phantom_identifiers().join(", ")
        );
    }
    Ok(data)
}

fn write_data(data: &StructuredData, transport: Transport, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(&data.to_wire(transport))?;
    match output {
        Some(path) => {
            fs::write(path, format!("{}\n", json))
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            info!("wrote {} ({})", path.display(), transport);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn list_nodes(data: &StructuredData) -> Result<()> {
    for fqi in data.identifiers() {
        let Some(node) = data.node(fqi) else {
            continue;
        };
        let value = match node.content() {
            NodeContent::Group(children) => format!("({} children)", children.len()),
            NodeContent::Text(text) => text.clone(),
            NodeContent::Asset(asset) => match asset.link() {
                Some((kind, reference)) => format!(
                    "{}:{}",
                    kind.wire_prefix(),
                    reference
                        .id
                        .as_deref()
                        .or(reference.path.as_deref())
                        .unwrap_or_default()
                ),
                None => "-".to_string(),
            },
        };
        let marker = if node.is_phantom() { " (phantom)" } else { "" };
        println!("{:<40} {:<6} {}{}", fqi, node.node_type(), value, marker);
    }
    Ok(())
}

fn report_phantoms(
    data: &mut StructuredData,
    remove: bool,
    transport: Transport,
    output: Option<&Path>,
) -> Result<()> {
    let nodes = data.phantom_identifiers();
    let values = data.phantom_values();

    if !remove {
        if nodes.is_empty() && values.is_empty() {
            println!("No phantom nodes or values");
        }
        for fqi in &nodes {
            println!("phantom node:  {}", fqi);
        }
        for fqi in &values {
            println!("phantom value: {}", fqi);
        }
        return Ok(());
    }

    let removed_nodes = data.remove_phantom_nodes();
    let cleaned_values = data.remove_phantom_values();
    eprintln!(
        "Removed {} phantom node(s), cleaned {} phantom value(s)",
        removed_nodes, cleaned_values
    );
    write_data(data, transport, output)
}
