use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use devcfg_descriptor::{
    load_descriptor_file, ParameterField, ParameterGroup, ParameterNode, ProductDescriptor,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Device configuration descriptor tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate descriptor documents
    Validate(ValidateArgs),
    /// Print the flattened default values of a descriptor
    Defaults(DefaultsArgs),
    /// Resolve a field label for a locale
    Label(LabelArgs),
    /// Render the parameter tree of a descriptor
    Show(ShowArgs),
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Descriptor files to check
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct DefaultsArgs {
    file: PathBuf,
    /// Emit the mapping as JSON instead of a listing
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct LabelArgs {
    file: PathBuf,
    /// Dot-joined field path, e.g. outputs.Irr.delta_min
    path: String,
    /// Locale code to resolve; the wildcard entry is the fallback
    #[arg(short, long, default_value = "*")]
    locale: String,
}

#[derive(Args, Debug)]
struct ShowArgs {
    file: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Validate(args) => handle_validate(args),
        Command::Defaults(args) => handle_defaults(args),
        Command::Label(args) => handle_label(args),
        Command::Show(args) => handle_show(args),
    }
}

fn handle_validate(args: ValidateArgs) -> Result<()> {
    info!(files = args.files.len(), "validating descriptors");
    let mut success_count = 0;
    let mut failure_count = 0;

    for path in &args.files {
        match load_descriptor_file(path) {
            Ok(descriptor) => {
                println!(
                    "  ✅ {}: product '{}', {} fields",
                    path.display(),
                    descriptor.product_name,
                    descriptor.default_values().len()
                );
                success_count += 1;
            }
            Err(err) => {
                eprintln!("  ⚠️  {}: {}", path.display(), err);
                failure_count += 1;
            }
        }
    }

    println!("\n--- Validation Summary ---");
    println!("  Valid:   {}", success_count);
    println!("  Invalid: {}", failure_count);

    if failure_count > 0 {
        bail!("{failure_count} descriptor(s) failed validation");
    }
    Ok(())
}

fn handle_defaults(args: DefaultsArgs) -> Result<()> {
    let descriptor = load_descriptor_file(&args.file)
        .with_context(|| format!("failed to load {}", args.file.display()))?;
    let defaults = descriptor.default_values();

    if args.json {
        let mut object = Map::new();
        for (path, value) in &defaults {
            object.insert(path.clone(), value.to_json());
        }
        println!("{}", serde_json::to_string_pretty(&Value::Object(object))?);
        return Ok(());
    }

    let width = defaults.keys().map(String::len).max().unwrap_or(0);
    for (path, value) in &defaults {
        println!("{path:width$}  {value}");
    }
    Ok(())
}

fn handle_label(args: LabelArgs) -> Result<()> {
    let descriptor = load_descriptor_file(&args.file)
        .with_context(|| format!("failed to load {}", args.file.display()))?;
    let field = descriptor
        .field(&args.path)
        .with_context(|| format!("no field at path '{}'", args.path))?;
    let label = field.label.resolve(&args.locale)?;
    println!("{label}");
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<()> {
    let descriptor = load_descriptor_file(&args.file)
        .with_context(|| format!("failed to load {}", args.file.display()))?;
    print_descriptor(&descriptor)?;
    Ok(())
}

fn print_descriptor(descriptor: &ProductDescriptor) -> Result<()> {
    println!(
        "{} - {}",
        descriptor.product_name,
        descriptor.description.resolve("*")?
    );
    if descriptor.supports.is_empty() {
        println!("supports: (none)");
    } else {
        println!("supports: {}", descriptor.supports.join(", "));
    }
    print_group(&descriptor.parameters, 0)?;
    Ok(())
}

fn print_group(group: &ParameterGroup, depth: usize) -> Result<()> {
    let indent = "  ".repeat(depth);
    for (name, node) in group.children() {
        match node {
            ParameterNode::Group(child) => {
                let mut heading = format!("{indent}{name}/");
                if let Some(variable) = &child.variable {
                    heading.push_str(&format!("  ({}, {})", variable.var_type, variable.units));
                }
                if let Some(description) = &child.description {
                    heading.push_str(&format!("  {}", description.resolve("*")?));
                }
                println!("{heading}");
                print_group(child, depth + 1)?;
            }
            ParameterNode::Field(field) => print_field(name, field, &indent)?,
        }
    }
    Ok(())
}

fn print_field(name: &str, field: &ParameterField, indent: &str) -> Result<()> {
    println!(
        "{indent}{name}: {} = {}  [{}]",
        field.field_type,
        field.default,
        field.label.resolve("*")?
    );
    Ok(())
}
