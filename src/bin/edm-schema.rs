//! EDM Schema CLI
//!
//! Command-line interface for validating CSDL documents and looking up
//! schema elements by qualified name.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use edm_schema::{
    get_ruleset, load_model, validate, Capability, EdmModel, EdmVersion, LookupResult,
    SchemaElementRef, Severity,
};

#[derive(Parser)]
#[command(name = "edm-schema")]
#[command(about = "Resolve and validate Entity Data Model schemas")]
#[command(version)]
struct Cli {
    /// Log resolution and validation progress to stderr (honours RUST_LOG)
    #[arg(long, short, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Never log, regardless of RUST_LOG
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate one or more CSDL documents as a single model
    Validate {
        /// CSDL JSON documents
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Rule set to apply: 1.0, 1.1, 1.2, 2.0, 3.0 or 4.0
        /// (default: the documents' declared version, else 4.0)
        #[arg(long)]
        edm_version: Option<String>,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Resolve a qualified name against the model
    Lookup {
        /// CSDL JSON documents
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Qualified or alias-qualified name, e.g. Sales.Customer
        #[arg(long)]
        name: String,

        /// What to look for: type (default), term, container or operation
        #[arg(long, default_value = "type")]
        capability: String,
    },
}

fn init_tracing(cli: &Cli) {
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::new("off")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let result = match cli.command {
        Commands::Validate {
            files,
            edm_version,
            format,
            strict,
        } => run_validate(&files, edm_version.as_deref(), &format, strict),

        Commands::Lookup {
            files,
            name,
            capability,
        } => run_lookup(&files, &name, &capability),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn load(files: &[PathBuf]) -> Result<EdmModel, u8> {
    load_model(files).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn run_validate(
    files: &[PathBuf],
    edm_version: Option<&str>,
    format: &str,
    strict: bool,
) -> Result<(), u8> {
    if format != "text" && format != "json" {
        eprintln!("Error: unknown format \"{}\": expected text or json", format);
        return Err(2);
    }

    let requested = edm_version
        .map(str::parse::<EdmVersion>)
        .transpose()
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

    let model = load(files)?;
    let version = match requested {
        Some(version) => version,
        None => model
            .version()
            .map_err(|e| {
                eprintln!("Error: {}", e);
                e.exit_code() as u8
            })?
            .unwrap_or(EdmVersion::LATEST),
    };
    let diagnostics = validate(&model, get_ruleset(version));

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics.len() - errors;
    let passed = errors == 0 && (!strict || warnings == 0);

    if format == "json" {
        let output = serde_json::json!({
            "version": version.as_str(),
            "valid": passed,
            "errors": errors,
            "warnings": warnings,
            "diagnostics": diagnostics,
        });
        let rendered = serde_json::to_string_pretty(&output).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", rendered);
    } else {
        for diag in &diagnostics {
            let color = match diag.severity {
                Severity::Error => "\x1b[31m",
                Severity::Warning => "\x1b[33m",
            };
            println!(
                "{}: {}{}[{}]\x1b[0m: {}",
                diag.location, color, diag.severity, diag.code, diag.message
            );
        }
        if passed {
            println!("Valid (EDM {})", version);
        } else {
            println!(
                "Invalid (EDM {}): {} errors, {} warnings",
                version, errors, warnings
            );
        }
    }

    if passed {
        Ok(())
    } else {
        Err(1)
    }
}

fn run_lookup(files: &[PathBuf], name: &str, capability: &str) -> Result<(), u8> {
    let Some(capability) = Capability::parse(capability) else {
        eprintln!(
            "Error: unknown capability \"{}\": expected type, term, container or operation",
            capability
        );
        return Err(2);
    };

    let model = load(files)?;
    match model.resolve_qualified_name(name, capability) {
        LookupResult::Found(element) => {
            println!("{}", describe(&model, &element));
            Ok(())
        }
        LookupResult::Ambiguous(candidates) => {
            println!("'{}' is ambiguous between {} elements:", name, candidates.len());
            for element in &candidates {
                println!("  {}", describe(&model, element));
            }
            Err(1)
        }
        LookupResult::NotFound(name) => {
            println!("'{}' not found", name);
            Err(1)
        }
    }
}

fn describe(model: &EdmModel, element: &SchemaElementRef) -> String {
    match element {
        SchemaElementRef::Type(id) => {
            let ty = model.schema_type(*id);
            format!("{} type {} at {}", ty.type_kind(), ty.full_name(), ty.location)
        }
        SchemaElementRef::Term(id) => {
            let term = model.term(*id);
            format!(
                "term {} of type {}",
                term.full_name(),
                model.type_name(term.type_ref.get(model))
            )
        }
        SchemaElementRef::EntityContainer(id) => {
            let container = model.container(*id);
            format!("entity container {} at {}", container.full_name(), container.location)
        }
        SchemaElementRef::Operations(group) => {
            let overloads: Vec<String> = group
                .iter()
                .map(|id| {
                    let op = model.operation(*id);
                    let params: Vec<&str> = op.parameters.iter().map(|p| p.name.as_str()).collect();
                    format!("{}({})", op.full_name(), params.join(", "))
                })
                .collect();
            format!("{} overloads: {}", overloads.len(), overloads.join("; "))
        }
    }
}
