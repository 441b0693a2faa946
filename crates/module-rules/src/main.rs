//! Build module rules tool (modrules)

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use module_rules::commands::{check_registry, init_module, stale_against_plan, write_plan};
use module_rules::{
    find_project_root, ModuleDescriptor, ModuleGraph, ModuleRegistry, PchUsageMode,
    WorkspaceConfig,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "modrules")]
#[command(about = "Build module descriptors and dependency graph", long_about = None)]
#[command(version)]
struct Cli {
    /// Project root (defaults to the nearest directory containing modules.toml)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new module descriptor
    Init {
        /// Module name
        name: String,
        /// PCH usage mode (e.g. "use-explicit-or-shared-pchs")
        #[arg(long, default_value = "default")]
        pch: PchUsageMode,
        /// Public dependency (repeatable)
        #[arg(long = "dep")]
        deps: Vec<String>,
        /// Private dependency (repeatable)
        #[arg(long = "private-dep")]
        private_deps: Vec<String>,
    },

    /// Validate all descriptors
    Check,

    /// Print the build order
    Order {
        /// Only order this module and its dependencies
        #[arg(long)]
        target: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what a module exposes, links and is used by
    Deps {
        /// Module name
        name: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the build plan, or list modules changed since it was written
    Plan {
        /// Only plan this module and its dependencies
        #[arg(long)]
        target: Option<String>,
        /// List stale modules instead of writing the plan
        #[arg(long)]
        check: bool,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_env("MODRULES_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let root = match cli.root {
        Some(root) => root,
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            find_project_root(&cwd).unwrap_or(cwd)
        }
    };
    let config = WorkspaceConfig::load(&root)?;
    tracing::debug!(root = %root.display(), "using project root");

    match cli.command {
        Commands::Init {
            name,
            pch,
            deps,
            private_deps,
        } => {
            let desc = ModuleDescriptor::new(name, pch)
                .with_public_dependencies(deps)
                .with_private_dependencies(private_deps);
            let path = init_module(&root, &config, &desc)?;
            println!("Created module {}", desc.name);
            println!("  - {}", path.display());
        }
        Commands::Check => {
            let registry = ModuleRegistry::load(&root, &config)?;
            let report = check_registry(&registry);
            println!("{}", report);
            if !report.is_ok() {
                bail!("module graph is invalid");
            }
        }
        Commands::Order { target, json } => {
            let registry = ModuleRegistry::load(&root, &config)?;
            let graph = ModuleGraph::new(&registry);
            let order = match target.as_deref() {
                Some(t) => graph.build_order(t)?,
                None => graph.topological_order()?,
            };
            let names: Vec<&str> = order.iter().map(|d| d.name.as_str()).collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else {
                for (i, name) in names.iter().enumerate() {
                    println!("{:>3}. {}", i + 1, name);
                }
            }
        }
        Commands::Deps { name, json } => {
            let registry = ModuleRegistry::load(&root, &config)?;
            let graph = ModuleGraph::new(&registry);
            let public = graph.public_closure(&name)?;
            let link = graph.link_closure(&name)?;
            let dependents = graph.dependents(&name)?;

            if json {
                let value = serde_json::json!({
                    "module": name,
                    "public": public,
                    "link": link,
                    "dependents": dependents,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{}", name);
                println!("  exposes:    {}", public.join(", "));
                println!("  links:      {}", link.join(", "));
                println!("  used by:    {}", dependents.join(", "));
            }
        }
        Commands::Plan { target, check } => {
            let registry = ModuleRegistry::load(&root, &config)?;
            if check {
                let stale = stale_against_plan(&root, &config, &registry)?;
                if stale.is_empty() {
                    println!("Build plan is up to date");
                } else {
                    println!("{} module(s) need rebuilding:", stale.len());
                    for name in stale {
                        println!("  - {}", name);
                    }
                }
            } else {
                let plan = write_plan(&root, &config, &registry, target.as_deref())?;
                println!(
                    "Wrote {} ({} modules)",
                    config.plan_path(&root).display(),
                    plan.modules.len()
                );
            }
        }
    }

    Ok(())
}
