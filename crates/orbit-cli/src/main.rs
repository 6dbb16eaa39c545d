use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use orbit_config::{discover_config_path, ConfigDiagnostics, OrbitConfig};
use orbit_deps::{LibraryDependencies, LibraryDependenciesCache, LibraryInfo, ModuleDependencies};
use orbit_project::{Project, ProjectDescriptor};
use orbit_scheduler::{run_with_timeout, CancellationToken};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "orbit", version, about = "Orbit CLI (library dependency caches)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the libraries and SDKs a library is used together with
    Deps(DepsArgs),
    /// Print the unfiltered libraries and SDKs reachable from a module
    ModuleDeps(ModuleDepsArgs),
    /// Print the JSON schema of `orbit.toml`
    ConfigSchema,
}

#[derive(Args)]
struct DepsArgs {
    /// Project descriptor (JSON)
    descriptor: PathBuf,
    /// Library name
    library: String,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
    /// Give up after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Config file (defaults to `orbit.toml` next to the descriptor)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct ModuleDepsArgs {
    /// Project descriptor (JSON)
    descriptor: PathBuf,
    /// Module name
    module: String,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
    /// Config file (defaults to `orbit.toml` next to the descriptor)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Deps(args) => {
            let cache = open_cache(&args.descriptor, args.config.as_deref())?;
            let report = library_report(&cache, &args.library, args.timeout_ms)?;
            print_output(&report, args.json)?;
            Ok(0)
        }
        Command::ModuleDeps(args) => {
            let cache = open_cache(&args.descriptor, args.config.as_deref())?;
            let report = module_report(&cache, &args.module)?;
            print_output(&report, args.json)?;
            Ok(0)
        }
        Command::ConfigSchema => {
            let schema = orbit_config::json_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(0)
        }
    }
}

fn load_config(descriptor: &Path, explicit: Option<&Path>) -> Result<OrbitConfig> {
    let path = explicit.map(Path::to_path_buf).or_else(|| {
        let project_dir = descriptor
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        discover_config_path(project_dir)
    });
    let (config, diagnostics) = match path {
        Some(path) => OrbitConfig::load_from_path_with_diagnostics(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => (OrbitConfig::default(), ConfigDiagnostics::default()),
    };

    orbit_config::init_tracing(&config.logging);
    for key in &diagnostics.unknown_keys {
        tracing::warn!(target: "orbit.config", key = %key, "unknown config key");
    }
    for warning in &diagnostics.warnings {
        tracing::warn!(target: "orbit.config", ?warning, "config warning");
    }
    Ok(config)
}

fn open_cache(descriptor: &Path, config: Option<&Path>) -> Result<Arc<LibraryDependenciesCache>> {
    let config = load_config(descriptor, config)?;
    let project_descriptor = ProjectDescriptor::load(descriptor)?;
    let project = Project::from_descriptor(&project_descriptor)?;
    Ok(LibraryDependenciesCache::new(
        Arc::new(project),
        config.dependencies,
    ))
}

#[derive(Serialize)]
struct LibraryReport {
    library: String,
    infos: Vec<LibraryInfoReport>,
}

#[derive(Serialize)]
struct LibraryInfoReport {
    platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    klib: Option<String>,
    libraries: Vec<LibraryEntry>,
    sdks: Vec<String>,
}

#[derive(Serialize)]
struct LibraryEntry {
    name: String,
    platform: String,
}

impl From<&LibraryInfo> for LibraryEntry {
    fn from(info: &LibraryInfo) -> Self {
        Self {
            name: info.name().to_owned(),
            platform: info.platform().to_string(),
        }
    }
}

fn library_report(
    cache: &Arc<LibraryDependenciesCache>,
    name: &str,
    timeout_ms: Option<u64>,
) -> Result<LibraryReport> {
    let id = cache
        .project()
        .snapshot()
        .library_by_name(name)
        .ok_or_else(|| anyhow!("unknown library `{name}`"))?;

    let mut infos = Vec::new();
    for info in cache.library_infos(id)?.iter() {
        let deps = compute_with_timeout(cache, info, timeout_ms)?;
        infos.push(info_report(info, &deps));
    }

    Ok(LibraryReport {
        library: name.to_owned(),
        infos,
    })
}

fn compute_with_timeout(
    cache: &Arc<LibraryDependenciesCache>,
    info: &LibraryInfo,
    timeout_ms: Option<u64>,
) -> Result<Arc<LibraryDependencies>> {
    let token = CancellationToken::new();
    let Some(timeout_ms) = timeout_ms else {
        return Ok(cache.library_dependencies(info, &token)?);
    };

    let worker_cache = Arc::clone(cache);
    let worker_info = info.clone();
    let result = run_with_timeout(Duration::from_millis(timeout_ms), token, move |ctx| {
        worker_cache.library_dependencies_with_context(&worker_info, &ctx)
    })?;
    Ok(result?)
}

fn info_report(info: &LibraryInfo, deps: &LibraryDependencies) -> LibraryInfoReport {
    LibraryInfoReport {
        platform: info.platform().to_string(),
        klib: info.klib().map(|klib| klib.unique_name.clone()),
        libraries: deps.libraries.iter().map(LibraryEntry::from).collect(),
        sdks: deps.sdks.iter().map(|sdk| sdk.name.clone()).collect(),
    }
}

#[derive(Serialize)]
struct ModuleReport {
    module: String,
    platform: String,
    libraries: Vec<LibraryEntry>,
    sdks: Vec<String>,
}

fn module_report(cache: &LibraryDependenciesCache, name: &str) -> Result<ModuleReport> {
    let id = cache
        .project()
        .snapshot()
        .module_by_name(name)
        .ok_or_else(|| anyhow!("unknown module `{name}`"))?;

    let platform = cache.module_platform(id)?;
    let deps: Arc<ModuleDependencies> = cache.module_dependencies(id, &CancellationToken::new())?;

    Ok(ModuleReport {
        module: name.to_owned(),
        platform: platform.to_string(),
        libraries: deps
            .libraries
            .iter()
            .flat_map(|candidate| candidate.libraries().iter().map(LibraryEntry::from))
            .collect(),
        sdks: deps.sdks.iter().map(|sdk| sdk.name.clone()).collect(),
    })
}

fn print_output<T: Serialize + 'static>(value: &T, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(value)?;
        println!("{out}");
        return Ok(());
    }

    // Human output for the report types. Everything else falls back to pretty JSON.
    let any = value as &dyn std::any::Any;
    if let Some(report) = any.downcast_ref::<LibraryReport>() {
        for info in &report.infos {
            match &info.klib {
                Some(klib) => println!("{} [{}] ({klib})", report.library, info.platform),
                None => println!("{} [{}]", report.library, info.platform),
            }
            print_entries(&info.libraries, &info.sdks);
        }
        if report.infos.is_empty() {
            println!("{}: no library infos", report.library);
        }
    } else if let Some(report) = any.downcast_ref::<ModuleReport>() {
        println!("{} [{}]", report.module, report.platform);
        print_entries(&report.libraries, &report.sdks);
    } else {
        let out = serde_json::to_string_pretty(value)?;
        println!("{out}");
    }
    Ok(())
}

fn print_entries(libraries: &[LibraryEntry], sdks: &[String]) {
    println!("  libraries:");
    for library in libraries {
        println!("    {} [{}]", library.name, library.platform);
    }
    println!("  sdks:");
    for sdk in sdks {
        println!("    {sdk}");
    }
}
