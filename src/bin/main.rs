//! sqljson CLI - Rewrite SQL into JSON-producing queries
//!
//! Usage:
//!   sqljson bind <file.sql> [-p kind:value]...
//!   sqljson describe <file.sql> [--database <path>] [--parsed]
//!   sqljson rewrite <file.sql> [-p kind:value]... [--dialect <dialect>]
//!   sqljson aggregate --ids 1,2,3 [-p kind:value]...
//!   sqljson request <report> [-p kind:value]...
//!   sqljson generate <report> [-p kind:value]... --out <path>
//!
//! Examples:
//!   sqljson rewrite queries/staff.sql -p number:10 -p text:IT_PROG --dialect sqlite --parsed
//!   sqljson aggregate --ids 1,4 -p date:2024-01-31
//!   sqljson generate monthly_sales -p number:2024 --out monthly_sales.xlsx

use clap::{Parser, Subcommand, ValueEnum};
use sqljson::backend::SqliteBackend;
use sqljson::catalog::SqliteCatalog;
use sqljson::config::{IntrospectionMode, Settings};
use sqljson::introspect::{ParsedIntrospector, SchemaIntrospector};
use sqljson::logging::init_logging;
use sqljson::model::{DataSourceId, ParameterList, ParameterValue};
use sqljson::render::{
    HttpRenderService, RenderError, RenderRequest, RenderResult, RenderService,
};
use sqljson::report::ReportGenerator;
use sqljson::store::MemoryReportStore;
use sqljson::{bind, Aggregator, Dialect, JsonRewriter};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "sqljson")]
#[command(about = "sqljson - Rewrite parameterized SQL into single-value JSON queries")]
#[command(version)]
struct Cli {
    /// Path to the settings file (defaults to $SQLJSON_CONFIG, ./sqljson.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that describe queries.
#[derive(clap::Args)]
struct EngineArgs {
    /// SQL dialect to generate (defaults to the live database's, else engine.dialect)
    #[arg(short, long)]
    dialect: Option<DialectArg>,

    /// SQLite database to prepare queries against (overrides introspection.database)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Derive columns from the query text instead of a live database
    #[arg(long)]
    parsed: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Substitute #P<n># placeholders and print the bound SQL
    Bind {
        /// Path to the .sql file
        file: PathBuf,

        /// Parameter as kind:value (number, text, date) or null; repeat in placeholder order
        #[arg(short = 'p', long = "param", value_name = "KIND:VALUE")]
        params: Vec<ParameterValue>,

        /// SQL dialect used to render literals
        #[arg(short, long)]
        dialect: Option<DialectArg>,
    },

    /// Print the output columns of a query
    Describe {
        /// Path to the .sql file
        file: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Rewrite a query into a single JSON array query
    Rewrite {
        /// Path to the .sql file
        file: PathBuf,

        #[arg(short = 'p', long = "param", value_name = "KIND:VALUE")]
        params: Vec<ParameterValue>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Compose catalog data sources into one document query
    Aggregate {
        /// Data source ids, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<i64>,

        #[arg(short = 'p', long = "param", value_name = "KIND:VALUE")]
        params: Vec<ParameterValue>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Print the render request for a report without sending it
    Request {
        /// Report name registered in the catalog
        report: String,

        #[arg(short = 'p', long = "param", value_name = "KIND:VALUE")]
        params: Vec<ParameterValue>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Render a report and write the document to a file
    Generate {
        /// Report name registered in the catalog
        report: String,

        #[arg(short = 'p', long = "param", value_name = "KIND:VALUE")]
        params: Vec<ParameterValue>,

        /// Where to write the rendered document
        #[arg(short, long)]
        out: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Oracle,
    Sqlite,
    Postgres,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Oracle => Dialect::Oracle,
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Postgres => Dialect::Postgres,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&settings.logging) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let result = match cli.command {
        Commands::Bind {
            file,
            params,
            dialect,
        } => cmd_bind(&settings, &file, params, dialect),
        Commands::Describe { file, engine } => cmd_describe(&settings, &file, &engine),
        Commands::Rewrite {
            file,
            params,
            engine,
        } => cmd_rewrite(&settings, &file, params, &engine),
        Commands::Aggregate {
            ids,
            params,
            engine,
        } => cmd_aggregate(&settings, ids, params, &engine),
        Commands::Request {
            report,
            params,
            engine,
        } => cmd_request(&settings, &report, params, &engine),
        Commands::Generate {
            report,
            params,
            out,
            engine,
        } => cmd_generate(&settings, &report, params, &out, &engine).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Either a live database or the offline parser.
enum Introspector {
    Live(SqliteBackend),
    Parsed(ParsedIntrospector),
}

impl Introspector {
    fn as_dyn(&self) -> &dyn SchemaIntrospector {
        match self {
            Introspector::Live(backend) => backend,
            Introspector::Parsed(parsed) => parsed,
        }
    }

    /// Dialect to generate: the live database's, else the requested one.
    fn dialect(&self, settings: &Settings, arg: Option<DialectArg>) -> Result<Dialect, Box<dyn Error>> {
        match self {
            Introspector::Live(backend) => engine_dialect(settings, arg, backend.dialect()),
            Introspector::Parsed(_) => Ok(dialect_for(settings, arg)),
        }
    }
}

fn dialect_for(settings: &Settings, arg: Option<DialectArg>) -> Dialect {
    arg.map(Dialect::from).unwrap_or(settings.engine.dialect)
}

/// The database that runs the statements fixes the dialect. An explicit
/// `--dialect` naming another one is an error; a configured one is overridden.
fn engine_dialect(
    settings: &Settings,
    arg: Option<DialectArg>,
    engine: Dialect,
) -> Result<Dialect, Box<dyn Error>> {
    match arg.map(Dialect::from) {
        Some(requested) if requested != engine => Err(format!(
            "--dialect {} cannot be used with a {} database",
            requested, engine
        )
        .into()),
        Some(_) => Ok(engine),
        None => {
            if settings.engine.dialect != engine {
                warn!(
                    configured = %settings.engine.dialect,
                    %engine,
                    "configured dialect ignored for live database"
                );
            }
            Ok(engine)
        }
    }
}

/// `--parsed` always wins; a configured parsed mode yields to an explicit `--database`.
fn wants_parsed(settings: &Settings, engine: &EngineArgs) -> bool {
    engine.parsed
        || (settings.introspection.mode == IntrospectionMode::Parsed && engine.database.is_none())
}

fn open_backend(settings: &Settings, engine: &EngineArgs) -> Result<SqliteBackend, Box<dyn Error>> {
    let path = match &engine.database {
        Some(path) => path.clone(),
        None => settings.introspection.resolved_database()?,
    };
    Ok(SqliteBackend::open(path, settings.introspection.timeout())?)
}

fn introspector_for(settings: &Settings, engine: &EngineArgs) -> Result<Introspector, Box<dyn Error>> {
    if wants_parsed(settings, engine) {
        let dialect = dialect_for(settings, engine.dialect);
        return Ok(Introspector::Parsed(ParsedIntrospector::new(dialect)));
    }
    Ok(Introspector::Live(open_backend(settings, engine)?))
}

fn open_catalog(settings: &Settings) -> Result<SqliteCatalog, Box<dyn Error>> {
    let path = settings.catalog.resolved_path()?;
    Ok(SqliteCatalog::open(path, settings.catalog.timeout())?)
}

fn read_sql(file: &Path) -> Result<String, Box<dyn Error>> {
    fs::read_to_string(file)
        .map_err(|e| format!("Error reading file '{}': {}", file.display(), e).into())
}

fn cmd_bind(
    settings: &Settings,
    file: &Path,
    params: Vec<ParameterValue>,
    dialect: Option<DialectArg>,
) -> CliResult {
    let sql = read_sql(file)?;
    let params = ParameterList::from(params);
    println!("{}", bind(&sql, &params, dialect_for(settings, dialect)));
    Ok(())
}

fn cmd_describe(settings: &Settings, file: &Path, engine: &EngineArgs) -> CliResult {
    let sql = read_sql(file)?;
    let introspector = introspector_for(settings, engine)?;

    let columns = introspector.as_dyn().describe(&sql)?;
    if columns.is_empty() {
        println!("No columns.");
    }
    for column in &columns {
        let marker = if column.synthetic { " (unnamed)" } else { "" };
        println!("{:>3}  {}{}", column.ordinal, column.name, marker);
    }
    Ok(())
}

fn cmd_rewrite(
    settings: &Settings,
    file: &Path,
    params: Vec<ParameterValue>,
    engine: &EngineArgs,
) -> CliResult {
    let sql = read_sql(file)?;
    let introspector = introspector_for(settings, engine)?;
    let dialect = introspector.dialect(settings, engine.dialect)?;
    let rewriter = JsonRewriter::new(introspector.as_dyn(), dialect);

    println!("{}", rewriter.to_json_query(&sql, &ParameterList::from(params))?);
    Ok(())
}

fn cmd_aggregate(
    settings: &Settings,
    ids: Vec<i64>,
    params: Vec<ParameterValue>,
    engine: &EngineArgs,
) -> CliResult {
    let catalog = open_catalog(settings)?;
    let introspector = introspector_for(settings, engine)?;
    let dialect = introspector.dialect(settings, engine.dialect)?;
    let rewriter = JsonRewriter::new(introspector.as_dyn(), dialect);

    let ids: Vec<DataSourceId> = ids.into_iter().map(DataSourceId).collect();
    let sql = Aggregator::new(&catalog, rewriter)
        .with_filename_marker(settings.engine.filename_marker.as_str())
        .aggregate(&ids, &ParameterList::from(params))?;

    println!("{}", sql);
    Ok(())
}

fn cmd_request(
    settings: &Settings,
    report: &str,
    params: Vec<ParameterValue>,
    engine: &EngineArgs,
) -> CliResult {
    let catalog = open_catalog(settings)?;
    let backend = open_backend(settings, engine)?;
    let dialect = engine_dialect(settings, engine.dialect, backend.dialect())?;
    let parsed = ParsedIntrospector::new(dialect);
    let introspector: &dyn SchemaIntrospector = if wants_parsed(settings, engine) {
        &parsed
    } else {
        &backend
    };

    // Nothing is rendered or stored in a dry run.
    let store = MemoryReportStore::new();
    let request = generator(settings, dialect, &catalog, introspector, &backend, &DryRunRenderer, &store)?
        .build_request(report, &ParameterList::from(params))?;

    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

async fn cmd_generate(
    settings: &Settings,
    report: &str,
    params: Vec<ParameterValue>,
    out: &Path,
    engine: &EngineArgs,
) -> CliResult {
    let catalog = open_catalog(settings)?;
    let backend = open_backend(settings, engine)?;
    let dialect = engine_dialect(settings, engine.dialect, backend.dialect())?;
    let parsed = ParsedIntrospector::new(dialect);
    let introspector: &dyn SchemaIntrospector = if wants_parsed(settings, engine) {
        &parsed
    } else {
        &backend
    };

    let renderer = HttpRenderService::new(
        settings.render.resolved_endpoint()?,
        settings.render.timeout(),
    )?;
    let store = MemoryReportStore::new();

    let generated = generator(settings, dialect, &catalog, introspector, &backend, &renderer, &store)?
        .generate(report, &ParameterList::from(params))
        .await?;

    let payload = store
        .get(generated.record_id)
        .and_then(|record| record.payload)
        .ok_or("rendered document missing from store")?;
    fs::write(out, &payload)?;

    println!(
        "Wrote {} ({} bytes, {}) to {}",
        generated.filename,
        generated.size,
        generated.mime_type,
        out.display()
    );
    Ok(())
}

fn generator<'a>(
    settings: &Settings,
    dialect: Dialect,
    catalog: &'a SqliteCatalog,
    introspector: &'a dyn SchemaIntrospector,
    backend: &'a SqliteBackend,
    renderer: &'a dyn RenderService,
    store: &'a MemoryReportStore,
) -> Result<ReportGenerator<'a>, Box<dyn Error>> {
    Ok(
        ReportGenerator::new(catalog, introspector, backend, renderer, store)
            .with_dialect(dialect)
            .with_filename_marker(settings.engine.filename_marker.as_str())
            .with_credentials(settings.render.credentials()?)
            .with_render_timeout(settings.render.timeout()),
    )
}

/// Renderer for `request`, which never renders.
struct DryRunRenderer;

#[async_trait::async_trait]
impl RenderService for DryRunRenderer {
    async fn render(
        &self,
        _request: &RenderRequest,
    ) -> RenderResult<Vec<u8>> {
        Err(RenderError::Config("dry run does not render".to_string()))
    }
}
