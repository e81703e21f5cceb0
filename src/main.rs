use clap::{Args, Parser as ClapParser, Subcommand};
use cost_query::{
    EngineConfig, WalkOrder,
    cli::{self, CliError, QueryInput, Step},
};
use std::{
    io::{self, Read},
    path::PathBuf,
};

#[derive(ClapParser)]
#[command(name = "costq")]
#[command(about = "costq - filter and group cost entries through a chain of stages")]
#[command(version)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// JSON file holding an array of entries (reads stdin if not provided)
    #[arg(short, long)]
    entries: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Filter as NAME OP VALUE, e.g. status=open, hours>=2, tracker=bug,feature
    #[arg(short, long = "filter")]
    filters: Vec<String>,

    /// Group on the column axis
    #[arg(long = "column")]
    columns: Vec<String>,

    /// Group on the row axis
    #[arg(long = "row")]
    rows: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the query and print its results as JSON
    Run {
        #[command(flatten)]
        query: QueryArgs,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Print group totals as a tree instead of JSON
        #[arg(long)]
        totals: bool,
    },

    /// Show the stage chain
    Explain {
        #[command(flatten)]
        query: QueryArgs,

        /// List the base stage first
        #[arg(long)]
        base_first: bool,
    },

    /// Invoke an operation on the head of the chain (count, sum, filters, ...)
    Call {
        /// Operation name
        operation: String,

        /// Operation arguments (JSON or plain strings)
        args: Vec<String>,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// List the filter and group-by names the config registers
    Fields {
        /// TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    cli::setup_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run {
            query,
            pretty,
            totals,
        } => run(query, pretty, totals),
        Commands::Explain { query, base_first } => explain(query, base_first),
        Commands::Call {
            operation,
            args,
            query,
        } => call(query, &operation, &args),
        Commands::Fields { config } => fields(config),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig, CliError> {
    match path {
        Some(path) => Ok(EngineConfig::load(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn query_input(args: QueryArgs) -> Result<QueryInput, CliError> {
    let config = load_config(args.config.as_ref())?;

    let mut steps = Vec::new();
    for filter in &args.filters {
        steps.push(cli::parse_filter(filter)?);
    }
    steps.extend(args.rows.into_iter().map(Step::Row));
    steps.extend(args.columns.into_iter().map(Step::Column));

    let input = if args.entries.is_none() && config.entries.is_none() && !atty::is(atty::Stream::Stdin)
    {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(cost_query::QueryError::Io)?;
        Some(buffer)
    } else {
        None
    };

    Ok(QueryInput {
        config,
        entries: args.entries,
        input,
        steps,
    })
}

fn run(args: QueryArgs, pretty: bool, totals: bool) -> Result<(), CliError> {
    let input = query_input(args)?;

    if totals {
        let mut query = cli::build_query(&input)?;
        for line in cli::render_totals(&mut query, input.config.sum_field.as_deref())? {
            println!("{}", line);
        }
        return Ok(());
    }

    let output = cli::execute_run(&input)?;
    print_json(&output, pretty)
}

fn explain(args: QueryArgs, base_first: bool) -> Result<(), CliError> {
    let input = query_input(args)?;
    let order = if base_first {
        WalkOrder::BaseFirst
    } else {
        WalkOrder::EdgeFirst
    };
    for line in cli::execute_explain(&input, order)? {
        println!("{}", line);
    }
    Ok(())
}

fn call(args: QueryArgs, operation: &str, raw_args: &[String]) -> Result<(), CliError> {
    let input = query_input(args)?;
    let values: Vec<_> = raw_args.iter().map(|a| cli::parse_arg_value(a)).collect();
    let output = cli::execute_call(&input, operation, &values)?;
    print_json(&output, false)
}

fn fields(config: Option<PathBuf>) -> Result<(), CliError> {
    let registry = load_config(config.as_ref())?.registry();
    println!("filters:   {}", registry.names(cost_query::Category::Filter).join(", "));
    println!("group_bys: {}", registry.names(cost_query::Category::GroupBy).join(", "));
    println!("accepted:  {}", registry.accepted_properties().join(", "));
    Ok(())
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(cost_query::QueryError::Json)?;
    println!("{}", json);
    Ok(())
}
