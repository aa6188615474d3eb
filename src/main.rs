use clap::{Args, Parser, Subcommand};
use session_gate::navigator::Navigator;
use session_gate::transport::{ApiRequest, Method, ReqwestTransport};
use session_gate::{GateConfig, GateError, MemoryStore, PageKind, SessionGate, SessionStore};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error("invalid header {0:?}; expected `name: value`")]
    InvalidHeader(String),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "session-gate", about = "Evaluate page gating and send authorized requests")]
struct Cli {
    #[arg(long, env = "SESSION_GATE_BASE_URL")]
    base_url: Option<String>,

    #[command(flatten)]
    session: SessionArgs,

    #[command(subcommand)]
    command: Command,
}

/// Cached session fields, stored verbatim before the gate runs.
#[derive(Args, Debug)]
struct SessionArgs {
    #[arg(long, env = "SESSION_GATE_TOKEN")]
    token: Option<String>,

    #[arg(long, env = "SESSION_GATE_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "SESSION_GATE_USER_ID")]
    user_id: Option<String>,

    /// Stored roles value, e.g. `["USER","ADMIN"]`.
    #[arg(long, env = "SESSION_GATE_ROLES")]
    roles: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a page load for `path` and print the outcome.
    Check { path: String },
    /// Send an authorized request and print the outcome.
    Request(RequestArgs),
}

#[derive(Args, Debug)]
struct RequestArgs {
    url: String,

    #[arg(long, default_value = "GET")]
    method: String,

    #[arg(long)]
    body: Option<String>,

    /// Extra header as `name: value`; repeatable.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,
}

type CliGate = SessionGate<MemoryStore, StderrNavigator, ReqwestTransport>;

/// Prints redirects and notices instead of acting on them.
struct StderrNavigator;

impl Navigator for StderrNavigator {
    fn navigate(&self, path: &str) {
        eprintln!("navigate -> {path}");
    }

    fn notify(&self, message: &str) {
        eprintln!("notice: {message}");
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = GateConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = Some(base_url.trim_end_matches('/').to_owned());
    }

    let store = MemoryStore::new();
    seed_store(&store, &config, &cli.session);
    let transport = ReqwestTransport::new(&config)?;
    let gate = SessionGate::new(config, store, StderrNavigator, transport);

    match cli.command {
        Command::Check { path } => run_check(&gate, &path),
        Command::Request(args) => run_request(&gate, args).await,
    }
}

fn seed_store(store: &MemoryStore, config: &GateConfig, session: &SessionArgs) {
    let fields = [
        (&config.keys.credential, &session.token),
        (&config.keys.display_name, &session.username),
        (&config.keys.subject_id, &session.user_id),
        (&config.keys.roles, &session.roles),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            store.set(key, value);
        }
    }
}

fn run_check(gate: &CliGate, path: &str) -> Result<(), CliError> {
    let page = PageKind::classify(path, gate.config());
    let outcome = gate.evaluate(&page);
    if let session_gate::PageOutcome::Redirect { to } = &outcome {
        gate.navigator().navigate(to);
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn run_request(gate: &CliGate, args: RequestArgs) -> Result<(), CliError> {
    let method: Method = args.method.parse()?;
    let mut request = ApiRequest::new(method, args.url);
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        request = request.header(name, value);
    }
    if let Some(body) = args.body {
        request = request.body(body);
    }

    let outcome = gate.authorized_request(request).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn parse_header(raw: &str) -> Result<(&str, &str), CliError> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| CliError::InvalidHeader(raw.to_owned()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::InvalidHeader(raw.to_owned()));
    }
    Ok((name, value.trim()))
}
