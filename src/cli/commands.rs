use crate::config::GatewayConfig;
use crate::context::{GatewayResponse, InboundRequest};
use crate::executor::MqMessage;
use crate::router::{router_name_for_mode, RouteTable};
use crate::runtime_config::RuntimeConfig;
use anyhow::Context;
use clap::{Parser, Subcommand};
use http::Method;
use std::io::Write;
use std::path::PathBuf;

/// Command-line interface for the vortex gateway engine
#[derive(Parser)]
#[command(name = "vortex")]
#[command(about = "Vortex gateway request-dispatch engine", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show which protocol family a request path routes to
    Classify {
        /// Request path, e.g. /router/rest/user/profile
        path: String,
    },
    /// Show the router name registered for an integer mode
    Mode {
        #[arg(allow_negative_numbers = true)]
        mode: i64,
    },
    /// Load and validate a configuration file
    CheckConfig {
        /// Path to the YAML configuration
        file: PathBuf,
    },
    /// Dispatch one request through a configured gateway
    Dispatch {
        /// Path to the YAML configuration
        #[arg(short, long, env = "VORTEX_CONFIG")]
        config: PathBuf,

        /// Request path, optionally with a query string
        path: String,

        /// Query string, appended to any query already in the path
        #[arg(short, long)]
        query: Option<String>,

        /// Request body
        #[arg(short, long)]
        body: Option<String>,

        /// HTTP method of the inbound request
        #[arg(short = 'X', long, default_value = "GET")]
        method: Method,

        /// Extra header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Content type of the body
        #[arg(long, default_value = "application/json")]
        content_type: String,
    },
}

/// Run a parsed command, writing its report to `out`.
///
/// Returns `false` for negative answers: an unroutable path, an unmapped
/// mode, or a dispatch that did not succeed.
pub fn run_cli(cli: Cli, out: &mut impl Write) -> anyhow::Result<bool> {
    match cli.command {
        Commands::Classify { path } => {
            let routes = RouteTable::standard();
            let matched = routes.route(&path);
            writeln!(
                out,
                "family={:?} router={} remainder={}",
                matched.family,
                matched.family.router_name(),
                matched.remainder
            )?;
            Ok(matched.family.is_routable())
        }
        Commands::Mode { mode } => match router_name_for_mode(mode) {
            Some(name) => {
                writeln!(out, "{name}")?;
                Ok(true)
            }
            None => {
                writeln!(out, "no mapping")?;
                Ok(false)
            }
        },
        Commands::CheckConfig { file } => {
            let config = GatewayConfig::load(&file)?;
            writeln!(out, "{}: ok", file.display())?;
            for (family, asset) in config.families()? {
                writeln!(out, "  {family} -> {}://{}", asset.scheme, asset.host)?;
            }
            if !config.features.is_empty() {
                writeln!(out, "  features: {}", config.features.join(", "))?;
            }
            Ok(true)
        }
        Commands::Dispatch {
            config,
            path,
            query,
            body,
            method,
            headers,
            content_type,
        } => {
            let mut request = InboundRequest::from_target(method, &path);
            if let Some(extra) = query {
                let joined = match request.query.take() {
                    Some(existing) if !existing.is_empty() => format!("{existing}&{extra}"),
                    _ => extra,
                };
                request = request.with_query(joined);
            }
            for header in &headers {
                let (name, value) = header
                    .split_once(':')
                    .with_context(|| format!("header '{header}' is not 'Name: value'"))?;
                request = request.with_header(name.trim(), value.trim());
            }
            if let Some(body) = body {
                request = request
                    .with_header("content-type", content_type)
                    .with_body(body);
            }

            let config = GatewayConfig::load(&config)?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start runtime")?;
            let (response, published) = runtime.block_on(dispatch_once(&config, request))?;
            write_response(out, &response)?;
            for message in published {
                writeln!(
                    out,
                    "published: topic={} broker={} bytes={}",
                    message.topic,
                    message.broker,
                    message.body.len()
                )?;
            }
            Ok(response.is_success())
        }
    }
}

async fn dispatch_once(
    config: &GatewayConfig,
    request: InboundRequest,
) -> anyhow::Result<(GatewayResponse, Vec<MqMessage>)> {
    let gateway = config.assemble(&RuntimeConfig::from_env())?;
    let mut mq_messages = gateway.mq_messages;
    let dispatcher = gateway.builder.build();
    let response = dispatcher.dispatch(request).await;
    dispatcher.shutdown();

    let mut published = Vec::new();
    if let Some(rx) = mq_messages.as_mut() {
        while let Ok(message) = rx.try_recv() {
            published.push(message);
        }
    }
    Ok((response, published))
}

fn write_response(out: &mut impl Write, response: &GatewayResponse) -> std::io::Result<()> {
    writeln!(out, "status: {}", response.status)?;
    writeln!(
        out,
        "content-type: {}",
        response.content_type().unwrap_or("-")
    )?;
    if let Some(trace_id) = response.trace_id() {
        writeln!(out, "trace-id: {trace_id}")?;
    }
    writeln!(out)?;
    out.write_all(&response.body)?;
    if !response.body.ends_with(b"\n") {
        writeln!(out)?;
    }
    Ok(())
}
