use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use lungscope_client::{InferenceConfig, TransportKind};

use crate::commands::time::format_duration;
use crate::{commands, print_err, print_info};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct CliArgs {
    #[command(flatten)]
    pub backend: BackendArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify one histopathology image.
    Predict(commands::predict::PredictArgs),
    /// Check that the REST prediction server is up.
    Health,
    /// Print the API the remote backend declares.
    DescribeApi,
    /// Print the resolved configuration.
    Config,
}

/// Overrides for the `LUNGSCOPE_*` environment settings.
#[derive(Args, Debug, Default, Clone)]
pub struct BackendArgs {
    /// Backend protocol: rest, queued or rpc.
    #[arg(long, global = true)]
    pub transport: Option<TransportKind>,
    /// Base URL of the REST prediction server.
    #[arg(long, global = true)]
    pub api_base: Option<String>,
    /// Root URL of the hosted app (queued transport).
    #[arg(long, global = true)]
    pub space_url: Option<String>,
    /// Hosted app identifier, owner/name or URL (rpc transport).
    #[arg(long, global = true)]
    pub space_id: Option<String>,
    /// Index of the remote function to call (queued transport).
    #[arg(long, global = true)]
    pub fn_index: Option<u32>,
    /// Remote API name.
    #[arg(long, global = true)]
    pub api_name: Option<String>,
    /// Parameter name used when retrying an rpc call with a named argument.
    #[arg(long, global = true)]
    pub api_param: Option<String>,
    /// Seconds without stream events before giving up; 0 waits forever.
    #[arg(long, global = true)]
    pub stream_timeout: Option<u64>,
}

impl BackendArgs {
    /// Environment settings with command-line values taking precedence.
    pub fn resolve(&self, mut config: InferenceConfig) -> InferenceConfig {
        if let Some(transport) = self.transport {
            config.transport = transport;
        }
        if let Some(base) = &self.api_base {
            config.api_base = Some(base.trim_end_matches('/').to_string());
        }
        if let Some(url) = &self.space_url {
            config.space_url = Some(url.trim_end_matches('/').to_string());
        }
        if let Some(id) = &self.space_id {
            config.space_id = Some(id.clone());
        }
        if let Some(index) = self.fn_index {
            config.fn_index = index;
        }
        if let Some(name) = &self.api_name {
            config.api_name = name.clone();
        }
        if let Some(param) = &self.api_param {
            config.api_param = param.clone();
        }
        if let Some(secs) = self.stream_timeout {
            config.stream_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        config
    }
}

pub fn cli_main() -> ExitCode {
    let time_begin = std::time::Instant::now();
    let args = CliArgs::parse();

    let cli_res = handle_command(args);

    let code = match cli_res {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            print_err!("{:#}", e);
            ExitCode::FAILURE
        }
    };

    let duration = time_begin.elapsed();
    print_info!("Time elapsed: {}", format_duration(&duration));
    code
}

fn handle_command(args: CliArgs) -> anyhow::Result<()> {
    let config = args.backend.resolve(InferenceConfig::from_env()?);

    match args.command {
        Commands::Predict(predict_args) => commands::predict::handle_command(predict_args, &config),
        Commands::Health => commands::health::handle_command(&config),
        Commands::DescribeApi => commands::describe::handle_command(&config),
        Commands::Config => commands::config::handle_command(&config),
    }
}
