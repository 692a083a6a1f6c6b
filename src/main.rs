use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use localstack_harness::cli::{self, Overrides};
use tracing::Level;

#[derive(Parser)]
#[command(name = "lsh")]
#[command(about = "Manage disposable Localstack containers for AWS SDK tests", long_about = None)]
#[command(version)]
struct Cli {
    /// Show debug logging, including every docker invocation
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct ContainerArgs {
    /// Container name; an existing container with this name is reused
    #[arg(long)]
    name: Option<String>,

    /// Image repository
    #[arg(long)]
    repository: Option<String>,

    /// Image tag
    #[arg(long)]
    tag: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a Localstack container and wait until it is ready
    Start {
        /// Comma separated services to enable, e.g. s3,sqs
        #[arg(long, value_delimiter = ',')]
        services: Option<Vec<String>>,

        /// Enable persistence with this DATA_DIR
        #[arg(long)]
        data_dir: Option<String>,

        #[command(flatten)]
        container: ContainerArgs,
    },
    /// Remove a named Localstack container
    Stop {
        #[command(flatten)]
        container: ContainerArgs,
    },
    /// List the services Localstack can enable
    Services,
    /// Print the endpoint an SDK client would use for a service
    Resolve {
        /// SDK endpoint identifier, e.g. s3, monitoring, streams.dynamodb
        sdk_id: String,

        /// Services enabled in the running container
        #[arg(long, value_delimiter = ',')]
        services: Option<Vec<String>>,

        /// Region to resolve in
        #[arg(long)]
        region: Option<String>,

        /// Fail instead of falling back for known services that are not enabled
        #[arg(long)]
        strict: bool,

        #[command(flatten)]
        container: ContainerArgs,
    },
}

impl ContainerArgs {
    fn into_overrides(self) -> Overrides {
        Overrides {
            name: self.name,
            repository: self.repository,
            tag: self.tag,
            ..Default::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start {
            services,
            data_dir,
            container,
        } => {
            let overrides = Overrides {
                services,
                data_dir,
                ..container.into_overrides()
            };
            cli::start::run(&overrides).context("Failed to start Localstack")?;
        }
        Commands::Stop { container } => {
            cli::stop::run(&container.into_overrides()).context("Failed to stop Localstack")?;
        }
        Commands::Services => cli::services::run()?,
        Commands::Resolve {
            sdk_id,
            services,
            region,
            strict,
            container,
        } => {
            let overrides = Overrides {
                services,
                ..container.into_overrides()
            };
            cli::resolve::run(&sdk_id, region.as_deref(), strict, &overrides)
                .with_context(|| format!("Failed to resolve endpoint for '{}'", sdk_id))?;
        }
    }

    Ok(())
}
