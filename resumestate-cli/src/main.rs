mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::handlers;

#[derive(Parser)]
#[command(name = "resumestate")]
#[command(version)]
#[command(about = "Resume a failed Step Functions execution from the state it failed at")]
#[command(
    help_template = "{name} - {version}\n{about}\n\n{usage-heading}\n  {usage}\n\n{all-args}{options}\n"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resume a failed execution (default)
    ///
    /// Reads the execution ARN from EXECUTION_ARN, falling back to --execution-arn.
    /// ENVIRONMENT_TAG tags every log line, LOG_LEVEL sets verbosity.
    ///
    /// The new state machine starts at a GoToState choice: executions started
    /// with {"resuming": true} jump to the failed state, {"resuming": false}
    /// runs from the original StartAt.
    ///
    /// Examples:
    ///   EXECUTION_ARN=arn:aws:states:us-east-1:123:execution:Etl:run-7 resumestate
    ///   resumestate resume --execution-arn arn:aws:states:us-east-1:123:execution:Etl:run-7 --json
    Resume {
        /// Execution ARN of the failed state machine
        #[arg(long)]
        execution_arn: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Run an Athena query and copy its result file to a new S3 key
    QueryTo {
        /// SQL to run
        query: String,

        /// Job name used in log lines
        #[arg(long, default_value = "resumestate-query")]
        job_name: String,

        /// Key the result is copied to
        #[arg(long)]
        target_key: String,

        /// Bucket the result is copied to (default: the bucket Athena wrote to)
        #[arg(long)]
        target_bucket: Option<String>,

        /// Athena database
        #[arg(long)]
        database: Option<String>,

        /// s3:// prefix for raw query results (default: the work group setting)
        #[arg(long)]
        output_location: Option<String>,

        /// Athena work group
        #[arg(long)]
        work_group: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            handlers::handle_resume(None, false).await?;
        }
        Some(Commands::Resume {
            execution_arn,
            json,
        }) => {
            handlers::handle_resume(execution_arn, json).await?;
        }
        Some(Commands::QueryTo {
            query,
            job_name,
            target_key,
            target_bucket,
            database,
            output_location,
            work_group,
            json,
        }) => {
            handlers::handle_query_to(
                handlers::QueryToArgs {
                    query,
                    job_name,
                    target_key,
                    target_bucket,
                    database,
                    output_location,
                    work_group,
                },
                json,
            )
            .await?;
        }
    }

    Ok(())
}
