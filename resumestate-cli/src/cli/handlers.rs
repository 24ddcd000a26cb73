//! Command handlers for `resume` and `query-to`

use anyhow::{Context, Result};
use resumestate_core::client::{load_sdk_config, SfnClient};
use resumestate_core::services::{environment_span, init_logging, log_failure};
use resumestate_core::utils::{query_to, AthenaQueryRunner, S3ObjectStore};
use resumestate_core::{resume_failed_execution, ResumeReport, Settings};
use std::sync::Arc;
use tracing::Instrument;

/// Arguments of the `query-to` command
#[derive(Debug, Clone)]
pub struct QueryToArgs {
    pub query: String,
    pub job_name: String,
    pub target_key: String,
    pub target_bucket: Option<String>,
    pub database: Option<String>,
    pub output_location: Option<String>,
    pub work_group: Option<String>,
}

fn setup(arn_flag: Option<String>) -> Result<Settings> {
    let settings = Settings::from_env(arn_flag).context("Invalid configuration")?;

    if let Err(e) = init_logging(settings.log_level) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    Ok(settings)
}

/// Handle the resume command
pub async fn handle_resume(execution_arn: Option<String>, json: bool) -> Result<()> {
    let settings = setup(execution_arn)?;
    let execution_arn = settings
        .require_execution_arn()
        .context("Nothing to resume")?
        .to_string();

    let sdk_config = load_sdk_config().await;
    let client = Arc::new(SfnClient::from_conf(&sdk_config));

    let report = match resume_failed_execution(client, &execution_arn)
        .instrument(environment_span(&settings.environment_tag))
        .await
    {
        Ok(report) => report,
        Err(e) => {
            log_failure(&e);
            return Err(e).with_context(|| format!("Failed to resume '{}'", execution_arn));
        }
    };

    print_report(&report, json)
}

fn print_report(report: &ResumeReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("Execution failed at state '{}'", report.failed_state);
        if let Some(input) = &report.failed_input {
            println!("   Input: {}", input);
        }
        println!("Resume state machine: {}", report.resume_state_machine_arn);
        println!("Resume execution: {}", report.resume_execution_arn);
    }
    Ok(())
}

/// Handle the query-to command
pub async fn handle_query_to(args: QueryToArgs, json: bool) -> Result<()> {
    let settings = setup(None)?;

    let sdk_config = load_sdk_config().await;
    let runner = AthenaQueryRunner::from_conf(&sdk_config)
        .with_database(args.database)
        .with_output_location(args.output_location)
        .with_work_group(args.work_group);
    let store = S3ObjectStore::from_conf(&sdk_config);

    let target = query_to(
        &runner,
        &store,
        &args.query,
        &args.job_name,
        &args.target_key,
        args.target_bucket.as_deref(),
    )
    .instrument(environment_span(&settings.environment_tag))
    .await
    .with_context(|| format!("Query job '{}' failed", args.job_name))?;

    if json {
        let output = serde_json::json!({
            "job_name": args.job_name,
            "location": target,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Query result copied to {}", target);
    }
    Ok(())
}
