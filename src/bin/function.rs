use std::time::{Duration, SystemTime};

use clap::Parser;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use budget_assistant::{
    Assistant, AssistantArgs, AssistantConfig, FunctionEvent, FunctionResponse,
    handle_function_event,
};

/// How long before the invocation deadline the upstream call is abandoned.
const DEADLINE_MARGIN: Duration = Duration::from_millis(500);

/// The serverless function handler for budget_assistant.
///
/// All options are normally set through the function's environment.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    assistant: AssistantArgs,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .without_time()
        .compact()
        .init();

    let args = Args::parse();
    let assistant = Assistant::new(AssistantConfig::from(args.assistant))?;
    let assistant = &assistant;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<FunctionEvent>| async move {
        handle(assistant, event).await
    }))
    .await
}

async fn handle(
    assistant: &Assistant,
    event: LambdaEvent<FunctionEvent>,
) -> Result<FunctionResponse, Error> {
    let (event, context) = event.into_parts();
    tracing::debug!("Handling invocation {}", context.request_id);

    // Give up on the upstream model shortly before the platform kills the
    // invocation, so the client still gets an error response.
    let cancel = CancellationToken::new();
    let remaining = context
        .deadline()
        .duration_since(SystemTime::now())
        .unwrap_or_default()
        .saturating_sub(DEADLINE_MARGIN);
    let deadline = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(remaining).await;
            cancel.cancel();
        }
    });

    let response = handle_function_event(assistant, event, &cancel).await;
    deadline.abort();

    Ok(response)
}
