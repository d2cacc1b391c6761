//! Configuration for the assistant pipeline.
//!
//! Both binaries flatten [AssistantArgs] into their command line, so every
//! option can also be set through the environment. The library itself never
//! reads the environment: the resulting [AssistantConfig] is handed to
//! [crate::Assistant::new].

use std::time::Duration;

use clap::Args;
use secrecy::SecretString;

/// The default base URL of the chat-completion API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.deepseek.com";
/// The default model used for completions.
pub const DEFAULT_MODEL: &str = "deepseek-chat";
/// The default time to wait for the upstream model before giving up.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);
/// The default timezone used to work out today's date.
pub const DEFAULT_TIMEZONE: &str = "Etc/UTC";

/// Command line and environment options for the assistant pipeline.
#[derive(Args, Debug, Clone)]
pub struct AssistantArgs {
    /// The API key for the chat-completion API.
    ///
    /// Requests are answered with a configuration error while this is unset.
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// The base URL of the chat-completion API.
    #[arg(long, env = "DEEPSEEK_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// The model to request completions from.
    #[arg(long, env = "DEEPSEEK_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// How many seconds to wait for the upstream model.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = DEFAULT_UPSTREAM_TIMEOUT.as_secs())]
    pub upstream_timeout_secs: u64,

    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    #[arg(long, env = "LOCAL_TIMEZONE", default_value = DEFAULT_TIMEZONE)]
    pub timezone: String,
}

/// The settings the assistant pipeline is constructed with.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// The API key for the chat-completion API, if one has been configured.
    pub api_key: Option<SecretString>,
    /// The base URL of the chat-completion API, without a trailing slash.
    pub api_base_url: String,
    /// The model to request completions from.
    pub model: String,
    /// How long to wait for the upstream model.
    pub upstream_timeout: Duration,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl AssistantConfig {
    /// Create a config with the default settings and the given API key.
    pub fn new(api_key: Option<&str>) -> Self {
        Self {
            api_key: api_key.map(|key| SecretString::from(key.to_owned())),
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            local_timezone: DEFAULT_TIMEZONE.to_owned(),
        }
    }

    /// Point the pipeline at a different chat-completion API.
    pub fn with_api_base_url(mut self, api_base_url: &str) -> Self {
        self.api_base_url = api_base_url.trim_end_matches('/').to_owned();
        self
    }

    /// Set how long to wait for the upstream model.
    pub fn with_upstream_timeout(mut self, upstream_timeout: Duration) -> Self {
        self.upstream_timeout = upstream_timeout;
        self
    }

    /// Set the timezone used to work out today's date.
    pub fn with_local_timezone(mut self, local_timezone: &str) -> Self {
        self.local_timezone = local_timezone.to_owned();
        self
    }
}

impl From<AssistantArgs> for AssistantConfig {
    fn from(args: AssistantArgs) -> Self {
        // An empty variable, e.g. `DEEPSEEK_API_KEY=`, counts as unset.
        let api_key = args.api_key.filter(|key| !key.trim().is_empty());

        Self {
            api_key: api_key.map(SecretString::from),
            api_base_url: args.api_base_url.trim_end_matches('/').to_owned(),
            model: args.model,
            upstream_timeout: Duration::from_secs(args.upstream_timeout_secs),
            local_timezone: args.timezone,
        }
    }
}
