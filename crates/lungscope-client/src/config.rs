use std::str::FromStr;
use std::time::Duration;

use strum::{Display, EnumString};

use crate::error::InferenceError;

pub const ENV_TRANSPORT: &str = "LUNGSCOPE_TRANSPORT";
pub const ENV_API_BASE: &str = "LUNGSCOPE_API_BASE";
pub const ENV_SPACE_URL: &str = "LUNGSCOPE_SPACE_URL";
pub const ENV_SPACE_ID: &str = "LUNGSCOPE_SPACE_ID";
pub const ENV_FN_INDEX: &str = "LUNGSCOPE_FN_INDEX";
pub const ENV_API_NAME: &str = "LUNGSCOPE_API_NAME";
pub const ENV_API_PARAM: &str = "LUNGSCOPE_API_PARAM";
pub const ENV_STREAM_TIMEOUT: &str = "LUNGSCOPE_STREAM_TIMEOUT_SECS";

pub const DEFAULT_API_NAME: &str = "/predict";
pub const DEFAULT_API_PARAM: &str = "image";
pub const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which backend protocol a client speaks. Fixed for the lifetime of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TransportKind {
    /// Single multipart POST to a REST prediction endpoint.
    #[default]
    Rest,
    /// Upload, enqueue, then consume an event stream.
    Queued,
    /// Connect to a hosted app and negotiate the call shape.
    Rpc,
}

/// Settings resolved once at startup. Which fields are required depends on
/// [`TransportKind`]; see [`InferenceConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceConfig {
    pub transport: TransportKind,
    pub api_base: Option<String>,
    pub space_url: Option<String>,
    pub space_id: Option<String>,
    pub fn_index: u32,
    pub api_name: String,
    pub api_param: String,
    /// Idle timeout on the event stream. `None` waits forever.
    pub stream_timeout: Option<Duration>,
    pub request_timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        InferenceConfig {
            transport: TransportKind::default(),
            api_base: None,
            space_url: None,
            space_id: None,
            fn_index: 0,
            api_name: DEFAULT_API_NAME.to_string(),
            api_param: DEFAULT_API_PARAM.to_string(),
            stream_timeout: Some(DEFAULT_STREAM_TIMEOUT),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl InferenceConfig {
    /// Creates a new configuration from the process environment.
    pub fn from_env() -> Result<Self, InferenceError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`InferenceConfig::from_env`] but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InferenceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = InferenceConfig::default();

        if let Some(transport) = get(ENV_TRANSPORT) {
            config.transport = TransportKind::from_str(&transport).map_err(|_| {
                InferenceError::Configuration(format!(
                    "{ENV_TRANSPORT} must be one of `rest`, `queued` or `rpc`, got `{transport}`."
                ))
            })?;
        }
        config.api_base = get(ENV_API_BASE).map(|base| base.trim_end_matches('/').to_string());
        config.space_url = get(ENV_SPACE_URL).map(|url| url.trim_end_matches('/').to_string());
        config.space_id = get(ENV_SPACE_ID);
        if let Some(index) = get(ENV_FN_INDEX) {
            config.fn_index = parse_number(ENV_FN_INDEX, &index)?;
        }
        if let Some(name) = get(ENV_API_NAME) {
            config.api_name = name;
        }
        if let Some(param) = get(ENV_API_PARAM) {
            config.api_param = param;
        }
        if let Some(secs) = get(ENV_STREAM_TIMEOUT) {
            let secs: u64 = parse_number(ENV_STREAM_TIMEOUT, &secs)?;
            config.stream_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Checks that the setting required by the selected transport is present.
    pub fn validate(&self) -> Result<(), InferenceError> {
        match self.transport {
            TransportKind::Rest => require(&self.api_base, ENV_API_BASE, "http://localhost:8000"),
            TransportKind::Queued => require(
                &self.space_url,
                ENV_SPACE_URL,
                "https://owner-name.hf.space",
            ),
            TransportKind::Rpc => require(&self.space_id, ENV_SPACE_ID, "owner/name"),
        }
    }
}

fn require(value: &Option<String>, var: &str, example: &str) -> Result<(), InferenceError> {
    match value {
        Some(_) => Ok(()),
        None => Err(InferenceError::Configuration(format!(
            "{var} is not set. Set {var}={example} in the environment or pass it on the command line."
        ))),
    }
}

fn parse_number<T: FromStr>(var: &str, raw: &str) -> Result<T, InferenceError> {
    raw.parse::<T>().map_err(|_| {
        InferenceError::Configuration(format!("{var} must be a non-negative integer, got `{raw}`."))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let cfg = InferenceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, InferenceConfig::default());
        assert_eq!(cfg.transport, TransportKind::Rest);
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_urls() {
        let cfg = InferenceConfig::from_lookup(lookup(&[
            (ENV_API_BASE, "http://localhost:8000/"),
            (ENV_SPACE_URL, "https://me-lungs.hf.space/"),
        ]))
        .unwrap();
        assert_eq!(cfg.api_base.as_deref(), Some("http://localhost:8000"));
        assert_eq!(cfg.space_url.as_deref(), Some("https://me-lungs.hf.space"));
    }

    #[test]
    fn transport_is_case_insensitive() {
        let cfg = InferenceConfig::from_lookup(lookup(&[(ENV_TRANSPORT, "Queued")])).unwrap();
        assert_eq!(cfg.transport, TransportKind::Queued);
    }

    #[test]
    fn unknown_transport_is_a_configuration_error() {
        let err = InferenceConfig::from_lookup(lookup(&[(ENV_TRANSPORT, "grpc")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn malformed_fn_index_is_rejected() {
        let err = InferenceConfig::from_lookup(lookup(&[(ENV_FN_INDEX, "two")])).unwrap_err();
        assert!(err.to_string().contains(ENV_FN_INDEX));
    }

    #[test]
    fn zero_stream_timeout_disables_it() {
        let cfg = InferenceConfig::from_lookup(lookup(&[(ENV_STREAM_TIMEOUT, "0")])).unwrap();
        assert_eq!(cfg.stream_timeout, None);
        let cfg = InferenceConfig::from_lookup(lookup(&[(ENV_STREAM_TIMEOUT, "5")])).unwrap();
        assert_eq!(cfg.stream_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn blank_values_count_as_absent() {
        let cfg = InferenceConfig::from_lookup(lookup(&[(ENV_API_BASE, "   ")])).unwrap();
        assert_eq!(cfg.api_base, None);
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains(ENV_API_BASE));
    }

    #[test]
    fn validation_checks_the_setting_of_the_selected_transport() {
        let cfg = InferenceConfig {
            transport: TransportKind::Rpc,
            api_base: Some("http://localhost:8000".into()),
            ..Default::default()
        };
        assert!(cfg.validate().unwrap_err().to_string().contains(ENV_SPACE_ID));

        let cfg = InferenceConfig {
            transport: TransportKind::Queued,
            space_url: Some("https://me-lungs.hf.space".into()),
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }
}
