use thiserror::Error;

/// Environment variable containing the region injected into every job
pub const REGION: &str = "REGION";
/// Environment variable containing the account number injected into every job
pub const ACCT_NUM: &str = "ACCT_NUM";
/// Optional environment variable toggling `NoEcho` on the callback response
pub const RESPONSE_NO_ECHO: &str = "RESPONSE_NO_ECHO";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing {0} environment variable")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {name} environment variable")]
    Invalid { name: &'static str, value: String },
}

/// Account details stamped onto the container environment of each job definition.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountConfig {
    pub region: String,
    pub account_id: String,
}

impl AccountConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let region: String = lookup(REGION).ok_or(ConfigError::Missing(REGION))?;
        let account_id: String = lookup(ACCT_NUM).ok_or(ConfigError::Missing(ACCT_NUM))?;

        Ok(AccountConfig { region, account_id })
    }
}

/// Read `RESPONSE_NO_ECHO`, defaulting to false when unset.
pub fn no_echo_from_env() -> Result<bool, ConfigError> {
    parse_no_echo(std::env::var(RESPONSE_NO_ECHO).ok())
}

pub fn parse_no_echo(value: Option<String>) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(raw) if raw.eq_ignore_ascii_case("true") => Ok(true),
        Some(raw) if raw.eq_ignore_ascii_case("false") => Ok(false),
        Some(raw) => Err(ConfigError::Invalid {
            name: RESPONSE_NO_ECHO,
            value: raw.to_string(),
        }),
    }
}
