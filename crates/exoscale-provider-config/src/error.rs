use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "config file not found. Checked:\n\
        - EXOSCALE_PROVIDER_CONFIG\n\
        - ./exoscale.yaml\n\
        - ~/.config/exoscale/provider.yaml"
    )]
    ConfigFileNotFound,

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("missing credential: {0} (set it in the config file or the environment)")]
    MissingCredential(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
