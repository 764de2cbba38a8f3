use thiserror::Error;

#[derive(Error, Debug)]
pub enum FasyncError {
    #[error("config error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),
}
