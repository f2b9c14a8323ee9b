use thiserror::Error;

#[derive(Error, Debug)]
pub enum TagFixError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ID3 error: {0}")]
    Id3(#[from] id3::Error),

    #[error("Tag codec error: {0}")]
    Codec(#[from] lofty::error::LoftyError),

    #[error("ASF header error: {0}")]
    Asf(String),

    #[error("No {0} tag present")]
    MissingTag(&'static str),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Path does not exist: {0}")]
    PathNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Interrupted by user")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, TagFixError>;
