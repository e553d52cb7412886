use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] stripline_core::Error),

    #[error("Sampler: {0}")]
    Sampler(#[from] stripline_sampler::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Audio processor already taken")]
    ProcessorTaken,
}

pub type Result<T> = core::result::Result<T, Error>;
