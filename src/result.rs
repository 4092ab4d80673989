use super::errors::ProcessError;

pub type ProcessResult<T> = Result<T, ProcessError>;
