use sl_domain::error::DomainError;

pub type Result<T> = std::result::Result<T, DomainError>;

pub fn err(msg: impl Into<String>) -> DomainError {
    DomainError::Unknown(msg.into())
}
