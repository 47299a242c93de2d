use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
  #[error("Error de validación: {0}")]
  ValidationError(String),
  #[error("Selección no disponible: {0}")]
  SeleccionNoDisponible(String),
  #[error("Error de serialización: {0}")]
  SerializationError(String),
}

impl From<serde_json::Error> for DomainError {
  fn from(err: serde_json::Error) -> Self {
    DomainError::SerializationError(err.to_string())
  }
}
