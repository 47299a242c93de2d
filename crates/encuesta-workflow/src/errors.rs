use thiserror::Error;

// Errores del formulario de encuesta.
//
// Agrupa los errores del flujo remoto (`FlowError`), del dominio
// (`DomainError`) y las validaciones propias del formulario.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
  /// Errores originados en el crate `flow` (transiciones, servidor, red).
  #[error("Error de flujo: {0}")]
  Flow(#[from] flow::errors::FlowError),

  /// Errores de validación del dominio (fechas, precio, selector).
  #[error("Error de dominio: {0}")]
  Domain(#[from] encuesta_domain::DomainError),

  /// Validación local del formulario; no se llamó al servidor.
  #[error("Error de validación: {0}")]
  Validation(String),

  /// El rol no puede modificar la encuesta en su estado actual.
  #[error("La encuesta es de solo lectura en estado '{0}'")]
  SoloLectura(String),

  /// Ya hay una operación en curso.
  #[error("Hay una operación en curso: {0}")]
  Ocupado(String),

  #[error("Error de serialización: {0}")]
  Serialization(String),
}

impl WorkflowError {
  /// Mensaje a mostrar en la vista.
  pub fn mensaje_usuario(&self) -> String {
    match self {
      WorkflowError::Flow(e) => e.mensaje_usuario(),
      WorkflowError::Domain(encuesta_domain::DomainError::ValidationError(m)) => m.clone(),
      WorkflowError::Domain(encuesta_domain::DomainError::SeleccionNoDisponible(m)) => {
        format!("Opción no disponible: {}", m)
      }
      WorkflowError::Validation(m) => m.clone(),
      otro => otro.to_string(),
    }
  }

  /// Error detectado antes de llamar al servidor.
  pub fn es_local(&self) -> bool {
    match self {
      WorkflowError::Flow(e) => e.es_local(),
      WorkflowError::Serialization(_) => false,
      _ => true,
    }
  }
}

impl From<serde_json::Error> for WorkflowError {
  fn from(err: serde_json::Error) -> Self {
    WorkflowError::Serialization(err.to_string())
  }
}
