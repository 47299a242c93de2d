// Archivo: errors.rs
// Propósito: definir los errores del flujo de encuestas y el alias
// Result<T> usado por el contrato `EncuestaApi` y el motor.
use encuesta_domain::DomainError;
use thiserror::Error;

/// Mensaje cuando el servidor rechaza sin explicar el motivo.
pub const MENSAJE_GENERICO: &str = "Ocurrió un error al procesar la solicitud";
/// Mensaje para fallas de red o de transporte.
pub const MENSAJE_SIN_CONEXION: &str = "No se pudo conectar con el servidor";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    /// Entidad no encontrada (encuesta, observación, fabricante...).
    #[error("No encontrado: {0}")]
    NotFound(String),
    /// El evento no corresponde a ninguna arista desde el estado actual.
    #[error("Transición no permitida: {0}")]
    InvalidTransition(String),
    /// El rol no puede ejecutar la acción en el estado actual.
    #[error("No autorizado: {0}")]
    Unauthorized(String),
    /// Validación local; nunca se llegó a llamar al servidor.
    #[error("Error de validación: {0}")]
    Validation(String),
    /// El servidor respondió con un error de negocio.
    #[error("Rechazado por el servidor ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// No hubo respuesta del servidor.
    #[error("Error de transporte: {0}")]
    Transport(String),
    #[error("Error de almacenamiento: {0}")]
    Storage(String),
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error de serialización: {0}")]
    Serialization(String),
    #[error("Error de dominio: {0}")]
    Domain(#[from] DomainError),
}

impl FlowError {
    /// Texto a mostrar al usuario para la acción fallida.
    pub fn mensaje_usuario(&self) -> String {
        match self {
            FlowError::Rejected { message, .. } if !message.trim().is_empty() => message.clone(),
            FlowError::Rejected { .. } => MENSAJE_GENERICO.to_string(),
            FlowError::Transport(_) => MENSAJE_SIN_CONEXION.to_string(),
            FlowError::NotFound(m)
            | FlowError::InvalidTransition(m)
            | FlowError::Unauthorized(m)
            | FlowError::Validation(m) => m.clone(),
            FlowError::Domain(DomainError::ValidationError(m)) => m.clone(),
            other => other.to_string(),
        }
    }

    /// Error detectado localmente, antes de cualquier llamada remota.
    pub fn es_local(&self) -> bool {
        matches!(self,
                 FlowError::InvalidTransition(_)
                 | FlowError::Unauthorized(_)
                 | FlowError::Validation(_)
                 | FlowError::Domain(_))
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mensaje_usuario_por_tipo_de_error() {
        let rechazo = FlowError::Rejected { status: 409,
                                            message: "El RUC ya está registrado".into() };
        assert_eq!(rechazo.mensaje_usuario(), "El RUC ya está registrado");
        let vacio = FlowError::Rejected { status: 500,
                                          message: " ".into() };
        assert_eq!(vacio.mensaje_usuario(), MENSAJE_GENERICO);
        assert_eq!(FlowError::Transport("connection refused".into()).mensaje_usuario(), MENSAJE_SIN_CONEXION);
        assert!(FlowError::Validation("x".into()).es_local());
        assert!(!FlowError::Transport("x".into()).es_local());
    }
}
