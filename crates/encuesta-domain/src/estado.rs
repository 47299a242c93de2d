// estado.rs
use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Estados del ciclo de vida de una encuesta. El servidor es quien los
/// asigna; el cliente sólo los refleja y solicita transiciones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum EstadoEncuesta {
  EnRegistro,
  EnRevision,
  Transferido,
  EnCorreccion,
  Aprobado,
  Observada,
}

impl EstadoEncuesta {
  pub const TODOS: [EstadoEncuesta; 6] = [EstadoEncuesta::EnRegistro,
                                          EstadoEncuesta::EnRevision,
                                          EstadoEncuesta::Transferido,
                                          EstadoEncuesta::EnCorreccion,
                                          EstadoEncuesta::Aprobado,
                                          EstadoEncuesta::Observada];

  pub fn id(&self) -> i64 {
    match self {
      EstadoEncuesta::EnRegistro => 1,
      EstadoEncuesta::EnRevision => 2,
      EstadoEncuesta::Transferido => 3,
      EstadoEncuesta::EnCorreccion => 4,
      EstadoEncuesta::Aprobado => 5,
      EstadoEncuesta::Observada => 6,
    }
  }

  pub fn nombre(&self) -> &'static str {
    match self {
      EstadoEncuesta::EnRegistro => "En registro",
      EstadoEncuesta::EnRevision => "En revisión",
      EstadoEncuesta::Transferido => "Transferido",
      EstadoEncuesta::EnCorreccion => "En corrección",
      EstadoEncuesta::Aprobado => "Aprobado",
      EstadoEncuesta::Observada => "Observada",
    }
  }

  pub fn es_terminal(&self) -> bool {
    matches!(self, EstadoEncuesta::Aprobado)
  }
}

impl TryFrom<i64> for EstadoEncuesta {
  type Error = DomainError;

  fn try_from(id: i64) -> Result<Self, Self::Error> {
    EstadoEncuesta::TODOS.iter()
                         .copied()
                         .find(|e| e.id() == id)
                         .ok_or_else(|| DomainError::ValidationError(format!("estadoId desconocido: {}", id)))
  }
}

impl From<EstadoEncuesta> for i64 {
  fn from(estado: EstadoEncuesta) -> Self {
    estado.id()
  }
}

impl fmt::Display for EstadoEncuesta {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.nombre())
  }
}

/// Rol del usuario autenticado. Se obtiene de la descripción del primer rol
/// devuelto por el inicio de sesión.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rol {
  Encuestador,
  Validador,
  Administrador,
  /// Cualquier rol no reconocido. No edita ni transiciona.
  Otro,
}

impl Rol {
  pub fn from_descripcion(descripcion: &str) -> Rol {
    match descripcion.trim().to_lowercase().as_str() {
      "encuestador" => Rol::Encuestador,
      "validador" => Rol::Validador,
      "administrador" => Rol::Administrador,
      _ => Rol::Otro,
    }
  }

  pub fn descripcion(&self) -> &'static str {
    match self {
      Rol::Encuestador => "Encuestador",
      Rol::Validador => "Validador",
      Rol::Administrador => "Administrador",
      Rol::Otro => "Otro",
    }
  }
}

impl fmt::Display for Rol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.descripcion())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ids_y_nombres_coinciden_con_el_servidor() {
    assert_eq!(EstadoEncuesta::Transferido.id(), 3);
    assert_eq!(EstadoEncuesta::Observada.nombre(), "Observada");
    assert_eq!(EstadoEncuesta::try_from(4), Ok(EstadoEncuesta::EnCorreccion));
    assert!(EstadoEncuesta::try_from(7).is_err());
    assert!(EstadoEncuesta::Aprobado.es_terminal());
  }

  #[test]
  fn estado_se_serializa_como_entero() -> Result<(), DomainError> {
    let v = serde_json::to_value(EstadoEncuesta::EnRevision)?;
    assert_eq!(v, serde_json::json!(2));
    let e: EstadoEncuesta = serde_json::from_value(serde_json::json!(6))?;
    assert_eq!(e, EstadoEncuesta::Observada);
    assert!(serde_json::from_value::<EstadoEncuesta>(serde_json::json!(0)).is_err());
    Ok(())
  }

  #[test]
  fn rol_desde_descripcion_ignora_mayusculas() {
    assert_eq!(Rol::from_descripcion("VALIDADOR"), Rol::Validador);
    assert_eq!(Rol::from_descripcion(" Encuestador "), Rol::Encuestador);
    assert_eq!(Rol::from_descripcion("supervisor"), Rol::Otro);
  }
}
