//! Estado de la vista del formulario.
//!
//! Un único valor describe qué muestra la pantalla; sólo `reducir` lo hace
//! avanzar. Combinaciones como "procesando" y "error" a la vez no existen.
use crate::errors::WorkflowError;
use std::fmt;

/// Operación remota en curso.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operacion {
  AbrirRevision,
  ConfirmarObservaciones,
  Guardar,
  Completar,
  GuardarObservacion,
  DesestimarObservacion,
  DesestimarMarca,
  EnviarRevision,
  RegistrarEncuestado,
}

impl fmt::Display for Operacion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Operacion::AbrirRevision => "abrir revisión",
      Operacion::ConfirmarObservaciones => "confirmar observaciones",
      Operacion::Guardar => "guardar",
      Operacion::Completar => "completar",
      Operacion::GuardarObservacion => "guardar observación",
      Operacion::DesestimarObservacion => "desestimar observación",
      Operacion::DesestimarMarca => "desestimar marca",
      Operacion::EnviarRevision => "enviar revisión",
      Operacion::RegistrarEncuestado => "registrar encuestado",
    };
    write!(f, "{}", s)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destino {
  Listado,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VistaEstado {
  Cargando,
  /// Validador ante una encuesta transferida: debe aceptar o cancelar.
  ConfirmarRevision,
  /// Encuestador ante una encuesta observada: debe tomar conocimiento.
  AvisoObservada,
  Lista,
  Procesando(Operacion),
  Exito(String),
  Error(String),
  Navegar(Destino),
}

impl VistaEstado {
  pub fn ocupada(&self) -> bool {
    matches!(self, VistaEstado::Procesando(_))
  }

  /// Hay una puerta (confirmación o aviso) pendiente.
  pub fn en_puerta(&self) -> bool {
    matches!(self, VistaEstado::ConfirmarRevision | VistaEstado::AvisoObservada)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accion {
  Cargada,
  PedirConfirmacion,
  AvisarObservada,
  Iniciar(Operacion),
  Exito(String),
  Fallo(String),
  Descartar,
  Navegar(Destino),
}

/// Función de transición de la vista.
pub fn reducir(estado: &VistaEstado, accion: Accion) -> Result<VistaEstado, WorkflowError> {
  use VistaEstado as V;
  match (estado, accion) {
    (V::Procesando(op), Accion::Iniciar(_)) | (V::Procesando(op), Accion::Navegar(_)) => {
      Err(WorkflowError::Ocupado(op.to_string()))
    }
    (V::Cargando, Accion::PedirConfirmacion) => Ok(V::ConfirmarRevision),
    (V::Cargando, Accion::AvisarObservada) => Ok(V::AvisoObservada),
    (V::Cargando | V::Procesando(_) | V::Exito(_) | V::Error(_) | V::Lista, Accion::Cargada) => Ok(V::Lista),
    (V::Cargando | V::Navegar(_), Accion::Iniciar(op)) => {
      Err(WorkflowError::Validation(format!("No se puede {} sin una encuesta cargada", op)))
    }
    (_, Accion::Iniciar(op)) => Ok(V::Procesando(op)),
    (V::Procesando(_), Accion::Exito(m)) => Ok(V::Exito(m)),
    (V::Procesando(_) | V::Cargando, Accion::Fallo(m)) => Ok(V::Error(m)),
    (V::Exito(_) | V::Error(_), Accion::Descartar) => Ok(V::Lista),
    (_, Accion::Navegar(d)) => Ok(V::Navegar(d)),
    (actual, accion) => {
      Err(WorkflowError::Validation(format!("Acción {:?} no válida en la vista {:?}", accion, actual)))
    }
  }
}
