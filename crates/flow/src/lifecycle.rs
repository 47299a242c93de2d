// Archivo: lifecycle.rs
// Propósito: tabla de transiciones del ciclo de vida de la encuesta.
//
// El servidor es la autoridad sobre el estado; esta tabla sólo decide qué
// transición se solicita y rechaza localmente las que no existen.
use crate::errors::{FlowError, Result};
use encuesta_domain::{EstadoEncuesta, Rol, Seccion, TipoEncuesta};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Evento {
    /// El encuestador completa la encuesta (todas las secciones, sin
    /// cambios pendientes).
    Completar,
    /// El validador acepta abrir una encuesta transferida.
    AbrirRevision,
    EnviarConObservaciones,
    EnviarSinObservaciones,
    /// El encuestador toma conocimiento de las observaciones.
    ConfirmarObservaciones,
}

impl Evento {
    /// Evento de envío de revisión según las observaciones vigentes.
    pub fn envio_revision(observaciones_activas: usize) -> Evento {
        if observaciones_activas > 0 {
            Evento::EnviarConObservaciones
        } else {
            Evento::EnviarSinObservaciones
        }
    }
}

impl fmt::Display for Evento {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Evento::Completar => "completar",
            Evento::AbrirRevision => "abrir revisión",
            Evento::EnviarConObservaciones => "enviar con observaciones",
            Evento::EnviarSinObservaciones => "enviar sin observaciones",
            Evento::ConfirmarObservaciones => "confirmar observaciones",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transicion {
    pub desde: EstadoEncuesta,
    pub evento: Evento,
    pub hacia: EstadoEncuesta,
    pub rol: Rol,
}

/// Única fuente de aristas válidas. APROBADO no tiene salidas.
pub const TRANSICIONES: [Transicion; 6] =
    [Transicion { desde: EstadoEncuesta::EnRegistro,
                  evento: Evento::Completar,
                  hacia: EstadoEncuesta::Transferido,
                  rol: Rol::Encuestador },
     Transicion { desde: EstadoEncuesta::Transferido,
                  evento: Evento::AbrirRevision,
                  hacia: EstadoEncuesta::EnRevision,
                  rol: Rol::Validador },
     Transicion { desde: EstadoEncuesta::EnRevision,
                  evento: Evento::EnviarConObservaciones,
                  hacia: EstadoEncuesta::Observada,
                  rol: Rol::Validador },
     Transicion { desde: EstadoEncuesta::EnRevision,
                  evento: Evento::EnviarSinObservaciones,
                  hacia: EstadoEncuesta::Aprobado,
                  rol: Rol::Validador },
     Transicion { desde: EstadoEncuesta::Observada,
                  evento: Evento::ConfirmarObservaciones,
                  hacia: EstadoEncuesta::EnCorreccion,
                  rol: Rol::Encuestador },
     Transicion { desde: EstadoEncuesta::EnCorreccion,
                  evento: Evento::Completar,
                  hacia: EstadoEncuesta::Transferido,
                  rol: Rol::Encuestador }];

pub fn transicion(desde: EstadoEncuesta, evento: Evento) -> Option<&'static Transicion> {
    TRANSICIONES.iter().find(|t| t.desde == desde && t.evento == evento)
}

/// Resuelve el estado destino para `evento` o rechaza localmente.
pub fn transicionar(desde: EstadoEncuesta, evento: Evento, rol: Rol) -> Result<EstadoEncuesta> {
    let t = transicion(desde, evento).ok_or_else(|| {
                                         FlowError::InvalidTransition(format!("no se puede {} una encuesta en estado '{}'",
                                                                              evento, desde))
                                     })?;
    if t.rol != rol {
        return Err(FlowError::Unauthorized(format!("el rol {} no puede {} una encuesta en estado '{}'",
                                                   rol, evento, desde)));
    }
    Ok(t.hacia)
}

/// El servidor también valida contra esta tabla.
pub fn es_arista_valida(desde: EstadoEncuesta, hacia: EstadoEncuesta) -> bool {
    TRANSICIONES.iter().any(|t| t.desde == desde && t.hacia == hacia)
}

pub fn eventos_disponibles(estado: EstadoEncuesta, rol: Rol) -> Vec<Evento> {
    TRANSICIONES.iter().filter(|t| t.desde == estado && t.rol == rol).map(|t| t.evento).collect()
}

/// Condiciones locales para completar una encuesta.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecondicionesCompletar {
    pub tipo_encuesta: Option<TipoEncuesta>,
    pub secciones_incompletas: Vec<Seccion>,
    pub cambios_sin_guardar: bool,
}

impl PrecondicionesCompletar {
    pub fn verificar(&self) -> Result<()> {
        if self.cambios_sin_guardar {
            return Err(FlowError::Validation("Debe guardar los cambios antes de completar la encuesta".to_string()));
        }
        if self.tipo_encuesta.is_none() {
            return Err(FlowError::Validation("La encuesta no tiene tipo definido".to_string()));
        }
        if !self.secciones_incompletas.is_empty() {
            let nombres: Vec<&str> =
                self.secciones_incompletas.iter().map(|s| s.etiqueta_para(self.tipo_encuesta)).collect();
            return Err(FlowError::Validation(format!("Complete todas las secciones antes de continuar: {}",
                                                     nombres.join(", "))));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: [Rol; 4] = [Rol::Encuestador, Rol::Validador, Rol::Administrador, Rol::Otro];
    const EVENTOS: [Evento; 5] = [Evento::Completar,
                                  Evento::AbrirRevision,
                                  Evento::EnviarConObservaciones,
                                  Evento::EnviarSinObservaciones,
                                  Evento::ConfirmarObservaciones];

    #[test]
    fn ninguna_transicion_sale_de_la_tabla() {
        for desde in EstadoEncuesta::TODOS {
            for evento in EVENTOS {
                for rol in ROLES {
                    if let Ok(hacia) = transicionar(desde, evento, rol) {
                        assert!(es_arista_valida(desde, hacia), "{:?} -> {:?} fuera de la tabla", desde, hacia);
                    }
                }
            }
        }
    }

    #[test]
    fn aprobado_es_terminal() {
        for evento in EVENTOS {
            for rol in ROLES {
                assert!(transicionar(EstadoEncuesta::Aprobado, evento, rol).is_err());
            }
        }
        assert!(eventos_disponibles(EstadoEncuesta::Aprobado, Rol::Validador).is_empty());
    }

    #[test]
    fn rol_equivocado_no_autorizado() {
        let r = transicionar(EstadoEncuesta::EnRegistro, Evento::Completar, Rol::Validador);
        assert!(matches!(r, Err(FlowError::Unauthorized(_))));
        let r = transicionar(EstadoEncuesta::EnRegistro, Evento::AbrirRevision, Rol::Validador);
        assert!(matches!(r, Err(FlowError::InvalidTransition(_))));
    }

    #[test]
    fn envio_segun_observaciones() {
        assert_eq!(transicionar(EstadoEncuesta::EnRevision, Evento::envio_revision(1), Rol::Validador),
                   Ok(EstadoEncuesta::Observada));
        assert_eq!(transicionar(EstadoEncuesta::EnRevision, Evento::envio_revision(0), Rol::Validador),
                   Ok(EstadoEncuesta::Aprobado));
    }

    #[test]
    fn precondiciones() {
        let mut p = PrecondicionesCompletar { tipo_encuesta: Some(TipoEncuesta::Constructora),
                                              secciones_incompletas: vec![Seccion::DatosObra],
                                              cambios_sin_guardar: false };
        let err = p.verificar().err().map(|e| e.mensaje_usuario()).unwrap_or_default();
        assert!(err.contains("Datos de la Obra"));
        p.secciones_incompletas.clear();
        assert!(p.verificar().is_ok());
        p.cambios_sin_guardar = true;
        assert!(p.verificar().is_err());
    }
}
