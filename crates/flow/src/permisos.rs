// Archivo: permisos.rs
// Propósito: matriz única de permisos por rol y estado.
use encuesta_domain::{EstadoEncuesta, Rol};

/// Única función de autorización para editar campos de la encuesta.
/// Administrador y validador nunca editan; el encuestador sólo en registro
/// o en corrección.
pub fn can_edit(rol: Rol, estado: EstadoEncuesta) -> bool {
    matches!((rol, estado),
             (Rol::Encuestador, EstadoEncuesta::EnRegistro) | (Rol::Encuestador, EstadoEncuesta::EnCorreccion))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccesoObservaciones {
    Ninguno,
    Lectura,
    Edicion,
}

impl AccesoObservaciones {
    pub fn puede_ver(&self) -> bool {
        !matches!(self, AccesoObservaciones::Ninguno)
    }

    pub fn puede_editar(&self) -> bool {
        matches!(self, AccesoObservaciones::Edicion)
    }
}

pub fn acceso_observaciones(rol: Rol, estado: EstadoEncuesta) -> AccesoObservaciones {
    use EstadoEncuesta::*;
    match (rol, estado) {
        (Rol::Validador, EnRevision) => AccesoObservaciones::Edicion,
        (Rol::Encuestador, Observada | EnCorreccion) => AccesoObservaciones::Lectura,
        (Rol::Validador | Rol::Administrador, Observada | Aprobado | EnCorreccion) => AccesoObservaciones::Lectura,
        _ => AccesoObservaciones::Ninguno,
    }
}

/// El validador debe confirmar antes de pasar una encuesta transferida a
/// revisión.
pub fn requiere_confirmacion_revision(rol: Rol, estado: EstadoEncuesta) -> bool {
    rol == Rol::Validador && estado == EstadoEncuesta::Transferido
}

/// El encuestador que abre una encuesta observada debe tomar conocimiento
/// de las observaciones.
pub fn requiere_aviso_observada(rol: Rol, estado: EstadoEncuesta) -> bool {
    rol == Rol::Encuestador && estado == EstadoEncuesta::Observada
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solo_el_encuestador_edita_en_registro_o_correccion() {
        for estado in EstadoEncuesta::TODOS {
            for rol in [Rol::Validador, Rol::Administrador, Rol::Otro] {
                assert!(!can_edit(rol, estado));
            }
            let esperado = matches!(estado, EstadoEncuesta::EnRegistro | EstadoEncuesta::EnCorreccion);
            assert_eq!(can_edit(Rol::Encuestador, estado), esperado, "{:?}", estado);
        }
    }

    #[test]
    fn matriz_de_observaciones() {
        assert_eq!(acceso_observaciones(Rol::Validador, EstadoEncuesta::EnRevision), AccesoObservaciones::Edicion);
        assert_eq!(acceso_observaciones(Rol::Encuestador, EstadoEncuesta::EnRevision), AccesoObservaciones::Ninguno);
        assert_eq!(acceso_observaciones(Rol::Encuestador, EstadoEncuesta::Observada), AccesoObservaciones::Lectura);
        assert_eq!(acceso_observaciones(Rol::Encuestador, EstadoEncuesta::Aprobado), AccesoObservaciones::Ninguno);
        assert_eq!(acceso_observaciones(Rol::Administrador, EstadoEncuesta::Aprobado), AccesoObservaciones::Lectura);
        assert_eq!(acceso_observaciones(Rol::Administrador, EstadoEncuesta::EnRevision), AccesoObservaciones::Ninguno);
        assert_eq!(acceso_observaciones(Rol::Validador, EstadoEncuesta::EnCorreccion), AccesoObservaciones::Lectura);
        assert_eq!(acceso_observaciones(Rol::Validador, EstadoEncuesta::Transferido), AccesoObservaciones::Ninguno);
        for estado in EstadoEncuesta::TODOS {
            let editores = [Rol::Encuestador, Rol::Validador, Rol::Administrador, Rol::Otro].into_iter()
                                                                                          .filter(|r| {
                                                                                              acceso_observaciones(*r, estado).puede_editar()
                                                                                          })
                                                                                          .count();
            assert!(editores <= 1);
        }
    }

    #[test]
    fn compuertas_de_apertura() {
        assert!(requiere_confirmacion_revision(Rol::Validador, EstadoEncuesta::Transferido));
        assert!(!requiere_confirmacion_revision(Rol::Administrador, EstadoEncuesta::Transferido));
        assert!(requiere_aviso_observada(Rol::Encuestador, EstadoEncuesta::Observada));
        assert!(!requiere_aviso_observada(Rol::Validador, EstadoEncuesta::Observada));
    }
}
