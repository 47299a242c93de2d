// Archivo: engine.rs
// Propósito: implementar el `FlowEngine`, que ejecuta transiciones de
// estado validadas localmente contra la tabla y delega el cambio real en
// `EncuestaApi`.
//
// Nota: el motor no predice el estado resultante. Devuelve siempre la
// encuesta que respondió el servidor.
use crate::errors::Result;
use crate::lifecycle::{transicionar, Evento, PrecondicionesCompletar};
use crate::repository::EncuestaApi;
use encuesta_domain::{Encuesta, Rol};
use log::{info, warn};
use std::sync::Arc;

/// Motor de transiciones del ciclo de vida.
///
/// Responsabilidades principales:
/// - Resolver el estado destino a partir del evento y el rol
/// - Rechazar localmente transiciones inexistentes o no autorizadas
/// - Solicitar el cambio de estado al servidor y devolver su respuesta
pub struct FlowEngine<A>
    where A: EncuestaApi + ?Sized
{
    api: Arc<A>,
}

impl<A> FlowEngine<A> where A: EncuestaApi + ?Sized
{
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Ejecuta `evento` sobre la encuesta. Si la transición no existe o el
    /// rol no la tiene permitida no se llama al servidor.
    pub fn ejecutar(&self, encuesta: &Encuesta, evento: Evento, rol: Rol) -> Result<Encuesta> {
        let hacia = match transicionar(encuesta.estado_id, evento, rol) {
            Ok(h) => h,
            Err(e) => {
                warn!("encuesta {}: transición rechazada localmente: {}", encuesta.encuesta_id, e);
                return Err(e);
            }
        };
        let actualizada = self.api.cambiar_estado(encuesta.encuesta_id, hacia)?;
        if actualizada.estado_id != hacia {
            warn!("encuesta {}: se solicitó '{}' y el servidor respondió '{}'",
                  encuesta.encuesta_id, hacia, actualizada.estado_id);
        }
        info!("encuesta {}: '{}' -> '{}' ({})",
              encuesta.encuesta_id, encuesta.estado_id, actualizada.estado_id, evento);
        Ok(actualizada)
    }

    /// Completa la encuesta (EN_REGISTRO/EN_CORRECCION -> TRANSFERIDO)
    /// después de verificar secciones y cambios pendientes.
    pub fn completar(&self, encuesta: &Encuesta, rol: Rol, pre: &PrecondicionesCompletar) -> Result<Encuesta> {
        transicionar(encuesta.estado_id, Evento::Completar, rol)?;
        pre.verificar()?;
        self.ejecutar(encuesta, Evento::Completar, rol)
    }

    pub fn abrir_revision(&self, encuesta: &Encuesta, rol: Rol) -> Result<Encuesta> {
        self.ejecutar(encuesta, Evento::AbrirRevision, rol)
    }

    /// Envía la revisión: OBSERVADA con observaciones vigentes, APROBADO
    /// sin ellas.
    pub fn enviar_revision(&self, encuesta: &Encuesta, rol: Rol, observaciones_activas: usize) -> Result<Encuesta> {
        self.ejecutar(encuesta, Evento::envio_revision(observaciones_activas), rol)
    }

    pub fn confirmar_observaciones(&self, encuesta: &Encuesta, rol: Rol) -> Result<Encuesta> {
        self.ejecutar(encuesta, Evento::ConfirmarObservaciones, rol)
    }
}
