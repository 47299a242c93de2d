// Observaciones del validador por sección y envío de la revisión.
use super::FormularioEncuesta;
use crate::errors::WorkflowError;
use crate::vista::{Accion, Operacion};
use flow::repository::EncuestaApi;
use log::{debug, warn};

impl<A> FormularioEncuesta<A> where A: EncuestaApi + ?Sized
{
  /// Recarga vigentes y luego historial, en ese orden. Si una consulta
  /// falla se conserva lo que había; el historial nunca se recorta.
  pub(super) fn recargar_observaciones(&mut self) {
    let api = self.engine.api().clone();
    match api.listar_observaciones(self.encuesta_id) {
      Ok(obs) => self.libro.reemplazar_activas(obs),
      Err(e) => warn!("encuesta {}: no se pudieron cargar las observaciones: {}", self.encuesta_id, e),
    }
    match api.listar_historial(self.encuesta_id) {
      Ok(historial) => {
        debug!("encuesta {}: {} entradas de historial", self.encuesta_id, historial.len());
        self.libro.reemplazar_historial(historial);
      }
      Err(e) => warn!("encuesta {}: no se pudo cargar el historial: {}", self.encuesta_id, e),
    }
  }

  fn exigir_edicion_observaciones(&self) -> Result<(), WorkflowError> {
    if self.vista.ocupada() {
      return Err(WorkflowError::Ocupado(format!("{:?}", self.vista)));
    }
    if !self.acceso_observaciones().puede_editar() {
      let estado = self.encuesta.as_ref().map(|e| e.estado_id.nombre()).unwrap_or("sin cargar");
      return Err(WorkflowError::SoloLectura(estado.to_string()));
    }
    Ok(())
  }

  /// Texto en edición de la sección: el borrador si existe, si no el
  /// vigente.
  pub fn texto_observacion(&self, seccion: &str) -> &str {
    self.borradores.get(seccion).map(String::as_str).unwrap_or_else(|| self.libro.texto(seccion))
  }

  pub fn actualizar_borrador(&mut self, seccion: &str, texto: &str) -> Result<(), WorkflowError> {
    self.exigir_edicion_observaciones()?;
    if texto == self.libro.texto(seccion) {
      self.borradores.shift_remove(seccion);
    } else {
      self.borradores.insert(seccion.to_string(), texto.to_string());
    }
    Ok(())
  }

  /// Secciones cuyo borrador difiere del texto vigente.
  pub fn borradores_pendientes(&self) -> Vec<String> {
    self.borradores
        .iter()
        .filter(|(seccion, texto)| texto.as_str() != self.libro.texto(seccion))
        .map(|(seccion, _)| seccion.clone())
        .collect()
  }

  /// Envía el borrador de la sección (upsert) y recarga observaciones e
  /// historial.
  pub fn guardar_observacion(&mut self, seccion: &str) -> Result<(), WorkflowError> {
    self.exigir_edicion_observaciones()?;
    let texto = self.texto_observacion(seccion).trim().to_string();
    self.operar(Operacion::GuardarObservacion, |f| {
          f.api().guardar_observacion(f.encuesta_id, seccion, &texto)?;
          f.borradores.shift_remove(seccion);
          f.recargar_observaciones();
          Ok(((), Accion::Exito("Observación guardada".to_string())))
        })
  }

  /// Desestima la observación guardándola vacía. El historial no cambia.
  pub fn desestimar_observacion(&mut self, seccion: &str) -> Result<(), WorkflowError> {
    self.exigir_edicion_observaciones()?;
    self.operar(Operacion::DesestimarObservacion, |f| {
          f.api().guardar_observacion(f.encuesta_id, seccion, "")?;
          f.borradores.shift_remove(seccion);
          f.recargar_observaciones();
          Ok(((), Accion::Exito("Observación desestimada".to_string())))
        })
  }

  /// Envía la revisión: OBSERVADA si queda alguna observación vigente,
  /// APROBADO si no. Con borradores sin guardar no se llama al servidor.
  pub fn enviar_revision(&mut self) -> Result<(), WorkflowError> {
    self.operar(Operacion::EnviarRevision, |f| {
          let pendientes = f.borradores_pendientes();
          if !pendientes.is_empty() {
            return Err(WorkflowError::Validation(format!("Guarde las observaciones pendientes: {}",
                                                         pendientes.join(", "))));
          }
          let encuesta = f.actual()?.clone();
          let activas = f.libro.contar_activas();
          let actualizada = f.engine.enviar_revision(&encuesta, f.rol, activas)?;
          f.encuesta = Some(actualizada);
          let mensaje = if activas > 0 {
            "Encuesta devuelta al encuestador con observaciones"
          } else {
            "Encuesta aprobada correctamente"
          };
          Ok(((), Accion::Exito(mensaje.to_string())))
        })
  }
}
