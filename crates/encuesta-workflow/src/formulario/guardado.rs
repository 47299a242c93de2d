// Guardado de la encuesta (payload mínimo) y de la obra, y desestimación de
// marcas persistidas.
use super::FormularioEncuesta;
use crate::errors::WorkflowError;
use crate::vista::{Accion, Operacion};
use encuesta_domain::{Campo, TipoEncuesta};
use flow::repository::{EncuestaApi, ObraRegistro};
use log::{debug, info, warn};

pub const MENSAJE_SIN_CAMBIOS: &str = "No hay cambios por guardar";
const MENSAJE_GUARDADO: &str = "Encuesta guardada exitosamente";
const MENSAJE_GUARDADO_CON_OBRA: &str = "Encuesta y datos de la obra guardados exitosamente";
const MENSAJE_DIRECCION_INCOMPLETA: &str =
  "Debe completar los datos de dirección (País, Departamento, Provincia, Distrito) antes de guardar la encuesta";
const MENSAJE_OBRA_INCOMPLETA: &str = "Complete la etapa y la fecha de finalización de la obra antes de guardar";
const MENSAJE_OBRA_FALLIDA: &str =
  "Encuesta guardada, pero hubo un error al guardar los datos de la obra. Por favor, intente nuevamente.";

/// Resultado de `guardar`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guardado {
  SinCambios,
  Completo,
  /// La encuesta se guardó pero la obra no; la obra sigue pendiente.
  Parcial(String),
}

impl<A> FormularioEncuesta<A> where A: EncuestaApi + ?Sized
{
  /// Envía sólo los campos modificados. La respuesta del servidor reemplaza
  /// la copia local. Si la obra cambió y tiene etapa y fecha, se envía
  /// después con `PUT /obras`.
  pub fn guardar(&mut self) -> Result<Guardado, WorkflowError> {
    self.editable()?;
    if !self.cambios.hay_cambios() {
      self.operar(Operacion::Guardar, |_| Ok(((), Accion::Exito(MENSAJE_SIN_CAMBIOS.to_string()))))?;
      return Ok(Guardado::SinCambios);
    }
    self.operar(Operacion::Guardar, |f| {
          f.validar_para_guardar()?;
          if f.cambios.hay_cambios_de_encuesta() {
            f.enviar_encuesta()?;
          }
          let (resultado, mensaje) = if f.cambios.esta_marcado(Campo::Obra) {
            f.enviar_obra()?
          } else {
            (Guardado::Completo, MENSAJE_GUARDADO)
          };
          Ok((resultado, Accion::Exito(mensaje.to_string())))
        })
  }

  /// Desestima la fila: si ya está registrada se borra en el servidor y
  /// luego se quita localmente.
  pub fn desestimar_fila_marca(&mut self, indice: usize) -> Result<(), WorkflowError> {
    self.editable()?;
    let persistida = self.selector.fila(indice)?.encuesta_fabricante_id;
    let Some(id) = persistida else {
      return self.eliminar_fila_marca(indice);
    };
    self.operar(Operacion::DesestimarMarca, |f| {
          f.api().eliminar_marca_encuesta(id)?;
          f.selector.eliminar_fila(indice)?;
          if let Some(e) = f.encuesta.as_mut() {
            e.marcas.retain(|m| m.encuesta_fabricante_id != Some(id));
          }
          info!("encuesta {}: marca {} desestimada", f.encuesta_id, id);
          Ok(((), Accion::Exito("Fabricante desestimado correctamente".to_string())))
        })
  }

  fn validar_para_guardar(&self) -> Result<(), WorkflowError> {
    let encuesta = self.actual()?;
    match encuesta.tipo_encuesta {
      Some(TipoEncuesta::Industria) if encuesta.empresa_id.is_none() => {
        return Err(WorkflowError::Validation("Debe seleccionar una empresa".to_string()));
      }
      Some(TipoEncuesta::Constructora) => {
        if !self.selector.alguna_completa() {
          return Err(WorkflowError::Validation("Debe seleccionar al menos un fabricante y marca.".to_string()));
        }
        if self.obra.tiene_datos() && !self.obra.direccion.ubigeo_completo() {
          return Err(WorkflowError::Validation(MENSAJE_DIRECCION_INCOMPLETA.to_string()));
        }
      }
      _ => {}
    }
    // La obra modificada se valida antes de cualquier envío.
    if self.cambios.esta_marcado(Campo::Obra) && ObraRegistro::desde_obra(self.encuesta_id, &self.obra).is_none() {
      let mensaje = if self.obra.tiene_datos() { MENSAJE_DIRECCION_INCOMPLETA } else { MENSAJE_OBRA_INCOMPLETA };
      return Err(WorkflowError::Validation(mensaje.to_string()));
    }
    Ok(())
  }

  fn enviar_encuesta(&mut self) -> Result<(), WorkflowError> {
    let mut borrador = self.actual()?.clone();
    if self.cambios.esta_marcado(Campo::Marcas) {
      borrador.marcas = self.selector.marcas_para_guardar();
    }
    // Las filas sin completar no viajan: se conservan en el selector.
    let pendientes = self.selector.filas_pendientes();
    let payload = self.cambios.payload(&borrador)?;
    debug!("encuesta {}: PUT con {:?}", self.encuesta_id, payload);
    let guardada = self.api().guardar_encuesta(&payload)?;
    // La obra pendiente no viaja en este PUT: se conserva la local.
    let obra_pendiente = self.cambios.esta_marcado(Campo::Obra).then(|| self.obra.clone());
    self.procesar(guardada);
    if !pendientes.is_empty() {
      self.selector.conservar_pendientes(pendientes);
      self.cambios.marcar(Campo::Marcas);
    }
    if let Some(obra) = obra_pendiente {
      self.obra = obra;
      self.cambios.marcar(Campo::Obra);
    }
    info!("encuesta {}: guardada", self.encuesta_id);
    Ok(())
  }

  /// Envía la obra. Un fallo aquí no deshace el guardado de la encuesta y
  /// la obra queda pendiente.
  fn enviar_obra(&mut self) -> Result<(Guardado, &'static str), WorkflowError> {
    let registro = ObraRegistro::desde_obra(self.encuesta_id, &self.obra)
      .ok_or_else(|| WorkflowError::Validation(MENSAJE_OBRA_INCOMPLETA.to_string()))?;
    match self.api().guardar_obra(&registro) {
      Ok(obra) => {
        if let Some(e) = self.encuesta.as_mut() {
          e.obra = Some(obra.clone());
        }
        self.obra = obra;
        self.cambios.desmarcar(Campo::Obra);
        Ok((Guardado::Completo, MENSAJE_GUARDADO_CON_OBRA))
      }
      Err(e) => {
        warn!("encuesta {}: la obra no se guardó: {}", self.encuesta_id, e);
        Ok((Guardado::Parcial(MENSAJE_OBRA_FALLIDA.to_string()), MENSAJE_OBRA_FALLIDA))
      }
    }
  }
}
