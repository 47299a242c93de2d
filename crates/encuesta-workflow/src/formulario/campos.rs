// Setters de la encuesta y operaciones del selector de marcas. Cada setter
// exige que el rol pueda editar en el estado actual y marca el campo que
// toca.
use super::FormularioEncuesta;
use crate::errors::WorkflowError;
use crate::vista::{Accion, Operacion};
use encuesta_domain::{texto_opcional, validar_encuestado_nuevo, validar_fecha_encuesta, validar_precio, validar_ruc,
                      Campo, Empresa, Encuesta, Encuestado, Obra, TipoProducto};
use flow::permisos::can_edit;
use flow::repository::EncuestaApi;
use log::info;

impl<A> FormularioEncuesta<A> where A: EncuestaApi + ?Sized
{
  pub(super) fn editable(&mut self) -> Result<&mut Encuesta, WorkflowError> {
    if self.vista.ocupada() {
      return Err(WorkflowError::Ocupado(format!("{:?}", self.vista)));
    }
    let rol = self.rol;
    let encuesta =
      self.encuesta.as_mut().ok_or_else(|| WorkflowError::Validation("No hay datos de encuesta".to_string()))?;
    if !can_edit(rol, encuesta.estado_id) {
      return Err(WorkflowError::SoloLectura(encuesta.estado_id.nombre().to_string()));
    }
    Ok(encuesta)
  }

  /// Acepta `YYYY-MM-DD` o un timestamp ISO; no puede ser posterior a hoy.
  pub fn set_fecha_encuesta(&mut self, fecha: &str) -> Result<(), WorkflowError> {
    let normalizada = validar_fecha_encuesta(fecha)?;
    self.editable()?.fecha_encuesta = Some(normalizada);
    self.cambios.marcar(Campo::FechaEncuesta);
    Ok(())
  }

  pub fn seleccionar_empresa(&mut self, empresa: Empresa) -> Result<(), WorkflowError> {
    if !empresa.ruc.trim().is_empty() {
      validar_ruc(&empresa.ruc)?;
    }
    let e = self.editable()?;
    e.empresa_id = Some(empresa.empresa_id);
    e.empresa = Some(empresa);
    self.cambios.marcar(Campo::EmpresaId);
    Ok(())
  }

  /// Asigna un encuestado ya registrado en el servidor.
  pub fn seleccionar_encuestado(&mut self, encuestado: Encuestado) -> Result<(), WorkflowError> {
    let id = encuestado.encuestado_id
                       .ok_or_else(|| WorkflowError::Validation("Registre primero al encuestado".to_string()))?;
    let e = self.editable()?;
    e.encuestado_id = Some(id);
    e.encuestado = Some(encuestado);
    self.cambios.marcar(Campo::EncuestadoId);
    Ok(())
  }

  /// Registra un encuestado nuevo (`POST /encuestados`) y lo asigna a la
  /// encuesta. La asignación viaja con el siguiente guardado.
  pub fn registrar_encuestado(&mut self, nuevo: Encuestado) -> Result<(), WorkflowError> {
    self.editable()?;
    validar_encuestado_nuevo(&nuevo)?;
    self.operar(Operacion::RegistrarEncuestado, |f| {
          let creado = f.api().registrar_encuestado(&nuevo)?;
          let mensaje = format!("Encuestado {} registrado y asignado correctamente", creado.nombre_completo());
          info!("encuesta {}: encuestado {:?} registrado", f.encuesta_id, creado.encuestado_id);
          let e = f.encuesta.as_mut().ok_or_else(|| WorkflowError::Validation("No hay datos de encuesta".to_string()))?;
          e.encuestado_id = creado.encuestado_id;
          e.encuestado = Some(creado);
          f.cambios.marcar(Campo::EncuestadoId);
          Ok(((), Accion::Exito(mensaje)))
        })
  }

  /// Concreto premezclado y artículos de concreto son excluyentes.
  pub fn set_tipo_producto(&mut self, tipo: TipoProducto) -> Result<(), WorkflowError> {
    let e = self.editable()?;
    let premezclado = tipo == TipoProducto::ConcretoPremezclado;
    e.concreto_premezclado = Some(i64::from(premezclado));
    e.articulos_concreto = Some(i64::from(!premezclado));
    self.cambios.marcar(Campo::ConcretoPremezclado);
    self.cambios.marcar(Campo::ArticulosConcreto);
    Ok(())
  }

  pub fn set_tipo_lugar_compra(&mut self, valor: &str) -> Result<(), WorkflowError> {
    self.editable()?.tipo_lugar_compra = texto_opcional(valor);
    self.cambios.marcar(Campo::TipoLugarCompra);
    Ok(())
  }

  /// Cambiar el tipo de compra limpia presentación y cantidad.
  pub fn set_tipo_compra(&mut self, valor: &str) -> Result<(), WorkflowError> {
    let nuevo = texto_opcional(valor).map(|v| v.to_uppercase());
    let e = self.editable()?;
    if e.tipo_compra == nuevo {
      return Ok(());
    }
    e.tipo_compra = nuevo;
    e.presentacion_compra = None;
    e.cantidad_presentacion_compra = None;
    self.cambios.marcar(Campo::TipoCompra);
    self.cambios.marcar(Campo::PresentacionCompra);
    self.cambios.marcar(Campo::CantidadPresentacionCompra);
    Ok(())
  }

  /// Cambiar la presentación limpia la cantidad.
  pub fn set_presentacion_compra(&mut self, valor: &str) -> Result<(), WorkflowError> {
    let nuevo = texto_opcional(valor);
    let e = self.editable()?;
    if e.presentacion_compra == nuevo {
      return Ok(());
    }
    e.presentacion_compra = nuevo;
    e.cantidad_presentacion_compra = None;
    self.cambios.marcar(Campo::PresentacionCompra);
    self.cambios.marcar(Campo::CantidadPresentacionCompra);
    Ok(())
  }

  pub fn set_cantidad_presentacion_compra(&mut self, valor: &str) -> Result<(), WorkflowError> {
    self.editable()?.cantidad_presentacion_compra = texto_opcional(valor);
    self.cambios.marcar(Campo::CantidadPresentacionCompra);
    Ok(())
  }

  pub fn set_desc_compra(&mut self, valor: &str) -> Result<(), WorkflowError> {
    self.editable()?.desc_compra = texto_opcional(valor);
    self.cambios.marcar(Campo::DescCompra);
    Ok(())
  }

  /// Precio entre 0 y 99 999 999.99; fuera de rango no modifica nada.
  pub fn set_precio(&mut self, precio: Option<f64>) -> Result<(), WorkflowError> {
    let precio = precio.map(validar_precio).transpose()?;
    self.editable()?.precio = precio;
    self.cambios.marcar(Campo::Precio);
    Ok(())
  }

  pub fn set_con_igv(&mut self, con_igv: bool) -> Result<(), WorkflowError> {
    self.editable()?.con_igv = Some(i64::from(con_igv));
    self.cambios.marcar(Campo::ConIgv);
    Ok(())
  }

  pub fn set_uso_cemento(&mut self, valor: &str) -> Result<(), WorkflowError> {
    self.editable()?.uso_cemento = texto_opcional(valor);
    self.cambios.marcar(Campo::UsoCemento);
    Ok(())
  }

  pub fn set_motivo_compra(&mut self, valor: &str) -> Result<(), WorkflowError> {
    self.editable()?.motivo_compra = texto_opcional(valor);
    self.cambios.marcar(Campo::MotivoCompra);
    Ok(())
  }

  pub fn set_deseo_regalo(&mut self, deseo: bool) -> Result<(), WorkflowError> {
    self.editable()?.deseo_regalo = Some(i64::from(deseo));
    self.cambios.marcar(Campo::DeseoRegalo);
    Ok(())
  }

  pub fn set_audio_url(&mut self, valor: &str) -> Result<(), WorkflowError> {
    self.editable()?.audio_url = texto_opcional(valor);
    self.cambios.marcar(Campo::AudioUrl);
    Ok(())
  }

  pub fn set_comentario_cuantitativo(&mut self, valor: &str) -> Result<(), WorkflowError> {
    self.editable()?.comentario_cuantitativo = texto_opcional(valor);
    self.cambios.marcar(Campo::ComentarioCuantitativo);
    Ok(())
  }

  /// Edita la obra (sólo encuestas CONSTRUCTORA). Se guarda aparte con
  /// `PUT /obras`.
  pub fn editar_obra<F>(&mut self, editar: F) -> Result<(), WorkflowError>
    where F: FnOnce(&mut Obra)
  {
    if !self.editable()?.es_constructora() {
      return Err(WorkflowError::Validation("Solo las encuestas de constructora tienen obra".to_string()));
    }
    editar(&mut self.obra);
    self.cambios.marcar(Campo::Obra);
    Ok(())
  }

  // ---- selector de marcas ----

  pub fn agregar_fila_marca(&mut self) -> Result<usize, WorkflowError> {
    self.editable()?;
    let indice = self.selector.agregar_fila();
    self.cambios.marcar(Campo::Marcas);
    Ok(indice)
  }

  /// Quita la fila localmente. Si es la única se reinicia en su lugar.
  pub fn eliminar_fila_marca(&mut self, indice: usize) -> Result<(), WorkflowError> {
    self.editable()?;
    self.selector.eliminar_fila(indice)?;
    self.cambios.marcar(Campo::Marcas);
    Ok(())
  }

  /// Selecciona el fabricante de la fila; sus marcas se consultan una sola
  /// vez por formulario.
  pub fn seleccionar_fabricante(&mut self, indice: usize, fabricante_id: Option<i64>) -> Result<(), WorkflowError> {
    self.editable()?;
    self.selector.fila(indice)?;
    if let Some(id) = fabricante_id {
      let api = self.engine.api().clone();
      self.catalogo.cargar_marcas(api.as_ref(), id)?;
    }
    self.selector.seleccionar_fabricante(indice, fabricante_id)?;
    self.cambios.marcar(Campo::Marcas);
    Ok(())
  }

  pub fn seleccionar_marca(&mut self, indice: usize, marca_fabricante_id: Option<i64>) -> Result<(), WorkflowError> {
    self.editable()?;
    self.selector.seleccionar_marca(indice, marca_fabricante_id, &self.catalogo)?;
    self.cambios.marcar(Campo::Marcas);
    Ok(())
  }

  /// Con una sola descripción física disponible, queda seleccionada.
  pub fn seleccionar_tipo_cemento(&mut self, indice: usize, tipo: Option<&str>) -> Result<(), WorkflowError> {
    self.editable()?;
    self.selector.seleccionar_tipo_cemento(indice, tipo, &self.catalogo)?;
    self.cambios.marcar(Campo::Marcas);
    Ok(())
  }

  pub fn seleccionar_desc_fisica(&mut self, indice: usize, desc: Option<&str>) -> Result<(), WorkflowError> {
    self.editable()?;
    self.selector.seleccionar_desc_fisica(indice, desc, &self.catalogo)?;
    self.cambios.marcar(Campo::Marcas);
    Ok(())
  }
}
