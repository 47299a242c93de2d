//! Formulario de una encuesta: carga, puertas de entrada, edición,
//! guardado, observaciones y transiciones.
//!
//! El formulario es dueño de la copia local de la encuesta mientras está
//! abierto. Tras cada mutación remota se reemplaza por la respuesta del
//! servidor. Los cambios de campos se registran explícitamente en
//! `RegistroCambios`; de ahí salen la bandera de cambios sin guardar y el
//! payload mínimo de `PUT /encuestas`.
mod campos;
mod guardado;
mod observaciones;

pub use guardado::{Guardado, MENSAJE_SIN_CAMBIOS};

use crate::catalogo::CatalogoReferencias;
use crate::errors::WorkflowError;
use crate::vista::{reducir, Accion, Destino, Operacion, VistaEstado};
use encuesta_domain::{normalizar_fecha, secciones_incompletas, seccion_completa, todas_las_secciones_completas,
                      Encuesta, EstadoFormulario, Fabricante, LibroObservaciones, Obra, RegistroCambios, Rol, Seccion,
                      SelectorMarcas, SelectorRow};
use flow::lifecycle::{eventos_disponibles, Evento};
use flow::permisos::{acceso_observaciones, can_edit, requiere_aviso_observada, requiere_confirmacion_revision,
                     AccesoObservaciones};
use flow::repository::EncuestaApi;
use flow::FlowEngine;
use indexmap::IndexMap;
use log::{info, warn};
use std::sync::Arc;

pub struct FormularioEncuesta<A>
  where A: EncuestaApi + ?Sized
{
  engine: FlowEngine<A>,
  rol: Rol,
  encuesta_id: i64,
  encuesta: Option<Encuesta>,
  obra: Obra,
  selector: SelectorMarcas,
  catalogo: CatalogoReferencias,
  cambios: RegistroCambios,
  libro: LibroObservaciones,
  /// Textos de observación en edición, por clave de sección.
  borradores: IndexMap<String, String>,
  vista: VistaEstado,
}

impl<A> FormularioEncuesta<A> where A: EncuestaApi + ?Sized
{
  /// Abre la encuesta. Un validador ante una encuesta transferida queda en
  /// `ConfirmarRevision` sin más llamadas; un encuestador ante una
  /// observada queda en `AvisoObservada`. Si la carga falla la vista
  /// termina en `Error`.
  pub fn abrir(api: Arc<A>, encuesta_id: i64, rol: Rol) -> Self {
    let mut f = Self { engine: FlowEngine::new(api),
                       rol,
                       encuesta_id,
                       encuesta: None,
                       obra: Obra::default(),
                       selector: SelectorMarcas::new(),
                       catalogo: CatalogoReferencias::new(),
                       cambios: RegistroCambios::new(),
                       libro: LibroObservaciones::new(),
                       borradores: IndexMap::new(),
                       vista: VistaEstado::Cargando };
    let encuesta = match f.engine.api().obtener_encuesta(encuesta_id) {
      Ok(e) => e,
      Err(e) => {
        warn!("encuesta {}: no se pudo cargar: {}", encuesta_id, e);
        f.aplicar(Accion::Fallo("Error al cargar la encuesta".to_string()));
        return f;
      }
    };
    if requiere_confirmacion_revision(rol, encuesta.estado_id) {
      info!("encuesta {}: transferida, se pide confirmación al validador", encuesta_id);
      f.encuesta = Some(encuesta);
      f.aplicar(Accion::PedirConfirmacion);
      return f;
    }
    let aviso = requiere_aviso_observada(rol, encuesta.estado_id);
    f.procesar(encuesta);
    f.aplicar(if aviso { Accion::AvisarObservada } else { Accion::Cargada });
    f
  }

  /// El validador acepta revisar: una transición a EN_REVISION y luego la
  /// carga del detalle.
  pub fn aceptar_revision(&mut self) -> Result<(), WorkflowError> {
    self.exigir_vista(VistaEstado::ConfirmarRevision)?;
    self.operar(Operacion::AbrirRevision, |f| {
          let encuesta = f.actual()?.clone();
          let actualizada = f.engine.abrir_revision(&encuesta, f.rol)?;
          f.procesar(actualizada);
          Ok(((), Accion::Cargada))
        })
  }

  /// Cancela la revisión sin tocar el servidor.
  pub fn cancelar_revision(&mut self) -> Result<(), WorkflowError> {
    self.exigir_vista(VistaEstado::ConfirmarRevision)?;
    self.vista = reducir(&self.vista, Accion::Navegar(Destino::Listado))?;
    Ok(())
  }

  /// El encuestador toma conocimiento de las observaciones: OBSERVADA pasa
  /// a EN_CORRECCION y la encuesta vuelve a ser editable.
  pub fn confirmar_observaciones(&mut self) -> Result<(), WorkflowError> {
    self.exigir_vista(VistaEstado::AvisoObservada)?;
    self.operar(Operacion::ConfirmarObservaciones, |f| {
          let encuesta = f.actual()?.clone();
          let actualizada = f.engine.confirmar_observaciones(&encuesta, f.rol)?;
          f.encuesta = Some(actualizada);
          Ok(((), Accion::Exito("Ahora puede editar los campos observados".to_string())))
        })
  }

  pub fn cancelar_aviso(&mut self) -> Result<(), WorkflowError> {
    self.exigir_vista(VistaEstado::AvisoObservada)?;
    self.vista = reducir(&self.vista, Accion::Navegar(Destino::Listado))?;
    Ok(())
  }

  /// Completa la encuesta (EN_REGISTRO/EN_CORRECCION -> TRANSFERIDO). Con
  /// secciones incompletas o cambios sin guardar no se llama al servidor.
  pub fn completar(&mut self) -> Result<(), WorkflowError> {
    self.operar(Operacion::Completar, |f| {
          let encuesta = f.actual()?.clone();
          let pre = flow::PrecondicionesCompletar { tipo_encuesta: encuesta.tipo_encuesta,
                                                    secciones_incompletas: f.secciones_incompletas(),
                                                    cambios_sin_guardar: f.cambios.hay_cambios() };
          let actualizada = f.engine.completar(&encuesta, f.rol, &pre)?;
          f.encuesta = Some(actualizada);
          Ok(((), Accion::Exito("Encuesta completada y transferida exitosamente".to_string())))
        })
  }

  /// Vuelve a `Lista` tras un mensaje de éxito o error.
  pub fn descartar_mensaje(&mut self) -> Result<(), WorkflowError> {
    self.vista = reducir(&self.vista, Accion::Descartar)?;
    Ok(())
  }

  pub fn volver_al_listado(&mut self) -> Result<(), WorkflowError> {
    self.vista = reducir(&self.vista, Accion::Navegar(Destino::Listado))?;
    Ok(())
  }

  // ---- consultas ----

  pub fn encuesta_id(&self) -> i64 {
    self.encuesta_id
  }

  pub fn encuesta(&self) -> Option<&Encuesta> {
    self.encuesta.as_ref()
  }

  pub fn rol(&self) -> Rol {
    self.rol
  }

  pub fn vista(&self) -> &VistaEstado {
    &self.vista
  }

  pub fn obra(&self) -> &Obra {
    &self.obra
  }

  pub fn observaciones(&self) -> &LibroObservaciones {
    &self.libro
  }

  pub fn es_editable(&self) -> bool {
    self.encuesta.as_ref().map(|e| can_edit(self.rol, e.estado_id)).unwrap_or(false)
  }

  pub fn acceso_observaciones(&self) -> AccesoObservaciones {
    self.encuesta
        .as_ref()
        .map(|e| acceso_observaciones(self.rol, e.estado_id))
        .unwrap_or(AccesoObservaciones::Ninguno)
  }

  pub fn eventos_disponibles(&self) -> Vec<Evento> {
    self.encuesta.as_ref().map(|e| eventos_disponibles(e.estado_id, self.rol)).unwrap_or_default()
  }

  pub fn hay_cambios_sin_guardar(&self) -> bool {
    self.cambios.hay_cambios()
  }

  pub fn cambios(&self) -> &RegistroCambios {
    &self.cambios
  }

  pub fn seccion_completa(&self, seccion: Seccion) -> bool {
    match &self.encuesta {
      Some(e) => seccion_completa(seccion, &EstadoFormulario::new(e, self.selector.filas(), &self.obra)),
      None => false,
    }
  }

  pub fn secciones_incompletas(&self) -> Vec<Seccion> {
    match &self.encuesta {
      Some(e) => secciones_incompletas(&EstadoFormulario::new(e, self.selector.filas(), &self.obra)),
      None => Vec::new(),
    }
  }

  pub fn todas_las_secciones_completas(&self) -> bool {
    match &self.encuesta {
      Some(e) => todas_las_secciones_completas(&EstadoFormulario::new(e, self.selector.filas(), &self.obra)),
      None => false,
    }
  }

  /// Filas del selector con sus opciones recalculadas.
  pub fn filas(&self) -> Vec<SelectorRow> {
    self.selector.vistas(&self.catalogo)
  }

  pub fn fabricantes(&self) -> &[Fabricante] {
    self.catalogo.fabricantes_cargados()
  }

  pub fn catalogo(&self) -> &CatalogoReferencias {
    &self.catalogo
  }

  // ---- internos ----

  fn api(&self) -> &A {
    self.engine.api().as_ref()
  }

  fn actual(&self) -> Result<&Encuesta, WorkflowError> {
    self.encuesta.as_ref().ok_or_else(|| WorkflowError::Validation("No hay datos de encuesta".to_string()))
  }

  fn aplicar(&mut self, accion: Accion) {
    match reducir(&self.vista, accion) {
      Ok(v) => self.vista = v,
      Err(e) => warn!("encuesta {}: {}", self.encuesta_id, e),
    }
  }

  fn exigir_vista(&self, esperada: VistaEstado) -> Result<(), WorkflowError> {
    if self.vista == esperada {
      Ok(())
    } else {
      Err(WorkflowError::Validation(format!("Acción no disponible en la vista {:?}", self.vista)))
    }
  }

  /// Ejecuta una operación remota pasando por `Procesando`. Termina siempre
  /// en la acción devuelta o en `Error` con el mensaje para el usuario.
  fn operar<T, F>(&mut self, op: Operacion, f: F) -> Result<T, WorkflowError>
    where F: FnOnce(&mut Self) -> Result<(T, Accion), WorkflowError>
  {
    self.vista = reducir(&self.vista, Accion::Iniciar(op))?;
    match f(self) {
      Ok((valor, accion)) => {
        self.aplicar(accion);
        if self.vista.ocupada() {
          self.vista = VistaEstado::Lista;
        }
        Ok(valor)
      }
      Err(e) => {
        warn!("encuesta {}: {} falló: {}", self.encuesta_id, op, e);
        self.aplicar(Accion::Fallo(e.mensaje_usuario()));
        Err(e)
      }
    }
  }

  /// Toma la encuesta del servidor como nueva copia local y recarga lo que
  /// depende de ella.
  fn procesar(&mut self, mut encuesta: Encuesta) {
    if let Some(fecha) = encuesta.fecha_encuesta.as_deref().and_then(|f| normalizar_fecha(f).ok()) {
      encuesta.fecha_encuesta = Some(fecha);
    }
    self.selector = SelectorMarcas::desde_marcas(&encuesta.marcas);
    self.obra = self.cargar_obra(&encuesta);
    self.encuesta = Some(encuesta);
    self.cambios.limpiar();
    self.cargar_referencias();
    if self.acceso_observaciones().puede_ver() {
      self.recargar_observaciones();
    }
  }

  fn cargar_obra(&self, encuesta: &Encuesta) -> Obra {
    if let Some(obra) = &encuesta.obra {
      return obra.clone();
    }
    if !encuesta.es_constructora() {
      return Obra::default();
    }
    match self.api().obtener_obra(encuesta.encuesta_id) {
      Ok(obra) => obra.unwrap_or_default(),
      Err(e) => {
        warn!("encuesta {}: no se pudo cargar la obra: {}", encuesta.encuesta_id, e);
        Obra::default()
      }
    }
  }

  /// Fabricantes y marcas de las filas cargadas. Una falla deja la fila sin
  /// opciones, no bloquea el formulario.
  fn cargar_referencias(&mut self) {
    let api = self.engine.api().clone();
    if let Err(e) = self.catalogo.fabricantes(api.as_ref()) {
      warn!("encuesta {}: no se pudieron cargar los fabricantes: {}", self.encuesta_id, e);
    }
    let ids: Vec<i64> = self.selector.filas().iter().filter_map(|f| f.fabricante_id).collect();
    for id in ids {
      if let Err(e) = self.catalogo.cargar_marcas(api.as_ref(), id) {
        warn!("encuesta {}: marcas del fabricante {} no disponibles: {}", self.encuesta_id, id, e);
      }
    }
  }
}
