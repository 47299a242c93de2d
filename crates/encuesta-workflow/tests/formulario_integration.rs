use encuesta_domain::{DomainError, DomainStubs, Encuestado, EstadoEncuesta, Rol, Seccion, TipoEncuesta};
use encuesta_workflow::{Destino, FormularioEncuesta, Guardado, VistaEstado, WorkflowError, MENSAJE_SIN_CAMBIOS};
use flow::stubs::InMemoryEncuestaApi;
use flow::{AccesoObservaciones, FlowError, MENSAJE_SIN_CONEXION};
use std::sync::Arc;

fn api() -> Arc<InMemoryEncuestaApi> {
  Arc::new(InMemoryEncuestaApi::con_datos_de_ejemplo().expect("api"))
}

fn con_estado(api: &InMemoryEncuestaApi, id: i64, estado: EstadoEncuesta) {
  let mut e = api.encuesta(id).expect("encuesta");
  e.estado_id = estado;
  api.insertar_encuesta(e).expect("insertar");
}

fn cambios_de_estado(api: &InMemoryEncuestaApi) -> Vec<String> {
  api.llamadas().into_iter().filter(|l| l.starts_with("PATCH")).collect()
}

#[test]
fn completar_industria_transfiere_y_bloquea_la_edicion() {
  let api = api();
  let mut f = FormularioEncuesta::abrir(api.clone(), 1, Rol::Encuestador);
  assert_eq!(f.vista(), &VistaEstado::Lista);
  assert!(f.es_editable());
  assert!(f.todas_las_secciones_completas());

  api.limpiar_llamadas();
  f.completar().expect("completar");
  assert_eq!(api.llamadas(), vec!["PATCH /encuestas/1/estados 3".to_string()]);
  assert_eq!(f.encuesta().map(|e| e.estado_id), Some(EstadoEncuesta::Transferido));
  assert!(matches!(f.vista(), VistaEstado::Exito(_)));
  assert!(!f.es_editable());
  assert!(matches!(f.set_precio(Some(10.0)), Err(WorkflowError::SoloLectura(_))));
}

#[test]
fn completar_con_secciones_incompletas_no_llama_al_servidor() {
  let api = api();
  let mut e = DomainStubs::encuesta_industria_completa(6);
  e.cantidad_presentacion_compra = None;
  api.insertar_encuesta(e).expect("insertar");
  let mut f = FormularioEncuesta::abrir(api.clone(), 6, Rol::Encuestador);
  assert!(!f.seccion_completa(Seccion::Compra));
  assert_eq!(f.secciones_incompletas(), vec![Seccion::Compra]);
  assert!(!f.hay_cambios_sin_guardar());

  api.limpiar_llamadas();
  let err = f.completar().err();
  assert!(matches!(err, Some(WorkflowError::Flow(FlowError::Validation(_)))));
  assert!(api.llamadas().is_empty());
  match f.vista() {
    VistaEstado::Error(m) => assert!(m.contains("Información de Compra"), "{}", m),
    otra => panic!("vista inesperada: {:?}", otra),
  }
  assert_eq!(f.encuesta().map(|e| e.estado_id), Some(EstadoEncuesta::EnRegistro));
}

#[test]
fn cambios_sin_guardar_bloquean_completar_hasta_guardar() {
  let api = api();
  let mut f = FormularioEncuesta::abrir(api.clone(), 1, Rol::Encuestador);
  api.limpiar_llamadas();

  assert_eq!(f.guardar().expect("sin cambios"), Guardado::SinCambios);
  assert_eq!(f.vista(), &VistaEstado::Exito(MENSAJE_SIN_CAMBIOS.to_string()));
  assert!(api.llamadas().is_empty());

  f.set_precio(Some(31.5)).expect("precio");
  assert!(f.hay_cambios_sin_guardar());
  assert!(f.completar().is_err());
  assert!(cambios_de_estado(&api).is_empty());

  assert_eq!(f.guardar().expect("guardar"), Guardado::Completo);
  assert_eq!(api.llamadas(), vec!["PUT /encuestas".to_string()]);
  assert!(!f.hay_cambios_sin_guardar());
  assert_eq!(api.encuesta(1).expect("encuesta").precio, Some(31.5));

  f.completar().expect("completar");
  assert_eq!(cambios_de_estado(&api), vec!["PATCH /encuestas/1/estados 3".to_string()]);
}

#[test]
fn precio_fuera_de_rango_no_modifica_nada() {
  let api = api();
  let mut f = FormularioEncuesta::abrir(api, 1, Rol::Encuestador);
  assert!(matches!(f.set_precio(Some(-1.0)), Err(WorkflowError::Domain(DomainError::ValidationError(_)))));
  assert!(f.set_precio(Some(100_000_000.0)).is_err());
  assert_eq!(f.encuesta().and_then(|e| e.precio), Some(28.5));
  assert!(!f.hay_cambios_sin_guardar());
  f.set_precio(Some(99_999_999.99)).expect("límite");
}

#[test]
fn tipo_compra_y_presentacion_limpian_dependientes() {
  let api = api();
  let mut f = FormularioEncuesta::abrir(api, 1, Rol::Encuestador);
  f.set_tipo_compra("bolsas").expect("mismo tipo");
  assert!(!f.hay_cambios_sin_guardar());

  f.set_tipo_compra("GRANEL").expect("granel");
  let e = f.encuesta().expect("encuesta");
  assert!(e.presentacion_compra.is_none() && e.cantidad_presentacion_compra.is_none());
  f.set_presentacion_compra("BIG_BAG").expect("presentación");
  assert!(!f.seccion_completa(Seccion::Compra));
  f.set_cantidad_presentacion_compra(" 12 ").expect("cantidad");
  assert!(f.seccion_completa(Seccion::Compra));
  f.set_presentacion_compra("CISTERNA").expect("otra presentación");
  assert!(f.encuesta().and_then(|e| e.cantidad_presentacion_compra.clone()).is_none());
}

#[test]
fn validador_acepta_la_revision_con_una_sola_transicion() {
  let api = api();
  con_estado(&api, 1, EstadoEncuesta::Transferido);
  api.limpiar_llamadas();

  let mut f = FormularioEncuesta::abrir(api.clone(), 1, Rol::Validador);
  assert_eq!(f.vista(), &VistaEstado::ConfirmarRevision);
  assert_eq!(api.llamadas(), vec!["GET /encuestas/1".to_string()]);

  api.limpiar_llamadas();
  f.aceptar_revision().expect("aceptar");
  let llamadas = api.llamadas();
  assert_eq!(llamadas.first().map(String::as_str), Some("PATCH /encuestas/1/estados 2"));
  assert_eq!(cambios_de_estado(&api).len(), 1);
  assert_eq!(f.vista(), &VistaEstado::Lista);
  assert_eq!(f.encuesta().map(|e| e.estado_id), Some(EstadoEncuesta::EnRevision));
  assert_eq!(f.acceso_observaciones(), AccesoObservaciones::Edicion);
  assert!(!f.es_editable());
}

#[test]
fn validador_cancela_la_revision_sin_llamadas() {
  let api = api();
  con_estado(&api, 1, EstadoEncuesta::Transferido);
  let mut f = FormularioEncuesta::abrir(api.clone(), 1, Rol::Validador);

  api.limpiar_llamadas();
  f.cancelar_revision().expect("cancelar");
  assert!(api.llamadas().is_empty());
  assert_eq!(f.vista(), &VistaEstado::Navegar(Destino::Listado));
  assert_eq!(api.encuesta(1).expect("encuesta").estado_id, EstadoEncuesta::Transferido);
}

#[test]
fn envio_de_revision_segun_observaciones_vigentes() {
  let api = api();
  con_estado(&api, 1, EstadoEncuesta::Transferido);
  con_estado(&api, 2, EstadoEncuesta::Transferido);

  let mut f1 = FormularioEncuesta::abrir(api.clone(), 1, Rol::Validador);
  f1.aceptar_revision().expect("revisión 1");
  f1.actualizar_borrador("compra", "El precio no coincide").expect("borrador");
  assert_eq!(f1.borradores_pendientes(), vec!["compra".to_string()]);

  api.limpiar_llamadas();
  assert!(matches!(f1.enviar_revision(), Err(WorkflowError::Validation(_))));
  assert!(api.llamadas().is_empty());

  f1.guardar_observacion("compra").expect("guardar observación");
  assert_eq!(api.llamadas(),
             vec!["POST /encuestas/1/observaciones compra".to_string(),
                  "GET /encuestas/1/observaciones".to_string(),
                  "GET /encuestas/1/observaciones/historial".to_string()]);
  assert_eq!(f1.observaciones().contar_activas(), 1);

  api.limpiar_llamadas();
  f1.enviar_revision().expect("enviar 1");
  assert_eq!(api.llamadas(), vec!["PATCH /encuestas/1/estados 6".to_string()]);
  assert_eq!(f1.encuesta().map(|e| e.estado_id), Some(EstadoEncuesta::Observada));

  let mut f2 = FormularioEncuesta::abrir(api.clone(), 2, Rol::Validador);
  f2.aceptar_revision().expect("revisión 2");
  api.limpiar_llamadas();
  f2.enviar_revision().expect("enviar 2");
  assert_eq!(api.llamadas(), vec!["PATCH /encuestas/2/estados 5".to_string()]);
  assert_eq!(f2.vista(), &VistaEstado::Exito("Encuesta aprobada correctamente".to_string()));
}

#[test]
fn ciclo_de_correccion_conserva_el_historial() {
  let api = api();
  let mut totales = Vec::new();

  let mut enc = FormularioEncuesta::abrir(api.clone(), 1, Rol::Encuestador);
  enc.completar().expect("completar");

  let mut val = FormularioEncuesta::abrir(api.clone(), 1, Rol::Validador);
  val.aceptar_revision().expect("revisión 1");
  val.actualizar_borrador("uso", "Falta detallar el uso").expect("borrador");
  val.guardar_observacion("uso").expect("observación");
  totales.push(val.observaciones().total_historial());
  val.enviar_revision().expect("observar");

  let mut enc = FormularioEncuesta::abrir(api.clone(), 1, Rol::Encuestador);
  assert_eq!(enc.vista(), &VistaEstado::AvisoObservada);
  assert_eq!(enc.acceso_observaciones(), AccesoObservaciones::Lectura);
  assert!(matches!(enc.actualizar_borrador("uso", "x"), Err(WorkflowError::SoloLectura(_))));
  totales.push(enc.observaciones().total_historial());
  assert_eq!(enc.observaciones().ultimo_ciclo(), 1);
  assert_eq!(enc.observaciones().secciones_visibles(Some(TipoEncuesta::Industria)),
             vec![Seccion::Uso.etiqueta().to_string()]);

  enc.confirmar_observaciones().expect("confirmar");
  assert_eq!(enc.encuesta().map(|e| e.estado_id), Some(EstadoEncuesta::EnCorreccion));
  assert!(enc.es_editable());
  enc.set_uso_cemento("Losas, columnas y vigas").expect("corregir");
  enc.guardar().expect("guardar");
  enc.completar().expect("completar de nuevo");

  let mut val = FormularioEncuesta::abrir(api.clone(), 1, Rol::Validador);
  val.aceptar_revision().expect("revisión 2");
  assert_eq!(api.ciclo_revision(1).expect("ciclo"), 2);
  totales.push(val.observaciones().total_historial());
  val.desestimar_observacion("uso").expect("desestimar");
  assert_eq!(val.observaciones().contar_activas(), 0);
  totales.push(val.observaciones().total_historial());
  val.enviar_revision().expect("aprobar");
  assert_eq!(val.encuesta().map(|e| e.estado_id), Some(EstadoEncuesta::Aprobado));

  let admin = FormularioEncuesta::abrir(api.clone(), 1, Rol::Administrador);
  totales.push(admin.observaciones().total_historial());
  assert_eq!(admin.acceso_observaciones(), AccesoObservaciones::Lectura);
  assert_eq!(admin.observaciones().historial_de("uso").len(), 1);
  assert!(totales.windows(2).all(|w| w[0] <= w[1]), "{:?}", totales);
  assert!(admin.eventos_disponibles().is_empty());
}

#[test]
fn encuestador_puede_salir_del_aviso_sin_cambiar_el_estado() {
  let api = api();
  con_estado(&api, 1, EstadoEncuesta::Observada);
  let mut f = FormularioEncuesta::abrir(api.clone(), 1, Rol::Encuestador);
  assert_eq!(f.vista(), &VistaEstado::AvisoObservada);
  api.limpiar_llamadas();
  f.cancelar_aviso().expect("cancelar");
  assert!(api.llamadas().is_empty());
  assert_eq!(f.vista(), &VistaEstado::Navegar(Destino::Listado));
}

#[test]
fn rechazo_remoto_deja_el_estado_local_intacto() {
  let api = api();
  let mut f = FormularioEncuesta::abrir(api.clone(), 1, Rol::Encuestador);
  api.fallar_proxima(FlowError::Rejected { status: 422, message: "Encuesta bloqueada".into() });
  assert!(f.completar().is_err());
  assert_eq!(f.vista(), &VistaEstado::Error("Encuesta bloqueada".to_string()));
  assert_eq!(f.encuesta().map(|e| e.estado_id), Some(EstadoEncuesta::EnRegistro));
  assert!(f.es_editable());

  f.descartar_mensaje().expect("descartar");
  f.set_desc_compra("Compra quincenal").expect("editar");
  api.fallar_proxima(FlowError::Transport("connection refused".into()));
  assert!(f.guardar().is_err());
  assert_eq!(f.vista(), &VistaEstado::Error(MENSAJE_SIN_CONEXION.to_string()));
  assert!(f.hay_cambios_sin_guardar());
  assert_eq!(api.encuesta(1).expect("encuesta").desc_compra, Some("Compra mensual".to_string()));
}

#[test]
fn encuesta_inexistente_termina_en_error() {
  let f = FormularioEncuesta::abrir(api(), 99, Rol::Encuestador);
  assert_eq!(f.vista(), &VistaEstado::Error("Error al cargar la encuesta".to_string()));
  assert!(f.encuesta().is_none());
  assert!(!f.todas_las_secciones_completas());
}

#[test]
fn administrador_y_validador_nunca_editan() {
  let api = api();
  for rol in [Rol::Administrador, Rol::Validador] {
    let mut f = FormularioEncuesta::abrir(api.clone(), 1, rol);
    assert!(!f.es_editable());
    assert!(matches!(f.set_uso_cemento("x"), Err(WorkflowError::SoloLectura(_))));
    assert!(matches!(f.agregar_fila_marca(), Err(WorkflowError::SoloLectura(_))));
    assert_eq!(f.acceso_observaciones(), AccesoObservaciones::Ninguno);
  }
}

#[test]
fn selector_en_el_formulario_memoriza_y_evita_duplicados() {
  let api = api();
  let mut f = FormularioEncuesta::abrir(api.clone(), 2, Rol::Encuestador);
  assert_eq!(f.fabricantes().len(), 3);
  assert_eq!(f.catalogo().fabricantes_en_cache(), vec![2]);

  api.limpiar_llamadas();
  let fila = f.agregar_fila_marca().expect("fila");
  f.seleccionar_fabricante(fila, Some(2)).expect("fabricante");
  assert!(api.llamadas().is_empty());

  let err = f.seleccionar_marca(fila, Some(202)).err();
  assert!(matches!(err, Some(WorkflowError::Domain(DomainError::SeleccionNoDisponible(_)))));
  f.seleccionar_marca(fila, Some(203)).expect("Mochica");
  f.seleccionar_tipo_cemento(fila, Some("Tipo ICo")).expect("tipo");
  let filas = f.filas();
  assert_eq!(filas[fila].fila.desc_fisica.as_deref(), Some("Bolsa 42.5 kg"));
  assert!(filas[fila].fila.completa());

  let otra = f.agregar_fila_marca().expect("otra fila");
  f.seleccionar_fabricante(otra, Some(1)).expect("fabricante 1");
  f.eliminar_fila_marca(otra).expect("quitar");
  let otra = f.agregar_fila_marca().expect("otra fila");
  f.seleccionar_fabricante(otra, Some(1)).expect("fabricante 1 de nuevo");
  assert_eq!(api.llamadas(), vec!["GET /fabricantes/1".to_string()]);
  assert!(f.hay_cambios_sin_guardar());
}

#[test]
fn desestimar_marca_persistida_la_borra_en_el_servidor() {
  let api = api();
  let mut f = FormularioEncuesta::abrir(api.clone(), 2, Rol::Encuestador);
  let fila = f.agregar_fila_marca().expect("fila");
  f.seleccionar_fabricante(fila, Some(3)).expect("fabricante");
  f.seleccionar_marca(fila, Some(301)).expect("Sol");

  api.limpiar_llamadas();
  f.desestimar_fila_marca(0).expect("desestimar");
  assert_eq!(api.llamadas(), vec!["DELETE /marca-fabricante/8001".to_string()]);
  assert_eq!(f.filas().len(), 1);
  assert_eq!(f.filas()[0].fila.fabricante_id, Some(3));
  assert!(api.encuesta(2).expect("encuesta").marcas.is_empty());

  // Una fila nueva sin registrar sólo se quita localmente.
  api.limpiar_llamadas();
  f.desestimar_fila_marca(0).expect("desestimar local");
  assert!(api.llamadas().is_empty());
  assert!(f.filas()[0].fila.esta_vacia());
}

#[test]
fn guardar_obra_de_constructora() {
  let api = api();
  let mut f = FormularioEncuesta::abrir(api.clone(), 2, Rol::Encuestador);
  assert!(f.todas_las_secciones_completas());

  f.editar_obra(|o| o.etapa_obra = Some("ACABADOS".into())).expect("obra");
  api.limpiar_llamadas();
  assert_eq!(f.guardar().expect("guardar"), Guardado::Completo);
  assert_eq!(api.llamadas(), vec!["PUT /obras".to_string()]);
  assert_eq!(f.vista(), &VistaEstado::Exito("Encuesta y datos de la obra guardados exitosamente".to_string()));
  assert_eq!(api.encuesta(2).expect("encuesta").obra.and_then(|o| o.etapa_obra), Some("ACABADOS".to_string()));
  assert!(!f.hay_cambios_sin_guardar());

  f.descartar_mensaje().expect("descartar");
  f.editar_obra(|o| o.direccion.cod_distrito = None).expect("sin distrito");
  api.limpiar_llamadas();
  assert!(matches!(f.guardar(), Err(WorkflowError::Validation(_))));
  assert!(api.llamadas().is_empty());
}

#[test]
fn falla_de_obra_es_un_guardado_parcial() {
  let api = api();
  let mut f = FormularioEncuesta::abrir(api.clone(), 2, Rol::Encuestador);
  f.set_desc_compra("Entrega quincenal").expect("desc");
  f.editar_obra(|o| o.metraje = Some("1500".into())).expect("obra");
  api.fallar_llamada("PUT /obras", FlowError::Rejected { status: 500, message: String::new() });

  match f.guardar().expect("guardar") {
    Guardado::Parcial(m) => assert!(m.starts_with("Encuesta guardada")),
    otro => panic!("se esperaba guardado parcial: {:?}", otro),
  }
  assert_eq!(api.encuesta(2).expect("encuesta").desc_compra, Some("Entrega quincenal".to_string()));
  assert!(f.hay_cambios_sin_guardar());
  assert!(!f.cambios().hay_cambios_de_encuesta());
  assert_eq!(f.obra().metraje.as_deref(), Some("1500"));
}

#[test]
fn industria_sin_empresa_no_se_guarda() {
  let api = api();
  let mut e = DomainStubs::encuesta_industria_completa(5);
  e.empresa_id = None;
  e.empresa = None;
  api.insertar_encuesta(e).expect("insertar");
  let mut f = FormularioEncuesta::abrir(api.clone(), 5, Rol::Encuestador);
  assert!(!f.seccion_completa(Seccion::Empresa));
  f.set_motivo_compra("Disponibilidad").expect("motivo");
  api.limpiar_llamadas();
  assert!(matches!(f.guardar(), Err(WorkflowError::Validation(_))));
  assert!(api.llamadas().is_empty());
  assert!(matches!(f.editar_obra(|o| o.mixer = Some("2".into())), Err(WorkflowError::Validation(_))));
  assert_eq!(api.encuesta(5).expect("encuesta").motivo_compra, Some("Precio".to_string()));
}

#[test]
fn fila_parcial_no_se_persiste_como_completa() {
  let api = api();
  let mut f = FormularioEncuesta::abrir(api.clone(), 1, Rol::Encuestador);
  let fila = f.agregar_fila_marca().expect("fila");
  f.seleccionar_fabricante(fila, Some(2)).expect("fabricante");
  f.seleccionar_marca(fila, Some(201)).expect("Pacasmayo");
  assert_eq!(f.guardar().expect("guardar"), Guardado::Completo);

  // El servidor sólo recibe la fila completa
  let marcas = api.encuesta(1).expect("encuesta").marcas;
  assert_eq!(marcas.len(), 1);
  assert!(marcas.iter().all(|m| m.fabricante_id != Some(2)));

  // La fila parcial sigue en el formulario, sin tipo ni descripción
  let filas = f.filas();
  assert_eq!(filas.len(), 2);
  assert_eq!(filas[1].fila.nombre_marca.as_deref(), Some("Pacasmayo"));
  assert!(filas[1].fila.tipo_cemento.is_none() && filas[1].fila.desc_fisica.is_none());
  assert!(!filas[1].fila.completa());
  assert!(f.hay_cambios_sin_guardar());

  let recargado = FormularioEncuesta::abrir(api.clone(), 1, Rol::Encuestador);
  let filas = recargado.filas();
  assert_eq!(filas.len(), 1);
  assert!(filas[0].fila.completa());
  assert_eq!(filas[0].fila.marca_fabricante_id, Some(103));
  let completas: Vec<_> = filas.iter().filter(|r| r.fila.completa()).collect();
  for (i, a) in completas.iter().enumerate() {
    for b in &completas[i + 1..] {
      assert_ne!(a.fila.desc_fisica, b.fila.desc_fisica);
    }
  }
}

#[test]
fn obra_sin_etapa_no_se_reporta_como_guardada() {
  let api = api();
  let mut f = FormularioEncuesta::abrir(api.clone(), 2, Rol::Encuestador);
  f.editar_obra(|o| {
     o.etapa_obra = None;
     o.mixer = Some("3".into());
   })
   .expect("obra");
  api.limpiar_llamadas();
  assert!(matches!(f.guardar(), Err(WorkflowError::Validation(_))));
  assert!(api.llamadas().is_empty());
  assert!(f.hay_cambios_sin_guardar());
  assert!(matches!(f.vista(), VistaEstado::Error(_)));
}

#[test]
fn registrar_encuestado_valida_y_lo_asigna() {
  let api = api();
  let mut f = FormularioEncuesta::abrir(api.clone(), 1, Rol::Encuestador);
  let mut nuevo = Encuestado { nombres: Some("Rosa".into()),
                               apepat: Some("Huamán".into()),
                               tipo_contacto: Some("EMAIL".into()),
                               contacto: Some("rosa@correo".into()),
                               ..Encuestado::default() };
  api.limpiar_llamadas();
  assert!(matches!(f.registrar_encuestado(nuevo.clone()), Err(WorkflowError::Domain(_))));
  nuevo.cargo = Some("Jefa de compras".into());
  assert!(matches!(f.registrar_encuestado(nuevo.clone()), Err(WorkflowError::Domain(_))));
  assert!(api.llamadas().is_empty());

  nuevo.contacto = Some("rosa@correo.pe".into());
  f.registrar_encuestado(nuevo).expect("registrar");
  assert_eq!(api.llamadas(), vec!["POST /encuestados".to_string()]);
  let id = f.encuesta().and_then(|e| e.encuestado_id).expect("id asignado");
  assert_eq!(api.encuestado(id).expect("registrado").nombres.as_deref(), Some("Rosa"));
  assert_eq!(f.vista(), &VistaEstado::Exito("Encuestado Rosa Huamán registrado y asignado correctamente".to_string()));
  assert!(f.hay_cambios_sin_guardar());

  f.descartar_mensaje().expect("descartar");
  f.guardar().expect("guardar");
  assert_eq!(api.encuesta(1).expect("encuesta").encuestado_id, Some(id));
}
