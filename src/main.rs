use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use encuesta_api::HttpEncuestaApi;
use encuesta_domain::{texto_opcional, Encuestado, Rol, Seccion};
use encuesta_workflow::{FormularioEncuesta, VistaEstado, WorkflowError};
use flow::stubs::InMemoryEncuestaApi;
use flow::EncuestaApi;
use log::{info, warn};

type Formulario = FormularioEncuesta<dyn EncuestaApi>;

/// Menú interactivo para trabajar encuestas contra el servidor REST o,
/// con `ENCUESTAS_DEMO=1`, contra el servidor en memoria.
///
/// Variables de entorno:
/// - `ENCUESTAS_API_URL` / `ENCUESTAS_API_TOKEN`: servidor y token.
/// - `ENCUESTAS_USUARIO` / `ENCUESTAS_CLAVE`: inicio de sesión opcional; el
///   rol sale de la sesión.
/// - `ENCUESTAS_ROL`: rol a usar sin sesión (encuestador por defecto).
/// - `RUST_LOG`: filtro de logs (`info` por defecto).
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let (api, rol) = conectar()?;
    info!("rol activo: {}", rol);
    let mut actual: Option<Formulario> = None;

    loop {
        println!("\n== Encuestas ({}) ==", rol);
        if let Some(f) = &actual {
            println!("Encuesta abierta: {} [{:?}]", f.encuesta_id(), f.vista());
        }
        println!("1) Listar encuestas");
        println!("2) Abrir encuesta");
        println!("3) Resumen de la encuesta abierta");
        println!("4) Editar un campo");
        println!("5) Marcas (fabricante / marca / tipo / presentación)");
        println!("6) Guardar");
        println!("7) Completar y transferir");
        println!("8) Observaciones");
        println!("9) Enviar revisión");
        println!("0) Salir");
        let opcion = prompt("Elige una opción: ")?;

        match opcion.trim() {
            "1" => listar(api.as_ref())?,
            "2" => {
                let id = match leer_id("Id de la encuesta: ")? {
                    Some(id) => id,
                    None => continue,
                };
                let mut f = FormularioEncuesta::abrir(api.clone(), id, rol);
                atender_puertas(&mut f)?;
                mostrar_vista(&f);
                actual = Some(f);
            }
            "0" => {
                println!("Saliendo...");
                break;
            }
            otra => {
                let Some(f) = actual.as_mut() else {
                    println!("Primero abre una encuesta (opción 2)");
                    continue;
                };
                // El mensaje anterior se cierra antes de la siguiente acción.
                if matches!(f.vista(), VistaEstado::Exito(_) | VistaEstado::Error(_)) {
                    if let Err(e) = f.descartar_mensaje() {
                        warn!("no se pudo cerrar el mensaje: {}", e);
                    }
                }
                let resultado = match otra {
                    "3" => {
                        resumen(f);
                        Ok(())
                    }
                    "4" => editar_campo(f)?,
                    "5" => marcas(f)?,
                    "6" => f.guardar().map(|g| info!("guardado: {:?}", g)),
                    "7" => f.completar(),
                    "8" => observaciones(f)?,
                    "9" => f.enviar_revision(),
                    _ => {
                        println!("Opción inválida: {}", otra);
                        continue;
                    }
                };
                if let Err(e) = resultado {
                    eprintln!("{}", e.mensaje_usuario());
                }
                mostrar_vista(f);
                if matches!(f.vista(), VistaEstado::Navegar(_)) {
                    actual = None;
                }
            }
        }
    }

    Ok(())
}

fn conectar() -> anyhow::Result<(Arc<dyn EncuestaApi>, Rol)> {
    let rol_env = std::env::var("ENCUESTAS_ROL").map(|r| Rol::from_descripcion(&r)).unwrap_or(Rol::Encuestador);
    if std::env::var("ENCUESTAS_DEMO").map(|v| v == "1").unwrap_or(false) {
        warn!("modo demo: servidor en memoria, los cambios no se conservan");
        let api: Arc<dyn EncuestaApi> = Arc::new(InMemoryEncuestaApi::con_datos_de_ejemplo()?);
        return Ok((api, rol_env));
    }
    let http = HttpEncuestaApi::from_env().context("configuración del servidor")?;
    let rol = match (std::env::var("ENCUESTAS_USUARIO"), std::env::var("ENCUESTAS_CLAVE")) {
        (Ok(usuario), Ok(clave)) => {
            let sesion = http.iniciar_sesion(&usuario, &clave).map_err(|e| anyhow!(e.mensaje_usuario()))?;
            info!("sesión iniciada como {}", sesion.username.as_deref().unwrap_or(&usuario));
            sesion.rol
        }
        _ => rol_env,
    };
    let api: Arc<dyn EncuestaApi> = Arc::new(http);
    Ok((api, rol))
}

fn listar(api: &dyn EncuestaApi) -> anyhow::Result<()> {
    match api.listar_encuestas(1, 20) {
        Ok(pagina) => {
            println!("\nID     | TIPO          | ESTADO");
            println!("----------------------------------------");
            for e in pagina.data {
                let tipo = e.tipo_encuesta.map(|t| format!("{:?}", t)).unwrap_or_else(|| "-".into());
                println!("{:<6} | {:<13} | {}", e.encuesta_id, tipo, e.estado_id);
            }
            println!("({} de {})", pagina.pagina, pagina.total_paginas);
        }
        Err(e) => eprintln!("Error listando encuestas: {}", e.mensaje_usuario()),
    }
    Ok(())
}

fn atender_puertas(f: &mut Formulario) -> anyhow::Result<()> {
    if !f.vista().en_puerta() {
        return Ok(());
    }
    let resultado = match f.vista() {
        VistaEstado::ConfirmarRevision => {
            let r = prompt("La encuesta pasará a EN REVISIÓN. ¿Continuar? (s/n): ")?;
            if r.trim().eq_ignore_ascii_case("s") { f.aceptar_revision() } else { f.cancelar_revision() }
        }
        VistaEstado::AvisoObservada => {
            println!("La encuesta tiene observaciones del validador:");
            let tipo = f.encuesta().and_then(|e| e.tipo_encuesta);
            for s in f.observaciones().secciones_visibles(tipo) {
                println!("  - {}", s);
            }
            let r = prompt("¿Pasar a corrección? (s/n): ")?;
            if r.trim().eq_ignore_ascii_case("s") { f.confirmar_observaciones() } else { f.cancelar_aviso() }
        }
        _ => Ok(()),
    };
    if let Err(e) = resultado {
        eprintln!("{}", e.mensaje_usuario());
    }
    Ok(())
}

fn mostrar_vista(f: &Formulario) {
    match f.vista() {
        VistaEstado::Exito(m) => println!("OK: {}", m),
        VistaEstado::Error(m) => eprintln!("Error: {}", m),
        VistaEstado::Navegar(_) => println!("De vuelta al listado"),
        _ => {}
    }
}

fn resumen(f: &Formulario) {
    let Some(e) = f.encuesta() else {
        println!("Sin datos de encuesta");
        return;
    };
    println!("\nEncuesta {} ({:?}) estado {}", e.encuesta_id, e.tipo_encuesta, e.estado_id);
    println!("Editable: {} | cambios sin guardar: {}", f.es_editable(), f.hay_cambios_sin_guardar());
    for s in Seccion::requeridas(e.tipo_encuesta) {
        let marca = if f.seccion_completa(*s) { "x" } else { " " };
        println!("  [{}] {}", marca, s.etiqueta_para(e.tipo_encuesta));
    }
    println!("Precio: {:?} | compra: {:?} {:?} {:?}",
             e.precio, e.tipo_compra, e.presentacion_compra, e.cantidad_presentacion_compra);
    for (i, fila) in f.filas().iter().enumerate() {
        let fabricante = fila.fila
                             .fabricante_id
                             .and_then(|id| f.catalogo().nombre_fabricante(id))
                             .unwrap_or("-");
        println!("  fila {}: {} / {} / {} / {}",
                 i,
                 fabricante,
                 fila.fila.nombre_marca.as_deref().unwrap_or("-"),
                 fila.fila.tipo_cemento.as_deref().unwrap_or("-"),
                 fila.fila.desc_fisica.as_deref().unwrap_or("-"));
    }
    let eventos: Vec<String> = f.eventos_disponibles().iter().map(|ev| ev.to_string()).collect();
    println!("Acciones disponibles: {}", if eventos.is_empty() { "-".to_string() } else { eventos.join(", ") });
    if f.acceso_observaciones().puede_ver() {
        println!("Observaciones vigentes: {} | historial: {} (ciclo {})",
                 f.observaciones().contar_activas(),
                 f.observaciones().total_historial(),
                 f.observaciones().ultimo_ciclo());
        for o in f.observaciones().activas() {
            println!("  {}: {}", o.seccion, o.observacion);
        }
    }
}

fn editar_campo(f: &mut Formulario) -> anyhow::Result<Result<(), WorkflowError>> {
    println!("a) Precio  b) Tipo de compra  c) Presentación  d) Cantidad  e) Descripción de compra");
    println!("f) Uso del cemento  g) Motivo de compra  h) Fecha de encuesta  i) Registrar encuestado");
    let campo = prompt("Campo: ")?;
    if campo.trim() == "i" {
        return Ok(registrar_encuestado(f)?);
    }
    let valor = prompt("Valor (enter para vaciar): ")?;
    let valor = valor.trim();
    Ok(match campo.trim() {
        "a" if valor.is_empty() => f.set_precio(None),
        "a" => match valor.parse::<f64>() {
            Ok(p) => f.set_precio(Some(p)),
            Err(_) => Err(WorkflowError::Validation("Precio inválido".to_string())),
        },
        "b" => f.set_tipo_compra(valor),
        "c" => f.set_presentacion_compra(valor),
        "d" => f.set_cantidad_presentacion_compra(valor),
        "e" => f.set_desc_compra(valor),
        "f" => f.set_uso_cemento(valor),
        "g" => f.set_motivo_compra(valor),
        "h" => f.set_fecha_encuesta(valor),
        otro => Err(WorkflowError::Validation(format!("Campo desconocido: {}", otro))),
    })
}

fn registrar_encuestado(f: &mut Formulario) -> io::Result<Result<(), WorkflowError>> {
    let leer = |msg: &str| prompt(msg).map(|v| texto_opcional(&v));
    let nuevo = Encuestado { nombres: leer("Nombres: ")?,
                             apepat: leer("Apellido paterno: ")?,
                             apemat: leer("Apellido materno: ")?,
                             tipodoc: leer("Tipo de documento (DNI): ")?,
                             numdoc: leer("Número de documento: ")?,
                             cargo: leer("Cargo: ")?,
                             tipo_contacto: leer("Tipo de contacto (EMAIL/TELEFONO/CELULAR/WHATSAPP): ")?,
                             contacto: leer("Contacto: ")?,
                             ..Encuestado::default() };
    Ok(f.registrar_encuestado(nuevo))
}

fn marcas(f: &mut Formulario) -> anyhow::Result<Result<(), WorkflowError>> {
    println!("a) Agregar fila  b) Fabricante  c) Marca  d) Tipo de cemento  e) Presentación  f) Desestimar fila");
    let accion = prompt("Acción: ")?;
    if accion.trim() == "a" {
        return Ok(f.agregar_fila_marca().map(|i| println!("Fila {} agregada", i)));
    }
    let Some(fila) = leer_id("Fila: ")? else {
        return Ok(Ok(()));
    };
    let fila = fila as usize;
    Ok(match accion.trim() {
        "b" => {
            for fab in f.fabricantes() {
                println!("  {}) {}", fab.fabricante_id, fab.razon_social);
            }
            match leer_id("Fabricante: ")? {
                Some(id) => f.seleccionar_fabricante(fila, Some(id)),
                None => f.seleccionar_fabricante(fila, None),
            }
        }
        "c" => {
            let opciones = f.filas().get(fila).map(|r| r.opciones.marcas.clone()).unwrap_or_default();
            for m in &opciones {
                println!("  {}) {}", m.marca_fabricante_id, m.nombre().unwrap_or("-"));
            }
            let id = leer_id("Marca: ")?;
            f.seleccionar_marca(fila, id)
        }
        "d" => {
            let opciones = f.filas().get(fila).map(|r| r.opciones.tipos_cemento.clone()).unwrap_or_default();
            println!("  {}", opciones.join(" | "));
            let tipo = prompt("Tipo: ")?;
            f.seleccionar_tipo_cemento(fila, Some(tipo.trim()))
        }
        "e" => {
            let opciones = f.filas().get(fila).map(|r| r.opciones.descripciones_fisicas.clone()).unwrap_or_default();
            println!("  {}", opciones.join(" | "));
            let desc = prompt("Presentación: ")?;
            f.seleccionar_desc_fisica(fila, Some(desc.trim()))
        }
        "f" => f.desestimar_fila_marca(fila),
        otra => Err(WorkflowError::Validation(format!("Acción desconocida: {}", otra))),
    })
}

fn observaciones(f: &mut Formulario) -> anyhow::Result<Result<(), WorkflowError>> {
    println!("Secciones: {}",
             Seccion::TODAS.iter().map(|s| s.clave()).collect::<Vec<_>>().join(", "));
    let seccion = prompt("Sección: ")?;
    let seccion = seccion.trim().to_string();
    println!("Texto actual: {}", f.texto_observacion(&seccion));
    for h in f.observaciones().historial_de(&seccion) {
        println!("  [ciclo {}] {}", h.ciclo_revision, h.observacion);
    }
    println!("a) Escribir y guardar  b) Desestimar  (enter para volver)");
    let accion = prompt("Acción: ")?;
    Ok(match accion.trim() {
        "a" => {
            let texto = prompt("Observación: ")?;
            f.actualizar_borrador(&seccion, texto.trim()).and_then(|_| f.guardar_observacion(&seccion))
        }
        "b" => f.desestimar_observacion(&seccion),
        _ => Ok(()),
    })
}

fn leer_id(msg: &str) -> io::Result<Option<i64>> {
    let s = prompt(msg)?;
    if s.trim().is_empty() {
        return Ok(None);
    }
    match s.trim().parse() {
        Ok(n) => Ok(Some(n)),
        Err(_) => {
            eprintln!("Número inválido");
            Ok(None)
        }
    }
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s)
}
