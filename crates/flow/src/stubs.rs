// Archivo: stubs.rs
// Propósito: implementación en memoria de `EncuestaApi` para pruebas y para
// el modo demo del CLI.
//
// Se comporta como el servidor que el cliente asume: valida transiciones
// con la misma tabla, numera los ciclos de revisión, archiva observaciones
// en el historial y devuelve siempre la encuesta resultante. No es durable.
use crate::errors::{FlowError, Result};
use crate::lifecycle::es_arista_valida;
use crate::permisos::can_edit;
use crate::repository::{EncuestaApi, ObraRegistro};
use chrono::Utc;
use encuesta_domain::{Direccion, DomainStubs, Encuesta, EncuestaObservacion, Encuestado, EstadoEncuesta,
                      Fabricante, HistorialEstado, MarcaFabricante, Obra, ObservacionHistorial, Pagina, Rol};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Servidor {
    encuestas: BTreeMap<i64, Encuesta>,
    ciclos: HashMap<i64, i64>,
    observaciones: BTreeMap<(i64, String), EncuestaObservacion>,
    historial: Vec<ObservacionHistorial>,
    fabricantes: Vec<Fabricante>,
    marcas: HashMap<i64, Vec<MarcaFabricante>>,
    encuestados: BTreeMap<i64, Encuestado>,
    secuencia: i64,
}

impl Servidor {
    fn siguiente_id(&mut self) -> i64 {
        self.secuencia += 1;
        self.secuencia
    }

    fn encuesta_mut(&mut self, encuesta_id: i64) -> Result<&mut Encuesta> {
        self.encuestas
            .get_mut(&encuesta_id)
            .ok_or_else(|| FlowError::NotFound(format!("encuesta {}", encuesta_id)))
    }

    fn marca(&self, marca_fabricante_id: i64) -> Option<MarcaFabricante> {
        self.marcas.values().flatten().find(|m| m.marca_fabricante_id == marca_fabricante_id).cloned()
    }

    /// Copia las observaciones vigentes con texto al historial, etiquetadas
    /// con el ciclo actual.
    fn archivar_observaciones(&mut self, encuesta_id: i64) {
        let ciclo = self.ciclos.get(&encuesta_id).copied().unwrap_or(0);
        let vigentes: Vec<EncuestaObservacion> = self.observaciones
                                                     .values()
                                                     .filter(|o| o.encuesta_id == encuesta_id && o.esta_activa())
                                                     .cloned()
                                                     .collect();
        for o in vigentes {
            let id = self.siguiente_id();
            self.historial.push(ObservacionHistorial { encuesta_observacion_historial_id: Some(id),
                                                       encuesta_id,
                                                       seccion: o.seccion,
                                                       observacion: o.observacion,
                                                       ciclo_revision: ciclo,
                                                       fecha_creacion: Some(Utc::now().to_rfc3339()),
                                                       usuario_creacion: Some("validador".to_string()) });
        }
    }
}

/// Servidor de encuestas en memoria.
#[derive(Debug)]
pub struct InMemoryEncuestaApi {
    servidor: Mutex<Servidor>,
    llamadas: Mutex<Vec<String>>,
    fallo: Mutex<Option<(Option<String>, FlowError)>>,
}

impl Default for InMemoryEncuestaApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEncuestaApi {
    /// Crea un servidor vacío con el catálogo de ejemplo de fabricantes.
    pub fn new() -> Self {
        let servidor = Servidor { fabricantes: DomainStubs::fabricantes(),
                                  marcas: DomainStubs::catalogo_marcas(),
                                  secuencia: 1000,
                                  ..Servidor::default() };
        Self { servidor: Mutex::new(servidor),
               llamadas: Mutex::new(Vec::new()),
               fallo: Mutex::new(None) }
    }

    /// Servidor con dos encuestas en registro (1: INDUSTRIA, 2: CONSTRUCTORA).
    pub fn con_datos_de_ejemplo() -> Result<Self> {
        let api = Self::new();
        api.insertar_encuesta(DomainStubs::encuesta_industria_completa(1))?;
        api.insertar_encuesta(DomainStubs::encuesta_constructora_completa(2))?;
        Ok(api)
    }

    fn lock<'a, T>(&'a self, m: &'a Mutex<T>) -> std::result::Result<MutexGuard<'a, T>, FlowError> {
        m.lock().map_err(|e| FlowError::Storage(format!("mutex poisoned: {:?}", e)))
    }

    /// Inserta o reemplaza una encuesta tal cual (sin validar estado).
    pub fn insertar_encuesta(&self, encuesta: Encuesta) -> Result<()> {
        let mut s = self.lock(&self.servidor)?;
        if matches!(encuesta.estado_id, EstadoEncuesta::EnRevision | EstadoEncuesta::Observada | EstadoEncuesta::EnCorreccion)
        {
            s.ciclos.entry(encuesta.encuesta_id).or_insert(1);
        }
        s.encuestas.insert(encuesta.encuesta_id, encuesta);
        Ok(())
    }

    /// Estado actual de una encuesta, sin registrar llamada.
    pub fn encuesta(&self, encuesta_id: i64) -> Result<Encuesta> {
        let s = self.lock(&self.servidor)?;
        s.encuestas.get(&encuesta_id).cloned().ok_or_else(|| FlowError::NotFound(format!("encuesta {}", encuesta_id)))
    }

    pub fn encuestado(&self, encuestado_id: i64) -> Result<Encuestado> {
        let s = self.lock(&self.servidor)?;
        s.encuestados
         .get(&encuestado_id)
         .cloned()
         .ok_or_else(|| FlowError::NotFound(format!("encuestado {}", encuestado_id)))
    }

    pub fn ciclo_revision(&self, encuesta_id: i64) -> Result<i64> {
        Ok(self.lock(&self.servidor)?.ciclos.get(&encuesta_id).copied().unwrap_or(0))
    }

    /// Llamadas recibidas, en orden, como "MÉTODO ruta".
    pub fn llamadas(&self) -> Vec<String> {
        self.llamadas.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn limpiar_llamadas(&self) {
        self.llamadas.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// La próxima llamada (cualquiera) devolverá `error`.
    pub fn fallar_proxima(&self, error: FlowError) {
        *self.fallo.lock().unwrap_or_else(|e| e.into_inner()) = Some((None, error));
    }

    /// La próxima llamada que empiece con `prefijo` (p. ej. "PUT /obras")
    /// devolverá `error`.
    pub fn fallar_llamada(&self, prefijo: &str, error: FlowError) {
        *self.fallo.lock().unwrap_or_else(|e| e.into_inner()) = Some((Some(prefijo.to_string()), error));
    }

    fn registrar(&self, llamada: String) -> Result<()> {
        log::debug!("in-memory api: {}", llamada);
        let mut fallo = self.lock(&self.fallo)?;
        let aplica = match fallo.as_ref() {
            Some((Some(prefijo), _)) => llamada.starts_with(prefijo.as_str()),
            Some((None, _)) => true,
            None => false,
        };
        self.lock(&self.llamadas)?.push(llamada);
        match fallo.take() {
            Some((_, err)) if aplica => Err(err),
            pendiente => {
                *fallo = pendiente;
                Ok(())
            }
        }
    }
}

/// Tope de `limite` por página que acepta el servidor.
const LIMITE_MAXIMO: i64 = 100;

fn rechazo(status: u16, message: &str) -> FlowError {
    FlowError::Rejected { status,
                          message: message.to_string() }
}

impl EncuestaApi for InMemoryEncuestaApi {
    fn listar_encuestas(&self, pagina: i64, limite: i64) -> Result<Pagina<Encuesta>> {
        self.registrar(format!("GET /encuestas?pagina={}&limite={}", pagina, limite))?;
        if pagina < 1 || !(1..=LIMITE_MAXIMO).contains(&limite) {
            return Err(rechazo(400, "Parámetros de paginación inválidos"));
        }
        let desde = (pagina - 1).checked_mul(limite)
                                .and_then(|d| usize::try_from(d).ok())
                                .ok_or_else(|| rechazo(400, "Página fuera de rango"))?;
        let s = self.lock(&self.servidor)?;
        let total = s.encuestas.len() as i64;
        let data: Vec<Encuesta> = s.encuestas.values().skip(desde).take(limite as usize).cloned().collect();
        Ok(Pagina { data,
                    total,
                    pagina,
                    limite,
                    total_paginas: total.saturating_add(limite - 1) / limite })
    }

    fn obtener_encuesta(&self, encuesta_id: i64) -> Result<Encuesta> {
        self.registrar(format!("GET /encuestas/{}", encuesta_id))?;
        self.encuesta(encuesta_id)
    }

    fn guardar_encuesta(&self, payload: &JsonValue) -> Result<Encuesta> {
        self.registrar("PUT /encuestas".to_string())?;
        let encuesta_id = payload.get("encuestaId")
                                 .and_then(JsonValue::as_i64)
                                 .ok_or_else(|| rechazo(400, "encuestaId es obligatorio"))?;
        let mut s = self.lock(&self.servidor)?;
        let actual = s.encuesta_mut(encuesta_id)?.clone();
        if !can_edit(Rol::Encuestador, actual.estado_id) {
            return Err(rechazo(409, "La encuesta no se puede modificar en su estado actual"));
        }
        let mut valor = serde_json::to_value(&actual)?;
        if let (Some(destino), Some(origen)) = (valor.as_object_mut(), payload.as_object()) {
            for (k, v) in origen {
                if k != "encuestaId" && k != "estadoId" {
                    destino.insert(k.clone(), v.clone());
                }
            }
        }
        let mut nueva: Encuesta = serde_json::from_value(valor).map_err(|e| rechazo(400, &e.to_string()))?;
        if payload.get("marcas").is_some() {
            for i in 0..nueva.marcas.len() {
                if nueva.marcas[i].encuesta_fabricante_id.is_none() {
                    nueva.marcas[i].encuesta_fabricante_id = Some(s.siguiente_id());
                }
                if let Some(id) = nueva.marcas[i].marca_fabricante_id {
                    nueva.marcas[i].marca_fabricante = s.marca(id);
                }
            }
        }
        s.encuestas.insert(encuesta_id, nueva.clone());
        Ok(nueva)
    }

    fn cambiar_estado(&self, encuesta_id: i64, estado: EstadoEncuesta) -> Result<Encuesta> {
        self.registrar(format!("PATCH /encuestas/{}/estados {}", encuesta_id, estado.id()))?;
        let mut s = self.lock(&self.servidor)?;
        let desde = s.encuesta_mut(encuesta_id)?.estado_id;
        if !es_arista_valida(desde, estado) {
            return Err(rechazo(409, &format!("No se puede pasar de '{}' a '{}'", desde, estado)));
        }
        match estado {
            EstadoEncuesta::EnRevision => {
                *s.ciclos.entry(encuesta_id).or_insert(0) += 1;
            }
            EstadoEncuesta::Observada | EstadoEncuesta::Aprobado => s.archivar_observaciones(encuesta_id),
            _ => {}
        }
        let historial_id = s.siguiente_id();
        let encuesta = s.encuesta_mut(encuesta_id)?;
        encuesta.estado_id = estado;
        encuesta.estados.push(HistorialEstado { encuesta_estado_id: historial_id,
                                                estado_id: estado,
                                                estado_descripcion: Some(estado.nombre().to_string()),
                                                fecha_creacion: Some(Utc::now().to_rfc3339()),
                                                usuario_creacion: None });
        Ok(encuesta.clone())
    }

    fn listar_observaciones(&self, encuesta_id: i64) -> Result<Vec<EncuestaObservacion>> {
        self.registrar(format!("GET /encuestas/{}/observaciones", encuesta_id))?;
        let s = self.lock(&self.servidor)?;
        Ok(s.observaciones.values().filter(|o| o.encuesta_id == encuesta_id).cloned().collect())
    }

    fn obtener_observacion(&self, encuesta_id: i64, seccion: &str) -> Result<Option<EncuestaObservacion>> {
        self.registrar(format!("GET /encuestas/{}/observaciones/{}", encuesta_id, seccion))?;
        let s = self.lock(&self.servidor)?;
        Ok(s.observaciones.get(&(encuesta_id, seccion.to_string())).cloned())
    }

    fn guardar_observacion(&self, encuesta_id: i64, seccion: &str, observacion: &str) -> Result<EncuestaObservacion> {
        self.registrar(format!("POST /encuestas/{}/observaciones {}", encuesta_id, seccion))?;
        let mut s = self.lock(&self.servidor)?;
        if s.encuesta_mut(encuesta_id)?.estado_id != EstadoEncuesta::EnRevision {
            return Err(rechazo(409, "Solo se pueden registrar observaciones durante la revisión"));
        }
        let ahora = Utc::now().to_rfc3339();
        let clave = (encuesta_id, seccion.to_string());
        let id = match s.observaciones.get(&clave).and_then(|o| o.encuesta_observacion_id) {
            Some(id) => id,
            None => s.siguiente_id(),
        };
        let creada = s.observaciones.get(&clave).and_then(|o| o.fecha_creacion.clone()).unwrap_or(ahora.clone());
        let obs = EncuestaObservacion { encuesta_observacion_id: Some(id),
                                        encuesta_id,
                                        seccion: seccion.to_string(),
                                        observacion: observacion.to_string(),
                                        fecha_creacion: Some(creada),
                                        fecha_modificacion: Some(ahora) };
        s.observaciones.insert(clave, obs.clone());
        Ok(obs)
    }

    fn actualizar_observacion(&self, encuesta_id: i64, seccion: &str, observacion: &str)
                              -> Result<EncuestaObservacion> {
        self.registrar(format!("PUT /encuestas/{}/observaciones/{}", encuesta_id, seccion))?;
        let mut s = self.lock(&self.servidor)?;
        let obs = s.observaciones
                   .get_mut(&(encuesta_id, seccion.to_string()))
                   .ok_or_else(|| FlowError::NotFound(format!("observación {} de la encuesta {}", seccion, encuesta_id)))?;
        obs.observacion = observacion.to_string();
        obs.fecha_modificacion = Some(Utc::now().to_rfc3339());
        Ok(obs.clone())
    }

    fn eliminar_observacion(&self, encuesta_id: i64, seccion: &str) -> Result<()> {
        self.registrar(format!("DELETE /encuestas/{}/observaciones/{}", encuesta_id, seccion))?;
        let mut s = self.lock(&self.servidor)?;
        s.observaciones
         .remove(&(encuesta_id, seccion.to_string()))
         .map(|_| ())
         .ok_or_else(|| FlowError::NotFound(format!("observación {} de la encuesta {}", seccion, encuesta_id)))
    }

    fn listar_historial(&self, encuesta_id: i64) -> Result<Vec<ObservacionHistorial>> {
        self.registrar(format!("GET /encuestas/{}/observaciones/historial", encuesta_id))?;
        let s = self.lock(&self.servidor)?;
        Ok(s.historial.iter().filter(|h| h.encuesta_id == encuesta_id).cloned().collect())
    }

    fn listar_historial_seccion(&self, encuesta_id: i64, seccion: &str) -> Result<Vec<ObservacionHistorial>> {
        self.registrar(format!("GET /encuestas/{}/observaciones/historial/seccion/{}", encuesta_id, seccion))?;
        let s = self.lock(&self.servidor)?;
        Ok(s.historial.iter().filter(|h| h.encuesta_id == encuesta_id && h.seccion == seccion).cloned().collect())
    }

    fn listar_fabricantes(&self) -> Result<Vec<Fabricante>> {
        self.registrar("GET /fabricantes".to_string())?;
        Ok(self.lock(&self.servidor)?.fabricantes.clone())
    }

    fn listar_marcas(&self, fabricante_id: i64) -> Result<Vec<MarcaFabricante>> {
        self.registrar(format!("GET /fabricantes/{}", fabricante_id))?;
        let s = self.lock(&self.servidor)?;
        if !s.fabricantes.iter().any(|f| f.fabricante_id == fabricante_id) {
            return Err(FlowError::NotFound(format!("fabricante {}", fabricante_id)));
        }
        Ok(s.marcas.get(&fabricante_id).cloned().unwrap_or_default())
    }

    fn eliminar_marca_encuesta(&self, encuesta_fabricante_id: i64) -> Result<()> {
        self.registrar(format!("DELETE /marca-fabricante/{}", encuesta_fabricante_id))?;
        let mut s = self.lock(&self.servidor)?;
        for encuesta in s.encuestas.values_mut() {
            let antes = encuesta.marcas.len();
            encuesta.marcas.retain(|m| m.encuesta_fabricante_id != Some(encuesta_fabricante_id));
            if encuesta.marcas.len() != antes {
                return Ok(());
            }
        }
        Err(FlowError::NotFound(format!("marca de encuesta {}", encuesta_fabricante_id)))
    }

    fn guardar_obra(&self, obra: &ObraRegistro) -> Result<Obra> {
        self.registrar("PUT /obras".to_string())?;
        let mut s = self.lock(&self.servidor)?;
        let estado = s.encuesta_mut(obra.encuesta_id)?.estado_id;
        if !can_edit(Rol::Encuestador, estado) {
            return Err(rechazo(409, "La encuesta no se puede modificar en su estado actual"));
        }
        let existente = s.encuesta_mut(obra.encuesta_id)?.obra.as_ref().and_then(|o| o.obra_encuesta_id);
        let id = match existente {
            Some(id) => id,
            None => s.siguiente_id(),
        };
        let guardada = Obra { obra_encuesta_id: Some(id),
                              etapa_obra: Some(obra.etapa_obra.clone()),
                              fecha_finalizacion_obra: Some(obra.fecha_finalizacion_obra.clone()),
                              mixer: obra.mixer.clone(),
                              metraje: obra.metraje.clone(),
                              resistencia: obra.resistencia.clone(),
                              direccion: Direccion { direc: None,
                                                     cod_pais: Some(obra.cod_pais.clone()),
                                                     cod_departamento: Some(obra.cod_departamento.clone()),
                                                     cod_provincia: Some(obra.cod_provincia.clone()),
                                                     cod_distrito: Some(obra.cod_distrito.clone()),
                                                     tipo_via: obra.tipo_via.clone(),
                                                     nombre_via: obra.nombre_via.clone(),
                                                     numero_via: obra.numero_via.clone(),
                                                     referencia: obra.referencia.clone() } };
        s.encuesta_mut(obra.encuesta_id)?.obra = Some(guardada.clone());
        Ok(guardada)
    }

    fn obtener_obra(&self, encuesta_id: i64) -> Result<Option<Obra>> {
        self.registrar(format!("GET /obras/encuesta/{}", encuesta_id))?;
        let mut s = self.lock(&self.servidor)?;
        Ok(s.encuesta_mut(encuesta_id)?.obra.clone())
    }

    fn registrar_encuestado(&self, encuestado: &Encuestado) -> Result<Encuestado> {
        self.registrar("POST /encuestados".to_string())?;
        let presente = |v: &Option<String>| v.as_deref().map(str::trim).is_some_and(|t| !t.is_empty());
        if !presente(&encuestado.nombres) || !presente(&encuestado.apepat) || !presente(&encuestado.cargo) {
            return Err(rechazo(400, "Nombres, apellido paterno y cargo son obligatorios"));
        }
        let mut s = self.lock(&self.servidor)?;
        let id = s.siguiente_id();
        let creado = Encuestado { encuestado_id: Some(id),
                                  ..encuestado.clone() };
        s.encuestados.insert(id, creado.clone());
        Ok(creado)
    }
}
