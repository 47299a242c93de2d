//! Implementación HTTP bloqueante de `EncuestaApi` sobre `ureq`.
use crate::config::ApiConfig;
use encuesta_domain::{Encuesta, EncuestaObservacion, Encuestado, EstadoEncuesta, Fabricante, MarcaFabricante,
                      Obra, ObservacionHistorial, Pagina, Rol};
use flow::errors::{FlowError, Result, MENSAJE_GENERICO};
use flow::repository::{EncuestaApi, ObraRegistro};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Metodo {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// Sesión devuelta por `POST /usuarios/inicio-sesion`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sesion {
    pub token: String,
    pub username: Option<String>,
    pub rol: Rol,
    pub fecha_expiracion: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RolRespuesta {
    descripcion: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRespuesta {
    token: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    roles: Vec<RolRespuesta>,
    #[serde(default)]
    fecha_expiracion: Option<String>,
}

/// Cliente del servidor de encuestas.
///
/// No reintenta ni aplica timeouts propios: cada error se clasifica y se
/// devuelve al llamador.
pub struct HttpEncuestaApi {
    config: ApiConfig,
    agent: ureq::Agent,
    token: RwLock<Option<String>>,
}

impl HttpEncuestaApi {
    pub fn new(config: ApiConfig) -> Self {
        // Los 4xx/5xx se leen como respuesta para extraer el mensaje.
        let agent_config = ureq::Agent::config_builder().http_status_as_error(false).build();
        let token = RwLock::new(config.token.clone());
        Self { config,
               agent: ureq::Agent::new_with_config(agent_config),
               token }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ApiConfig::from_env()?))
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Inicia sesión y usa el token recibido en las llamadas siguientes. El
    /// rol es la descripción del primer rol del usuario.
    pub fn iniciar_sesion(&self, usuario: &str, clave: &str) -> Result<Sesion> {
        if usuario.trim().is_empty() || clave.is_empty() {
            return Err(FlowError::Validation("Usuario y contraseña son obligatorios".to_string()));
        }
        let cuerpo = json!({"username": usuario.trim(), "password": clave});
        let (status, texto) = self.enviar(Metodo::Post, "/usuarios/inicio-sesion", Some(&cuerpo))?;
        let respuesta: LoginRespuesta = interpretar(status, &texto)?;
        let rol = respuesta.roles.first().map(|r| Rol::from_descripcion(&r.descripcion)).unwrap_or(Rol::Otro);
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(respuesta.token.clone());
        Ok(Sesion { token: respuesta.token,
                    username: respuesta.username,
                    rol,
                    fecha_expiracion: respuesta.fecha_expiracion })
    }

    fn token_actual(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn autorizar<B>(&self, req: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        match self.token_actual() {
            Some(t) => req.header("Authorization", &format!("Bearer {}", t)),
            None => req,
        }
    }

    /// Ejecuta la petición y devuelve estado y cuerpo. Sólo las fallas de red
    /// se convierten aquí en error.
    fn enviar(&self, metodo: Metodo, ruta: &str, cuerpo: Option<&JsonValue>) -> Result<(u16, String)> {
        let url = self.config.url(ruta);
        debug!("{:?} {}", metodo, url);
        let vacio = JsonValue::Object(Default::default());
        let cuerpo = cuerpo.unwrap_or(&vacio);
        let respuesta = match metodo {
            Metodo::Get => self.autorizar(self.agent.get(&url)).call(),
            Metodo::Delete => self.autorizar(self.agent.delete(&url)).call(),
            Metodo::Post => self.autorizar(self.agent.post(&url)).send_json(cuerpo),
            Metodo::Put => self.autorizar(self.agent.put(&url)).send_json(cuerpo),
            Metodo::Patch => self.autorizar(self.agent.patch(&url)).send_json(cuerpo),
        };
        let respuesta = respuesta.map_err(|e| error_de_transporte(&url, e))?;
        let status = respuesta.status().as_u16();
        let texto = respuesta.into_body().read_to_string().map_err(|e| error_de_transporte(&url, e))?;
        if !(200..300).contains(&status) {
            warn!("{:?} {} respondió {}", metodo, url, status);
        }
        Ok((status, texto))
    }

    fn get<T: DeserializeOwned>(&self, ruta: &str) -> Result<T> {
        let (status, texto) = self.enviar(Metodo::Get, ruta, None)?;
        interpretar(status, &texto)
    }

    /// GET que trata 404 y cuerpo vacío como ausencia.
    fn get_opcional<T: DeserializeOwned>(&self, ruta: &str) -> Result<Option<T>> {
        let (status, texto) = self.enviar(Metodo::Get, ruta, None)?;
        if status == 404 || ((200..300).contains(&status) && texto.trim().is_empty()) {
            return Ok(None);
        }
        interpretar(status, &texto)
    }

    fn con_cuerpo<T: DeserializeOwned>(&self, metodo: Metodo, ruta: &str, cuerpo: &JsonValue) -> Result<T> {
        let (status, texto) = self.enviar(metodo, ruta, Some(cuerpo))?;
        interpretar(status, &texto)
    }

    fn delete(&self, ruta: &str) -> Result<()> {
        let (status, texto) = self.enviar(Metodo::Delete, ruta, None)?;
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(error_desde_respuesta(status, &texto))
        }
    }
}

impl EncuestaApi for HttpEncuestaApi {
    fn listar_encuestas(&self, pagina: i64, limite: i64) -> Result<Pagina<Encuesta>> {
        self.get(&format!("/encuestas?pagina={}&limite={}", pagina, limite))
    }

    fn obtener_encuesta(&self, encuesta_id: i64) -> Result<Encuesta> {
        self.get(&format!("/encuestas/{}", encuesta_id))
    }

    fn guardar_encuesta(&self, payload: &JsonValue) -> Result<Encuesta> {
        self.con_cuerpo(Metodo::Put, "/encuestas", payload)
    }

    fn cambiar_estado(&self, encuesta_id: i64, estado: EstadoEncuesta) -> Result<Encuesta> {
        self.con_cuerpo(Metodo::Patch,
                        &format!("/encuestas/{}/estados", encuesta_id),
                        &json!({"estadoId": estado.id()}))
    }

    fn listar_observaciones(&self, encuesta_id: i64) -> Result<Vec<EncuestaObservacion>> {
        self.get(&format!("/encuestas/{}/observaciones", encuesta_id))
    }

    fn obtener_observacion(&self, encuesta_id: i64, seccion: &str) -> Result<Option<EncuestaObservacion>> {
        self.get_opcional(&ruta_observacion(encuesta_id, seccion))
    }

    fn guardar_observacion(&self, encuesta_id: i64, seccion: &str, observacion: &str) -> Result<EncuestaObservacion> {
        self.con_cuerpo(Metodo::Post,
                        &format!("/encuestas/{}/observaciones", encuesta_id),
                        &json!({"seccion": seccion, "observacion": observacion}))
    }

    fn actualizar_observacion(&self, encuesta_id: i64, seccion: &str, observacion: &str)
                              -> Result<EncuestaObservacion> {
        self.con_cuerpo(Metodo::Put,
                        &ruta_observacion(encuesta_id, seccion),
                        &json!({"observacion": observacion}))
    }

    fn eliminar_observacion(&self, encuesta_id: i64, seccion: &str) -> Result<()> {
        self.delete(&ruta_observacion(encuesta_id, seccion))
    }

    fn listar_historial(&self, encuesta_id: i64) -> Result<Vec<ObservacionHistorial>> {
        self.get(&format!("/encuestas/{}/observaciones/historial", encuesta_id))
    }

    fn listar_historial_seccion(&self, encuesta_id: i64, seccion: &str) -> Result<Vec<ObservacionHistorial>> {
        self.get(&format!("/encuestas/{}/observaciones/historial/seccion/{}", encuesta_id, urlencoding::encode(seccion)))
    }

    fn listar_fabricantes(&self) -> Result<Vec<Fabricante>> {
        self.get("/fabricantes")
    }

    fn listar_marcas(&self, fabricante_id: i64) -> Result<Vec<MarcaFabricante>> {
        self.get(&format!("/fabricantes/{}", fabricante_id))
    }

    fn eliminar_marca_encuesta(&self, encuesta_fabricante_id: i64) -> Result<()> {
        self.delete(&format!("/marca-fabricante/{}", encuesta_fabricante_id))
    }

    fn guardar_obra(&self, obra: &ObraRegistro) -> Result<Obra> {
        let cuerpo = serde_json::to_value(obra)?;
        self.con_cuerpo(Metodo::Put, "/obras", &cuerpo)
    }

    fn obtener_obra(&self, encuesta_id: i64) -> Result<Option<Obra>> {
        self.get_opcional(&format!("/obras/encuesta/{}", encuesta_id))
    }

    fn registrar_encuestado(&self, encuestado: &Encuestado) -> Result<Encuestado> {
        let cuerpo = serde_json::to_value(encuestado)?;
        self.con_cuerpo(Metodo::Post, "/encuestados", &cuerpo)
    }
}

/// Interpreta una respuesta: 2xx se deserializa, el resto se clasifica.
pub fn interpretar<T: DeserializeOwned>(status: u16, cuerpo: &str) -> Result<T> {
    if !(200..300).contains(&status) {
        return Err(error_desde_respuesta(status, cuerpo));
    }
    serde_json::from_str(cuerpo).map_err(|e| FlowError::Serialization(format!("respuesta inválida: {}", e)))
}

/// Clasifica una respuesta de error del servidor. 404 es `NotFound`; el
/// resto es `Rejected` con el mensaje del cuerpo o uno genérico.
pub fn error_desde_respuesta(status: u16, cuerpo: &str) -> FlowError {
    let mensaje = extraer_mensaje(cuerpo);
    match status {
        404 => FlowError::NotFound(mensaje.unwrap_or_else(|| "Recurso no encontrado".to_string())),
        _ => FlowError::Rejected { status,
                                   message: mensaje.unwrap_or_else(|| MENSAJE_GENERICO.to_string()) },
    }
}

/// Mensaje del cuerpo de error: `errores[0]`, luego `message` (texto o
/// primera entrada de lista), luego `mensaje`.
pub fn extraer_mensaje(cuerpo: &str) -> Option<String> {
    let valor: JsonValue = serde_json::from_str(cuerpo).ok()?;
    let primero = |v: &JsonValue| -> Option<String> {
        match v {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Array(items) => items.first().and_then(|i| i.as_str()).map(str::to_string),
            _ => None,
        }
    };
    ["errores", "message", "mensaje"].iter()
                                      .filter_map(|k| valor.get(*k))
                                      .filter_map(primero)
                                      .map(|m| m.trim().to_string())
                                      .find(|m| !m.is_empty())
}

fn error_de_transporte(url: &str, err: ureq::Error) -> FlowError {
    warn!("sin respuesta de {}: {}", url, err);
    FlowError::Transport(err.to_string())
}

/// Ruta de la observación de una sección; la sección viaja codificada.
fn ruta_observacion(encuesta_id: i64, seccion: &str) -> String {
    format!("/encuestas/{}/observaciones/{}", encuesta_id, urlencoding::encode(seccion))
}
