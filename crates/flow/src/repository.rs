// Archivo: repository.rs
// Propósito: definir el trait `EncuestaApi`, el contrato con el servidor
// REST que es dueño del flujo de encuestas. Lo implementan el cliente HTTP
// y la versión en memoria usada en pruebas.
use crate::errors::Result;
use encuesta_domain::{Encuesta, EncuestaObservacion, Encuestado, EstadoEncuesta, Fabricante, MarcaFabricante,
                      Obra, ObservacionHistorial, Pagina};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Tipo de referencia con el que el servidor asocia la dirección.
pub const TIPO_REFERENCIA_OBRA: &str = "OBRA";

/// Cuerpo de `PUT /obras`: datos de la obra más su dirección.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObraRegistro {
    pub encuesta_id: i64,
    pub etapa_obra: String,
    pub fecha_finalizacion_obra: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mixer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metraje: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resistencia: Option<String>,
    pub cod_pais: String,
    pub cod_departamento: String,
    pub cod_provincia: String,
    pub cod_distrito: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo_via: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre_via: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero_via: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referencia: Option<String>,
    pub tipo_referencia: String,
}

impl ObraRegistro {
    /// Arma el registro si la obra tiene etapa, fecha y ubigeo completos.
    pub fn desde_obra(encuesta_id: i64, obra: &Obra) -> Option<ObraRegistro> {
        if !obra.tiene_datos() || !obra.direccion.ubigeo_completo() {
            return None;
        }
        let d = &obra.direccion;
        let limpio = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        Some(ObraRegistro { encuesta_id,
                            etapa_obra: limpio(&obra.etapa_obra)?,
                            fecha_finalizacion_obra: limpio(&obra.fecha_finalizacion_obra)?,
                            mixer: limpio(&obra.mixer),
                            metraje: limpio(&obra.metraje),
                            resistencia: limpio(&obra.resistencia),
                            cod_pais: limpio(&d.cod_pais)?,
                            cod_departamento: limpio(&d.cod_departamento)?,
                            cod_provincia: limpio(&d.cod_provincia)?,
                            cod_distrito: limpio(&d.cod_distrito)?,
                            tipo_via: limpio(&d.tipo_via),
                            nombre_via: limpio(&d.nombre_via),
                            numero_via: limpio(&d.numero_via),
                            referencia: limpio(&d.referencia),
                            tipo_referencia: TIPO_REFERENCIA_OBRA.to_string() })
    }
}

/// Contrato con el servidor de encuestas.
///
/// Todas las operaciones son bloqueantes y sin reintentos: un error se
/// devuelve tal cual y el llamador decide. Los errores remotos llegan como
/// `FlowError::Rejected`/`NotFound` y los de red como `FlowError::Transport`.
pub trait EncuestaApi: Send + Sync {
    /// `GET /encuestas?pagina&limite`
    fn listar_encuestas(&self, pagina: i64, limite: i64) -> Result<Pagina<Encuesta>>;

    /// `GET /encuestas/:id`
    fn obtener_encuesta(&self, encuesta_id: i64) -> Result<Encuesta>;

    /// `PUT /encuestas` con el payload mínimo de campos cambiados. Devuelve
    /// la encuesta tal como quedó en el servidor.
    fn guardar_encuesta(&self, payload: &JsonValue) -> Result<Encuesta>;

    /// `PATCH /encuestas/:id/estados`
    fn cambiar_estado(&self, encuesta_id: i64, estado: EstadoEncuesta) -> Result<Encuesta>;

    /// `GET /encuestas/:id/observaciones`
    fn listar_observaciones(&self, encuesta_id: i64) -> Result<Vec<EncuestaObservacion>>;

    /// `GET /encuestas/:id/observaciones/:seccion`
    fn obtener_observacion(&self, encuesta_id: i64, seccion: &str) -> Result<Option<EncuestaObservacion>>;

    /// `POST /encuestas/:id/observaciones`: crea o reemplaza el texto
    /// vigente de la sección. Texto vacío equivale a desestimar.
    fn guardar_observacion(&self, encuesta_id: i64, seccion: &str, observacion: &str) -> Result<EncuestaObservacion>;

    /// `PUT /encuestas/:id/observaciones/:seccion`
    fn actualizar_observacion(&self, encuesta_id: i64, seccion: &str, observacion: &str)
                              -> Result<EncuestaObservacion>;

    /// `DELETE /encuestas/:id/observaciones/:seccion`. No toca el historial.
    fn eliminar_observacion(&self, encuesta_id: i64, seccion: &str) -> Result<()>;

    /// `GET /encuestas/:id/observaciones/historial`
    fn listar_historial(&self, encuesta_id: i64) -> Result<Vec<ObservacionHistorial>>;

    /// `GET /encuestas/:id/observaciones/historial/seccion/:seccion`
    fn listar_historial_seccion(&self, encuesta_id: i64, seccion: &str) -> Result<Vec<ObservacionHistorial>>;

    /// `GET /fabricantes`
    fn listar_fabricantes(&self) -> Result<Vec<Fabricante>>;

    /// `GET /fabricantes/:id`: marcas del fabricante.
    fn listar_marcas(&self, fabricante_id: i64) -> Result<Vec<MarcaFabricante>>;

    /// `DELETE /marca-fabricante/:id`: quita una fila persistida de la
    /// encuesta.
    fn eliminar_marca_encuesta(&self, encuesta_fabricante_id: i64) -> Result<()>;

    /// `PUT /obras`
    fn guardar_obra(&self, obra: &ObraRegistro) -> Result<Obra>;

    /// `GET /obras/encuesta/:id`
    fn obtener_obra(&self, encuesta_id: i64) -> Result<Option<Obra>>;

    /// `POST /encuestados`: devuelve el encuestado con su id asignado.
    fn registrar_encuestado(&self, encuestado: &Encuestado) -> Result<Encuestado>;
}
