use encuesta_api::{error_desde_respuesta, extraer_mensaje, interpretar, ApiConfig};
use encuesta_domain::{Encuesta, EstadoEncuesta};
use flow::{FlowError, MENSAJE_GENERICO};
use std::collections::HashMap;

fn variables(pares: &[(&str, &str)]) -> HashMap<String, String> {
  pares.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn config_desde_variables() {
  let vars = variables(&[("ENCUESTAS_API_URL", " https://encuestas.example/api/ "), ("ENCUESTAS_API_TOKEN", "tk")]);
  let cfg = ApiConfig::desde_variables(|k| vars.get(k).cloned()).expect("config");
  assert_eq!(cfg.base_url, "https://encuestas.example/api");
  assert_eq!(cfg.token.as_deref(), Some("tk"));
  assert_eq!(cfg.url("/encuestas/4"), "https://encuestas.example/api/encuestas/4");

  let alternativa = variables(&[("API_URL", "http://localhost:8080"), ("ENCUESTAS_API_TOKEN", "  ")]);
  let cfg = ApiConfig::desde_variables(|k| alternativa.get(k).cloned()).expect("config");
  assert_eq!(cfg.base_url, "http://localhost:8080");
  assert!(cfg.token.is_none());
}

#[test]
fn config_invalida() {
  let vacias = variables(&[]);
  assert!(matches!(ApiConfig::desde_variables(|k| vacias.get(k).cloned()), Err(FlowError::Config(_))));
  assert!(matches!(ApiConfig::new("ftp://x", None), Err(FlowError::Config(_))));
  assert!(matches!(ApiConfig::new("   ", None), Err(FlowError::Config(_))));
}

#[test]
fn mensaje_del_cuerpo_de_error() {
  assert_eq!(extraer_mensaje(r#"{"errores": ["La encuesta ya fue transferida"]}"#),
             Some("La encuesta ya fue transferida".to_string()));
  assert_eq!(extraer_mensaje(r#"{"message": ["precio must be positive", "otro"]}"#),
             Some("precio must be positive".to_string()));
  assert_eq!(extraer_mensaje(r#"{"message": "Unauthorized"}"#), Some("Unauthorized".to_string()));
  assert_eq!(extraer_mensaje(r#"{"errores": [], "mensaje": "Sin permiso"}"#), Some("Sin permiso".to_string()));
  assert_eq!(extraer_mensaje("<html>bad gateway</html>"), None);
  assert_eq!(extraer_mensaje(""), None);
}

#[test]
fn clasificacion_de_estados() {
  let err = error_desde_respuesta(422, r#"{"errores": ["Fecha inválida"]}"#);
  assert_eq!(err, FlowError::Rejected { status: 422, message: "Fecha inválida".into() });
  assert!(!err.es_local());
  assert_eq!(err.mensaje_usuario(), "Fecha inválida");

  let err = error_desde_respuesta(500, "");
  assert_eq!(err.mensaje_usuario(), MENSAJE_GENERICO);
  assert!(matches!(error_desde_respuesta(404, "{}"), FlowError::NotFound(_)));
}

#[test]
fn interpreta_respuestas_exitosas() {
  let cuerpo = r#"{"encuestaId": 12, "estadoId": 2, "tipoEncuesta": "INDUSTRIA", "marcas": [], "estados": []}"#;
  let encuesta: Encuesta = interpretar(200, cuerpo).expect("encuesta");
  assert_eq!(encuesta.encuesta_id, 12);
  assert_eq!(encuesta.estado_id, EstadoEncuesta::EnRevision);

  let invalida: Result<Encuesta, _> = interpretar(200, "no es json");
  assert!(matches!(invalida, Err(FlowError::Serialization(_))));
  let rechazada: Result<Encuesta, _> = interpretar(409, r#"{"mensaje": "Estado inválido"}"#);
  assert!(matches!(rechazada, Err(FlowError::Rejected { status: 409, .. })));
}
