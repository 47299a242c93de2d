// encuesta.rs
use crate::{DomainError, EstadoEncuesta};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Precio máximo aceptado por la columna `precio` del servidor.
pub const PRECIO_MAXIMO: f64 = 99_999_999.99;

/// Código de país por defecto para la dirección de la obra (Perú).
pub const COD_PAIS_POR_DEFECTO: &str = "428";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoEncuesta {
  Industria,
  Constructora,
}

impl fmt::Display for TipoEncuesta {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      TipoEncuesta::Industria => "INDUSTRIA",
      TipoEncuesta::Constructora => "CONSTRUCTORA",
    };
    write!(f, "{}", s)
  }
}

pub const TIPO_COMPRA_BOLSAS: &str = "BOLSAS";
pub const TIPO_COMPRA_GRANEL: &str = "GRANEL";

/// Producto principal declarado en la sección "Productos".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipoProducto {
  ConcretoPremezclado,
  ArticulosConcreto,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Encuestado {
  pub encuestado_id: Option<i64>,
  pub nombres: Option<String>,
  pub apepat: Option<String>,
  pub apemat: Option<String>,
  pub numdoc: Option<String>,
  pub tipodoc: Option<String>,
  pub cargo: Option<String>,
  pub tipo_contacto: Option<String>,
  pub contacto: Option<String>,
}

impl Encuestado {
  pub fn nombre_completo(&self) -> String {
    [&self.nombres, &self.apepat, &self.apemat].iter()
                                                .filter_map(|p| p.as_deref())
                                                .filter(|p| !p.trim().is_empty())
                                                .collect::<Vec<_>>()
                                                .join(" ")
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Empresa {
  pub empresa_id: i64,
  pub razon_social: String,
  pub ruc: String,
  pub tipo_empresa_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Direccion {
  pub direc: Option<String>,
  pub cod_pais: Option<String>,
  pub cod_departamento: Option<String>,
  pub cod_provincia: Option<String>,
  pub cod_distrito: Option<String>,
  pub tipo_via: Option<String>,
  pub nombre_via: Option<String>,
  pub numero_via: Option<String>,
  pub referencia: Option<String>,
}

impl Direccion {
  /// País, departamento, provincia y distrito son obligatorios para
  /// registrar la obra.
  pub fn ubigeo_completo(&self) -> bool {
    [&self.cod_pais, &self.cod_departamento, &self.cod_provincia, &self.cod_distrito].iter()
                                                                                   .all(|c| presente(c))
  }
}

impl Default for Obra {
  fn default() -> Self {
    Self { obra_encuesta_id: None,
           etapa_obra: None,
           fecha_finalizacion_obra: None,
           mixer: None,
           metraje: None,
           resistencia: None,
           direccion: Direccion { cod_pais: Some(COD_PAIS_POR_DEFECTO.to_string()),
                                  ..Direccion::default() } }
  }
}

/// Datos de la obra asociada a una encuesta CONSTRUCTORA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Obra {
  pub obra_encuesta_id: Option<i64>,
  pub etapa_obra: Option<String>,
  pub fecha_finalizacion_obra: Option<String>,
  pub mixer: Option<String>,
  pub metraje: Option<String>,
  pub resistencia: Option<String>,
  pub direccion: Direccion,
}

impl Obra {
  pub fn tiene_datos(&self) -> bool {
    presente(&self.etapa_obra) && presente(&self.fecha_finalizacion_obra)
  }
}

/// Marca registrada para una encuesta (fila persistida del selector).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncuestaMarca {
  pub encuesta_fabricante_id: Option<i64>,
  pub fabricante_id: Option<i64>,
  pub marca_fabricante_id: Option<i64>,
  pub marca_fabricante: Option<crate::MarcaFabricante>,
}

/// Entrada del historial de estados de una encuesta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorialEstado {
  pub encuesta_estado_id: i64,
  pub estado_id: EstadoEncuesta,
  #[serde(default)]
  pub estado_descripcion: Option<String>,
  #[serde(default)]
  pub fecha_creacion: Option<String>,
  #[serde(default)]
  pub usuario_creacion: Option<String>,
}

/// Raíz del agregado. Los campos opcionales reflejan lo que el servidor
/// puede omitir mientras la encuesta está en registro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encuesta {
  pub encuesta_id: i64,
  pub estado_id: EstadoEncuesta,
  #[serde(default)]
  pub tipo_encuesta: Option<TipoEncuesta>,
  #[serde(default)]
  pub fecha_encuesta: Option<String>,
  #[serde(default)]
  pub empresa_id: Option<i64>,
  #[serde(default)]
  pub empresa: Option<Empresa>,
  #[serde(default)]
  pub encuestado_id: Option<i64>,
  #[serde(default)]
  pub encuestado: Option<Encuestado>,
  #[serde(default)]
  pub concreto_premezclado: Option<i64>,
  #[serde(default)]
  pub articulos_concreto: Option<i64>,
  #[serde(default)]
  pub tipo_lugar_compra: Option<String>,
  #[serde(default)]
  pub tipo_compra: Option<String>,
  #[serde(default)]
  pub presentacion_compra: Option<String>,
  #[serde(default)]
  pub cantidad_presentacion_compra: Option<String>,
  #[serde(default)]
  pub desc_compra: Option<String>,
  #[serde(default)]
  pub precio: Option<f64>,
  #[serde(default)]
  pub con_igv: Option<i64>,
  #[serde(default)]
  pub uso_cemento: Option<String>,
  #[serde(default)]
  pub motivo_compra: Option<String>,
  #[serde(default)]
  pub deseo_regalo: Option<i64>,
  #[serde(default)]
  pub audio_url: Option<String>,
  #[serde(default)]
  pub comentario_cuantitativo: Option<String>,
  #[serde(default)]
  pub marcas: Vec<EncuestaMarca>,
  #[serde(default)]
  pub obra: Option<Obra>,
  #[serde(default)]
  pub estados: Vec<HistorialEstado>,
}

impl Encuesta {
  /// Encuesta vacía en registro, útil para stubs y pruebas.
  pub fn nueva(encuesta_id: i64, tipo: TipoEncuesta) -> Self {
    Self { encuesta_id,
           estado_id: EstadoEncuesta::EnRegistro,
           tipo_encuesta: Some(tipo),
           fecha_encuesta: None,
           empresa_id: None,
           empresa: None,
           encuestado_id: None,
           encuestado: None,
           concreto_premezclado: None,
           articulos_concreto: None,
           tipo_lugar_compra: None,
           tipo_compra: None,
           presentacion_compra: None,
           cantidad_presentacion_compra: None,
           desc_compra: None,
           precio: None,
           con_igv: None,
           uso_cemento: None,
           motivo_compra: None,
           deseo_regalo: None,
           audio_url: None,
           comentario_cuantitativo: None,
           marcas: Vec::new(),
           obra: None,
           estados: Vec::new() }
  }

  pub fn es_constructora(&self) -> bool {
    self.tipo_encuesta == Some(TipoEncuesta::Constructora)
  }

  /// Historial de estados ordenado del más reciente al más antiguo.
  pub fn historial_estados_ordenado(&self) -> Vec<HistorialEstado> {
    let mut estados = self.estados.clone();
    estados.sort_by(|a, b| b.encuesta_estado_id.cmp(&a.encuesta_estado_id));
    estados
  }

  pub fn estado_actual_historial(&self) -> Option<HistorialEstado> {
    self.historial_estados_ordenado().into_iter().next()
  }
}

/// Página de resultados de `GET /encuestas`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagina<T> {
  pub data: Vec<T>,
  pub total: i64,
  pub pagina: i64,
  pub limite: i64,
  pub total_paginas: i64,
}

pub(crate) fn presente(valor: &Option<String>) -> bool {
  valor.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Recorta el texto y devuelve `None` si queda vacío.
pub fn texto_opcional(valor: &str) -> Option<String> {
  let t = valor.trim();
  if t.is_empty() {
    None
  } else {
    Some(t.to_string())
  }
}

/// Normaliza una fecha (`YYYY-MM-DD` o timestamp ISO) a `YYYY-MM-DD`.
pub fn normalizar_fecha(valor: &str) -> Result<String, DomainError> {
  let v = valor.trim();
  if let Ok(d) = NaiveDate::parse_from_str(v, "%Y-%m-%d") {
    return Ok(d.format("%Y-%m-%d").to_string());
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
    return Ok(dt.date_naive().format("%Y-%m-%d").to_string());
  }
  if let Ok(dt) = NaiveDateTime::parse_from_str(v, "%Y-%m-%dT%H:%M:%S%.f") {
    return Ok(dt.date().format("%Y-%m-%d").to_string());
  }
  Err(DomainError::ValidationError(format!("Fecha inválida: {}", valor)))
}

/// Valida y normaliza la fecha de la encuesta: no puede ser posterior a hoy.
pub fn validar_fecha_encuesta(valor: &str) -> Result<String, DomainError> {
  let normalizada = normalizar_fecha(valor)?;
  let fecha = NaiveDate::parse_from_str(&normalizada, "%Y-%m-%d").map_err(|e| {
                                                                   DomainError::ValidationError(format!("Fecha inválida: {}", e))
                                                                 })?;
  if fecha > Local::now().date_naive() {
    return Err(DomainError::ValidationError("La fecha de la encuesta no puede ser futura".to_string()));
  }
  Ok(normalizada)
}

pub fn validar_precio(precio: f64) -> Result<f64, DomainError> {
  if !precio.is_finite() || precio < 0.0 {
    return Err(DomainError::ValidationError("El precio no puede ser negativo".to_string()));
  }
  if precio > PRECIO_MAXIMO {
    return Err(DomainError::ValidationError(format!("El precio no puede superar {:.2}", PRECIO_MAXIMO)));
  }
  Ok(precio)
}

/// RUC peruano: exactamente 11 dígitos.
pub fn validar_ruc(ruc: &str) -> Result<(), DomainError> {
  let r = ruc.trim();
  if r.len() != 11 || !r.chars().all(|c| c.is_ascii_digit()) {
    return Err(DomainError::ValidationError("El RUC debe tener 11 dígitos numéricos".to_string()));
  }
  Ok(())
}

pub fn validar_dni(dni: &str) -> Result<(), DomainError> {
  let d = dni.trim();
  if d.len() != 8 || !d.chars().all(|c| c.is_ascii_digit()) {
    return Err(DomainError::ValidationError("El DNI debe tener 8 dígitos numéricos".to_string()));
  }
  Ok(())
}

/// Valida el contacto del encuestado según su tipo.
pub fn validar_contacto(tipo_contacto: &str, contacto: &str) -> Result<(), DomainError> {
  let c = contacto.trim();
  match tipo_contacto.trim().to_uppercase().as_str() {
    "EMAIL" => {
      if c.len() > 100 {
        return Err(DomainError::ValidationError("El correo no puede superar 100 caracteres".to_string()));
      }
      if !email_valido(c) {
        return Err(DomainError::ValidationError("Formato de correo inválido".to_string()));
      }
      Ok(())
    }
    "TELEFONO" | "CELULAR" | "WHATSAPP" => {
      if c.len() != 9 || !c.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(DomainError::ValidationError("El número debe tener 9 dígitos".to_string()));
      }
      Ok(())
    }
    otro => Err(DomainError::ValidationError(format!("Tipo de contacto desconocido: {}", otro))),
  }
}

/// Valida los datos mínimos de un encuestado nuevo.
pub fn validar_encuestado_nuevo(e: &Encuestado) -> Result<(), DomainError> {
  if !presente(&e.nombres) || !presente(&e.apepat) || !presente(&e.cargo) {
    return Err(DomainError::ValidationError("Nombres, apellido paterno y cargo son obligatorios".to_string()));
  }
  if let Some(numdoc) = e.numdoc.as_deref().filter(|n| !n.trim().is_empty()) {
    if e.tipodoc.as_deref().map(|t| t.eq_ignore_ascii_case("DNI")).unwrap_or(true) {
      validar_dni(numdoc)?;
    }
  }
  if let (Some(tipo), Some(contacto)) = (e.tipo_contacto.as_deref(), e.contacto.as_deref()) {
    if !contacto.trim().is_empty() {
      validar_contacto(tipo, contacto)?;
    }
  }
  Ok(())
}

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("regex de correo"));

fn email_valido(email: &str) -> bool {
  EMAIL.is_match(email)
}
