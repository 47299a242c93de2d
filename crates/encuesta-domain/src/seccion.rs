// seccion.rs
use crate::TipoEncuesta;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Secciones lógicas del formulario. La clave es la que usan los endpoints
/// de observaciones (`/encuestas/:id/observaciones/:seccion`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seccion {
  #[serde(rename = "datos_encuesta")]
  DatosGenerales,
  DatosObra,
  Empresa,
  Encuestado,
  Productos,
  Fabricante,
  Compra,
  Uso,
  Marca,
  Ubicacion,
}

const SECCIONES_INDUSTRIA: [Seccion; 7] = [Seccion::DatosGenerales,
                                           Seccion::Empresa,
                                           Seccion::Encuestado,
                                           Seccion::Productos,
                                           Seccion::Fabricante,
                                           Seccion::Compra,
                                           Seccion::Uso];

const SECCIONES_CONSTRUCTORA: [Seccion; 5] =
  [Seccion::DatosGenerales, Seccion::DatosObra, Seccion::Encuestado, Seccion::Fabricante, Seccion::Compra];

impl Seccion {
  pub const TODAS: [Seccion; 10] = [Seccion::DatosGenerales,
                                    Seccion::DatosObra,
                                    Seccion::Empresa,
                                    Seccion::Encuestado,
                                    Seccion::Productos,
                                    Seccion::Fabricante,
                                    Seccion::Compra,
                                    Seccion::Uso,
                                    Seccion::Marca,
                                    Seccion::Ubicacion];

  pub fn clave(&self) -> &'static str {
    match self {
      Seccion::DatosGenerales => "datos_encuesta",
      Seccion::DatosObra => "datos_obra",
      Seccion::Empresa => "empresa",
      Seccion::Encuestado => "encuestado",
      Seccion::Productos => "productos",
      Seccion::Fabricante => "fabricante",
      Seccion::Compra => "compra",
      Seccion::Uso => "uso",
      Seccion::Marca => "marca",
      Seccion::Ubicacion => "ubicacion",
    }
  }

  pub fn etiqueta(&self) -> &'static str {
    match self {
      Seccion::DatosGenerales => "Datos Generales",
      Seccion::DatosObra => "Datos de la Obra",
      Seccion::Empresa => "Empresa",
      Seccion::Encuestado => "Datos del Encuestado",
      Seccion::Productos => "Productos",
      Seccion::Fabricante => "Fabricante, Marca y Tipo de Cemento comprado",
      Seccion::Compra => "Información de Compra",
      Seccion::Uso => "Comentario Cualitativo",
      Seccion::Marca => "Marca/Cemento",
      Seccion::Ubicacion => "Ubicación",
    }
  }

  /// Etiqueta según el formulario: en encuestas de obras la empresa es la
  /// constructora.
  pub fn etiqueta_para(&self, tipo: Option<TipoEncuesta>) -> &'static str {
    match (self, tipo) {
      (Seccion::Empresa, Some(TipoEncuesta::Constructora)) => "Datos de la Constructora",
      _ => self.etiqueta(),
    }
  }

  /// Etiqueta de una clave recibida del servidor; las desconocidas se
  /// muestran tal cual.
  pub fn etiqueta_de_clave(clave: &str, tipo: Option<TipoEncuesta>) -> String {
    match clave.parse::<Seccion>() {
      Ok(s) => s.etiqueta_para(tipo).to_string(),
      Err(_) => clave.to_string(),
    }
  }

  /// Secciones que deben estar completas para transferir la encuesta.
  /// Sin tipo no hay secciones evaluables más allá de datos generales.
  pub fn requeridas(tipo: Option<TipoEncuesta>) -> &'static [Seccion] {
    match tipo {
      Some(TipoEncuesta::Industria) => &SECCIONES_INDUSTRIA,
      Some(TipoEncuesta::Constructora) => &SECCIONES_CONSTRUCTORA,
      None => &SECCIONES_INDUSTRIA[..1],
    }
  }
}

impl FromStr for Seccion {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    Seccion::TODAS.iter()
                  .copied()
                  .find(|sec| sec.clave() == s)
                  .ok_or_else(|| format!("sección desconocida: {}", s))
  }
}

impl fmt::Display for Seccion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.clave())
  }
}
