// catalogo.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fabricante {
  pub fabricante_id: i64,
  pub razon_social: String,
  #[serde(default)]
  pub ruc: Option<String>,
}

/// Combinación marca / tipo de cemento / descripción física ofrecida por un
/// fabricante. Un mismo `nombre_marca` aparece en varios registros.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarcaFabricante {
  pub marca_fabricante_id: i64,
  pub fabricante_id: i64,
  #[serde(default)]
  pub nombre_marca: Option<String>,
  #[serde(default)]
  pub tipo_cemento: Option<String>,
  #[serde(default)]
  pub marca: Option<String>,
  #[serde(default)]
  pub sub_marca: Option<String>,
  #[serde(default)]
  pub desc_fisica: Option<String>,
}

impl MarcaFabricante {
  /// Nombre visible de la marca; el servidor a veces sólo llena `marca`.
  pub fn nombre(&self) -> Option<&str> {
    self.nombre_marca
        .as_deref()
        .or(self.marca.as_deref())
        .map(str::trim)
        .filter(|n| !n.is_empty())
  }
}

/// Fuente de marcas por fabricante consultada por el selector.
pub trait CatalogoMarcas {
  fn marcas_de(&self, fabricante_id: i64) -> &[MarcaFabricante];
}

impl CatalogoMarcas for HashMap<i64, Vec<MarcaFabricante>> {
  fn marcas_de(&self, fabricante_id: i64) -> &[MarcaFabricante] {
    self.get(&fabricante_id).map(Vec::as_slice).unwrap_or(&[])
  }
}
