use crate::errors::WorkflowError;
use encuesta_domain::{CatalogoMarcas, Fabricante, MarcaFabricante};
use flow::repository::EncuestaApi;
use indexmap::IndexMap;
use log::debug;

/// Datos de referencia del formulario: fabricantes (una sola carga) y
/// marcas memorizadas por fabricante mientras viva el formulario.
#[derive(Debug, Clone, Default)]
pub struct CatalogoReferencias {
  fabricantes: Option<Vec<Fabricante>>,
  marcas: IndexMap<i64, Vec<MarcaFabricante>>,
}

impl CatalogoReferencias {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn fabricantes<A>(&mut self, api: &A) -> Result<&[Fabricante], WorkflowError>
    where A: EncuestaApi + ?Sized
  {
    if self.fabricantes.is_none() {
      self.fabricantes = Some(api.listar_fabricantes()?);
    }
    Ok(self.fabricantes.as_deref().unwrap_or(&[]))
  }

  /// Marcas del fabricante; sólo la primera consulta llega al servidor.
  pub fn cargar_marcas<A>(&mut self, api: &A, fabricante_id: i64) -> Result<&[MarcaFabricante], WorkflowError>
    where A: EncuestaApi + ?Sized
  {
    if !self.marcas.contains_key(&fabricante_id) {
      let marcas = api.listar_marcas(fabricante_id)?;
      debug!("fabricante {}: {} marcas en caché", fabricante_id, marcas.len());
      self.marcas.insert(fabricante_id, marcas);
    }
    Ok(self.marcas_de(fabricante_id))
  }

  pub fn fabricantes_cargados(&self) -> &[Fabricante] {
    self.fabricantes.as_deref().unwrap_or(&[])
  }

  pub fn fabricantes_en_cache(&self) -> Vec<i64> {
    self.marcas.keys().copied().collect()
  }

  pub fn nombre_fabricante(&self, fabricante_id: i64) -> Option<&str> {
    self.fabricantes_cargados().iter().find(|f| f.fabricante_id == fabricante_id).map(|f| f.razon_social.as_str())
  }
}

impl CatalogoMarcas for CatalogoReferencias {
  fn marcas_de(&self, fabricante_id: i64) -> &[MarcaFabricante] {
    self.marcas.get(&fabricante_id).map(Vec::as_slice).unwrap_or(&[])
  }
}
