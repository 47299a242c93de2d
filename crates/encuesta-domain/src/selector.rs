// selector.rs
//
// Selector en cascada fabricante -> marca -> tipo de cemento -> descripción
// física. Las opciones de cada fila se derivan siempre de la lista completa
// de filas: nada de lo que se ofrece se guarda.
use crate::catalogo::{CatalogoMarcas, MarcaFabricante};
use crate::{DomainError, EncuestaMarca};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilaMarca {
  /// Identificador de la fila persistida (si ya existe en el servidor).
  pub encuesta_fabricante_id: Option<i64>,
  pub fabricante_id: Option<i64>,
  pub marca_fabricante_id: Option<i64>,
  pub nombre_marca: Option<String>,
  pub tipo_cemento: Option<String>,
  pub desc_fisica: Option<String>,
}

impl FilaMarca {
  pub fn desde_encuesta_marca(marca: &EncuestaMarca) -> Self {
    let info = marca.marca_fabricante.as_ref();
    Self { encuesta_fabricante_id: marca.encuesta_fabricante_id,
           fabricante_id: marca.fabricante_id.or(info.map(|m| m.fabricante_id)),
           marca_fabricante_id: marca.marca_fabricante_id.or(info.map(|m| m.marca_fabricante_id)),
           nombre_marca: info.and_then(|m| m.nombre()).map(str::to_string),
           tipo_cemento: info.and_then(|m| no_vacio(&m.tipo_cemento)),
           desc_fisica: info.and_then(|m| no_vacio(&m.desc_fisica)) }
  }

  /// Completa sólo con los cuatro niveles seleccionados.
  pub fn completa(&self) -> bool {
    self.fabricante_id.is_some()
    && self.marca_fabricante_id.is_some()
    && no_vacio(&self.tipo_cemento).is_some()
    && no_vacio(&self.desc_fisica).is_some()
  }

  pub fn esta_vacia(&self) -> bool {
    self.fabricante_id.is_none()
  }

  fn limpiar_desde_marca(&mut self) {
    self.marca_fabricante_id = None;
    self.nombre_marca = None;
    self.limpiar_desde_tipo();
  }

  fn limpiar_desde_tipo(&mut self) {
    self.tipo_cemento = None;
    self.desc_fisica = None;
  }

  fn a_encuesta_marca(&self) -> EncuestaMarca {
    EncuestaMarca { encuesta_fabricante_id: self.encuesta_fabricante_id,
                    fabricante_id: self.fabricante_id,
                    marca_fabricante_id: self.marca_fabricante_id,
                    marca_fabricante: None }
  }
}

/// Opciones disponibles para una fila en cada nivel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpcionesFila {
  /// Una marca por nombre (representante) del fabricante de la fila.
  pub marcas: Vec<MarcaFabricante>,
  pub tipos_cemento: Vec<String>,
  pub descripciones_fisicas: Vec<String>,
}

/// Fila junto con sus opciones derivadas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRow {
  pub fila: FilaMarca,
  pub opciones: OpcionesFila,
}

/// Recalcula las opciones de todas las filas a partir de la lista completa.
pub fn calcular_filas<C: CatalogoMarcas + ?Sized>(filas: &[FilaMarca], catalogo: &C) -> Vec<SelectorRow> {
  (0..filas.len()).map(|i| SelectorRow { fila: filas[i].clone(),
                                         opciones: opciones_para(filas, i, catalogo) })
                  .collect()
}

/// Opciones de la fila `indice`, excluyendo lo ya elegido en las demás filas.
pub fn opciones_para<C: CatalogoMarcas + ?Sized>(filas: &[FilaMarca], indice: usize, catalogo: &C) -> OpcionesFila {
  let Some(fila) = filas.get(indice) else {
    return OpcionesFila::default();
  };
  let Some(fabricante_id) = fila.fabricante_id else {
    return OpcionesFila::default();
  };
  let otras: Vec<&FilaMarca> = filas.iter().enumerate().filter(|(j, _)| *j != indice).map(|(_, f)| f).collect();
  let del_fabricante = catalogo.marcas_de(fabricante_id);

  let mut marcas: Vec<MarcaFabricante> = Vec::new();
  for m in del_fabricante {
    let Some(nombre) = m.nombre() else { continue };
    let tomada = otras.iter()
                      .any(|o| o.fabricante_id == Some(m.fabricante_id) && o.nombre_marca.as_deref() == Some(nombre));
    if tomada || marcas.iter().any(|ya| ya.nombre() == Some(nombre)) {
      continue;
    }
    marcas.push(m.clone());
  }

  let Some(nombre) = fila.nombre_marca.as_deref() else {
    return OpcionesFila { marcas,
                          ..OpcionesFila::default() };
  };
  let de_la_marca: Vec<&MarcaFabricante> = del_fabricante.iter().filter(|m| m.nombre() == Some(nombre)).collect();

  let tipos_usados: Vec<&str> = otras.iter().filter_map(|o| o.tipo_cemento.as_deref()).collect();
  let tipos_cemento = unicos(de_la_marca.iter().filter_map(|m| no_vacio(&m.tipo_cemento)), &tipos_usados);

  let descs_usadas: Vec<&str> = otras.iter().filter_map(|o| o.desc_fisica.as_deref()).collect();
  let tipo_actual = fila.tipo_cemento.as_deref();
  let descripciones_fisicas = unicos(de_la_marca.iter()
                                                .filter(|m| tipo_actual.is_none() || m.tipo_cemento.as_deref() == tipo_actual)
                                                .filter_map(|m| no_vacio(&m.desc_fisica)),
                                     &descs_usadas);

  OpcionesFila { marcas,
                 tipos_cemento,
                 descripciones_fisicas }
}

/// Lista creciente de filas del selector. Siempre existe al menos una fila.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorMarcas {
  filas: Vec<FilaMarca>,
}

impl Default for SelectorMarcas {
  fn default() -> Self {
    Self::new()
  }
}

impl SelectorMarcas {
  pub fn new() -> Self {
    Self { filas: vec![FilaMarca::default()] }
  }

  /// Construye las filas a partir de las marcas persistidas de la encuesta.
  pub fn desde_marcas(marcas: &[EncuestaMarca]) -> Self {
    let filas: Vec<FilaMarca> = marcas.iter().map(FilaMarca::desde_encuesta_marca).collect();
    if filas.is_empty() {
      Self::new()
    } else {
      Self { filas }
    }
  }

  pub fn filas(&self) -> &[FilaMarca] {
    &self.filas
  }

  pub fn fila(&self, indice: usize) -> Result<&FilaMarca, DomainError> {
    self.filas.get(indice).ok_or_else(|| fila_inexistente(indice))
  }

  pub fn vistas<C: CatalogoMarcas + ?Sized>(&self, catalogo: &C) -> Vec<SelectorRow> {
    calcular_filas(&self.filas, catalogo)
  }

  pub fn opciones<C: CatalogoMarcas + ?Sized>(&self, indice: usize, catalogo: &C) -> Result<OpcionesFila, DomainError> {
    self.fila(indice)?;
    Ok(opciones_para(&self.filas, indice, catalogo))
  }

  pub fn alguna_completa(&self) -> bool {
    self.filas.iter().any(FilaMarca::completa)
  }

  /// Filas a enviar al servidor: sólo las completas, cuyo
  /// `marca_fabricante_id` es el registro exacto elegido.
  pub fn marcas_para_guardar(&self) -> Vec<EncuestaMarca> {
    self.filas.iter().filter(|f| f.completa()).map(FilaMarca::a_encuesta_marca).collect()
  }

  /// Filas iniciadas pero sin completar. No viajan al servidor.
  pub fn filas_pendientes(&self) -> Vec<FilaMarca> {
    self.filas.iter().filter(|f| !f.esta_vacia() && !f.completa()).cloned().collect()
  }

  /// Agrega al final filas pendientes conservadas tras una recarga.
  pub fn conservar_pendientes(&mut self, pendientes: Vec<FilaMarca>) {
    if pendientes.is_empty() {
      return;
    }
    self.filas.retain(|f| !f.esta_vacia());
    self.filas.extend(pendientes);
  }

  pub fn agregar_fila(&mut self) -> usize {
    self.filas.push(FilaMarca::default());
    self.filas.len() - 1
  }

  /// Elimina la fila; si es la única se reinicia en su lugar.
  pub fn eliminar_fila(&mut self, indice: usize) -> Result<FilaMarca, DomainError> {
    self.fila(indice)?;
    if self.filas.len() == 1 {
      return Ok(std::mem::take(&mut self.filas[0]));
    }
    Ok(self.filas.remove(indice))
  }

  pub fn seleccionar_fabricante(&mut self, indice: usize, fabricante_id: Option<i64>) -> Result<(), DomainError> {
    let fila = self.fila_mut(indice)?;
    fila.fabricante_id = fabricante_id;
    fila.limpiar_desde_marca();
    Ok(())
  }

  pub fn seleccionar_marca<C: CatalogoMarcas + ?Sized>(&mut self,
                                                       indice: usize,
                                                       marca_fabricante_id: Option<i64>,
                                                       catalogo: &C)
                                                       -> Result<(), DomainError> {
    let Some(id) = marca_fabricante_id else {
      self.fila_mut(indice)?.limpiar_desde_marca();
      return Ok(());
    };
    let fabricante_id = self.fila(indice)?
                            .fabricante_id
                            .ok_or_else(|| DomainError::ValidationError("Seleccione primero el fabricante".to_string()))?;
    let marca = catalogo.marcas_de(fabricante_id)
                        .iter()
                        .find(|m| m.marca_fabricante_id == id)
                        .ok_or_else(|| DomainError::SeleccionNoDisponible(format!("marca {}", id)))?;
    let nombre = marca.nombre()
                      .ok_or_else(|| DomainError::SeleccionNoDisponible(format!("marca {} sin nombre", id)))?
                      .to_string();
    let ofrecida = opciones_para(&self.filas, indice, catalogo).marcas.iter().any(|m| m.nombre() == Some(nombre.as_str()));
    if !ofrecida {
      return Err(DomainError::SeleccionNoDisponible(format!("la marca {} ya fue registrada", nombre)));
    }
    let fila = self.fila_mut(indice)?;
    fila.marca_fabricante_id = Some(id);
    fila.nombre_marca = Some(nombre);
    fila.limpiar_desde_tipo();
    Ok(())
  }

  /// Selecciona el tipo de cemento. Si queda una sola descripción física
  /// disponible se selecciona automáticamente.
  pub fn seleccionar_tipo_cemento<C: CatalogoMarcas + ?Sized>(&mut self,
                                                              indice: usize,
                                                              tipo: Option<&str>,
                                                              catalogo: &C)
                                                              -> Result<(), DomainError> {
    let Some(tipo) = tipo.map(str::trim).filter(|t| !t.is_empty()) else {
      self.fila_mut(indice)?.limpiar_desde_tipo();
      return self.restablecer_marca(indice, catalogo);
    };
    let opciones = self.opciones(indice, catalogo)?;
    if !opciones.tipos_cemento.iter().any(|t| t == tipo) {
      return Err(DomainError::SeleccionNoDisponible(format!("tipo de cemento {}", tipo)));
    }
    self.restablecer_marca(indice, catalogo)?;
    {
      let fila = self.fila_mut(indice)?;
      fila.tipo_cemento = Some(tipo.to_string());
      fila.desc_fisica = None;
    }
    let descripciones = opciones_para(&self.filas, indice, catalogo).descripciones_fisicas;
    if let [unica] = descripciones.as_slice() {
      debug!("fila {}: descripción física autoseleccionada '{}'", indice, unica);
      self.fila_mut(indice)?.desc_fisica = Some(unica.clone());
    }
    self.resolver_marca(indice, catalogo)
  }

  pub fn seleccionar_desc_fisica<C: CatalogoMarcas + ?Sized>(&mut self,
                                                             indice: usize,
                                                             desc: Option<&str>,
                                                             catalogo: &C)
                                                             -> Result<(), DomainError> {
    let Some(desc) = desc.map(str::trim).filter(|d| !d.is_empty()) else {
      self.fila_mut(indice)?.desc_fisica = None;
      return self.restablecer_marca(indice, catalogo);
    };
    let opciones = self.opciones(indice, catalogo)?;
    if !opciones.descripciones_fisicas.iter().any(|d| d == desc) {
      return Err(DomainError::SeleccionNoDisponible(format!("descripción física {}", desc)));
    }
    self.restablecer_marca(indice, catalogo)?;
    self.fila_mut(indice)?.desc_fisica = Some(desc.to_string());
    self.resolver_marca(indice, catalogo)
  }

  /// Con la fila completa, apunta `marca_fabricante_id` al registro exacto
  /// (marca, tipo, descripción) del catálogo.
  fn resolver_marca<C: CatalogoMarcas + ?Sized>(&mut self, indice: usize, catalogo: &C) -> Result<(), DomainError> {
    let fila = self.fila_mut(indice)?;
    let (Some(fabricante_id), Some(nombre), Some(tipo), Some(desc)) =
      (fila.fabricante_id, fila.nombre_marca.clone(), fila.tipo_cemento.clone(), fila.desc_fisica.clone())
    else {
      return Ok(());
    };
    if let Some(exacta) = catalogo.marcas_de(fabricante_id).iter().find(|m| {
                                                                   m.nombre() == Some(nombre.as_str())
                                                                   && m.tipo_cemento.as_deref() == Some(tipo.as_str())
                                                                   && m.desc_fisica.as_deref() == Some(desc.as_str())
                                                                 })
    {
      fila.marca_fabricante_id = Some(exacta.marca_fabricante_id);
    }
    Ok(())
  }

  /// Vuelve `marca_fabricante_id` al representante de la marca elegida
  /// mientras tipo o descripción no determinen el registro exacto.
  fn restablecer_marca<C: CatalogoMarcas + ?Sized>(&mut self, indice: usize, catalogo: &C) -> Result<(), DomainError> {
    let fila = self.fila_mut(indice)?;
    let (Some(fabricante_id), Some(nombre)) = (fila.fabricante_id, fila.nombre_marca.clone()) else {
      return Ok(());
    };
    if let Some(representante) = catalogo.marcas_de(fabricante_id).iter().find(|m| m.nombre() == Some(nombre.as_str())) {
      fila.marca_fabricante_id = Some(representante.marca_fabricante_id);
    }
    Ok(())
  }

  fn fila_mut(&mut self, indice: usize) -> Result<&mut FilaMarca, DomainError> {
    self.filas.get_mut(indice).ok_or_else(|| fila_inexistente(indice))
  }
}

fn fila_inexistente(indice: usize) -> DomainError {
  DomainError::ValidationError(format!("Fila inexistente: {}", indice))
}

fn no_vacio(valor: &Option<String>) -> Option<String> {
  valor.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn unicos(valores: impl Iterator<Item = String>, excluidos: &[&str]) -> Vec<String> {
  let mut out: Vec<String> = Vec::new();
  for v in valores {
    if !excluidos.contains(&v.as_str()) && !out.contains(&v) {
      out.push(v);
    }
  }
  out
}
