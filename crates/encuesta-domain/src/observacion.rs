// observacion.rs
use crate::{Seccion, TipoEncuesta};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Observación vigente de una sección.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncuestaObservacion {
  #[serde(default)]
  pub encuesta_observacion_id: Option<i64>,
  pub encuesta_id: i64,
  pub seccion: String,
  #[serde(default)]
  pub observacion: String,
  #[serde(default)]
  pub fecha_creacion: Option<String>,
  #[serde(default)]
  pub fecha_modificacion: Option<String>,
}

impl EncuestaObservacion {
  pub fn esta_activa(&self) -> bool {
    !self.observacion.trim().is_empty()
  }
}

/// Copia archivada de una observación, etiquetada con el ciclo de revisión
/// asignado por el servidor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservacionHistorial {
  #[serde(default)]
  pub encuesta_observacion_historial_id: Option<i64>,
  pub encuesta_id: i64,
  pub seccion: String,
  #[serde(default)]
  pub observacion: String,
  pub ciclo_revision: i64,
  #[serde(default)]
  pub fecha_creacion: Option<String>,
  #[serde(default)]
  pub usuario_creacion: Option<String>,
}

/// Modelo de lectura de observaciones: vigentes por sección e historial
/// agrupado por sección, ciclo más reciente primero.
///
/// Sólo se alimenta con respuestas del servidor; nunca agrega entradas de
/// historial localmente.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibroObservaciones {
  activas: BTreeMap<String, EncuestaObservacion>,
  historial: BTreeMap<String, Vec<ObservacionHistorial>>,
}

impl LibroObservaciones {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn reemplazar_activas(&mut self, observaciones: Vec<EncuestaObservacion>) {
    self.activas = observaciones.into_iter().map(|o| (o.seccion.clone(), o)).collect();
  }

  pub fn reemplazar_historial(&mut self, entradas: Vec<ObservacionHistorial>) {
    let mut agrupado: BTreeMap<String, Vec<ObservacionHistorial>> = BTreeMap::new();
    for h in entradas {
      agrupado.entry(h.seccion.clone()).or_default().push(h);
    }
    for lista in agrupado.values_mut() {
      lista.sort_by(|a, b| {
             b.ciclo_revision
              .cmp(&a.ciclo_revision)
              .then_with(|| b.encuesta_observacion_historial_id.cmp(&a.encuesta_observacion_historial_id))
           });
    }
    self.historial = agrupado;
  }

  /// Texto vigente de la sección (vacío si no hay observación).
  pub fn texto(&self, seccion: &str) -> &str {
    self.activas.get(seccion).map(|o| o.observacion.as_str()).unwrap_or("")
  }

  /// Observaciones con texto, ordenadas por clave de sección.
  pub fn activas(&self) -> Vec<&EncuestaObservacion> {
    self.activas.values().filter(|o| o.esta_activa()).collect()
  }

  pub fn contar_activas(&self) -> usize {
    self.activas.values().filter(|o| o.esta_activa()).count()
  }

  pub fn tiene_activas(&self) -> bool {
    self.contar_activas() > 0
  }

  /// Etiquetas de las secciones con observación vigente.
  pub fn secciones_con_observaciones(&self, tipo: Option<TipoEncuesta>) -> Vec<String> {
    self.activas().iter().map(|o| Seccion::etiqueta_de_clave(&o.seccion, tipo)).collect()
  }

  pub fn historial(&self) -> &BTreeMap<String, Vec<ObservacionHistorial>> {
    &self.historial
  }

  pub fn historial_de(&self, seccion: &str) -> &[ObservacionHistorial] {
    self.historial.get(seccion).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn total_historial(&self) -> usize {
    self.historial.values().map(Vec::len).sum()
  }

  /// Mayor ciclo de revisión presente en el historial (0 si está vacío).
  pub fn ultimo_ciclo(&self) -> i64 {
    self.historial.values().flatten().map(|h| h.ciclo_revision).max().unwrap_or(0)
  }

  /// Secciones tocadas en el último ciclo de revisión.
  pub fn secciones_ultimo_ciclo(&self) -> BTreeSet<String> {
    let maximo = self.ultimo_ciclo();
    if maximo == 0 {
      return BTreeSet::new();
    }
    self.historial
        .iter()
        .filter(|(_, lista)| lista.iter().any(|h| h.ciclo_revision == maximo))
        .map(|(seccion, _)| seccion.clone())
        .collect()
  }

  /// Una entrada por sección del último ciclo.
  pub fn entradas_ultimo_ciclo(&self) -> Vec<&ObservacionHistorial> {
    let maximo = self.ultimo_ciclo();
    if maximo == 0 {
      return Vec::new();
    }
    self.historial.values().filter_map(|lista| lista.iter().find(|h| h.ciclo_revision == maximo)).collect()
  }

  /// Secciones con historial pero sin observación vigente.
  pub fn secciones_con_historial(&self) -> Vec<String> {
    self.historial
        .iter()
        .filter(|(seccion, lista)| {
          !lista.is_empty() && !self.activas.get(*seccion).map(EncuestaObservacion::esta_activa).unwrap_or(false)
        })
        .map(|(seccion, _)| seccion.clone())
        .collect()
  }

  /// Lo que hay que corregir: las vigentes o, si ya se limpiaron, las del
  /// último ciclo.
  pub fn secciones_visibles(&self, tipo: Option<TipoEncuesta>) -> Vec<String> {
    let activas = self.secciones_con_observaciones(tipo);
    if !activas.is_empty() {
      return activas;
    }
    self.secciones_ultimo_ciclo().iter().map(|s| Seccion::etiqueta_de_clave(s, tipo)).collect()
  }
}

/// Recorta el texto para la vista colapsada.
pub fn truncar(texto: &str, limite: usize) -> String {
  if texto.chars().count() > limite {
    format!("{}...", texto.chars().take(limite).collect::<String>())
  } else {
    texto.to_string()
  }
}
