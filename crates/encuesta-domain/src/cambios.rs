// cambios.rs
//
// Seguimiento explícito de cambios: cada setter marca el campo que toca.
// De aquí salen tanto la bandera de "cambios sin guardar" como el payload
// mínimo que se envía al servidor.
use crate::{DomainError, Encuesta};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Campos editables de la encuesta que viajan en `PUT /encuestas`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Campo {
  FechaEncuesta,
  EmpresaId,
  EncuestadoId,
  ConcretoPremezclado,
  ArticulosConcreto,
  TipoLugarCompra,
  TipoCompra,
  PresentacionCompra,
  CantidadPresentacionCompra,
  DescCompra,
  Precio,
  ConIgv,
  UsoCemento,
  MotivoCompra,
  DeseoRegalo,
  AudioUrl,
  ComentarioCuantitativo,
  Marcas,
  /// La obra se guarda aparte (`PUT /obras`), no forma parte del payload.
  Obra,
}

impl Campo {
  /// Nombre del campo en el JSON del servidor.
  pub fn clave(&self) -> &'static str {
    match self {
      Campo::FechaEncuesta => "fechaEncuesta",
      Campo::EmpresaId => "empresaId",
      Campo::EncuestadoId => "encuestadoId",
      Campo::ConcretoPremezclado => "concretoPremezclado",
      Campo::ArticulosConcreto => "articulosConcreto",
      Campo::TipoLugarCompra => "tipoLugarCompra",
      Campo::TipoCompra => "tipoCompra",
      Campo::PresentacionCompra => "presentacionCompra",
      Campo::CantidadPresentacionCompra => "cantidadPresentacionCompra",
      Campo::DescCompra => "descCompra",
      Campo::Precio => "precio",
      Campo::ConIgv => "conIgv",
      Campo::UsoCemento => "usoCemento",
      Campo::MotivoCompra => "motivoCompra",
      Campo::DeseoRegalo => "deseoRegalo",
      Campo::AudioUrl => "audioUrl",
      Campo::ComentarioCuantitativo => "comentarioCuantitativo",
      Campo::Marcas => "marcas",
      Campo::Obra => "obra",
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistroCambios {
  campos: BTreeSet<Campo>,
}

impl RegistroCambios {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn marcar(&mut self, campo: Campo) {
    self.campos.insert(campo);
  }

  pub fn desmarcar(&mut self, campo: Campo) {
    self.campos.remove(&campo);
  }

  pub fn esta_marcado(&self, campo: Campo) -> bool {
    self.campos.contains(&campo)
  }

  pub fn hay_cambios(&self) -> bool {
    !self.campos.is_empty()
  }

  /// Hay cambios que viajan en el payload de la encuesta (excluye la obra).
  pub fn hay_cambios_de_encuesta(&self) -> bool {
    self.campos.iter().any(|c| *c != Campo::Obra)
  }

  pub fn campos(&self) -> impl Iterator<Item = Campo> + '_ {
    self.campos.iter().copied()
  }

  pub fn limpiar(&mut self) {
    self.campos.clear();
  }

  /// Payload mínimo: `encuestaId` más los campos marcados que tienen valor.
  /// Los campos marcados pero vacíos no se envían.
  pub fn payload(&self, encuesta: &Encuesta) -> Result<Value, DomainError> {
    let completo = serde_json::to_value(encuesta)?;
    let mut out = Map::new();
    out.insert("encuestaId".to_string(), Value::from(encuesta.encuesta_id));
    for campo in self.campos.iter().filter(|c| **c != Campo::Obra) {
      match completo.get(campo.clave()) {
        Some(Value::Null) | None => {}
        Some(Value::String(s)) if s.trim().is_empty() => {}
        Some(v) => {
          out.insert(campo.clave().to_string(), v.clone());
        }
      }
    }
    Ok(Value::Object(out))
  }
}
