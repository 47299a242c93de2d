// completitud.rs
use crate::encuesta::presente;
use crate::selector::FilaMarca;
use crate::{Encuesta, Obra, Seccion, TIPO_COMPRA_BOLSAS, TIPO_COMPRA_GRANEL};

/// Vista de sólo lectura del formulario sobre la que se evalúa la
/// completitud. No guarda banderas: todo se deriva de los datos.
#[derive(Debug, Clone, Copy)]
pub struct EstadoFormulario<'a> {
  pub encuesta: &'a Encuesta,
  pub filas: &'a [FilaMarca],
  pub obra: &'a Obra,
}

impl<'a> EstadoFormulario<'a> {
  pub fn new(encuesta: &'a Encuesta, filas: &'a [FilaMarca], obra: &'a Obra) -> Self {
    Self { encuesta, filas, obra }
  }
}

pub fn seccion_completa(seccion: Seccion, f: &EstadoFormulario<'_>) -> bool {
  let e = f.encuesta;
  match seccion {
    Seccion::DatosGenerales => e.tipo_encuesta.is_some() && presente(&e.fecha_encuesta),
    Seccion::Empresa => e.empresa_id.is_some() || e.empresa.is_some(),
    Seccion::DatosObra => f.obra.tiene_datos(),
    Seccion::Encuestado => e.encuestado_id.is_some() || e.encuestado.is_some(),
    Seccion::Productos => {
      (e.concreto_premezclado == Some(1) || e.articulos_concreto == Some(1)) && presente(&e.tipo_lugar_compra)
    }
    Seccion::Fabricante => f.filas.iter().any(FilaMarca::completa),
    Seccion::Compra => compra_completa(e),
    Seccion::Uso => presente(&e.uso_cemento) && presente(&e.motivo_compra) && e.deseo_regalo.is_some(),
    // Secciones sólo observables, sin datos propios que completar.
    Seccion::Marca | Seccion::Ubicacion => true,
  }
}

fn compra_completa(e: &Encuesta) -> bool {
  let base = presente(&e.tipo_compra) && presente(&e.tipo_lugar_compra) && presente(&e.desc_compra) && e.precio.is_some();
  if !base {
    return false;
  }
  match e.tipo_compra.as_deref() {
    Some(TIPO_COMPRA_BOLSAS) => presente(&e.cantidad_presentacion_compra),
    Some(TIPO_COMPRA_GRANEL) => presente(&e.presentacion_compra) && presente(&e.cantidad_presentacion_compra),
    _ => true,
  }
}

/// Secciones requeridas por el tipo de encuesta que aún no están completas.
pub fn secciones_incompletas(f: &EstadoFormulario<'_>) -> Vec<Seccion> {
  Seccion::requeridas(f.encuesta.tipo_encuesta).iter().copied().filter(|s| !seccion_completa(*s, f)).collect()
}

/// AND lógico sobre las secciones requeridas; sin tipo de encuesta el
/// formulario nunca está completo.
pub fn todas_las_secciones_completas(f: &EstadoFormulario<'_>) -> bool {
  f.encuesta.tipo_encuesta.is_some() && secciones_incompletas(f).is_empty()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{DomainStubs, SelectorMarcas};

  #[test]
  fn compra_bolsas_requiere_cantidad() {
    let mut e = DomainStubs::encuesta_industria_completa(1);
    let obra = Obra::default();
    let sel = SelectorMarcas::desde_marcas(&e.marcas);
    assert!(seccion_completa(Seccion::Compra, &EstadoFormulario::new(&e, sel.filas(), &obra)));
    e.cantidad_presentacion_compra = None;
    assert!(!seccion_completa(Seccion::Compra, &EstadoFormulario::new(&e, sel.filas(), &obra)));
  }

  #[test]
  fn compra_granel_requiere_presentacion_y_cantidad() {
    let mut e = DomainStubs::encuesta_constructora_completa(2);
    let obra = e.obra.clone().unwrap_or_default();
    let sel = SelectorMarcas::desde_marcas(&e.marcas);
    assert!(seccion_completa(Seccion::Compra, &EstadoFormulario::new(&e, sel.filas(), &obra)));
    e.presentacion_compra = Some("  ".into());
    assert!(!seccion_completa(Seccion::Compra, &EstadoFormulario::new(&e, sel.filas(), &obra)));
  }

  #[test]
  fn productos_requiere_producto_y_lugar() {
    let mut e = DomainStubs::encuesta_industria_completa(1);
    let obra = Obra::default();
    e.concreto_premezclado = Some(0);
    e.articulos_concreto = Some(0);
    assert!(!seccion_completa(Seccion::Productos, &EstadoFormulario::new(&e, &[], &obra)));
    e.articulos_concreto = Some(1);
    assert!(seccion_completa(Seccion::Productos, &EstadoFormulario::new(&e, &[], &obra)));
  }

  #[test]
  fn sin_tipo_de_encuesta_nunca_esta_completa() {
    let mut e = DomainStubs::encuesta_industria_completa(1);
    e.tipo_encuesta = None;
    let obra = Obra::default();
    let sel = SelectorMarcas::desde_marcas(&e.marcas);
    let f = EstadoFormulario::new(&e, sel.filas(), &obra);
    assert!(!todas_las_secciones_completas(&f));
    assert_eq!(secciones_incompletas(&f), vec![Seccion::DatosGenerales]);
  }
}
