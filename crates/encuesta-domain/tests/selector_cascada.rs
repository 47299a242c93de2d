use encuesta_domain::{DomainError, DomainStubs, FilaMarca, SelectorMarcas};
use std::collections::HashSet;

/// Comprueba que ninguna pareja de filas distintas repita marca, tipo o
/// descripción física ya elegidos.
fn sin_duplicados(filas: &[FilaMarca]) -> bool {
  for (i, a) in filas.iter().enumerate() {
    for b in filas.iter().skip(i + 1) {
      if a.fabricante_id.is_some() && a.nombre_marca.is_some() && a.fabricante_id == b.fabricante_id && a.nombre_marca == b.nombre_marca {
        return false;
      }
      if a.tipo_cemento.is_some() && a.tipo_cemento == b.tipo_cemento {
        return false;
      }
      if a.desc_fisica.is_some() && a.desc_fisica == b.desc_fisica {
        return false;
      }
    }
  }
  true
}

#[test]
fn tipo_con_una_sola_descripcion_se_autoselecciona() -> Result<(), DomainError> {
  let catalogo = DomainStubs::catalogo_marcas();
  let mut sel = SelectorMarcas::new();
  sel.seleccionar_fabricante(0, Some(1))?;
  sel.seleccionar_marca(0, Some(101), &catalogo)?;
  sel.seleccionar_tipo_cemento(0, Some("Tipo V"), &catalogo)?;
  let fila = sel.fila(0)?;
  assert_eq!(fila.desc_fisica.as_deref(), Some("Bolsa 42.5 kg"));
  assert!(fila.completa());
  // Apunta al registro exacto del catálogo.
  assert_eq!(fila.marca_fabricante_id, Some(103));
  Ok(())
}

#[test]
fn tipo_con_varias_descripciones_deja_la_descripcion_vacia() -> Result<(), DomainError> {
  let catalogo = DomainStubs::catalogo_marcas();
  let mut sel = SelectorMarcas::new();
  sel.seleccionar_fabricante(0, Some(1))?;
  sel.seleccionar_marca(0, Some(101), &catalogo)?;
  sel.seleccionar_tipo_cemento(0, Some("Tipo I"), &catalogo)?;
  assert!(sel.fila(0)?.desc_fisica.is_none());
  assert!(!sel.fila(0)?.completa());
  let opciones = sel.opciones(0, &catalogo)?;
  assert_eq!(opciones.descripciones_fisicas, vec!["Bolsa 42.5 kg".to_string(), "Granel".to_string()]);
  sel.seleccionar_desc_fisica(0, Some("Granel"), &catalogo)?;
  assert_eq!(sel.fila(0)?.marca_fabricante_id, Some(102));
  assert!(sel.alguna_completa());
  Ok(())
}

#[test]
fn otras_filas_no_ofrecen_lo_ya_elegido() -> Result<(), DomainError> {
  let catalogo = DomainStubs::catalogo_marcas();
  let mut sel = SelectorMarcas::new();
  sel.seleccionar_fabricante(0, Some(1))?;
  sel.seleccionar_marca(0, Some(101), &catalogo)?;
  sel.seleccionar_tipo_cemento(0, Some("Tipo I"), &catalogo)?;
  sel.seleccionar_desc_fisica(0, Some("Bolsa 42.5 kg"), &catalogo)?;

  let i = sel.agregar_fila();
  sel.seleccionar_fabricante(i, Some(1))?;
  let nombres: Vec<String> =
    sel.opciones(i, &catalogo)?.marcas.iter().filter_map(|m| m.nombre().map(str::to_string)).collect();
  assert_eq!(nombres, vec!["Andino Forte".to_string()]);
  assert!(matches!(sel.seleccionar_marca(i, Some(103), &catalogo), Err(DomainError::SeleccionNoDisponible(_))));

  // En otro fabricante Tipo I tampoco se ofrece.
  sel.seleccionar_fabricante(i, Some(2))?;
  sel.seleccionar_marca(i, Some(201), &catalogo)?;
  assert_eq!(sel.opciones(i, &catalogo)?.tipos_cemento, vec!["Tipo MS".to_string()]);
  assert!(sel.seleccionar_tipo_cemento(i, Some("Tipo I"), &catalogo).is_err());
  sel.seleccionar_tipo_cemento(i, Some("Tipo MS"), &catalogo)?;
  assert_eq!(sel.fila(i)?.desc_fisica.as_deref(), Some("Big bag 1.5 t"));
  assert!(sin_duplicados(sel.filas()));
  Ok(())
}

#[test]
fn descripcion_ya_usada_no_se_autoselecciona() -> Result<(), DomainError> {
  let catalogo = DomainStubs::catalogo_marcas();
  let mut sel = SelectorMarcas::new();
  sel.seleccionar_fabricante(0, Some(3))?;
  sel.seleccionar_marca(0, Some(301), &catalogo)?;
  sel.seleccionar_tipo_cemento(0, Some("Tipo I"), &catalogo)?;
  assert_eq!(sel.fila(0)?.desc_fisica.as_deref(), Some("Bolsa 42.5 kg"));

  let i = sel.agregar_fila();
  sel.seleccionar_fabricante(i, Some(1))?;
  sel.seleccionar_marca(i, Some(103), &catalogo)?;
  sel.seleccionar_tipo_cemento(i, Some("Tipo V"), &catalogo)?;
  assert!(sel.fila(i)?.desc_fisica.is_none());
  assert!(sel.opciones(i, &catalogo)?.descripciones_fisicas.is_empty());
  Ok(())
}

#[test]
fn ninguna_secuencia_de_selecciones_produce_duplicados() -> Result<(), DomainError> {
  let catalogo = DomainStubs::catalogo_marcas();
  let mut sel = SelectorMarcas::new();
  for _ in 0..3 {
    sel.agregar_fila();
  }
  // Recorre todas las opciones ofrecidas en orden, fila por fila, e intenta
  // también elecciones no ofrecidas.
  for ronda in 0..2 {
    for i in 0..sel.filas().len() {
      let fabricante = ((i + ronda) % 3 + 1) as i64;
      sel.seleccionar_fabricante(i, Some(fabricante))?;
      for m in catalogo.get(&fabricante).into_iter().flatten() {
        let _ = sel.seleccionar_marca(i, Some(m.marca_fabricante_id), &catalogo);
        if sel.fila(i)?.nombre_marca.is_some() {
          break;
        }
      }
      let tipos = sel.opciones(i, &catalogo)?.tipos_cemento;
      if let Some(t) = tipos.first() {
        sel.seleccionar_tipo_cemento(i, Some(t), &catalogo)?;
      }
      let _ = sel.seleccionar_tipo_cemento(i, Some("Tipo I"), &catalogo);
      let descs = sel.opciones(i, &catalogo)?.descripciones_fisicas;
      if let Some(d) = descs.last() {
        sel.seleccionar_desc_fisica(i, Some(d), &catalogo)?;
      }
      assert!(sin_duplicados(sel.filas()), "duplicados tras ronda {} fila {}", ronda, i);
    }
  }
  let tipos: HashSet<_> = sel.filas().iter().filter_map(|f| f.tipo_cemento.clone()).collect();
  assert_eq!(tipos.len(), sel.filas().iter().filter(|f| f.tipo_cemento.is_some()).count());
  Ok(())
}

#[test]
fn eliminar_fila_intermedia_conserva_las_demas() -> Result<(), DomainError> {
  let catalogo = DomainStubs::catalogo_marcas();
  let mut sel = SelectorMarcas::new();
  sel.seleccionar_fabricante(0, Some(1))?;
  let i = sel.agregar_fila();
  sel.seleccionar_fabricante(i, Some(2))?;
  let j = sel.agregar_fila();
  sel.seleccionar_fabricante(j, Some(3))?;
  let quitada = sel.eliminar_fila(1)?;
  assert_eq!(quitada.fabricante_id, Some(2));
  let fabricantes: Vec<_> = sel.filas().iter().map(|f| f.fabricante_id).collect();
  assert_eq!(fabricantes, vec![Some(1), Some(3)]);
  // Las opciones se recalculan sobre la nueva lista.
  let vistas = sel.vistas(&catalogo);
  assert_eq!(vistas.len(), 2);
  assert_eq!(vistas[1].opciones.marcas.len(), 2);
  Ok(())
}

#[test]
fn filas_se_cargan_desde_la_encuesta() -> Result<(), DomainError> {
  let encuesta = DomainStubs::encuesta_constructora_completa(2);
  let sel = SelectorMarcas::desde_marcas(&encuesta.marcas);
  let fila = sel.fila(0)?;
  assert_eq!(fila.encuesta_fabricante_id, Some(8001));
  assert_eq!(fila.nombre_marca.as_deref(), Some("Pacasmayo"));
  assert_eq!(fila.tipo_cemento.as_deref(), Some("Tipo MS"));
  assert!(fila.completa());
  assert_eq!(sel.marcas_para_guardar().len(), 1);
  assert_eq!(SelectorMarcas::desde_marcas(&[]).filas().len(), 1);
  Ok(())
}
