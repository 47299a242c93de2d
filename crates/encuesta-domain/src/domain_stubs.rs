use crate::{Direccion, Empresa, Encuesta, EncuestaMarca, Encuestado, Fabricante, MarcaFabricante, Obra, TipoEncuesta};
use once_cell::sync::Lazy;
use std::collections::HashMap;

static CATALOGO: Lazy<HashMap<i64, Vec<MarcaFabricante>>> = Lazy::new(construir_catalogo);

pub struct DomainStubs;

impl DomainStubs {
  pub fn fabricantes() -> Vec<Fabricante> {
    vec![Fabricante { fabricante_id: 1,
                      razon_social: "Cementos Andinos S.A.".into(),
                      ruc: Some("20100000001".into()) },
         Fabricante { fabricante_id: 2,
                      razon_social: "Cementos Pacasmayo S.A.A.".into(),
                      ruc: Some("20100000002".into()) },
         Fabricante { fabricante_id: 3,
                      razon_social: "Unión Andina de Cementos".into(),
                      ruc: Some("20100000003".into()) }]
  }

  /// Catálogo de marcas por fabricante. "Andino" tiene dos presentaciones
  /// para Tipo I y una sola para Tipo V.
  pub fn catalogo_marcas() -> HashMap<i64, Vec<MarcaFabricante>> {
    CATALOGO.clone()
  }

  fn marca_persistida(encuesta_fabricante_id: i64, marca_fabricante_id: i64) -> EncuestaMarca {
    let info = CATALOGO.values().flatten().find(|m| m.marca_fabricante_id == marca_fabricante_id).cloned();
    EncuestaMarca { encuesta_fabricante_id: Some(encuesta_fabricante_id),
                    fabricante_id: info.as_ref().map(|m| m.fabricante_id),
                    marca_fabricante_id: Some(marca_fabricante_id),
                    marca_fabricante: info }
  }

  /// Encuesta INDUSTRIA en registro con todas sus secciones completas.
  pub fn encuesta_industria_completa(encuesta_id: i64) -> Encuesta {
    let mut e = Encuesta::nueva(encuesta_id, TipoEncuesta::Industria);
    e.fecha_encuesta = Some("2024-05-10".into());
    e.empresa_id = Some(5);
    e.empresa = Some(Empresa { empresa_id: 5,
                               razon_social: "Prefabricados del Sur S.A.C.".into(),
                               ruc: "20512345678".into(),
                               tipo_empresa_id: Some(1) });
    e.encuestado_id = Some(9);
    e.encuestado = Some(Encuestado { encuestado_id: Some(9),
                                     nombres: Some("Rosa".into()),
                                     apepat: Some("Huamán".into()),
                                     cargo: Some("Jefa de compras".into()),
                                     ..Encuestado::default() });
    e.concreto_premezclado = Some(1);
    e.articulos_concreto = Some(0);
    e.tipo_lugar_compra = Some("FERRETERIA".into());
    e.tipo_compra = Some("BOLSAS".into());
    e.presentacion_compra = Some("BOLSA_42_5".into());
    e.cantidad_presentacion_compra = Some("100".into());
    e.desc_compra = Some("Compra mensual".into());
    e.precio = Some(28.5);
    e.con_igv = Some(1);
    e.uso_cemento = Some("Losas y columnas".into());
    e.motivo_compra = Some("Precio".into());
    e.deseo_regalo = Some(1);
    e.marcas = vec![Self::marca_persistida(7001, 103)];
    e
  }

  /// Encuesta CONSTRUCTORA en registro con obra y compra a granel.
  pub fn encuesta_constructora_completa(encuesta_id: i64) -> Encuesta {
    let mut e = Encuesta::nueva(encuesta_id, TipoEncuesta::Constructora);
    e.fecha_encuesta = Some("2024-06-02".into());
    e.encuestado_id = Some(11);
    e.tipo_lugar_compra = Some("DISTRIBUIDOR".into());
    e.tipo_compra = Some("GRANEL".into());
    e.presentacion_compra = Some("BIG_BAG".into());
    e.cantidad_presentacion_compra = Some("20".into());
    e.desc_compra = Some("Entrega en obra".into());
    e.precio = Some(610.0);
    e.marcas = vec![Self::marca_persistida(8001, 202)];
    e.obra = Some(Obra { obra_encuesta_id: Some(31),
                         etapa_obra: Some("ESTRUCTURA".into()),
                         fecha_finalizacion_obra: Some("2025-03-30".into()),
                         mixer: None,
                         metraje: Some("1200".into()),
                         resistencia: Some("210".into()),
                         direccion: Direccion { cod_pais: Some("428".into()),
                                                cod_departamento: Some("15".into()),
                                                cod_provincia: Some("01".into()),
                                                cod_distrito: Some("22".into()),
                                                nombre_via: Some("Av. Los Próceres".into()),
                                                ..Direccion::default() } });
    e
  }
}

fn construir_catalogo() -> HashMap<i64, Vec<MarcaFabricante>> {
  let filas = [(101, 1, "Andino", "Tipo I", "Bolsa 42.5 kg"),
               (102, 1, "Andino", "Tipo I", "Granel"),
               (103, 1, "Andino", "Tipo V", "Bolsa 42.5 kg"),
               (104, 1, "Andino Forte", "Tipo IP", "Bolsa 25 kg"),
               (201, 2, "Pacasmayo", "Tipo I", "Bolsa 42.5 kg"),
               (202, 2, "Pacasmayo", "Tipo MS", "Big bag 1.5 t"),
               (203, 2, "Mochica", "Tipo ICo", "Bolsa 42.5 kg"),
               (301, 3, "Sol", "Tipo I", "Bolsa 42.5 kg"),
               (302, 3, "Apu", "Tipo GU", "Bolsa 25 kg")];
  let mut catalogo: HashMap<i64, Vec<MarcaFabricante>> = HashMap::new();
  for (id, fabricante_id, nombre, tipo, desc) in filas {
    catalogo.entry(fabricante_id).or_default().push(MarcaFabricante { marca_fabricante_id: id,
                                                                      fabricante_id,
                                                                      nombre_marca: Some(nombre.into()),
                                                                      tipo_cemento: Some(tipo.into()),
                                                                      marca: Some(nombre.into()),
                                                                      sub_marca: None,
                                                                      desc_fisica: Some(desc.into()) });
  }
  catalogo
}
