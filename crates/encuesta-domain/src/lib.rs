mod cambios;
mod catalogo;
mod completitud;
mod domain_stubs;
mod encuesta;
mod errors;
mod estado;
mod observacion;
mod seccion;
mod selector;

pub use cambios::{Campo, RegistroCambios};
pub use catalogo::{CatalogoMarcas, Fabricante, MarcaFabricante};
pub use completitud::{secciones_incompletas, seccion_completa, todas_las_secciones_completas, EstadoFormulario};
pub use domain_stubs::DomainStubs;
pub use encuesta::{normalizar_fecha, texto_opcional, validar_contacto, validar_dni, validar_encuestado_nuevo,
                   validar_fecha_encuesta, validar_precio, validar_ruc, Direccion, Empresa, Encuesta, EncuestaMarca,
                   Encuestado, HistorialEstado, Obra, Pagina, TipoEncuesta, TipoProducto, COD_PAIS_POR_DEFECTO,
                   PRECIO_MAXIMO, TIPO_COMPRA_BOLSAS, TIPO_COMPRA_GRANEL};
pub use errors::DomainError;
pub use estado::{EstadoEncuesta, Rol};
pub use observacion::{truncar, EncuestaObservacion, LibroObservaciones, ObservacionHistorial};
pub use seccion::Seccion;
pub use selector::{calcular_filas, opciones_para, FilaMarca, OpcionesFila, SelectorMarcas, SelectorRow};
