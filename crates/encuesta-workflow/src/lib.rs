//! encuesta-workflow: formulario de encuesta sobre `flow`
//!
//! Orquesta lo que el usuario hace con una encuesta abierta: puertas de
//! entrada (confirmación del validador, aviso de observada), edición con
//! seguimiento explícito de cambios, selector de marcas con catálogo
//! memorizado, guardado mínimo, observaciones y transiciones de estado.
//! La vista es un único `VistaEstado` que sólo avanza con `reducir`.

pub mod catalogo;
pub mod errors;
pub mod formulario;
pub mod vista;

pub use catalogo::CatalogoReferencias;
pub use errors::WorkflowError;
pub use formulario::{FormularioEncuesta, Guardado, MENSAJE_SIN_CAMBIOS};
pub use vista::{reducir, Accion, Destino, Operacion, VistaEstado};
