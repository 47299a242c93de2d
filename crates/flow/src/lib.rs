//! Crate `flow` — ciclo de vida de las encuestas
//!
//! Este crate define la tabla de transiciones de estado (`lifecycle`), la
//! matriz de permisos por rol (`permisos`), el contrato con el servidor REST
//! `EncuestaApi` y una implementación en memoria útil para pruebas
//! (`InMemoryEncuestaApi`). También expone `FlowEngine`, que ejecuta
//! transiciones validadas.
//!
//! Diseño resumido:
//! - El servidor es la autoridad: tras cualquier mutación se usa la encuesta
//!   devuelta por el servidor, nunca una predicción local.
//! - Validación local primero: una transición inexistente o no autorizada
//!   se rechaza sin llamar al servidor.
//! - Sin reintentos: los errores remotos se propagan tal cual.
//!
//! Ejemplo rápido:
//! ```rust
//! use flow::stubs::InMemoryEncuestaApi;
//! use flow::FlowEngine;
//! use std::sync::Arc;
//! let api = Arc::new(InMemoryEncuestaApi::new());
//! let engine = FlowEngine::new(api);
//! ```
pub mod engine;
pub mod errors;
pub mod lifecycle;
pub mod permisos;
pub mod repository;
pub mod stubs;

pub use engine::*;
pub use errors::*;
pub use lifecycle::*;
pub use permisos::*;
pub use repository::*;
pub use stubs::*;
