//! Cliente REST del servidor de encuestas.
//!
//! `HttpEncuestaApi` implementa `flow::EncuestaApi` con llamadas bloqueantes.
//! La URL base y el token opcional se leen del entorno (`ApiConfig`). Los
//! errores se clasifican en `FlowError::Transport` (sin respuesta),
//! `FlowError::NotFound` (404) y `FlowError::Rejected` (cualquier otro
//! estado no exitoso, con el mensaje que envió el servidor).
pub mod config;
pub mod http_api;

pub use config::ApiConfig;
pub use http_api::{error_desde_respuesta, extraer_mensaje, interpretar, HttpEncuestaApi, Sesion};
