//! Configuración del cliente HTTP a partir del entorno (`.env` incluido).
use flow::errors::{FlowError, Result};

/// Variable con la URL base del API; `API_URL` se acepta como alternativa.
pub const VAR_URL: &str = "ENCUESTAS_API_URL";
pub const VAR_URL_ALTERNATIVA: &str = "API_URL";
/// Token bearer opcional. El cliente no lo guarda ni lo renueva.
pub const VAR_TOKEN: &str = "ENCUESTAS_API_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl ApiConfig {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let base = base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(FlowError::Config("la URL del API está vacía".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(FlowError::Config(format!("la URL del API debe usar http o https: {}", base)));
        }
        Ok(Self { base_url: base.to_string(),
                  token: token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) })
    }

    /// Lee la configuración de las variables de entorno, cargando antes el
    /// archivo `.env` si existe.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::desde_variables(|k| std::env::var(k).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables inyectada.
    pub fn desde_variables<F>(leer: F) -> Result<Self>
        where F: Fn(&str) -> Option<String>
    {
        let url = leer(VAR_URL).or_else(|| leer(VAR_URL_ALTERNATIVA))
                               .ok_or_else(|| FlowError::Config(format!("{} no está definida", VAR_URL)))?;
        Self::new(&url, leer(VAR_TOKEN))
    }

    /// URL absoluta para `ruta` (que empieza con `/`).
    pub fn url(&self, ruta: &str) -> String {
        format!("{}{}", self.base_url, ruta)
    }
}
