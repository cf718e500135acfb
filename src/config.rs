//! Configuração do callwatch carregada a partir de `callwatch.toml`.
//!
//! A struct [`CallwatchConfig`] contém credenciais, números e parâmetros de polling.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! Variáveis de ambiente têm precedência sobre o arquivo; flags da CLI sobre ambos.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::CallwatchError;
use crate::lifecycle::PollConfig;
use crate::provider::{API_URL, RecordingFormat, TwilioClient};

/// Arquivo de configuração procurado no diretório atual.
pub const DEFAULT_CONFIG_FILE: &str = "callwatch.toml";

/// Configuração de nível superior carregada de `callwatch.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CallwatchConfig {
    /// Identificador da conta no provedor (Account SID).
    #[serde(default)]
    pub account_sid: String,

    /// Token secreto da conta.
    #[serde(default)]
    pub auth_token: String,

    /// Número de origem da chamada.
    #[serde(default)]
    pub from_number: String,

    /// Número de destino padrão.
    #[serde(default)]
    pub to_number: String,

    /// URL base da API REST.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Intervalo entre consultas de status, em milissegundos.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Máximo de consultas de status (0 = sem limite).
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    /// Caminho do arquivo onde a gravação é salva.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Representação da gravação a baixar.
    #[serde(default)]
    pub recording_format: RecordingFormat,
}

// Valor padrão para a URL base: API pública do provedor.
fn default_api_base_url() -> String {
    API_URL.to_string()
}

// Valor padrão para o intervalo de polling: 2000ms.
fn default_poll_interval_ms() -> u64 {
    PollConfig::default().interval_ms
}

// Valor padrão para o máximo de consultas: 900 (30 minutos a 2s).
fn default_max_poll_attempts() -> u32 {
    PollConfig::default().max_attempts
}

// Valor padrão para o arquivo de saída: "recording.json".
fn default_output_path() -> PathBuf {
    PathBuf::from("recording.json")
}

impl Default for CallwatchConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            to_number: String::new(),
            api_base_url: default_api_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: default_max_poll_attempts(),
            output_path: default_output_path(),
            recording_format: RecordingFormat::default(),
        }
    }
}

impl CallwatchConfig {
    /// Carrega a configuração de `callwatch.toml` no diretório atual.
    pub fn load() -> Result<Self, CallwatchError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Carrega a configuração do caminho fornecido e aplica as variáveis de ambiente.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load_from(path: &Path) -> Result<Self, CallwatchError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<CallwatchConfig>(&contents)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Sobrescreve campos com variáveis de ambiente não vazias.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields: [(&str, &mut String); 5] = [
            ("TWILIO_ACCOUNT_SID", &mut self.account_sid),
            ("TWILIO_AUTH_TOKEN", &mut self.auth_token),
            ("TWILIO_PHONE_NUMBER", &mut self.from_number),
            ("TO_PHONE_NUMBER", &mut self.to_number),
            ("CALLWATCH_API_BASE_URL", &mut self.api_base_url),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key)
                && !value.is_empty()
            {
                *field = value;
            }
        }
    }

    /// Parâmetros do loop de polling.
    pub fn poll(&self) -> PollConfig {
        PollConfig {
            interval_ms: self.poll_interval_ms,
            max_attempts: self.max_poll_attempts,
        }
    }

    /// Cria o cliente HTTP do provedor; exige credenciais preenchidas.
    pub fn client(&self) -> Result<TwilioClient, CallwatchError> {
        if self.account_sid.is_empty() || self.auth_token.is_empty() {
            return Err(CallwatchError::Config(
                "missing credentials: set TWILIO_ACCOUNT_SID and TWILIO_AUTH_TOKEN or add them to callwatch.toml".into(),
            ));
        }
        Ok(TwilioClient::with_base_url(
            self.account_sid.clone(),
            self.auth_token.clone(),
            self.api_base_url.clone(),
        )?)
    }
}
