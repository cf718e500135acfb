//! Tipos de erro para o adaptador do provedor de telefonia.
//!
//! Define [`ProviderError`] separando credenciais rejeitadas, falhas de rede
//! e demais erros da API, para que cada caso seja reportado com seu próprio
//! código de saída.

use thiserror::Error;

/// Erros que podem ocorrer ao interagir com a API REST do provedor.
///
/// Nenhuma variante é retentada pelo adaptador:
/// - [`Auth`](ProviderError::Auth): o provedor recusou as credenciais (401/403)
/// - [`Transport`](ProviderError::Transport): a requisição não chegou a completar
/// - [`Api`](ProviderError::Api): qualquer outro status HTTP de erro
/// - [`Decode`](ProviderError::Decode): o corpo da resposta veio num formato inesperado
#[derive(Debug, Error)]
pub enum ProviderError {
    /// O provedor recusou as credenciais (HTTP 401 ou 403).
    /// Contém o status e a mensagem do corpo da resposta.
    #[error("authentication failed (status {status}): {message}")]
    Auth { status: u16, message: String },

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    /// Encapsula o erro original do `reqwest` via `#[from]`.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Status de erro diferente de 401/403 (ex.: 400 número inválido, 500 erro interno).
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Resposta 2xx cujo corpo não pôde ser usado (ex.: SID vazio).
    /// Também recusa URLs de gravação fora do host da API.
    #[error("unexpected provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Classifica um status HTTP de erro em [`Auth`](ProviderError::Auth) ou
    /// [`Api`](ProviderError::Api).
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ProviderError::Auth { status, message },
            _ => ProviderError::Api { status, message },
        }
    }
}
