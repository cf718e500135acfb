//! Interface de linha de comando do callwatch baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (call, status,
//! recordings, download) e flags globais (--config, --verbose).

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::CallwatchConfig;
use crate::provider::{CallRequest, Instructions, RecordingFormat};

/// callwatch — faz uma chamada, acompanha o status e baixa a gravação.
#[derive(Debug, Parser)]
#[command(name = "callwatch", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: ./callwatch.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Habilita logs detalhados (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Formato aceito pela CLI, mapeado para [`RecordingFormat`] internamente.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    /// Metadados da gravação em JSON.
    Json,
    /// Áudio em MP3.
    Mp3,
    /// Áudio em WAV.
    Wav,
}

impl From<FormatArg> for RecordingFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => RecordingFormat::Json,
            FormatArg::Mp3 => RecordingFormat::Mp3,
            FormatArg::Wav => RecordingFormat::Wav,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Faz uma chamada, espera o fim e baixa a gravação.
    Call {
        #[command(flatten)]
        call: CallArgs,

        #[command(flatten)]
        retrieval: RetrievalArgs,
    },

    /// Mostra o status atual de uma chamada existente.
    Status {
        /// SID da chamada.
        call_sid: String,
    },

    /// Lista as gravações de uma chamada existente.
    Recordings {
        /// SID da chamada.
        call_sid: String,
    },

    /// Acompanha uma chamada existente e baixa a gravação quando concluída.
    Download {
        /// SID da chamada.
        call_sid: String,

        #[command(flatten)]
        retrieval: RetrievalArgs,
    },
}

/// Parâmetros da chamada a ser feita.
#[derive(Debug, Args)]
pub struct CallArgs {
    /// Número de destino (sobrescreve TO_PHONE_NUMBER).
    #[arg(long)]
    pub to: Option<String>,

    /// Número de origem (sobrescreve TWILIO_PHONE_NUMBER).
    #[arg(long)]
    pub from: Option<String>,

    /// Documento TwiML inline.
    #[arg(long, conflicts_with_all = ["say", "url"])]
    pub twiml: Option<String>,

    /// Texto falado ao atender (gera o TwiML).
    #[arg(long, conflicts_with = "url")]
    pub say: Option<String>,

    /// URL de onde o provedor busca as instruções TwiML.
    #[arg(long)]
    pub url: Option<String>,

    /// Tons DTMF enviados após a conexão (ex.: "1234#").
    #[arg(long)]
    pub digits: Option<String>,

    /// Desabilita a gravação da chamada.
    #[arg(long, default_value_t = false)]
    pub no_record: bool,
}

impl CallArgs {
    /// Instruções de voz escolhidas, se houver.
    pub fn instructions(&self) -> Option<Instructions> {
        if let Some(doc) = &self.twiml {
            Some(Instructions::Twiml(doc.clone()))
        } else if let Some(text) = &self.say {
            Some(Instructions::say(text))
        } else {
            self.url.clone().map(Instructions::Url)
        }
    }

    /// Monta a requisição combinando flags e configuração.
    pub fn to_request(&self, config: &CallwatchConfig) -> CallRequest {
        CallRequest {
            to: self.to.clone().unwrap_or_else(|| config.to_number.clone()),
            from: self.from.clone().unwrap_or_else(|| config.from_number.clone()),
            instructions: self.instructions(),
            send_digits: self.digits.clone(),
            record: !self.no_record,
        }
    }
}

/// Parâmetros de polling e de download.
#[derive(Debug, Args)]
pub struct RetrievalArgs {
    /// Arquivo onde a gravação é salva.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Formato da gravação a baixar.
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Intervalo entre consultas de status, em milissegundos.
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Máximo de consultas de status (0 = sem limite).
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Imprime o registro de auditoria em JSON ao final.
    #[arg(long, default_value_t = false)]
    pub audit: bool,
}

impl RetrievalArgs {
    /// Aplica as flags sobre a configuração carregada.
    pub fn apply(&self, config: &mut CallwatchConfig) {
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(format) = self.format {
            config.recording_format = format.into();
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(max) = self.max_attempts {
            config.max_poll_attempts = max;
        }
    }
}
