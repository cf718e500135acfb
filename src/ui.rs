//! Interface de terminal do callwatch — spinner e saída colorida.
//!
//! Usa as crates `indicatif` para o spinner durante o polling e `console` para
//! estilização com cores. O [`CallProgress`] implementa [`CallObserver`] e
//! reporta cada fase da chamada no terminal.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::CallwatchError;
use crate::lifecycle::{AuditRecord, CallOutcome};
use crate::orchestrator::CallObserver;
use crate::provider::{CallHandle, CallStatus, Recording};

/// Indicador visual de progresso para uma chamada no terminal.
///
/// Exibe um spinner enquanto o status é consultado e mensagens
/// coloridas para sucesso (verde), falha (vermelho) e avisos (amarelo).
pub struct CallProgress {
    // Spinner do indicatif.
    pb: ProgressBar,
    // Estilo verde para mensagens de sucesso.
    green: Style,
    // Estilo vermelho para mensagens de falha.
    red: Style,
    // Estilo amarelo para avisos.
    yellow: Style,
}

impl CallProgress {
    /// Inicia o spinner com o destino da chamada.
    pub fn start(label: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(label.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Remove o spinner quando a execução termina com erro.
    pub fn abort(&self) {
        self.pb.finish_and_clear();
    }

    /// Imprime o registro de auditoria formatado em JSON.
    pub fn print_audit(&self, record: &AuditRecord) -> Result<(), CallwatchError> {
        let json = serde_json::to_string_pretty(record)?;
        println!();
        println!("{}", self.yellow.apply_to("─── Audit Record ───"));
        println!("{json}");
        Ok(())
    }
}

impl CallObserver for CallProgress {
    fn submitted(&self, call: &CallHandle) {
        self.pb.println(format!("Call initiated. SID: {call}"));
        self.pb.set_message(format!("{call}: waiting for status"));
    }

    fn status(&self, attempt: u32, status: CallStatus) {
        self.pb.println(format!("Call status: {status}"));
        self.pb.set_message(format!("poll #{attempt}: {status}"));
    }

    fn recording(&self, recording: Option<&Recording>) {
        match recording {
            Some(rec) => self
                .pb
                .println(format!("Recording SID: {}, URL: {}", rec.sid, rec.uri)),
            None => self.pb.println(format!(
                "  {} No recording found for this call.",
                self.yellow.apply_to("!")
            )),
        }
    }

    /// Finaliza o spinner e exibe o resultado final da chamada.
    fn finished(&self, outcome: &CallOutcome) {
        self.pb.finish_and_clear();
        match outcome {
            CallOutcome::Downloaded(artifact) => println!(
                "  {} Recording downloaded successfully as '{}' ({} bytes).",
                self.green.apply_to("✓"),
                artifact.path.display(),
                artifact.bytes
            ),
            CallOutcome::NoRecording => println!(
                "  {} Call completed without a recording.",
                self.yellow.apply_to("!")
            ),
            CallOutcome::NotCompleted(status) => println!(
                "  {} Call did not complete successfully ({status}). No recording requested.",
                self.red.apply_to("✗")
            ),
            CallOutcome::TimedOut { attempts } => println!(
                "  {} Gave up after {attempts} status checks without a final status.",
                self.red.apply_to("✗")
            ),
            CallOutcome::DownloadFailed { status } => println!(
                "  {} Failed to download recording: {status}",
                self.red.apply_to("✗")
            ),
        }
    }
}
