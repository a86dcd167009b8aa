//! Output formatting for CLI results
//!
//! Three output formats:
//! - Table: human-readable tables; `encrypt` prints the bare envelope JSON
//!   so it can be piped straight into a submission client
//! - JSON: structured JSON for scripting and automation
//! - Quiet: minimal output, exit codes only

use std::str::FromStr;

use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use ptx_crypto::{CanonicalTx, DecodedPayload, TxEnvelope};

use crate::inspect::EnvelopeInspection;
use crate::ExitCode;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for scripting
    Json,
    /// Minimal output - exit codes only
    Quiet,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "quiet" => Ok(Self::Quiet),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Quiet => write!(f, "quiet"),
        }
    }
}

/// Standard JSON response wrapper for consistent schema
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    /// Whether the operation was successful
    pub success: bool,
    /// The response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// ISO 8601 timestamp
    pub timestamp: String,
    /// Command that was executed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl<T: Serialize> JsonResponse<T> {
    /// Create a successful response with command context
    pub fn success_with_command(data: T, command: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: Some(command.to_string()),
        }
    }
}

impl JsonResponse<()> {
    /// Create an error response with command context
    pub fn error_with_command(message: &str, command: &str) -> JsonResponse<()> {
        JsonResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: Some(command.to_string()),
        }
    }
}

/// Derived key summary. Never carries the key itself.
#[derive(Debug, Clone, Serialize)]
pub struct KeyInfo {
    /// Encoding the key was supplied in
    pub encoding: String,
    /// Raw group key length in bytes
    pub raw_len: usize,
    /// Fingerprint of the derived symmetric key
    pub key_fingerprint: String,
}

/// Result of opening a private envelope
#[derive(Debug, Clone, Serialize)]
pub struct DecryptedOutput {
    pub target_height: u64,
    pub tx: CanonicalTx,
    pub payload: DecodedPayload,
}

/// Formats output for different modes
pub struct OutputFormatter {
    format: OutputFormat,
    verbose: bool,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.format == OutputFormat::Quiet
    }

    /// Format a sealed envelope
    pub fn format_envelope(&self, env: &TxEnvelope) -> String {
        match self.format {
            OutputFormat::Table => serde_json::to_string(env)
                .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}")),
            OutputFormat::Json => self.to_json_response(env, "encrypt"),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format an opened envelope
    pub fn format_decrypted(&self, out: &DecryptedOutput) -> String {
        match self.format {
            OutputFormat::Table => self.decrypted_table(out),
            OutputFormat::Json => self.to_json_response(out, "decrypt"),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format key fingerprint info
    pub fn format_key_info(&self, info: &KeyInfo) -> String {
        match self.format {
            OutputFormat::Table => self.key_info_table(info),
            OutputFormat::Json => self.to_json_response(info, "fingerprint"),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format envelope inspection
    pub fn format_inspection(&self, info: &EnvelopeInspection) -> String {
        match self.format {
            OutputFormat::Table => self.inspection_table(info),
            OutputFormat::Json => self.to_json_response(info, "inspect"),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format error with exit code context
    pub fn format_error_with_code(&self, message: &str, command: &str, code: ExitCode) -> String {
        match self.format {
            OutputFormat::Table => format!("Error: {message}"),
            OutputFormat::Json => {
                let response = JsonResponse::error_with_command(message, command);
                let mut output = match serde_json::to_value(&response) {
                    Ok(v) => v,
                    Err(e) => return format!("{{\"error\": \"{e}\"}}"),
                };
                output["exit_code"] = serde_json::json!(code as i32);
                output["exit_code_name"] = serde_json::json!(code.name());
                self.to_json(&output)
            }
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Print an error for `command` and hand back its exit code
    pub fn fail(&self, message: &str, command: &str, code: ExitCode) -> ExitCode {
        let text = self.format_error_with_code(message, command, code);
        match self.format {
            OutputFormat::Table => eprintln!("{text}"),
            OutputFormat::Json => println!("{text}"),
            OutputFormat::Quiet => {}
        }
        code
    }

    /// Print a formatted result to stdout, nothing in quiet mode
    pub fn emit(&self, text: &str) {
        if !self.is_quiet() && !text.is_empty() {
            println!("{text}");
        }
    }

    /// Progress message (only shown in verbose table mode)
    pub fn progress(&self, message: &str) {
        if self.verbose && self.format == OutputFormat::Table {
            eprintln!("... {message}");
        }
    }

    fn to_json<T: Serialize>(&self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    fn to_json_response<T: Serialize>(&self, value: &T, command: &str) -> String {
        let response = JsonResponse::success_with_command(value, command);
        serde_json::to_string_pretty(&response).unwrap_or_else(|e| {
            let err_response =
                JsonResponse::error_with_command(&format!("Serialization error: {e}"), command);
            self.to_json(&err_response)
        })
    }

    fn decrypted_table(&self, out: &DecryptedOutput) -> String {
        let tx = &out.tx;
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Field", "Value"]);
        table.add_row(vec!["Type", tx.kind.as_str()]);
        table.add_row(vec!["From", &tx.from]);
        table.add_row(vec!["Nonce", &tx.nonce.to_string()]);
        table.add_row(vec!["Gas", &tx.gas.to_string()]);
        table.add_row(vec!["Fee", &tx.fee.to_string()]);
        table.add_row(vec!["Bid", &tx.bid.to_string()]);
        table.add_row(vec!["Fee Recipient", or_dash(&tx.fee_recipient)]);
        table.add_row(vec!["Target Height", &out.target_height.to_string()]);
        table.to_string()
    }

    fn key_info_table(&self, info: &KeyInfo) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Property", "Value"]);
        table.add_row(vec!["Encoding", &info.encoding]);
        table.add_row(vec!["Group Key Length", &info.raw_len.to_string()]);
        table.add_row(vec!["Key Fingerprint", &info.key_fingerprint]);
        table.to_string()
    }

    fn inspection_table(&self, info: &EnvelopeInspection) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Property", "Value"]);
        table.add_row(vec!["Type", &info.tx_type]);
        table.add_row(vec!["From", &info.from]);
        table.add_row(vec!["Nonce", &info.nonce.to_string()]);
        table.add_row(vec!["Target Height", &info.target_height.to_string()]);
        table.add_row(vec!["Blob Size", &info.blob_size.to_string()]);
        table.add_row(vec!["AEAD Nonce", &info.aead_nonce]);
        table.add_row(vec!["Body Size", &info.body_size.to_string()]);
        table.add_row(vec!["Tag", &info.tag]);
        table.add_row(vec!["Ephemeral Key Size", &info.ephemeral_key_size.to_string()]);
        if self.verbose || info.problem.is_some() {
            table.add_row(vec!["Problem", info.problem.as_deref().unwrap_or("-")]);
        }
        table.to_string()
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}
