//! CLI command definitions and argument parsing

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use ptx_crypto::cipher::CipherError;
use ptx_crypto::keys::derive_key_from_bytes;
use ptx_crypto::{
    decrypt_private_tx, encrypt_private_tx, EnvelopeError, GroupPublicKey, InnerTransaction,
    TxEnvelope,
};

use crate::config::{Config, GroupConfig};
use crate::inspect::inspect_envelope;
use crate::output::{DecryptedOutput, KeyInfo, OutputFormat, OutputFormatter};
use crate::public::CommitteePublicConfig;
use crate::ExitCode;

/// ptx - seal transactions for threshold decryption
#[derive(Parser, Debug)]
#[command(name = "ptx")]
#[command(version, about = "Seal, open and inspect private transaction envelopes")]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: table, json, quiet (defaults to the config value)
    #[arg(long, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Execute the CLI command with a pre-loaded configuration
    ///
    /// `config` is expected to already carry the CLI overrides.
    pub fn execute_with_config(self, config: Config) -> anyhow::Result<ExitCode> {
        let format = config
            .output
            .format
            .parse::<OutputFormat>()
            .unwrap_or_default();
        let formatter = OutputFormatter::new(format, config.output.verbose);

        match self.command {
            Commands::Encrypt(args) => args.execute(&formatter, &config.group),
            Commands::Decrypt(args) => args.execute(&formatter, &config.group),
            Commands::Fingerprint(args) => args.execute(&formatter, &config.group),
            Commands::Inspect(args) => args.execute(&formatter),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Seal an inner transaction into a private_v1 envelope
    Encrypt(EncryptArgs),
    /// Open a private_v1 envelope (committee side, for testing)
    Decrypt(DecryptArgs),
    /// Show the fingerprint of the key derived from a group key
    Fingerprint(FingerprintArgs),
    /// Show the cleartext parts of an envelope without a key
    Inspect(InspectArgs),
}

/// Where to take the committee group public key from
#[derive(Args, Debug, Clone, Default)]
pub struct KeyArgs {
    /// Group public key: 0x-prefixed hex or base64
    #[arg(long, env = "PTX_GROUP_KEY")]
    pub group_key: Option<String>,

    /// Committee public config JSON carrying `group_pubkey`
    #[arg(long)]
    pub public_config: Option<PathBuf>,
}

/// Why no usable group key could be produced
#[derive(Debug, thiserror::Error)]
pub enum KeySourceError {
    #[error("no group key: pass --group-key or --public-config, or set [group] in the config file")]
    Missing,
    #[error("{path}: {source}")]
    PublicConfig {
        path: PathBuf,
        source: crate::public::PublicConfigError,
    },
}

impl KeyArgs {
    /// Resolve the group key. Flags win over the config file; within each
    /// layer an inline key (`--group-key` or `PTX_GROUP_KEY`) wins over a
    /// public config path.
    pub fn resolve(&self, group: &GroupConfig) -> Result<GroupPublicKey, KeySourceError> {
        if let Some(key) = &self.group_key {
            return Ok(GroupPublicKey::parse(key));
        }
        if let Some(path) = &self.public_config {
            return load_public_config(path);
        }
        if let Some(key) = &group.pubkey {
            return Ok(GroupPublicKey::parse(key));
        }
        if let Some(path) = &group.public_config {
            return load_public_config(path);
        }
        Err(KeySourceError::Missing)
    }

    fn resolve_or_report(
        &self,
        group: &GroupConfig,
        formatter: &OutputFormatter,
        command: &str,
    ) -> Result<GroupPublicKey, ExitCode> {
        self.resolve(group)
            .map_err(|e| formatter.fail(&e.to_string(), command, ExitCode::InvalidInput))
    }
}

fn load_public_config(path: &Path) -> Result<GroupPublicKey, KeySourceError> {
    CommitteePublicConfig::load(path)
        .map(|cfg| cfg.group_key())
        .map_err(|source| KeySourceError::PublicConfig {
            path: path.to_path_buf(),
            source,
        })
}

/// Read all of `path`, or stdin when no path (or `-`) is given
pub fn read_input(path: Option<&Path>) -> std::io::Result<Vec<u8>> {
    match path {
        Some(p) if p != Path::new("-") => std::fs::read(p),
        _ => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Exit code for a failed argument parse. Help and version output are
/// successes; every other parse failure is invalid input.
pub fn usage_exit_code(err: &clap::Error) -> ExitCode {
    use clap::error::ErrorKind;
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Success,
        _ => ExitCode::InvalidInput,
    }
}

/// Map a library error to the exit code reported for it
pub fn exit_code_for(err: &EnvelopeError) -> ExitCode {
    match err {
        EnvelopeError::Decryption(CipherError::AuthenticationFailed)
        | EnvelopeError::CleartextMismatch => ExitCode::AuthenticationFailed,
        EnvelopeError::KeyDerivation(_)
        | EnvelopeError::Serialization(_)
        | EnvelopeError::InvalidEnvelope(_)
        | EnvelopeError::Decryption(_) => ExitCode::InvalidInput,
        EnvelopeError::Encryption(_) | EnvelopeError::Entropy(_) => ExitCode::GeneralError,
    }
}

/// Arguments for the encrypt command
#[derive(Parser, Debug)]
pub struct EncryptArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Height at which the committee may decrypt
    #[arg(long)]
    pub target_height: u64,

    /// Inner transaction JSON (stdin if omitted)
    #[arg(long = "in")]
    pub input: Option<PathBuf>,

    /// Write the envelope here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl EncryptArgs {
    pub fn execute(
        self,
        formatter: &OutputFormatter,
        group: &GroupConfig,
    ) -> anyhow::Result<ExitCode> {
        const CMD: &str = "encrypt";

        if self.target_height == 0 {
            return Ok(formatter.fail(
                "--target-height must be non-zero",
                CMD,
                ExitCode::InvalidInput,
            ));
        }
        let group_key = match self.key.resolve_or_report(group, formatter, CMD) {
            Ok(key) => key,
            Err(code) => return Ok(code),
        };

        let raw = read_input(self.input.as_deref()).context("reading inner transaction")?;
        let tx: InnerTransaction = match serde_json::from_slice(&raw) {
            Ok(tx) => tx,
            Err(e) => {
                return Ok(formatter.fail(
                    &format!("invalid inner transaction JSON: {e}"),
                    CMD,
                    ExitCode::InvalidInput,
                ))
            }
        };

        formatter.progress(&format!(
            "Sealing {} transaction from {} for height {}",
            tx.kind.unwrap_or_default(),
            tx.from,
            self.target_height
        ));

        let env = match encrypt_private_tx(&group_key, self.target_height, &tx) {
            Ok(env) => env,
            Err(e) => return Ok(formatter.fail(&e.to_string(), CMD, exit_code_for(&e))),
        };
        tracing::info!(
            from = %env.from,
            nonce = env.nonce,
            target_height = env.target_height,
            "sealed private transaction"
        );

        match self.out {
            Some(path) => {
                let mut line = serde_json::to_string(&env)?;
                line.push('\n');
                std::fs::write(&path, line)
                    .with_context(|| format!("writing {}", path.display()))?;
                formatter.progress(&format!("Envelope written to {}", path.display()));
            }
            None => {
                let text = formatter.format_envelope(&env);
                formatter.emit(&text);
            }
        }
        Ok(ExitCode::Success)
    }
}

/// Arguments for the decrypt command
#[derive(Parser, Debug)]
pub struct DecryptArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Envelope JSON (stdin if omitted)
    #[arg(long = "in")]
    pub input: Option<PathBuf>,
}

impl DecryptArgs {
    pub fn execute(
        self,
        formatter: &OutputFormatter,
        group: &GroupConfig,
    ) -> anyhow::Result<ExitCode> {
        const CMD: &str = "decrypt";

        let group_key = match self.key.resolve_or_report(group, formatter, CMD) {
            Ok(key) => key,
            Err(code) => return Ok(code),
        };
        let env = match read_envelope(self.input.as_deref(), formatter, CMD)? {
            Ok(env) => env,
            Err(code) => return Ok(code),
        };

        match decrypt_private_tx(&group_key, &env) {
            Ok(tx) => {
                let out = DecryptedOutput {
                    target_height: env.target_height,
                    payload: tx.clone().into_payload(),
                    tx,
                };
                let text = formatter.format_decrypted(&out);
                formatter.emit(&text);
                Ok(ExitCode::Success)
            }
            Err(e) => Ok(formatter.fail(&e.to_string(), CMD, exit_code_for(&e))),
        }
    }
}

/// Arguments for the fingerprint command
#[derive(Parser, Debug)]
pub struct FingerprintArgs {
    #[command(flatten)]
    pub key: KeyArgs,
}

impl FingerprintArgs {
    pub fn execute(
        self,
        formatter: &OutputFormatter,
        group: &GroupConfig,
    ) -> anyhow::Result<ExitCode> {
        const CMD: &str = "fingerprint";

        let group_key = match self.key.resolve_or_report(group, formatter, CMD) {
            Ok(key) => key,
            Err(code) => return Ok(code),
        };
        let raw = match group_key.to_raw_bytes() {
            Ok(raw) => raw,
            Err(e) => return Ok(formatter.fail(&e.to_string(), CMD, ExitCode::InvalidInput)),
        };

        let info = KeyInfo {
            encoding: group_key.encoding().to_string(),
            raw_len: raw.len(),
            key_fingerprint: derive_key_from_bytes(&raw).fingerprint(),
        };
        let text = formatter.format_key_info(&info);
        formatter.emit(&text);
        Ok(ExitCode::Success)
    }
}

/// Arguments for the inspect command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Envelope JSON (stdin if omitted)
    #[arg(long = "in")]
    pub input: Option<PathBuf>,
}

impl InspectArgs {
    pub fn execute(self, formatter: &OutputFormatter) -> anyhow::Result<ExitCode> {
        const CMD: &str = "inspect";

        let env = match read_envelope(self.input.as_deref(), formatter, CMD)? {
            Ok(env) => env,
            Err(code) => return Ok(code),
        };
        match inspect_envelope(&env) {
            Ok(info) => {
                let text = formatter.format_inspection(&info);
                formatter.emit(&text);
                if info.problem.is_some() {
                    Ok(ExitCode::InvalidInput)
                } else {
                    Ok(ExitCode::Success)
                }
            }
            Err(e) => Ok(formatter.fail(&e.to_string(), CMD, ExitCode::InvalidInput)),
        }
    }
}

/// Read and parse an envelope. I/O failures propagate; malformed JSON is
/// reported and turned into an exit code.
fn read_envelope(
    path: Option<&Path>,
    formatter: &OutputFormatter,
    command: &str,
) -> anyhow::Result<Result<TxEnvelope, ExitCode>> {
    let raw = read_input(path).context("reading envelope")?;
    Ok(serde_json::from_slice::<TxEnvelope>(&raw).map_err(|e| {
        formatter.fail(
            &format!("invalid envelope JSON: {e}"),
            command,
            ExitCode::InvalidInput,
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptx_crypto::keys::KeyError;
    use ptx_crypto::TxError;
    use tempfile::TempDir;

    #[test]
    fn test_parse_encrypt_command() {
        let cli = Cli::try_parse_from([
            "ptx",
            "--output",
            "json",
            "encrypt",
            "--group-key",
            "0x00",
            "--target-height",
            "1000",
            "--in",
            "tx.json",
        ])
        .unwrap();

        assert_eq!(cli.output, Some(OutputFormat::Json));
        match cli.command {
            Commands::Encrypt(args) => {
                assert_eq!(args.key.group_key.as_deref(), Some("0x00"));
                assert_eq!(args.target_height, 1000);
                assert_eq!(args.input, Some(PathBuf::from("tx.json")));
                assert!(args.out.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_encrypt_requires_target_height() {
        assert!(Cli::try_parse_from(["ptx", "encrypt", "--group-key", "0x00"]).is_err());
    }

    #[test]
    fn test_both_key_flags_parse_and_group_key_wins() {
        let cli = Cli::try_parse_from([
            "ptx",
            "fingerprint",
            "--group-key",
            "0x00",
            "--public-config",
            "committee.json",
        ])
        .unwrap();
        let Commands::Fingerprint(args) = cli.command else {
            panic!("expected fingerprint");
        };
        assert_eq!(
            args.key.resolve(&GroupConfig::default()).unwrap(),
            GroupPublicKey::Hex("00".to_string())
        );
    }

    #[test]
    fn test_env_group_key_alongside_public_config_flag() {
        std::env::set_var("PTX_GROUP_KEY", "0x01");
        let parsed = Cli::try_parse_from(["ptx", "fingerprint", "--public-config", "c.json"]);
        std::env::remove_var("PTX_GROUP_KEY");

        let cli = parsed.unwrap();
        let Commands::Fingerprint(args) = cli.command else {
            panic!("expected fingerprint");
        };
        assert_eq!(args.key.group_key.as_deref(), Some("0x01"));
        assert_eq!(args.key.public_config, Some(PathBuf::from("c.json")));
        assert_eq!(
            args.key.resolve(&GroupConfig::default()).unwrap(),
            GroupPublicKey::Hex("01".to_string())
        );
    }

    #[test]
    fn test_usage_errors_are_invalid_input() {
        let missing = Cli::try_parse_from(["ptx", "encrypt", "--group-key", "0x00"]).unwrap_err();
        assert_eq!(usage_exit_code(&missing), ExitCode::InvalidInput);

        let unknown = Cli::try_parse_from(["ptx", "frobnicate"]).unwrap_err();
        assert_eq!(usage_exit_code(&unknown), ExitCode::InvalidInput);

        let help = Cli::try_parse_from(["ptx", "--help"]).unwrap_err();
        assert_eq!(usage_exit_code(&help), ExitCode::Success);

        let version = Cli::try_parse_from(["ptx", "--version"]).unwrap_err();
        assert_eq!(usage_exit_code(&version), ExitCode::Success);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ptx", "inspect", "-v", "--debug"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.debug);
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_key_resolution_precedence() {
        let group = GroupConfig {
            pubkey: Some("AA==".to_string()),
            public_config: None,
        };

        let flag = KeyArgs {
            group_key: Some("0x01".to_string()),
            public_config: None,
        };
        assert_eq!(
            flag.resolve(&group).unwrap(),
            GroupPublicKey::Hex("01".to_string())
        );

        let from_config = KeyArgs::default().resolve(&group).unwrap();
        assert_eq!(from_config, GroupPublicKey::Base64("AA==".to_string()));
    }

    #[test]
    fn test_key_resolution_public_config_file() {
        use base64::Engine;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("committee-public.json");
        let encoded = base64::engine::general_purpose::STANDARD.encode([7u8; 48]);
        std::fs::write(&path, format!(r#"{{"group_pubkey":"{encoded}"}}"#)).unwrap();

        let args = KeyArgs {
            group_key: None,
            public_config: Some(path),
        };
        let key = args.resolve(&GroupConfig::default()).unwrap();
        assert_eq!(key, GroupPublicKey::Raw(vec![7u8; 48]));
    }

    #[test]
    fn test_key_resolution_missing() {
        let err = KeyArgs::default()
            .resolve(&GroupConfig::default())
            .unwrap_err();
        assert!(matches!(err, KeySourceError::Missing));
    }

    #[test]
    fn test_key_resolution_bad_public_config_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        let args = KeyArgs {
            group_key: None,
            public_config: Some(path),
        };
        let err = args.resolve(&GroupConfig::default()).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(
            exit_code_for(&EnvelopeError::Decryption(CipherError::AuthenticationFailed)),
            ExitCode::AuthenticationFailed
        );
        assert_eq!(
            exit_code_for(&EnvelopeError::CleartextMismatch),
            ExitCode::AuthenticationFailed
        );
        assert_eq!(
            exit_code_for(&EnvelopeError::KeyDerivation(KeyError::MalformedKeyEncoding(
                "odd number of hex digits"
            ))),
            ExitCode::InvalidInput
        );
        assert_eq!(
            exit_code_for(&EnvelopeError::Serialization(TxError::MissingField("from"))),
            ExitCode::InvalidInput
        );
        assert_eq!(
            exit_code_for(&EnvelopeError::Encryption(CipherError::Encryption)),
            ExitCode::GeneralError
        );
    }

    #[test]
    fn test_read_input_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.json");
        std::fs::write(&path, b"{}").unwrap();
        assert_eq!(read_input(Some(&path)).unwrap(), b"{}");
    }
}
