//! `pts-imc replay`
//!
//! Runs captured verifier messages through a measurer bound to a transport
//! that writes each reply to `reply-<n>.bin`, numbered from 1 in send order.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use bytes::Bytes;
use clap::Args;
use pts_imc::{
    ConnectionId, ImcConfig, ImcHost, TncConnectionState, TncResult, Transport, TransportError,
    tnc::{IF_IMC_VERSION_1, PTS_MESSAGE_TYPE},
};
use pts_proto::ProtoCaps;

use crate::error::CliError;

const IMC_ID: u32 = 1;

/// Measurer settings exposed on the command line.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Protocol capability bits offered to the verifier
    #[arg(long, default_value_t = ImcConfig::default().proto_caps.bits())]
    caps: u32,

    /// TPM version information blob, hex encoded
    #[arg(long)]
    tpm_version_info: Option<String>,

    /// Bytes read per hashing step
    #[arg(long, default_value_t = ImcConfig::default().chunk_size)]
    chunk_size: usize,
}

impl ConfigArgs {
    /// Build the measurer configuration.
    pub fn into_config(self) -> Result<ImcConfig, CliError> {
        let tpm_version_info = self.tpm_version_info.map(hex::decode).transpose()?.map(Bytes::from);
        Ok(ImcConfig {
            proto_caps: ProtoCaps::from_bits_truncate(self.caps),
            tpm_version_info,
            chunk_size: self.chunk_size,
            ..ImcConfig::default()
        })
    }
}

/// Writes every delivered message to its own numbered file.
#[derive(Debug)]
struct ReplyWriter {
    dir: PathBuf,
    written: AtomicUsize,
}

impl ReplyWriter {
    fn new(dir: PathBuf) -> Self {
        Self { dir, written: AtomicUsize::new(0) }
    }

    fn written(&self) -> usize {
        self.written.load(Ordering::SeqCst)
    }
}

impl Transport for ReplyWriter {
    fn send_message(
        &self,
        connection_id: ConnectionId,
        message: Bytes,
    ) -> Result<(), TransportError> {
        let n = self.written.fetch_add(1, Ordering::SeqCst) + 1;
        let path = self.dir.join(format!("reply-{n}.bin"));
        fs::write(&path, &message)?;
        tracing::debug!(connection_id, path = %path.display(), bytes = message.len(), "wrote reply");
        Ok(())
    }
}

/// Replay `messages` on one connection, printing one status line per message.
///
/// Every message is attempted even after a failure.
pub fn run(
    out: &mut impl Write,
    messages: &[PathBuf],
    out_dir: &Path,
    connection_id: ConnectionId,
    config: ImcConfig,
) -> Result<(), CliError> {
    fs::create_dir_all(out_dir)
        .map_err(|source| CliError::OutputDir { path: out_dir.to_path_buf(), source })?;

    let writer = Arc::new(ReplyWriter::new(out_dir.to_path_buf()));
    let mut host = ImcHost::new(config);
    let mut version = 0;
    check(host.initialize(IMC_ID, IF_IMC_VERSION_1, IF_IMC_VERSION_1, &mut version))?;
    check(host.bind_functions(IMC_ID, writer.clone()))?;
    check(host.notify_connection_change(IMC_ID, connection_id, TncConnectionState::Create))?;
    check(host.begin_handshake(IMC_ID, connection_id))?;

    let mut failed = 0;
    for path in messages {
        let data =
            fs::read(path).map_err(|source| CliError::Read { path: path.clone(), source })?;
        match host.receive_message(IMC_ID, connection_id, Bytes::from(data), PTS_MESSAGE_TYPE) {
            TncResult::Success => {
                let reply = out_dir.join(format!("reply-{}.bin", writer.written()));
                writeln!(out, "{}: replied -> {}", path.display(), reply.display())?;
            },
            result => {
                failed += 1;
                writeln!(out, "{}: no reply ({result:?})", path.display())?;
            },
        }
    }

    check(host.notify_connection_change(IMC_ID, connection_id, TncConnectionState::Delete))?;
    check(host.terminate(IMC_ID))?;

    if failed > 0 {
        return Err(CliError::ReplayFailed { failed, total: messages.len() });
    }
    Ok(())
}

fn check(result: TncResult) -> Result<(), CliError> {
    match result {
        TncResult::Success => Ok(()),
        other => Err(CliError::Host(other)),
    }
}

#[cfg(test)]
mod tests {
    use pts_proto::{Attribute, MeasAlgorithms, PaTncMessage, PtsErrorCode};
    use tempfile::TempDir;

    use super::*;

    fn write_message(dir: &Path, name: &str, message: &PaTncMessage) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, message.encode().unwrap()).unwrap();
        path
    }

    #[test]
    fn writes_numbered_replies() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let caps = write_message(
            input.path(),
            "caps.bin",
            &PaTncMessage::new(1).with(Attribute::ReqProtoCaps(ProtoCaps::all())),
        );
        let algo = write_message(
            input.path(),
            "algo.bin",
            &PaTncMessage::new(2).with(Attribute::MeasAlgo(MeasAlgorithms::SHA1)),
        );

        let mut out = Vec::new();
        run(&mut out, &[caps, algo], output.path(), 1, ImcConfig::default()).unwrap();

        let first = PaTncMessage::decode(fs::read(output.path().join("reply-1.bin")).unwrap().into())
            .unwrap();
        assert_eq!(first.attributes(), [Attribute::ProtoCaps(ProtoCaps::V)]);
        let second = PaTncMessage::decode(fs::read(output.path().join("reply-2.bin")).unwrap().into())
            .unwrap();
        assert_eq!(second.attributes(), [Attribute::MeasAlgoSelection(MeasAlgorithms::SHA1)]);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
    }

    #[test]
    fn failures_are_counted() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let garbage = input.path().join("garbage.bin");
        fs::write(&garbage, [0xff, 0xff]).unwrap();
        let tpm = write_message(
            input.path(),
            "tpm.bin",
            &PaTncMessage::new(1).with(Attribute::GetTpmVersionInfo),
        );

        let mut out = Vec::new();
        let result = run(&mut out, &[garbage, tpm], output.path(), 1, ImcConfig::default());
        assert!(matches!(result, Err(CliError::ReplayFailed { failed: 1, total: 2 })));

        let reply = PaTncMessage::decode(fs::read(output.path().join("reply-1.bin")).unwrap().into())
            .unwrap();
        let [Attribute::PaTncError(error)] = reply.attributes() else {
            panic!("unexpected reply {reply:?}");
        };
        assert_eq!(error.pts_code(), Some(PtsErrorCode::TpmVersNotSupported));
    }

    #[test]
    fn tpm_info_is_hex_decoded() {
        let args = ConfigArgs { caps: 8, tpm_version_info: Some("0102ff".into()), chunk_size: 16 };
        let config = args.into_config().unwrap();
        assert_eq!(config.tpm_version_info, Some(Bytes::from_static(&[1, 2, 0xff])));
        assert_eq!(config.proto_caps, ProtoCaps::V);

        let args = ConfigArgs { caps: 8, tpm_version_info: Some("xyz".into()), chunk_size: 16 };
        assert!(matches!(args.into_config(), Err(CliError::TpmVersionInfo(_))));
    }
}
