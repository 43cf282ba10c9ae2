//! Scenario tests for the negotiation phases of the handshake.

use pts_imc::{HashAlgorithm, ImcConfig, ImcError, Phase, UnsupportedPhase};
use pts_harness::Scenario;
use pts_proto::{Attribute, MeasAlgorithms, PaTncError, ProtoCaps, PtsErrorCode};

#[test]
fn capability_negotiation_intersects_flags() {
    let config = ImcConfig { proto_caps: ProtoCaps::from_bits_truncate(0b101), ..ImcConfig::default() };

    let result = Scenario::new("caps 0b011 against local 0b101")
        .config(config)
        .connection(1)
        .send(1, vec![Attribute::ReqProtoCaps(ProtoCaps::from_bits_truncate(0b011))])
        .oracle(Box::new(|world| {
            let state = world.state(1).ok_or("connection 1 should exist")?;
            if state.phase() != Phase::NegotiatingCaps {
                return Err(format!("expected NegotiatingCaps, got {:?}", state.phase()));
            }
            if state.negotiated_caps().bits() != 0b001 {
                return Err(format!("expected caps 0b001, got {:#b}", state.negotiated_caps().bits()));
            }

            let reply = world.last_reply(1)?;
            if reply.attributes() != [Attribute::ProtoCaps(ProtoCaps::from_bits_truncate(0b001))] {
                return Err(format!("unexpected reply {:?}", reply.attributes()));
            }
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario failed: {result:?}");
}

#[test]
fn full_negotiation_sequence() {
    let config = ImcConfig {
        tpm_version_info: Some(bytes::Bytes::from_static(&[1, 2, 0, 0])),
        ..ImcConfig::default()
    };

    let result = Scenario::new("caps, algorithm, tpm")
        .config(config)
        .connection(3)
        .send(3, vec![Attribute::ReqProtoCaps(ProtoCaps::all())])
        .send(3, vec![Attribute::MeasAlgo(MeasAlgorithms::SHA1 | MeasAlgorithms::SHA256)])
        .send(3, vec![Attribute::GetTpmVersionInfo])
        .oracle(Box::new(|world| {
            let replies = world.replies(3)?;
            if replies.len() != 3 {
                return Err(format!("expected 3 replies, got {}", replies.len()));
            }
            let expected = [
                Attribute::ProtoCaps(ProtoCaps::V),
                Attribute::MeasAlgoSelection(MeasAlgorithms::SHA256),
                Attribute::TpmVersionInfo(bytes::Bytes::from_static(&[1, 2, 0, 0])),
            ];
            for (reply, expected) in replies.iter().zip(expected) {
                if reply.attributes() != [expected.clone()] {
                    return Err(format!("expected {expected:?}, got {:?}", reply.attributes()));
                }
            }

            let state = world.state(3).ok_or("connection 3 should exist")?;
            if state.negotiated_algorithm() != HashAlgorithm::Sha256 {
                return Err(format!("unexpected algorithm {}", state.negotiated_algorithm()));
            }
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario failed: {result:?}");
}

#[test]
fn peer_error_suppresses_reply() {
    let error = PaTncError::pts(PtsErrorCode::InvalidPath, [1, 0, 0, 0, 0, 0, 0, 1]);

    let result = Scenario::new("peer error anywhere in message")
        .connection(1)
        .send(1, vec![Attribute::ReqProtoCaps(ProtoCaps::V), Attribute::PaTncError(error)])
        .send(1, vec![Attribute::PaTncError(error), Attribute::GetTpmVersionInfo])
        .oracle(Box::new(|world| {
            if world.messages_sent(1) != 0 {
                return Err(format!("expected no reply, got {}", world.messages_sent(1)));
            }
            for outcome in world.outcomes() {
                if !matches!(outcome.result, Err(ImcError::Protocol { .. })) {
                    return Err(format!("expected protocol error, got {:?}", outcome.result));
                }
            }
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario failed: {result:?}");
}

#[test]
fn no_common_algorithm_is_signalled() {
    let config =
        ImcConfig { supported_algorithms: MeasAlgorithms::SHA256, ..ImcConfig::default() };

    let result = Scenario::new("disjoint algorithm sets")
        .config(config)
        .connection(1)
        .send(1, vec![Attribute::MeasAlgo(MeasAlgorithms::SHA1 | MeasAlgorithms::SHA384)])
        .oracle(Box::new(|world| {
            let reply = world.last_reply(1)?;
            match reply.attributes() {
                [Attribute::PaTncError(error)]
                    if error.pts_code() == Some(PtsErrorCode::HashAlgNotSupported) =>
                {
                    Ok(())
                },
                other => Err(format!("expected hash-alg-not-supported, got {other:?}")),
            }
        }))
        .run();

    assert!(result.is_ok(), "scenario failed: {result:?}");
}

#[test]
fn unsupported_request_sends_nothing_and_session_survives() {
    let result = Scenario::new("AIK request then caps")
        .connection(1)
        .send(1, vec![Attribute::GetAik])
        .send(1, vec![Attribute::ReqProtoCaps(ProtoCaps::V)])
        .oracle(Box::new(|world| {
            let first = world.outcome(0).ok_or("missing first outcome")?;
            if !matches!(
                first.result,
                Err(ImcError::UnsupportedPhase(UnsupportedPhase::AwaitingAik))
            ) {
                return Err(format!("expected unsupported phase, got {:?}", first.result));
            }
            if world.messages_sent(1) != 1 {
                return Err(format!("expected 1 reply, got {}", world.messages_sent(1)));
            }
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario failed: {result:?}");
}

#[test]
fn malformed_message_gets_no_reply() {
    let result = Scenario::new("garbage bytes")
        .connection(1)
        .send_raw(1, vec![1u8, 0, 0, 0, 0, 0, 0, 1, 0x80])
        .oracle(Box::new(|world| {
            let outcome = world.outcome(0).ok_or("missing outcome")?;
            if !matches!(outcome.result, Err(ImcError::Parse(_))) {
                return Err(format!("expected parse error, got {:?}", outcome.result));
            }
            if world.messages_sent(1) != 0 {
                return Err("malformed message must not be answered".into());
            }
            let state = world.state(1).ok_or("connection 1 should exist")?;
            if state.phase() != Phase::Init {
                return Err(format!("state changed to {:?}", state.phase()));
            }
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario failed: {result:?}");
}

#[test]
fn delivery_failure_is_reported() {
    let result = Scenario::new("transport closed")
        .connection(1)
        .close_transport(1)
        .send(1, vec![Attribute::ReqProtoCaps(ProtoCaps::V)])
        .oracle(Box::new(|world| {
            let outcome = world.outcome(0).ok_or("missing outcome")?;
            if !matches!(outcome.result, Err(ImcError::Transport(_))) {
                return Err(format!("expected transport error, got {:?}", outcome.result));
            }
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario failed: {result:?}");
}

#[test]
fn scenario_reports_oracle_failure() {
    let result = Scenario::new("failing oracle")
        .connection(1)
        .oracle(Box::new(|_| Err("boom".into())))
        .run();

    assert_eq!(result, Err("Scenario 'failing oracle': boom".to_string()));
}
