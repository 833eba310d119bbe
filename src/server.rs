use std::{fs, io::ErrorKind, os::unix::fs::FileTypeExt, path::Path, sync::Arc};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{UnixListener, UnixStream},
    signal::unix::{SignalKind, signal},
    sync::mpsc,
};

use crate::{
    config::Config,
    engine::SurveyEngine,
    error::{SurveyError, internal_error, invalid_request},
    protocol::{ClientRequest, error_reply, ok_reply, parse_client_request},
};

enum ExitReason {
    SocketMessage,
    Signal(&'static str),
}

pub async fn run(config: Config, engine: Arc<SurveyEngine>) -> Result<()> {
    prepare_socket_path(&config.socket_path)?;
    let listener = UnixListener::bind(&config.socket_path)
        .with_context(|| format!("unable to bind socket {}", config.socket_path.display()))?;

    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;
    let (exit_tx, mut exit_rx) = mpsc::unbounded_channel::<()>();

    tracing::info!(
        target: "server",
        socket = %config.socket_path.display(),
        strategy = engine.strategy().name(),
        "listening"
    );
    eprintln!(
        "conjointd listening on unix socket (NDJSON): {}",
        config.socket_path.display()
    );

    let exit_reason = loop {
        tokio::select! {
            _ = sigint.recv() => break ExitReason::Signal("SIGINT"),
            _ = sigterm.recv() => break ExitReason::Signal("SIGTERM"),
            Some(()) = exit_rx.recv() => break ExitReason::SocketMessage,
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, _)) => {
                        let engine = Arc::clone(&engine);
                        let exit_tx = exit_tx.clone();
                        tokio::spawn(async move {
                            if let Err(err) = handle_client(stream, engine, exit_tx).await {
                                tracing::warn!(target: "server", error = %format!("{err:#}"), "client_handling_failed");
                            }
                        });
                    }
                    Err(err) => tracing::warn!(target: "server", error = %err, "accept_failed"),
                }
            }
        }
    };

    cleanup_socket_path(&config.socket_path)?;
    match exit_reason {
        ExitReason::SocketMessage => {
            tracing::info!(target: "server", "stopped: received exit message");
        }
        ExitReason::Signal(signal_name) => {
            tracing::info!(target: "server", signal = signal_name, "stopped: received signal");
        }
    }

    Ok(())
}

async fn handle_client(
    stream: UnixStream,
    engine: Arc<SurveyEngine>,
    exit_tx: mpsc::UnboundedSender<()>,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = match parse_client_request(line) {
            Ok(ClientRequest::Exit) => {
                let _ = exit_tx.send(());
                break;
            }
            Ok(request) => dispatch(&engine, request),
            Err(err) => error_reply(&invalid_request(format!("malformed request: {err}"))),
        };

        write_half.write_all(reply.as_bytes()).await?;
        write_half.write_all(b"\n").await?;
    }

    Ok(())
}

fn dispatch(engine: &SurveyEngine, request: ClientRequest) -> String {
    let outcome = match request {
        ClientRequest::StartSession => engine.start_session().and_then(to_payload),
        ClientRequest::Respond {
            session_id,
            question_id,
            question_type,
            value,
        } => engine
            .respond(session_id, &question_id, question_type, &value)
            .and_then(|question| to_payload(serde_json::json!({ "question": question }))),
        ClientRequest::GetRound {
            session_id,
            round_number,
        } => engine.get_round(session_id, round_number).and_then(to_payload),
        ClientRequest::SubmitChoice {
            session_id,
            round_number,
            choice,
            response_time_ms,
        } => engine
            .submit_choice(session_id, round_number, choice, response_time_ms)
            .and_then(to_payload),
        ClientRequest::GetResults { session_id } => {
            engine.get_results(session_id).and_then(to_payload)
        }
        // Exit never reaches dispatch; the connection loop intercepts it.
        ClientRequest::Exit => to_payload(serde_json::json!({ "exiting": true })),
    };

    match outcome {
        Ok(payload) => ok_reply(payload),
        Err(err) => error_reply(&err),
    }
}

fn to_payload<T: serde::Serialize>(value: T) -> Result<Value, SurveyError> {
    serde_json::to_value(value)
        .map_err(|err| internal_error(format!("failed to serialize reply: {err}")))
}

fn prepare_socket_path(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("unable to create {}", parent.display()))?;
    }

    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            if metadata.file_type().is_socket() || metadata.is_file() {
                fs::remove_file(path)
                    .with_context(|| format!("unable to remove stale socket {}", path.display()))?;
            } else {
                bail!(
                    "socket path exists but is not removable as file/socket: {}",
                    path.display()
                );
            }
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("unable to inspect {}", path.display()));
        }
    }

    Ok(())
}

fn cleanup_socket_path(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => {
            Err(err).with_context(|| format!("unable to remove socket {}", path.display()))
        }
    }
}
