//! `stride serve`: JSON-lines request loop
//!
//! Requests are handled one at a time on the loop task, so buffer edits and
//! accept/skip never interleave. Prediction runs on the blocking pool and
//! reports back through a channel; results for an outdated buffer version
//! are dropped.

use crate::protocol::{Envelope, Reply, Request, Response, SuggestionView};
use anyhow::{Context, Result};
use stride_adapters::config::Config;
use stride_core::{
    predict_batch, AcceptOutcome, Buffer, Language, Prediction, Session, Span, TextEdit,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A prediction job that finished on the blocking pool.
#[derive(Debug)]
struct Finished {
    id: Option<u64>,
    result: std::result::Result<Prediction, String>,
}

enum Step {
    Reply(Reply),
    /// Reply follows once the prediction job completes
    Deferred,
    Shutdown(Reply),
}

struct Server {
    session: Session,
    jobs: mpsc::Sender<Finished>,
}

impl Server {
    fn new(config: &Config, jobs: mpsc::Sender<Finished>) -> Self {
        let session = Session::new(Buffer::new(""), config.matcher_config())
            .with_token_merging(config.merge_within_token);
        Self { session, jobs }
    }

    fn handle_line(&mut self, line: &str) -> Step {
        match serde_json::from_str::<Envelope>(line) {
            Ok(envelope) => self.handle(envelope),
            Err(err) => {
                warn!("unreadable request: {}", err);
                Step::Reply(Reply::error(None, format!("invalid request: {}", err)))
            }
        }
    }

    fn handle(&mut self, envelope: Envelope) -> Step {
        let Envelope { id, request } = envelope;
        debug!(id, request = request.label(), "request");
        let response = match request {
            Request::Open {
                path,
                language,
                text,
            } => {
                let mut buffer = match path {
                    Some(path) => Buffer::from_path(path, text),
                    None => Buffer::new(text),
                };
                if let Some(name) = language {
                    buffer.set_language(Language::from_name(&name));
                }
                info!(language = buffer.language().name(), "opened buffer");
                self.session.open(buffer);
                self.ok()
            }
            Request::Begin => {
                self.session.begin_editing();
                self.ok()
            }
            Request::Edit { start, end, text } => {
                if end < start {
                    return Step::Reply(Reply::error(
                        id,
                        format!("edit range {}..{} is reversed", start, end),
                    ));
                }
                match self.session.edit(TextEdit::replace(Span::new(start, end), text)) {
                    Ok(_) => self.ok(),
                    Err(err) => Response::Error {
                        message: err.to_string(),
                    },
                }
            }
            Request::Finish => return self.finish(id),
            Request::Current => self.current(),
            Request::Accept => match self.session.accept() {
                Ok(AcceptOutcome::Applied { suggestion, .. }) => Response::Applied {
                    id: suggestion.id,
                    text: self.session.buffer().text().to_string(),
                    version: self.session.buffer().version(),
                    remaining: self.session.queue().len(),
                },
                Ok(AcceptOutcome::Exhausted) => Response::Exhausted,
                Err(err) => Response::Error {
                    message: err.to_string(),
                },
            },
            Request::Skip => {
                self.session.skip();
                self.current()
            }
            Request::Clear => {
                self.session.clear();
                self.ok()
            }
            Request::Shutdown => return Step::Shutdown(Reply::new(id, self.ok())),
        };
        Step::Reply(Reply::new(id, response))
    }

    fn ok(&self) -> Response {
        Response::Ok {
            version: self.session.buffer().version(),
        }
    }

    fn current(&mut self) -> Response {
        let Some((suggestion, preview)) = self.session.current_preview() else {
            return Response::Suggestion {
                item: None,
                preview: None,
                rendered: None,
            };
        };
        let suggestion = suggestion.clone();
        let buffer = self.session.buffer();
        let rendered = self.session.engine().render_line(&suggestion, buffer);
        Response::Suggestion {
            item: Some(SuggestionView::new(&suggestion, buffer)),
            preview: Some(preview),
            rendered,
        }
    }

    /// Close the editing session and start matching off the loop task.
    fn finish(&mut self, id: Option<u64>) -> Step {
        let version = self.session.buffer().version();
        let Some(batch) = self.session.take_batch() else {
            return Step::Reply(Reply::new(
                id,
                Response::Suggestions {
                    version,
                    items: Vec::new(),
                    stale: false,
                },
            ));
        };

        let matcher = self.session.matcher().clone();
        let engine = self.session.engine().clone();
        let language = self.session.buffer().language();
        let jobs = self.jobs.clone();
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || {
                predict_batch(&matcher, &engine, &batch, language, version)
            })
            .await
            .map_err(|err| format!("prediction failed: {}", err));
            if jobs.send(Finished { id, result }).await.is_err() {
                debug!("server stopped before prediction finished");
            }
        });
        Step::Deferred
    }

    fn complete(&mut self, finished: Finished) -> Reply {
        let prediction = match finished.result {
            Ok(prediction) => prediction,
            Err(message) => return Reply::error(finished.id, message),
        };
        let version = prediction.version;
        let stale = !self.session.accept_prediction(prediction);
        let buffer = self.session.buffer();
        let items = if stale {
            Vec::new()
        } else {
            self.session
                .queue()
                .iter()
                .map(|s| SuggestionView::new(s, buffer))
                .collect()
        };
        Reply::new(
            finished.id,
            Response::Suggestions {
                version,
                items,
                stale,
            },
        )
    }
}

/// Serve requests from stdin until `shutdown` or end of input.
pub async fn serve(config: &Config) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    run(stdin, tokio::io::stdout(), config).await
}

pub async fn run<R, W>(reader: R, mut writer: W, config: &Config) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::channel::<Finished>(16);
    let mut server = Server::new(config, tx);
    let mut lines = reader.lines();
    let mut input_open = true;
    let mut in_flight = 0usize;

    info!("stride server ready");
    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                let Some(line) = line.context("Failed to read request")? else {
                    input_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match server.handle_line(&line) {
                    Step::Reply(reply) => write_reply(&mut writer, &reply).await?,
                    Step::Deferred => in_flight += 1,
                    Step::Shutdown(reply) => {
                        write_reply(&mut writer, &reply).await?;
                        break;
                    }
                }
            }
            Some(finished) = rx.recv(), if in_flight > 0 => {
                in_flight -= 1;
                let reply = server.complete(finished);
                write_reply(&mut writer, &reply).await?;
            }
            else => break,
        }
    }
    info!("stride server stopped");
    Ok(())
}

async fn write_reply<W: AsyncWrite + Unpin>(writer: &mut W, reply: &Reply) -> Result<()> {
    let mut line = serde_json::to_string(reply).context("Failed to encode reply")?;
    line.push('\n');
    writer
        .write_all(line.as_bytes())
        .await
        .context("Failed to write reply")?;
    writer.flush().await.context("Failed to flush reply")?;
    Ok(())
}
