//! Per-connection driver.
//!
//! Runs the animation loop for one client: negotiates character mode,
//! switches to the alternate screen, then redraws after every tick, key
//! press and resize until the client quits, disconnects, times out or the
//! server shuts down. The visitor pipeline for the connection is spawned up
//! front and released once the loop ends.

use std::future::pending;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, info};

use super::telnet::{TelnetParser, NEGOTIATION};
use crate::core::{AnimationSettings, Cmd, Command, Model};
use crate::ui::{AnsiRenderer, Compositor, KeyMapper, ViewConfig};
use crate::visitor::{GeoLookup, NotificationSink, Visit, VisitorWatch};

/// State shared by every session of a server
pub struct SessionContext<G, S> {
    pub view: ViewConfig,
    pub settings: AnimationSettings,
    pub watch: Arc<VisitorWatch<G, S>>,
}

/// Longest a single write may stall before the client is dropped
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Quit,
    Disconnected,
    Shutdown,
}

/// Serve one connection until it ends, then wait for its visitor pipeline
pub async fn run<T, G, S>(
    stream: T,
    peer: SocketAddr,
    ctx: Arc<SessionContext<G, S>>,
    mut shutdown: watch::Receiver<bool>,
) -> io::Result<()>
where
    T: AsyncRead + AsyncWrite + Send + Unpin,
    G: GeoLookup,
    S: NotificationSink,
{
    info!(%peer, "connected");

    let visit = Visit::begin(peer.ip());
    let (ended, ended_rx) = watch::channel(false);
    let pipeline = tokio::spawn(ctx.watch.clone().run(visit, ended_rx));

    let result = drive(stream, &ctx, &mut shutdown).await;
    let _ = ended.send(true);

    match &result {
        Ok(exit) => info!(%peer, reason = ?exit, "disconnected"),
        Err(e) => info!(%peer, error = %e, "connection lost"),
    }

    match pipeline.await {
        Ok(outcome) => debug!(
            %peer,
            classification = %outcome.classification(),
            ?outcome,
            "visitor pipeline finished"
        ),
        Err(e) => debug!(%peer, error = %e, "visitor pipeline aborted"),
    }

    result.map(|_| ())
}

async fn drive<T, G, S>(
    stream: T,
    ctx: &SessionContext<G, S>,
    shutdown: &mut watch::Receiver<bool>,
) -> io::Result<Exit>
where
    T: AsyncRead + AsyncWrite + Send + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);

    let started = Instant::now();
    // Writes never outlive the session ceiling, even for a client that
    // stopped reading
    let session_end = started + ctx.settings.session_timeout;

    let mut setup = NEGOTIATION.to_vec();
    queue!(setup, EnterAlternateScreen, Hide)?;
    if !send(&mut writer, &setup, write_deadline(session_end)).await? {
        return Ok(Exit::Disconnected);
    }

    let mut rng = StdRng::from_entropy();
    let mut model = Model::new(ctx.settings, &ctx.view.pages, &mut rng, started.into_std());
    let renderer = AnsiRenderer;
    let compositor = Compositor::new(&renderer, &ctx.view);
    let mut telnet = TelnetParser::new();
    let mut next_tick = schedule(model.init(), None);
    let mut buf = [0u8; 1024];

    let exit = loop {
        let frame = frame(&compositor.view(&model))?;
        if !send(&mut writer, &frame, write_deadline(session_end)).await? {
            break Exit::Disconnected;
        }

        let commands = tokio::select! {
            _ = wait_until(next_tick) => vec![Command::Tick(Instant::now().into_std())],
            read = reader.read(&mut buf) => {
                let n = match read {
                    Ok(0) => break Exit::Disconnected,
                    Ok(n) => n,
                    Err(e) if is_hangup(&e) => break Exit::Disconnected,
                    Err(e) => return Err(e),
                };
                let parsed = telnet.feed(&buf[..n]);
                let mut commands: Vec<Command> = parsed
                    .resizes
                    .into_iter()
                    .map(|(width, height)| Command::Resize { width, height })
                    .collect();
                commands.extend(KeyMapper::commands(&parsed.data));
                commands
            }
            _ = shutdown.changed() => break Exit::Shutdown,
        };

        let mut quit = false;
        for command in commands {
            let is_tick = matches!(command, Command::Tick(_));
            match model.update(command) {
                Cmd::Quit => {
                    quit = true;
                    break;
                }
                cmd => {
                    if is_tick {
                        next_tick = schedule(cmd, None);
                    } else {
                        next_tick = schedule(cmd, next_tick);
                    }
                }
            }
        }
        if quit {
            break Exit::Quit;
        }
    };

    if exit != Exit::Disconnected {
        let mut teardown = Vec::new();
        queue!(teardown, Show, LeaveAlternateScreen)?;
        send(&mut writer, &teardown, Instant::now() + WRITE_TIMEOUT).await?;
    }
    Ok(exit)
}

/// Next tick deadline after `cmd`, keeping `current` when nothing new is asked
fn schedule(cmd: Cmd, current: Option<Instant>) -> Option<Instant> {
    match cmd {
        Cmd::Tick(delay) => Some(Instant::now() + delay),
        Cmd::None | Cmd::Quit => current,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

/// Bytes for one frame drawn from the top-left corner
fn frame(view: &str) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(view.len() + 64);
    queue!(out, MoveTo(0, 0))?;
    out.extend_from_slice(view.replace('\n', "\r\n").as_bytes());
    queue!(out, Clear(ClearType::FromCursorDown))?;
    Ok(out)
}

fn write_deadline(session_end: Instant) -> Instant {
    (Instant::now() + WRITE_TIMEOUT).min(session_end)
}

/// Write and flush `bytes`, returning whether the client is still there.
/// A hang-up, or a write still pending at `deadline`, means it is not.
async fn send<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8], deadline: Instant) -> io::Result<bool> {
    let write = async {
        writer.write_all(bytes).await?;
        writer.flush().await
    };
    match timeout_at(deadline, write).await {
        Ok(Ok(())) => Ok(true),
        Ok(Err(e)) if is_hangup(&e) => Ok(false),
        Ok(Err(e)) => Err(e),
        Err(_) => Ok(false),
    }
}

fn is_hangup(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof
    )
}
