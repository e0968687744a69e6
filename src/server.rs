//! TCP server for the name-set protocol.
//!
//! Accepts connections, greets each client, and runs one read/dispatch/write
//! loop per connection against the shared store.

use crate::framer::LineFramer;
use crate::protocol::{is_valid_name, Command, ParseError, Response};
use crate::store::{Store, StoreResult};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, trace};

/// Server instance
pub struct Server {
    listener: TcpListener,
    store: Arc<Store>,
}

impl Server {
    /// Bind the listening address. Use port 0 for an ephemeral port.
    pub async fn bind(addr: &str, store: Arc<Store>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Server { listener, store })
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever, spawning one task per connection.
    ///
    /// There is no bound on concurrent connections; each task holds only its
    /// own transport and buffer, so a slow peer never blocks the others.
    pub async fn run(self) -> std::io::Result<()> {
        info!(address = %self.local_addr()?, "Server listening");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    debug!(peer = %addr, "New connection");

                    let store = Arc::clone(&self.store);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, store).await {
                            debug!(peer = %addr, error = %e, "Connection error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

/// Handle a single client connection.
///
/// Sends the greeting, then reads one line at a time, dispatches it, and
/// writes exactly one response line. Returns silently on end of stream and
/// closes after replying to QUIT.
async fn handle_connection(mut stream: TcpStream, store: Arc<Store>) -> std::io::Result<()> {
    let mut framer = LineFramer::new();

    LineFramer::write_line(&mut stream, Response::greeting()).await?;

    loop {
        let line = match framer.read_line(&mut stream).await? {
            Some(line) => line,
            None => {
                // Peer is gone; no response attempted.
                trace!("Connection closed by client");
                return Ok(());
            }
        };

        let parsed = Command::parse(&line);
        trace!(line = %line, "Processing command");
        let reply = execute_command(&parsed, &store);
        LineFramer::write_line(&mut stream, &reply).await?;

        if matches!(parsed, Ok(Command::Quit)) {
            return Ok(());
        }
    }
}

/// Execute one parsed command against the store and format the response.
fn execute_command(parsed: &Result<Command, ParseError>, store: &Store) -> String {
    let command = match parsed {
        Ok(command) => command,
        Err(e) => return Response::err(&e.to_string()),
    };

    match command {
        Command::Help => Response::help().to_string(),

        Command::List => Response::list(&store.list()),

        Command::Add { name } => {
            if !is_valid_name(name) {
                return Response::invalid_name();
            }
            match store.add(name) {
                Ok(StoreResult::Added) => Response::added().to_string(),
                Ok(_) => Response::err("Name already exists."),
                Err(e) => {
                    error!(name = %name, error = %e, "ADD failed");
                    Response::server_error(&e)
                }
            }
        }

        Command::Del { name } => {
            if !is_valid_name(name) {
                return Response::invalid_name();
            }
            match store.delete(name) {
                Ok(StoreResult::Deleted) => Response::deleted().to_string(),
                Ok(_) => Response::err("Name not found."),
                Err(e) => {
                    error!(name = %name, error = %e, "DEL failed");
                    Response::server_error(&e)
                }
            }
        }

        Command::Quit => Response::bye().to_string(),
    }
}
