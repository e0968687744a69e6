//! Interactive console client.
//!
//! Reads commands from stdin one line at a time, sends each to the server,
//! and prints the one-line reply. Blank input is skipped locally; the
//! session ends after QUIT or when either side closes.

use crate::config::ClientArgs;
use crate::framer::LineFramer;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::warn;

pub async fn run(args: &ClientArgs) -> std::io::Result<()> {
    let mut stream = TcpStream::connect(&args.server).await?;
    let mut framer = LineFramer::new();

    // The greeting is the first line on every connection.
    match framer.read_line(&mut stream).await? {
        Some(greeting) => println!("{}", greeting),
        None => {
            eprintln!("Server closed the connection before greeting");
            return Ok(());
        }
    }

    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut input = String::new();

    loop {
        input.clear();
        let bytes = stdin.read_line(&mut input).await?;
        if bytes == 0 {
            break;
        }

        let command = input.trim();
        if command.is_empty() {
            continue;
        }

        LineFramer::write_line(&mut stream, command).await?;

        match framer.read_line(&mut stream).await? {
            Some(reply) => println!("{}", reply),
            None => {
                eprintln!("Server closed the connection");
                break;
            }
        }

        if command.eq_ignore_ascii_case("QUIT") {
            break;
        }
    }

    if let Err(e) = stream.shutdown().await {
        warn!(error = %e, "Failed to shut down connection cleanly");
    }

    Ok(())
}
