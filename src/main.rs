use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use relaybus::codec::CodecRegistry;
use relaybus::config::load_config;
use relaybus::dispatch::EventRegistry;
use relaybus::server::NetworkServer;
use relaybus::utils::logging;

#[tokio::main]
async fn main() {
    let settings = load_config().expect("Failed to load configuration");
    logging::init(&settings.logging.level);

    let codecs = Arc::new(CodecRegistry::new());
    let events = Arc::new(EventRegistry::new());
    let server = NetworkServer::new(&settings, codecs, events);
    server.initialize();
    if !server.start().await {
        std::process::exit(1);
    }

    // The process owns shutdown: a "stop" line on stdin winds the server down.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim() == "stop" {
            break;
        }
    }
    server.shutdown().await;
}
