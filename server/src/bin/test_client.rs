use clap::Parser;
use pong_shared::input::encode_client_input;
use pong_shared::{encode_frame, CodecError, FrameDecoder, Framing, InputEvent, KeyCode, Message};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::sleep;

#[derive(Parser, Debug)]
#[clap(about = "Connects to a pong server, prints what it sends and presses a few keys")]
struct Args {
    /// Server address
    #[clap(short, long, default_value = "127.0.0.1:55555")]
    server: String,
    /// Frame boundaries on the wire: "newline" or "legacy"
    #[clap(long, default_value_t = Framing::Newline)]
    framing: Framing,
    /// Print every GAME_DATA snapshot instead of one per second
    #[clap(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("Connecting to {}", args.server);
    let stream = TcpStream::connect(&args.server).await?;
    println!("Connected from {}", stream.local_addr()?);
    let (mut reader, mut writer) = stream.into_split();

    // Print everything the server sends
    let framing = args.framing;
    let verbose = args.verbose;
    let printer = tokio::spawn(async move {
        let mut decoder = FrameDecoder::new(framing);
        let mut buf = vec![0u8; framing.read_buffer_size()];
        let mut snapshots = 0u64;

        loop {
            let len = match reader.read(&mut buf).await {
                Ok(0) => {
                    println!("Server closed the connection");
                    break;
                }
                Ok(len) => len,
                Err(e) => {
                    println!("Error reading from server: {}", e);
                    break;
                }
            };
            decoder.extend(&buf[..len]);

            loop {
                let frame = match decoder.next_frame() {
                    Ok(Some(frame)) => frame,
                    Ok(None) => break,
                    Err(CodecError::InvalidUtf8) => {
                        println!("Skipping non UTF-8 frame");
                        continue;
                    }
                    Err(e) => {
                        println!("Giving up on stream: {}", e);
                        return;
                    }
                };
                match frame.parse::<Message>() {
                    Ok(Message::GameData { player1_y, player2_y, balls }) => {
                        snapshots += 1;
                        if verbose || snapshots % 60 == 1 {
                            println!(
                                "Snapshot {}: paddles ({:.1}, {:.1}), {} balls {:?}",
                                snapshots,
                                player1_y,
                                player2_y,
                                balls.len(),
                                balls
                            );
                        }
                    }
                    Ok(message) => println!("Received: {:?}", message),
                    Err(e) => println!("Unparsed frame {:?}: {}", frame, e),
                }
            }
        }
    });

    // Scripted key sequence: paddle 1 up, paddle 2 down, then release both
    let script = [
        vec![InputEvent::KeyDown(KeyCode::new('W'))],
        vec![InputEvent::KeyDown(KeyCode::new('K'))],
        vec![
            InputEvent::KeyUp(KeyCode::new('W')),
            InputEvent::KeyUp(KeyCode::new('K')),
        ],
        vec![InputEvent::KeyDown(KeyCode::new('S'))],
        vec![InputEvent::KeyUp(KeyCode::new('S'))],
        vec![InputEvent::PowerUpRequest],
    ];

    for events in script {
        let message = encode_client_input(&events);
        println!("Sending input: {}", message);
        writer.write_all(&encode_frame(&message, framing)).await?;
        sleep(Duration::from_millis(500)).await;
    }

    // Watch the match a little longer before leaving
    sleep(Duration::from_secs(5)).await;
    writer.shutdown().await?;
    printer.abort();

    println!("Test client finished");
    Ok(())
}
