// Accepts RTMP publishers on :1935 and writes every incoming stream to
// ./test.flv, mirroring the FLV-recording example the engine was grounded on.
//
// Usage:
//   cargo run --example simple_server

use log::info;
use rtmp::{Result, ServerConfig, Session};
use std::fs::File;
use std::io::Write;
use std::sync::Mutex;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::builder().build()?;
    rtmp::init_logging(&config)?;

    info!("starting RTMP server on {}", config.bind_addr);
    info!("recording every published stream to ./test.flv");

    tokio::spawn(rtmp::run(config, |_config| {
        let file = Mutex::new(File::create("test.flv").expect("create test.flv"));
        Session::new(
            move |_meta, event| {
                file.lock().unwrap().write_all(event.bytes)?;
                Ok(())
            },
            |meta, err| match err {
                Some(e) => log::warn!("stream {} closed: {}", meta.stream_name, e),
                None => log::info!("stream {} closed", meta.stream_name),
            },
        )
    }));

    info!("press 'q' then Enter to stop");
    let mut line = String::new();
    loop {
        line.clear();
        std::io::stdin().read_line(&mut line)?;
        if line.trim() == "q" {
            break;
        }
    }

    Ok(())
}
