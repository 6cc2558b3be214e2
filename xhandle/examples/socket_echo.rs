//! Echo server over a Unix socket pair.
//!
//! This example shows how to:
//! - Build a host from an event loop and the tokio blocking pool
//! - Read a socket through a readable handle
//! - Answer through a writable handle on the same socket
//!
//! Run with: cargo run -p xhandle --example socket_echo

use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use xhandle::{
    codec, Charset, Context, EventLoop, Handle, Host, Interrupter, ReadEvent,
    ReadableStreamHandle, RuntimeConfig, WritableStreamHandle, WriteEvent,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    println!("=== XHandle Socket Echo Example ===\n");

    let (ours, mut peer) = UnixStream::pair()?;

    // The peer sends two lines, half-closes, then prints whatever comes back.
    let client = thread::spawn(move || -> std::io::Result<String> {
        peer.write_all(b"hello\n")?;
        peer.write_all(b"xhandle\n")?;
        peer.shutdown(Shutdown::Write)?;

        let mut answer = String::new();
        peer.read_to_string(&mut answer)?;
        Ok(answer)
    });

    let runtime = RuntimeConfig::new().build()?;
    runtime.block_on(async {
        let mut event_loop = EventLoop::new();
        let host = Host::for_loop(&event_loop)?;

        let writer = Arc::new(Mutex::new(WritableStreamHandle::new(ours.try_clone()?)));
        let mut reader = ReadableStreamHandle::new(host, ours.try_clone()?)
            .with_interrupter(Interrupter::unix(ours.try_clone()?));

        let sink = Arc::clone(&writer);
        reader.start_reading(
            Context::new("echo"),
            Arc::new(move |event: ReadEvent| {
                let mut writer = sink.lock();
                if let Some(data) = &event.data {
                    let text = codec::decode(data, Charset::utf8());
                    let reply = format!("echo: {}", text);
                    let _ = writer.write_text(
                        &reply,
                        Charset::utf8(),
                        event.context.clone(),
                        Box::new(|_: WriteEvent| {}),
                    );
                }
                if event.is_terminal() {
                    println!("read finished: {:?}", event.error);
                    if let Some(stream) = writer.get_ref() {
                        let _ = stream.shutdown(Shutdown::Write);
                    }
                    writer.close();
                }
            }),
        )?;

        let tasks = event_loop.run().await;
        println!("event loop ran {} callbacks", tasks);
        reader.close();
        Ok::<_, Box<dyn std::error::Error>>(())
    })?;

    let answer = client.join().map_err(|_| "client thread panicked")??;
    print!("{}", answer);
    Ok(())
}
