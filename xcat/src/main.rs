use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{debug, info, warn};
use parking_lot::Mutex;
use xhandle::{
    Charset, ChunkDecoder, Context, Error, EventLoop, Handle, HandleConfig, Host, ReadCallback,
    ReadEvent, ReadableStreamHandle, RuntimeConfig, WritableStreamHandle, WriteEvent, DEFAULT_READ_CHUNK_SIZE,
};

/// Copy a file or stdin to stdout, converting between charsets.
#[derive(Parser, Debug)]
#[command(name = "xcat", version, about)]
struct Args {
    /// Charset of the input
    #[arg(short, long, default_value = "utf-8")]
    from: String,

    /// Charset of the output
    #[arg(short, long, default_value = "utf-8")]
    to: String,

    /// Bytes requested per blocking read
    #[arg(long, default_value_t = DEFAULT_READ_CHUNK_SIZE)]
    chunk_size: usize,

    /// Input file; stdin when omitted
    file: Option<PathBuf>,
}

type Output = Arc<Mutex<WritableStreamHandle<io::Stdout>>>;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("xcat: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> xhandle::Result<()> {
    let from = Charset::for_label(&args.from)?;
    let to = Charset::for_label(&args.to)?;
    if !to.can_encode() {
        return Err(Error::with_message(
            xhandle::ErrorKind::UnsupportedCharset,
            format!("cannot encode output as {}", to),
        ));
    }

    let input: Box<dyn Read + Send> = match &args.file {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin()),
    };
    info!("converting {} -> {}", from, to);

    let runtime = RuntimeConfig::new().build()?;
    let result = runtime.block_on(pump(input, args.chunk_size, from, to));

    // A read parked on stdin must not hold up exit.
    runtime.shutdown_background();
    result
}

async fn pump(
    input: Box<dyn Read + Send>,
    chunk_size: usize,
    from: Charset,
    to: Charset,
) -> xhandle::Result<()> {
    let mut event_loop = EventLoop::new();
    let host = Host::for_loop(&event_loop)?;
    let config = HandleConfig::new().with_read_chunk_size(chunk_size);
    let mut reader = ReadableStreamHandle::with_config(host, input, config);

    let output: Output = Arc::new(Mutex::new(WritableStreamHandle::new(io::stdout())));
    let failure = Arc::new(Mutex::new(None));
    let callback = transcoder(from, to, Arc::clone(&output), Arc::clone(&failure));
    reader.start_reading(Context::none(), callback)?;

    tokio::select! {
        tasks = event_loop.run() => debug!("input drained after {} callbacks", tasks),
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            reader.stop_reading()?;
        }
    }

    reader.close();
    output.lock().close();
    match failure.lock().take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Read callback that decodes each chunk as it arrives and writes it back
/// out re-encoded.
fn transcoder(
    from: Charset,
    to: Charset,
    output: Output,
    failure: Arc<Mutex<Option<Error>>>,
) -> ReadCallback {
    let decoder = Mutex::new(Some(ChunkDecoder::new(from)));

    Arc::new(move |event: ReadEvent| {
        let mut decoder = decoder.lock();
        let text = match &event.data {
            Some(data) => match decoder.as_mut() {
                Some(session) => {
                    session.push(data);
                    session.take()
                }
                None => return,
            },
            None => match decoder.take() {
                Some(session) => session.finish(),
                None => return,
            },
        };

        let mut out = output.lock();
        if !text.is_empty() {
            let errors = Arc::clone(&failure);
            let written = out.write_text(
                &text,
                to,
                Context::none(),
                Box::new(move |event: WriteEvent| {
                    if let Some(e) = event.error {
                        warn!("write to stdout failed: {}", e);
                        errors.lock().get_or_insert(e);
                    }
                }),
            );
            if let Err(e) = written {
                failure.lock().get_or_insert(e);
            }
        }

        if let Some(error) = event.error {
            if !error.is_eof() {
                warn!("read failed: {}", error);
                failure.lock().get_or_insert(error);
            }
            out.close();
        }
    })
}
