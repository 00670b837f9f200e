use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use serial_io::config::{ConfigLoader, LogFormat};
use serial_io::{
    logging, BaudRate, Framing, Payload, Request, RequestKind, SerialIo, TransferMode, WriteValue,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "serial-io",
    version,
    about = "Read from and write to serial devices through the serial-io engine."
)]
struct Cli {
    /// Configuration file (overrides the standard search path).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "serial_io=trace". RUST_LOG takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format.
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available serial devices in index order.
    List {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Queue reads on the worker and print each response as it arrives.
    Read {
        #[command(flatten)]
        device: DeviceArgs,

        /// What to read.
        #[arg(long, value_enum, default_value_t = KindArg::Line)]
        kind: KindArg,

        /// Items per read.
        #[arg(long, default_value_t = 1)]
        count: usize,

        /// Number of reads to queue.
        #[arg(long, default_value_t = 1)]
        repeat: usize,

        /// Give up after this long without a response.
        #[arg(long, default_value_t = 2000)]
        timeout_ms: u64,

        /// Print responses as JSON lines.
        #[arg(long)]
        json: bool,
    },
    /// Write values synchronously.
    Write {
        #[command(flatten)]
        device: DeviceArgs,

        /// Treat the values as integers of this many bytes (1, 2, 4 or 8).
        #[arg(long, conflicts_with = "floats")]
        int_size: Option<i64>,

        /// Treat the values as floats.
        #[arg(long)]
        floats: bool,

        /// Append a newline after text values.
        #[arg(long)]
        newline: bool,

        /// Values to write. Without --int-size or --floats they are sent as
        /// text joined by spaces.
        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<String>,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Args, Debug)]
struct DeviceArgs {
    /// Device path, alias from the config file, or index into `list`.
    #[arg(short, long)]
    port: String,

    /// Line rate. Defaults to the configured rate.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Wire framing.
    #[arg(short, long, value_enum, default_value_t = FramingArg::Ascii)]
    framing: FramingArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FramingArg {
    Ascii,
    Binary,
}

impl From<FramingArg> for Framing {
    fn from(arg: FramingArg) -> Self {
        match arg {
            FramingArg::Ascii => Framing::Ascii,
            FramingArg::Binary => Framing::Binary,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Line,
    Byte,
    Int,
    Float,
}

impl From<KindArg> for RequestKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Line => RequestKind::Line,
            KindArg::Byte => RequestKind::Byte,
            KindArg::Int => RequestKind::Int,
            KindArg::Float => RequestKind::Float,
        }
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let mut loader = match &cli.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    if let Some(level) = &cli.log_level {
        loader.config.logging.level = level.clone();
    }
    if let Some(format) = cli.log_format {
        loader.config.logging.format = format;
    }
    logging::init(&loader.config.logging);

    match cli.command {
        Command::List { json } => list(&loader, json),
        Command::Read {
            device,
            kind,
            count,
            repeat,
            timeout_ms,
            json,
        } => {
            let mut io = open(&loader, &device)?;
            read(&mut io, kind.into(), count, repeat, Duration::from_millis(timeout_ms), json)
        }
        Command::Write {
            device,
            int_size,
            floats,
            newline,
            values,
        } => {
            let mut io = open(&loader, &device)?;
            io.try_set_mode(TransferMode::Sync)?;
            let value = parse_write_value(&values, int_size, floats, newline)?;
            io.try_write(&value)?;
            io.try_flush()?;
            Ok(())
        }
        Command::Config => {
            print!("{}", loader.to_toml()?);
            Ok(())
        }
    }
}

fn list(loader: &ConfigLoader, as_json: bool) -> CliResult<()> {
    let io = SerialIo::from_config(loader.config());
    let devices = io.try_list_devices()?;
    if as_json {
        let entries: Vec<_> = devices
            .iter()
            .enumerate()
            .map(|(index, path)| json!({ "index": index, "path": path }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if devices.is_empty() {
        println!("no serial devices found");
    } else {
        for (index, path) in devices.iter().enumerate() {
            println!("[{index}] {path}");
        }
    }
    Ok(())
}

fn open(loader: &ConfigLoader, args: &DeviceArgs) -> CliResult<SerialIo> {
    let config = loader.config();
    let mut io = SerialIo::from_config(config);
    let framing = args.framing.into();
    let baud = match args.baud {
        Some(rate) => BaudRate::try_from(rate)?,
        None => config.serial.port_configuration().baud_rate,
    };

    match args.port.parse::<usize>() {
        Ok(index) => io.try_open(index, framing, baud)?,
        Err(_) => {
            let path = config.serial.resolve_port(&args.port);
            io.try_open_path_at(&path, framing, baud)?
        }
    }
    Ok(io)
}

fn read(
    io: &mut SerialIo,
    kind: RequestKind,
    count: usize,
    repeat: usize,
    timeout: Duration,
    as_json: bool,
) -> CliResult<()> {
    let mut seen = io.notifier().generation();
    for _ in 0..repeat {
        io.try_submit_read(kind, count)?;
    }

    let mut remaining = repeat;
    let mut deadline = Instant::now() + timeout;
    while remaining > 0 {
        while let Some(response) = io.take_response() {
            print_response(&response, as_json)?;
            remaining -= 1;
            deadline = Instant::now() + timeout;
        }
        if remaining == 0 {
            break;
        }
        let wait = deadline.saturating_duration_since(Instant::now());
        match io.notifier().wait_timeout(seen, wait) {
            Some(generation) => seen = generation,
            None if io.pending_responses() == 0 => {
                return Err(format!("timed out with {remaining} read(s) outstanding").into());
            }
            None => {}
        }
    }
    Ok(())
}

fn print_response(response: &Request, as_json: bool) -> CliResult<()> {
    let value = match &response.payload {
        Payload::Empty => json!(null),
        Payload::Byte(b) => json!(b),
        Payload::Bytes(b) => json!(b),
        Payload::Ints(v) => json!(v),
        Payload::Floats(v) => json!(v),
        Payload::Text(s) => json!(s),
    };
    if as_json {
        let line = json!({
            "kind": response.kind.to_string(),
            "status": format!("{:?}", response.status).to_lowercase(),
            "requested": response.requested_count,
            "actual": response.actual_count,
            "value": value,
        });
        println!("{}", serde_json::to_string(&line)?);
    } else if response.is_success() {
        match &response.payload {
            Payload::Text(s) => println!("{s}"),
            _ => println!("{value}"),
        }
    } else {
        eprintln!("{} read: {:?}", response.kind, response.status);
    }
    Ok(())
}

fn parse_write_value(
    values: &[String],
    int_size: Option<i64>,
    floats: bool,
    newline: bool,
) -> CliResult<WriteValue> {
    if let Some(size) = int_size {
        let width = serial_io::IntWidth::from_bytes(size)
            .ok_or(serial_io::SerialIoError::InvalidWriteWidth(size))?;
        let values = values
            .iter()
            .map(|v| v.parse::<i64>())
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(WriteValue::Ints { values, width });
    }
    if floats {
        let values = values
            .iter()
            .map(|v| v.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(WriteValue::Floats(values));
    }
    let mut text = values.join(" ");
    if newline {
        text.push('\n');
    }
    Ok(WriteValue::Text(text))
}
