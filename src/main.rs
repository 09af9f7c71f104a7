use std::{
    io::{stdin, stdout, BufWriter, Cursor, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context};
use clap::Parser;
use sawyer_chunk::{ChunkReader, DecodedChunk, Limits};
use tap::Pipe;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use zerocopy::{Immutable, IntoBytes, LittleEndian, U32, U64};

/// Record written in front of every extracted chunk.
#[derive(Debug, Clone, IntoBytes, Immutable)]
#[repr(C)]
struct BinHeader {
    pub index: U32<LittleEndian>,
    pub encoding: u8,
    pub length: U64<LittleEndian>,
}

#[derive(Debug, Parser)]
struct Cli {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,

    /// List chunk headers
    #[arg(short)]
    pub list: bool,

    /// Extract decoded chunks
    #[arg(short = 'x')]
    pub extract: bool,

    /// Treat the input as a headerless track design
    #[arg(short)]
    pub track: bool,

    #[arg(short)]
    pub verbose: bool,

    #[arg(long)]
    pub max_chunk_size: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish()
        .pipe(tracing::subscriber::set_global_default)?;

    ensure!(
        args.list != args.extract || !args.list,
        "Must be specified only a single operation!"
    );
    ensure!(
        args.list != args.extract || args.list,
        "Operation must be specified!"
    );
    ensure!(!args.track || args.extract, "Track mode only applies to extraction");

    let limits = args.max_chunk_size.map(Limits::new).unwrap_or_default();
    let input = read_input(args.input.as_deref())?;
    let mut reader = ChunkReader::with_limits(Cursor::new(input), limits);

    if args.list {
        let mut writer = stdout().lock();
        list(&mut reader, &mut writer)?;
        writer.flush()?;
    } else {
        extract_file(&mut reader, args.output, args.track)?;
    }

    Ok(())
}

/// Whole input in memory, since stdin cannot seek.
fn read_input(input: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match input {
        Some(path) => std::fs::read(path).with_context(|| format!("Unable to read {}", path.display())),
        None => {
            let mut buf = vec![];
            stdin().read_to_end(&mut buf).context("Unable to read stdin")?;
            Ok(buf)
        }
    }
}

fn list(reader: &mut ChunkReader<Cursor<Vec<u8>>>, mut writer: impl Write) -> anyhow::Result<usize> {
    let total = reader.get_ref().get_ref().len() as u64;
    let mut count = 0;

    while reader.position()? < total {
        let offset = reader.position()?;
        let header = reader
            .skip_chunk()
            .with_context(|| format!("Unable to skip chunk {count} at offset {offset}"))?;

        let encoding = header
            .encoding()
            .map(|x| format!("{x:?}"))
            .unwrap_or_else(|_| format!("unknown({})", header.encoding));
        writeln!(writer, "{count:>4} {offset:>10} {encoding:<14} {}", header.length())?;

        count += 1;
    }

    info!(chunks = count, "listed chunks");
    Ok(count)
}

fn extract_file(
    reader: &mut ChunkReader<Cursor<Vec<u8>>>,
    output: Option<PathBuf>,
    track: bool,
) -> anyhow::Result<()> {
    let mut writer: Box<dyn Write> = if let Some(output) = output.as_ref() {
        std::fs::File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(output)?
            .pipe(BufWriter::new)
            .pipe(Box::new)
    } else {
        Box::new(stdout())
    };

    let result = extract(reader, &mut writer, track)
        .and_then(|written| writer.flush().map(|_| written).context("Unable to flush output"));
    drop(writer);

    let written = result
        .context("Unable to extract chunks")
        .inspect_err(|_| {
            if let Some(output) = output.as_ref() {
                std::fs::remove_file(output).inspect_err(|e| warn!("{e}")).ok();
            }
        })?;

    info!(bytes = written, "extraction finished");
    Ok(())
}

fn extract(
    reader: &mut ChunkReader<Cursor<Vec<u8>>>,
    mut writer: impl Write,
    track: bool,
) -> anyhow::Result<u64> {
    if track {
        let chunk = reader.read_chunk_track().context("Unable to decode track data")?;
        return write_record(&mut writer, 0, &chunk);
    }

    let total = reader.get_ref().get_ref().len() as u64;
    let mut total_written = 0u64;
    let mut index = 0u32;

    while reader.position()? < total {
        let header = reader
            .peek_header()
            .with_context(|| format!("Unable to read header of chunk {index}"))?;
        let chunk = reader
            .read_chunk()
            .with_context(|| format!("Unable to decode chunk {index} ({header:?})"))?;

        total_written += write_record(&mut writer, index, &chunk)?;
        index += 1;
    }

    Ok(total_written)
}

fn write_record(mut writer: impl Write, index: u32, chunk: &DecodedChunk) -> anyhow::Result<u64> {
    let header = BinHeader {
        index: index.into(),
        encoding: chunk.encoding() as u8,
        length: (chunk.len() as u64).into(),
    };

    writer.write_all(header.as_bytes())?;
    writer.write_all(chunk.data())?;

    Ok(header.as_bytes().len() as u64 + chunk.len() as u64)
}
