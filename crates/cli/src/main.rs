use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use vidframe_core::shared::constants::DEFAULT_FRAMERATE;
use vidframe_core::video::domain::frame_slice::FrameSlice;
use vidframe_core::video::domain::image_writer::ImageWriter;
use vidframe_core::video::domain::video_reader::{LoadOptions, VideoReader};
use vidframe_core::video::domain::video_writer::VideoWriter;
use vidframe_core::video::domain::writer_config::WriterConfig;
use vidframe_core::video::infrastructure::codec_catalog::{describe_decoder, describe_encoder};
use vidframe_core::video::infrastructure::ffmpeg_backend::library_versions;
use vidframe_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Frame-accurate access to video files.
#[derive(Parser)]
#[command(name = "vidframe", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the properties of the first video stream.
    Probe {
        input: PathBuf,

        /// Print the stream properties as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Save a single frame as an image (format from the extension).
    Extract {
        input: PathBuf,

        /// Frame index; negative values count from the end.
        #[arg(allow_negative_numbers = true)]
        index: i64,

        output: PathBuf,

        /// Resize the image to WIDTHxHEIGHT.
        #[arg(long, value_parser = parse_size)]
        size: Option<(u32, u32)>,
    },

    /// Re-encode a start:stop:step selection of frames into a new video.
    Slice {
        input: PathBuf,

        output: PathBuf,

        #[arg(long, allow_negative_numbers = true)]
        start: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        stop: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        step: Option<i64>,

        /// Output frame rate (defaults to the input's).
        #[arg(long)]
        framerate: Option<f64>,

        /// Output bit rate in bits per second.
        #[arg(long)]
        bitrate: Option<u64>,

        /// Group-of-pictures size.
        #[arg(long)]
        gop: Option<u32>,

        /// Encoder name (derived from the output extension by default).
        #[arg(long)]
        codec: Option<String>,

        /// Container format name (derived from the output extension by default).
        #[arg(long)]
        format: Option<String>,
    },

    /// Decode every frame and report whether the file is complete.
    Verify {
        input: PathBuf,

        /// Fail on the first decode error instead of counting good frames.
        #[arg(long)]
        strict: bool,
    },

    /// Describe a codec known to the linked FFmpeg build, as JSON.
    Codec {
        name: String,

        /// Look up the encoder instead of the decoder.
        #[arg(long)]
        encoder: bool,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Probe { input, json } => run_probe(&input, json),
        Command::Extract {
            input,
            index,
            output,
            size,
        } => run_extract(&input, index, &output, size),
        Command::Slice {
            input,
            output,
            start,
            stop,
            step,
            framerate,
            bitrate,
            gop,
            codec,
            format,
        } => {
            let reader = VideoReader::open(&input)?;
            let mut config = WriterConfig::new(reader.info().width, reader.info().height)
                .with_framerate(framerate.unwrap_or_else(|| input_framerate(&reader)));
            if let Some(bitrate) = bitrate {
                config = config.with_bitrate(bitrate);
            }
            if let Some(gop) = gop {
                config = config.with_gop(gop);
            }
            if let Some(codec) = codec {
                config = config.with_codec(codec);
            }
            if let Some(format) = format {
                config = config.with_format(format);
            }
            run_slice(&reader, FrameSlice::new(start, stop, step), &output, config)
        }
        Command::Verify { input, strict } => run_verify(&input, strict),
        Command::Codec { name, encoder } => {
            let description = if encoder {
                describe_encoder(&name)?
            } else {
                describe_decoder(&name)?
            };
            println!("{}", serde_json::to_string_pretty(&description)?);
            Ok(())
        }
    }
}

fn run_probe(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let reader = VideoReader::open(input)?;
    if json {
        println!("{}", serde_json::to_string_pretty(reader.info())?);
    } else {
        println!("{}", reader.info());
        println!("{}", library_versions()?);
    }
    Ok(())
}

fn run_extract(
    input: &Path,
    index: i64,
    output: &Path,
    size: Option<(u32, u32)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader = VideoReader::open(input)?;
    let frame = reader.get_frame(index)?;
    let image_writer: Box<dyn ImageWriter> = Box::new(ImageFileWriter::new());
    image_writer.write(output, &frame, size)?;
    log::info!("Frame {} written to {}", frame.index(), output.display());
    Ok(())
}

fn run_slice(
    reader: &VideoReader,
    slice: FrameSlice,
    output: &Path,
    config: WriterConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let frames = reader.get_slice(slice)?;
    let mut writer = VideoWriter::create(output, config)?;
    writer.append_batch(frames.view())?;
    writer.close()?;
    println!("{writer}");
    Ok(())
}

fn run_verify(input: &Path, strict: bool) -> Result<(), Box<dyn std::error::Error>> {
    let reader = VideoReader::open(input)?;
    let options = LoadOptions {
        raise_on_error: strict,
        ..LoadOptions::default()
    }
    .with_progress(|current, total| {
        eprint!("\rDecoding frame {current}/{total}");
        true
    });

    let (read, _) = reader.load_all_with(&options)?;
    eprintln!();
    if read < reader.len() {
        return Err(format!(
            "{} is truncated: decoded {read} of {} frames",
            input.display(),
            reader.len()
        )
        .into());
    }
    println!("{}: all {read} frames decoded", input.display());
    Ok(())
}

fn input_framerate(reader: &VideoReader) -> f64 {
    let rate = reader.info().frame_rate;
    if rate > 0.0 {
        rate
    } else {
        DEFAULT_FRAMERATE
    }
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let parse = |d: &str| {
        d.trim()
            .parse::<u32>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| format!("invalid dimension '{d}' in '{value}'"))
    };
    Ok((parse(w)?, parse(h)?))
}
