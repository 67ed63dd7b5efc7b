//! # CCITT RLE tool
#![warn(missing_docs)]

mod pbm;

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use ccitt_mh::{packed_line_stride, FillOrder, Mode, StripCoder};
use clap::Parser;
use color_eyre::eyre::{self, eyre, WrapErr};
use log::{info, LevelFilter};

#[derive(Parser)]
/// Convert between PBM images and raw CCITT Modified Huffman streams
struct Options {
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Compress a PBM image (P1 or P4) into a raw MH stream
    Encode(EncodeOpts),
    /// Decompress a raw MH stream into a PBM image
    Decode(DecodeOpts),
    /// Print the run lengths of every scanline in a raw MH stream
    Runs(RunsOpts),
}

#[derive(clap::Args)]
struct EncodeOpts {
    /// The PBM file to compress
    file: PathBuf,
    /// Where to store the compressed stream
    out: PathBuf,
    /// Lines per strip (0 processes the image in one strip)
    #[clap(long, default_value = "0")]
    strip_rows: u32,
    /// Bit order within each stream byte, 1 (MSB first) or 2 (LSB first)
    #[clap(long, default_value = "1")]
    fill_order: u16,
}

#[derive(clap::Args)]
struct DecodeOpts {
    /// The raw MH stream to decompress
    file: PathBuf,
    /// Where to store the PBM image
    out: PathBuf,
    /// Width of the encoded image in pixels
    #[clap(long)]
    width: u32,
    /// Number of scanlines in the encoded image
    #[clap(long)]
    height: u32,
    /// Lines per strip (0 processes the image in one strip)
    #[clap(long, default_value = "0")]
    strip_rows: u32,
    /// Bit order within each stream byte, 1 (MSB first) or 2 (LSB first)
    #[clap(long, default_value = "1")]
    fill_order: u16,
}

#[derive(clap::Args)]
struct RunsOpts {
    /// The raw MH stream to inspect
    file: PathBuf,
    /// Width of the encoded image in pixels
    #[clap(long)]
    width: u32,
    /// Number of scanlines in the encoded image
    #[clap(long)]
    height: u32,
    /// Bit order within each stream byte, 1 (MSB first) or 2 (LSB first)
    #[clap(long, default_value = "1")]
    fill_order: u16,
    /// Emit rows in the inverted-polarity dialect, with a zero-length
    /// run at each end of every row
    #[clap(long, short = 'i')]
    invert: bool,
}

fn fill_order(value: u16) -> eyre::Result<FillOrder> {
    match value {
        1 => Ok(FillOrder::MsbToLsb),
        2 => Ok(FillOrder::LsbToMsb),
        i => Err(eyre!("Unknown fill order: {}", i)),
    }
}

fn read_input(file: &Path) -> eyre::Result<Vec<u8>> {
    std::fs::read(file).wrap_err_with(|| format!("Failed to read `{}`", file.display()))
}

fn encode(opt: EncodeOpts) -> eyre::Result<()> {
    let input = read_input(&opt.file)?;
    let image = pbm::parse(&input)?;
    let fill_order = fill_order(opt.fill_order)?;
    info!(
        "{} x {} pixels, {} bytes packed",
        image.width,
        image.height,
        image.data.len()
    );

    let stride = packed_line_stride(image.width);
    let strip_rows = match opt.strip_rows {
        0 => image.height,
        n => n,
    };

    let mut coder = StripCoder::new(image.width, image.height, Mode::Encode, fill_order, false);
    let mut stream = Vec::new();
    let mut done = 0;
    while done < image.height {
        let rows = strip_rows.min(image.height - done);
        let mut out = vec![0u8; rows as usize * (image.width as usize + 8) + 2];
        let written = coder.encode_strip(&image.data[done as usize * stride..], rows, &mut out)?;
        info!("strip at line {}: {} lines, {} bytes", done, rows, written);
        stream.extend_from_slice(&out[..written]);
        done += rows;
    }

    info!(
        "{} bytes compressed ({:.1}% of the raster)",
        stream.len(),
        100.0 * stream.len() as f64 / image.data.len() as f64
    );
    std::fs::write(&opt.out, &stream)
        .wrap_err_with(|| format!("Failed to write `{}`", opt.out.display()))?;
    Ok(())
}

fn decode(opt: DecodeOpts) -> eyre::Result<()> {
    let stream = read_input(&opt.file)?;
    let fill_order = fill_order(opt.fill_order)?;

    let stride = packed_line_stride(opt.width);
    let strip_rows = match opt.strip_rows {
        0 => opt.height,
        n => n,
    };

    let mut coder = StripCoder::new(opt.width, opt.height, Mode::Decode, fill_order, false);
    let mut packed = vec![0u8; stride * opt.height as usize];
    let mut cursor = 0;
    let mut done = 0;
    while done < opt.height {
        let rows = strip_rows.min(opt.height - done);
        let offset = done as usize * stride;
        let consumed = coder
            .decode_strip(
                &stream[cursor..],
                rows,
                &mut packed[offset..offset + rows as usize * stride],
            )
            .wrap_err_with(|| format!("Decoding failed in the strip at line {}", done))?;
        cursor += consumed;
        done += rows;
    }
    info!(
        "decoded {} lines from {} of {} input bytes",
        opt.height,
        cursor,
        stream.len()
    );

    let file = File::create(&opt.out)
        .wrap_err_with(|| format!("Failed to create `{}`", opt.out.display()))?;
    let mut writer = BufWriter::new(file);
    pbm::write(&mut writer, opt.width, opt.height, &packed)?;
    Ok(())
}

fn runs(opt: RunsOpts) -> eyre::Result<()> {
    let stream = read_input(&opt.file)?;
    let fill_order = fill_order(opt.fill_order)?;

    let mut coder = StripCoder::new(opt.width, opt.height, Mode::Decode, fill_order, opt.invert);
    let mut rows = vec![Vec::new(); opt.height as usize];
    coder.decode_strip_to_runs(&stream, &mut rows)?;

    for row in &rows {
        let slots: Vec<String> = row.iter().map(|slot| slot.to_string()).collect();
        println!("{}", slots.join(" "));
    }
    Ok(())
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Info)
        .init();
    let opt: Options = Options::parse();

    match opt.command {
        Command::Encode(opts) => encode(opts),
        Command::Decode(opts) => decode(opts),
        Command::Runs(opts) => runs(opts),
    }
}
