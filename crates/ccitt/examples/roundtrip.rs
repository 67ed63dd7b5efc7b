use std::path::PathBuf;

use ccitt_mh::{packed_line_stride, FillOrder, Mode, StripCoder};
use clap::Parser;
use color_eyre::eyre::{self, eyre};

#[derive(Parser)]
/// Encode a generated test page, decode it back and compare
struct Options {
    /// Width of the generated page in pixels
    #[clap(long, default_value = "1728")]
    width: u32,
    /// Number of scanlines
    #[clap(long, default_value = "1100")]
    height: u32,
    /// Lines per strip (0 encodes the page in one strip)
    #[clap(long, default_value = "0")]
    strip_rows: u32,
    /// Store ink as zero bits
    #[clap(long, short = 'i')]
    invert: bool,
    /// Reverse the bit order within each stream byte (TIFF FillOrder 2)
    #[clap(long)]
    lsb_first: bool,
    /// Write the compressed stream to this file
    #[clap(long, short = 'o')]
    out: Option<PathBuf>,
}

/// A page of widening diagonal bars, with ink touching both margins on
/// some lines
fn test_page(width: u32, height: u32, invert: bool) -> Vec<u8> {
    let stride = packed_line_stride(width);
    let mut page = vec![if invert { 0xFF } else { 0x00 }; stride * height as usize];
    for y in 0..height as usize {
        let line = &mut page[y * stride..(y + 1) * stride];
        for x in (0..width as usize).step_by(64) {
            let bar = x + y % 32;
            for ink in bar..(bar + 8 + y % 24).min(width as usize) {
                if invert {
                    line[ink / 8] &= !(0x80 >> (ink % 8));
                } else {
                    line[ink / 8] |= 0x80 >> (ink % 8);
                }
            }
        }
    }
    page
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opt: Options = Options::parse();

    let fill_order = if opt.lsb_first {
        FillOrder::LsbToMsb
    } else {
        FillOrder::MsbToLsb
    };
    let stride = packed_line_stride(opt.width);
    let strip_rows = match opt.strip_rows {
        0 => opt.height,
        n => n,
    };

    let page = test_page(opt.width, opt.height, opt.invert);

    let mut encoder = StripCoder::new(opt.width, opt.height, Mode::Encode, fill_order, opt.invert);
    let mut stream = Vec::new();
    let mut done = 0;
    while done < opt.height {
        let rows = strip_rows.min(opt.height - done);
        let mut out = vec![0u8; rows as usize * (opt.width as usize + 8) + 2];
        let offset = done as usize * stride;
        let written = encoder.encode_strip(&page[offset..], rows, &mut out)?;
        stream.extend_from_slice(&out[..written]);
        done += rows;
    }

    println!(
        "{} x {} page: {} bytes raw, {} bytes compressed ({:.1}%)",
        opt.width,
        opt.height,
        page.len(),
        stream.len(),
        100.0 * stream.len() as f64 / page.len() as f64
    );

    if let Some(out) = &opt.out {
        std::fs::write(out, &stream)?;
    }

    let mut decoder = StripCoder::new(opt.width, opt.height, Mode::Decode, fill_order, opt.invert);
    let mut decoded = vec![0u8; stride * opt.height as usize];
    let mut cursor = 0;
    let mut done = 0;
    while done < opt.height {
        let rows = strip_rows.min(opt.height - done);
        let offset = done as usize * stride;
        let consumed = decoder.decode_strip(
            &stream[cursor..],
            rows,
            &mut decoded[offset..offset + rows as usize * stride],
        )?;
        cursor += consumed;
        done += rows;
    }

    if decoded == page {
        println!("round trip OK");
        Ok(())
    } else {
        Err(eyre!("decoded page differs from the original"))
    }
}
