use std::env;
use std::fs::{self, File};
use std::io::Write;

use log::{debug, error, info};

use huffpack::{BitReader, BitWriter, Codec, HuffError};

/// Decodes into memory so a failed run never leaves a partial output file.
fn decode_file(input_filepath: &str) -> huffpack::Result<Vec<u8>> {
    info!("Reading encoded file: {}", input_filepath);
    let input = File::open(input_filepath)?;
    let mut reader = BitReader::new(input);
    let mut writer = BitWriter::new(Vec::new());

    Codec::default().decompress(&mut reader, &mut writer)?;
    debug!("Consumed {} bits of input", reader.bits_read());

    Ok(writer.finish()?)
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        error!("Usage: {} <input_file> <output_file>", args[0]);
        eprintln!("  📂 <input_file>:  path to the encoded file.");
        eprintln!("  💾 <output_file>: path to write the decoded output.");
        std::process::exit(1);
    }

    let input_filepath = &args[1];
    let output_filepath = &args[2];

    info!("--- Start Decoding ---");

    let decoded_data = match decode_file(input_filepath) {
        Ok(data) => data,
        Err(e @ HuffError::Format { .. }) => {
            error!("{} is not a compressed file: {}", input_filepath, e);
            std::process::exit(1);
        }
        Err(e) if e.is_truncation() => {
            error!("{} is truncated or corrupt: {}", input_filepath, e);
            std::process::exit(1);
        }
        Err(e) => {
            error!("Failed to decode {}: {}", input_filepath, e);
            std::process::exit(1);
        }
    };

    info!("Writing decoded output to file: {}", output_filepath);
    let written = File::create(output_filepath).and_then(|mut f| f.write_all(&decoded_data));
    if let Err(e) = written {
        error!("Could not write decoded data: {}", e);
        std::process::exit(1);
    }

    info!("Write successful.");

    let input_size = fs::metadata(input_filepath).map(|m| m.len()).unwrap_or(0);
    let output_size = decoded_data.len() as u64;
    let ratio = if output_size > 0 {
        100.0 * (1.0 - (input_size as f64) / (output_size as f64))
    } else {
        0.0
    };

    println!(
        "\r\n✅ decoding successful.\n\
         📂 input file:        {} ({} bytes)\n\
         💾 output file:       {} ({} bytes)\n\
         🗜️ compression ratio: {:.2}% (relative to decoded output)",
        input_filepath, input_size, output_filepath, output_size, ratio
    );

    info!("--- End ---");
}
