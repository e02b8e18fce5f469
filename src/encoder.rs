use std::env;
use std::fs::{self, File};
use std::io::BufWriter;

use log::{debug, error, info};

use huffpack::huffman::{count_frequencies, entropy_from_histogram};
use huffpack::{BitReader, BitWriter, Codec, HeaderMode};

fn run(input_filepath: &str, output_filepath: &str, mode: HeaderMode) -> huffpack::Result<f64> {
    let input = File::open(input_filepath)?;
    let mut reader = BitReader::new(input);

    let histogram = count_frequencies(&mut reader)?;
    let entropy = entropy_from_histogram(&histogram);
    reader.reset()?;

    let output = BufWriter::new(File::create(output_filepath)?);
    let mut writer = BitWriter::new(output);
    Codec::new(mode).compress(&mut reader, &mut writer)?;
    let bits = writer.bits_written();
    writer.finish()?;
    debug!("Wrote {} bits to {}", bits, output_filepath);

    Ok(entropy)
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        error!("Usage: {} <input_file> [output_file] [--header=tree|counts]", args[0]);
        eprintln!("  📂 <input_file>:  path to the file to encode.");
        eprintln!("  💾 [output_file]: path to write the encoded output (default 'output.huff').");
        std::process::exit(1);
    }

    let input_filepath = &args[1];
    let mut output_filepath = "output.huff";
    let mut mode = HeaderMode::default();

    for arg in &args[2..] {
        if let Some(value) = arg.strip_prefix("--header=") {
            match value.parse() {
                Ok(m) => mode = m,
                Err(e) => {
                    error!("{}", e);
                    std::process::exit(1);
                }
            }
        } else {
            output_filepath = arg;
        }
    }

    info!("--- Start Encoding ---");
    let file_entropy = match run(input_filepath, output_filepath, mode) {
        Ok(entropy) => entropy,
        Err(e) => {
            error!("Encoding failed: {}", e);
            std::process::exit(1);
        }
    };

    let input_size = fs::metadata(input_filepath).map(|m| m.len()).unwrap_or(0);
    let output_size = fs::metadata(output_filepath).map(|m| m.len()).unwrap_or(0);
    let compression_ratio = if input_size > 0 {
        100.0 * (1.0 - (output_size as f64) / (input_size as f64))
    } else {
        0.0
    };

    println!(
        "\r\n✅ Encoding successful.\n\
         📂  Input:       {} ({} bytes)\n\
         💾  Output:      {} ({} bytes)\n\
         ⚙️  Header:      {}\n\
         ℹ️  Entropy:     {:.4} bits/symbol\n\
         🗜️  Ratio:       {:.4}%",
        input_filepath,
        input_size,
        output_filepath,
        output_size,
        mode,
        file_entropy,
        compression_ratio
    );

    info!("--- End ---");
}
