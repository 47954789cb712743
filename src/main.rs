// Load a json file that specifies which image to warp, the function to warp
// it with and how, then write out the result

use std::io::{Error, Read, ErrorKind};
use std::fs::File;
use std::env;
use std::path::{Path, PathBuf};

use json::JsonValue;

use complex_warp::display::FrameWriter;
use complex_warp::session::{AnimationSettings, Session};
use complex_warp::{io, ComplexFunction, PixelBuffer, ProgressiveRemap, RemapEngine, RemapMode, RemapOptions, Viewport, WarpError};

fn warp_image(
    source : &PixelBuffer,
    viewport : &Viewport,
    function : &ComplexFunction,
    options : &RemapOptions,
    mode : RemapMode
) -> Result<PixelBuffer, WarpError> {
    RemapEngine::new(source, viewport, function, options, mode)?.run()
}

// Frames go in a directory named after the output image minus its extension
fn frame_directory(out_filename : &str) -> PathBuf {
    Path::new(out_filename).with_extension("")
}

// Run the two stage animation, writing frames next to the output image
fn animate(
    input : &JsonValue,
    remap : ProgressiveRemap,
    out_filename : &str
) -> Result<PixelBuffer, WarpError> {
    let out_filename_base = frame_directory(out_filename);
    let settings = AnimationSettings::from_json(&input["animation"], remap.source().width())?;
    let mut display = FrameWriter::from_json(&input["animation"], &out_filename_base)?;
    let mut session = Session::new(remap, settings)?;
    let phase = session.run(&mut display)?;
    println!(
        "Stopped at {:?} after writing {} frames to {}",
        phase, display.frames_written(), out_filename_base.display()
    );
    Ok(session.into_frame())
}

fn main() -> std::io::Result<()> {
    env_logger::init();
    // Get file to use else default
    let in_filename = env::args().nth(1).unwrap_or("input.json".to_string());
    let out_filename = env::args().nth(2).unwrap_or("output.png".to_string());
    println!("Loading input file: {}", in_filename);
    let mut file = File::open(in_filename)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    println!("Parsing input file");
    let input = json::parse(&contents).map_err(
        |_| Error::new(ErrorKind::InvalidData, "Couldn't parse input")
    )?;

    let image_filename = input["input"].as_str().ok_or_else(
        || Error::new(ErrorKind::InvalidData, "Missing input image")
    )?;
    println!("Loading image: {}", image_filename);
    let source = io::load(Path::new(image_filename))?;
    println!(
        "Image size: {} x {}, channels: {}",
        source.width(), source.height(), source.channels()
    );
    let viewport = Viewport::from_json(&input["viewport"], source.width(), source.height())?;
    let function = ComplexFunction::from_json(&input["function"])?;
    let options = RemapOptions::from_json(&input)?;
    let function_name = function.name().to_string();

    let mode = input["mode"].as_str().unwrap_or("inverse");
    let image = match mode {
        "forward" => warp_image(&source, &viewport, &function, &options, RemapMode::ForwardScatter)?,
        "inverse" => warp_image(&source, &viewport, &function, &options, RemapMode::InverseGather)?,
        "animation" => {
            let remap = ProgressiveRemap::new(source, viewport, function, options)?;
            animate(&input, remap, &out_filename)?
        },
        _ => return Err(Error::new(ErrorKind::InvalidData, "Unknown mode"))
    };
    println!("Warped with {} ({})", function_name, mode);
    println!("Writing output to {}", out_filename);
    io::save(Path::new(&out_filename), &image)?;
    Ok(())
}
