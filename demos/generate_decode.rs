//! Minimal example: build a two-codec decode table in memory, render it and print the summary.
//!
//! Run: cargo run --example generate_decode

use capsgen::{generate, GenOptions, Mode, Table};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let csv = "\
CodecID,MaxcodecLevel,Profile,MemHandleType,WMin,WMax,WStep,HMin,HMax,HStep,ColorFormat
MFX_CODEC_HEVC,MFX_LEVEL_HEVC_51,MFX_PROFILE_HEVC_MAIN,MFX_RESOURCE_SYSTEM_SURFACE,64,4096,8,64,4096,8,MFX_FOURCC_I420
MFX_CODEC_AVC,MFX_LEVEL_AVC_52,MFX_PROFILE_AVC_HIGH,MFX_RESOURCE_SYSTEM_SURFACE,64,4096,8,64,4096,8,MFX_FOURCC_I420
MFX_CODEC_HEVC,MFX_LEVEL_HEVC_51,MFX_PROFILE_HEVC_MAIN10,MFX_RESOURCE_SYSTEM_SURFACE,64,4096,8,64,4096,8,MFX_FOURCC_I010
";
    let table = Table::parse(csv)?;
    let generated = generate(Mode::Decode, &table, &GenOptions::default())?;

    println!("{}", generated.text);
    eprintln!("{}", generated.summary.report());
    eprintln!("groups per level: {:?}", generated.summary.groups);
    Ok(())
}
