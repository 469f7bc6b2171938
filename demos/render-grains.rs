//! Renders a plucked test signal through a granular delay effect into a WAV file.

use std::path::PathBuf;

use arg::{parse_args, Args};

use grainfield::{
    effects::{GrainDelayEffect, ScatterEffect},
    utils::pitch::{PitchScale, RootNote},
    Effect, EffectTime, Error, Parameter,
};

// -------------------------------------------------------------------------------------------------

#[cfg(all(debug_assertions, feature = "assert-allocs"))]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

// -------------------------------------------------------------------------------------------------

const DEFAULT_LOG_LEVEL: log::Level = if cfg!(debug_assertions) {
    log::Level::Debug
} else {
    log::Level::Warn
};

const SAMPLE_RATE: u32 = 48000;
const BLOCK_SIZE: usize = 512;
const DURATION_SECONDS: u32 = 12;
const TEMPO_BPM: f64 = 96.0;

// -------------------------------------------------------------------------------------------------

/// Render a test signal through a granular delay effect into a wav file.
#[derive(Args, Debug, Default)]
struct Arguments {
    #[arg(short = "e", long = "effect")]
    /// Effect to render: \"grain-delay\" (default) or \"scatter\".
    effect: Option<String>,
    #[arg(short = "o", long = "output")]
    /// Path of the rendered wav file. By default \"grains.wav\".
    output_path: Option<PathBuf>,
    #[arg(short = "l", long = "log-level")]
    /// Set logging level to \"debug\", \"info\", \"warn\" or \"error\".
    log_level: Option<log::Level>,
}

// -------------------------------------------------------------------------------------------------

fn create_effect(name: &str) -> Result<Box<dyn Effect>, Error> {
    match name {
        "grain-delay" => {
            let effect = GrainDelayEffect::new();
            let parameters = effect.shared_parameters();
            parameters.set(GrainDelayEffect::DELAY_TIME_ID, 375.0)?;
            parameters.set(GrainDelayEffect::FEEDBACK_ID, 0.6)?;
            parameters.set(GrainDelayEffect::CHAOS_ID, 0.5)?;
            parameters.set(GrainDelayEffect::MIX_ID, 0.6)?;
            Ok(Box::new(effect))
        }
        "scatter" => {
            let effect = ScatterEffect::new();
            let parameters = effect.shared_parameters();
            parameters.set(ScatterEffect::GRAIN_SIZE_ID, 180.0)?;
            parameters.set(ScatterEffect::DENSITY_ID, 0.7)?;
            parameters.set(ScatterEffect::PITCH_RANDOM_ID, 0.8)?;
            parameters.set_enum(ScatterEffect::SCALE_ID, PitchScale::Pentatonic)?;
            parameters.set_enum(ScatterEffect::ROOT_NOTE_ID, RootNote::A)?;
            parameters.set(ScatterEffect::MIX_ID, 0.7)?;
            Ok(Box::new(effect))
        }
        _ => Err(Error::ParameterError(format!(
            "Unknown effect '{name}'. Expected 'grain-delay' or 'scatter'."
        ))),
    }
}

/// Decaying sine plucks, one every beat, cycling through a few pitches.
fn render_input(buffer: &mut [f32], first_frame: u64) {
    const FREQUENCIES: [f32; 4] = [220.0, 277.18, 329.63, 440.0];
    let beat_frames = (60.0 / TEMPO_BPM * SAMPLE_RATE as f64) as u64;
    for (index, frame) in buffer.chunks_exact_mut(2).enumerate() {
        let frame_index = first_frame + index as u64;
        let beat = frame_index / beat_frames;
        // silence the last seconds to listen to the tail
        let sample = if frame_index < (DURATION_SECONDS as u64 - 4) * SAMPLE_RATE as u64 {
            let time = (frame_index % beat_frames) as f32 / SAMPLE_RATE as f32;
            let frequency = FREQUENCIES[beat as usize % FREQUENCIES.len()];
            (std::f32::consts::TAU * frequency * time).sin() * (-time * 6.0).exp() * 0.5
        } else {
            0.0
        };
        frame.fill(sample);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args::<Arguments>();

    simple_logger::SimpleLogger::new()
        .with_level(args.log_level.unwrap_or(DEFAULT_LOG_LEVEL).to_level_filter())
        .init()?;

    let effect_name = args.effect.as_deref().unwrap_or("grain-delay");
    let output_path = args
        .output_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("grains.wav"));

    let mut effect = create_effect(effect_name)?;
    effect.initialize(SAMPLE_RATE, 2, BLOCK_SIZE)?;
    for parameter in effect.parameters() {
        log::debug!(
            "Parameter '{}' defaults to {}",
            parameter.name(),
            parameter.value_to_string(parameter.default_value(), true)
        );
    }

    let mut writer = hound::WavWriter::create(
        &output_path,
        hound::WavSpec {
            channels: 2,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        },
    )?;

    let mut time = EffectTime::new(0).with_bpm(TEMPO_BPM);
    let mut buffer = vec![0.0; BLOCK_SIZE * 2];
    let total_frames = DURATION_SECONDS as u64 * SAMPLE_RATE as u64;
    while time.pos_in_frames < total_frames {
        render_input(&mut buffer, time.pos_in_frames);
        effect.process(&mut buffer, &time);
        for sample in &buffer {
            writer.write_sample(*sample)?;
        }
        time.advance(BLOCK_SIZE as u64);
    }
    writer.finalize()?;

    log::info!(
        "Rendered {} seconds of '{}' into '{}'",
        DURATION_SECONDS,
        effect.name(),
        output_path.display()
    );
    Ok(())
}
