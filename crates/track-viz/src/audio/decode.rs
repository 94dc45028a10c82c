//! Audio file decoding via symphonia.
//!
//! Produces a mono [`Waveform`]; multichannel tracks are downmixed by
//! averaging each frame.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use track_viz_core::{VizError, Waveform};

fn classify(path: &Path, err: SymphoniaError) -> VizError {
    match err {
        // Running off the end while probing means the stream is not one we know
        SymphoniaError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            VizError::UnsupportedFormat(format!("truncated or unrecognised stream: {}", e))
        }
        SymphoniaError::IoError(source) => VizError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => VizError::UnsupportedFormat(other.to_string()),
    }
}

/// Decode the first audio track of `path` to mono f32 samples.
pub fn load_waveform(path: &Path) -> Result<Waveform, VizError> {
    let file = File::open(path).map_err(|source| VizError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| classify(path, e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| VizError::UnsupportedFormat("no audio track found".into()))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| VizError::UnsupportedFormat("unknown sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| classify(path, e))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(classify(path, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            // Corrupt packets are skipped rather than aborting the whole file
            Err(SymphoniaError::DecodeError(msg)) => {
                log::debug!("Skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(classify(path, e)),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let num_frames = decoded.frames();

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        if channels == 1 {
            samples.extend_from_slice(sample_buf.samples());
        } else {
            samples.extend(
                sample_buf
                    .samples()
                    .chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
        }
    }

    log::debug!(
        "Decoded {} mono samples at {} Hz",
        samples.len(),
        sample_rate
    );

    Waveform::new(samples, sample_rate)
}
